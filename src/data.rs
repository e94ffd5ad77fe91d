//! Data
//!
//! Containers for the campaign data: a borrowed column-major [`Matrix`] used by the
//! models, and an owned, column-oriented [`Dataset`] of typed columns used for
//! loading, filtering and feature encoding.
use crate::constants::{SEGMENT_COL, TREATMENT_COL};
use crate::errors::UpliftError;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

/// Contiguous Column Major Matrix data container.
///
/// This structure holds a dense matrix of values in a single contiguous memory block.
/// It follows column-major order (Fortran-style), which allows for efficient column slicing.
pub struct Matrix<'a, T> {
    /// The raw data stored in a single slice.
    pub data: &'a [T],
    /// Indices into the data row-wise.
    pub index: Vec<usize>,
    /// Number of rows in the matrix.
    pub rows: usize,
    /// Number of columns in the matrix.
    pub cols: usize,
    stride1: usize,
    stride2: usize,
}

impl<'a, T> Matrix<'a, T> {
    /// Create a new Matrix.
    pub fn new(data: &'a [T], rows: usize, cols: usize) -> Self {
        Matrix {
            data,
            index: (0..rows).collect(),
            rows,
            cols,
            stride1: rows,
            stride2: 1,
        }
    }

    /// Get a single reference to an item in the matrix.
    ///
    /// * `i` - The ith row of the data to get.
    /// * `j` - the jth column of the data to get.
    pub fn get(&self, i: usize, j: usize) -> &T {
        &self.data[self.item_index(i, j)]
    }

    fn item_index(&self, i: usize, j: usize) -> usize {
        let mut idx = self.stride2 * i;
        idx += j * self.stride1;
        idx
    }

    /// Get access to a row of the data, as an iterator.
    pub fn get_row_iter(&self, row: usize) -> std::iter::StepBy<std::iter::Skip<std::slice::Iter<'a, T>>> {
        self.data.iter().skip(row).step_by(self.rows)
    }

    /// Get an entire column in the matrix.
    ///
    /// * `col` - The index of the column to get.
    pub fn get_col(&self, col: usize) -> &[T] {
        let i = self.item_index(0, col);
        let j = self.item_index(self.rows, col);
        &self.data[i..j]
    }
}

impl<'a, T> Matrix<'a, T>
where
    T: Copy,
{
    /// Get a row of the data as a vector.
    pub fn get_row(&self, row: usize) -> Vec<T> {
        self.get_row_iter(row).copied().collect()
    }

    /// Copy the selected rows into a new column-major buffer,
    /// in the order given by `rows`.
    pub fn select_rows(&self, rows: &[usize]) -> Vec<T> {
        let mut sub = Vec::with_capacity(rows.len() * self.cols);
        for col in 0..self.cols {
            let col_data = self.get_col(col);
            sub.extend(rows.iter().map(|&i| col_data[i]));
        }
        sub
    }
}

/// How a column is interpreted by the feature encoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnKind {
    /// Passed through unchanged.
    Numeric,
    /// Expanded into one indicator column per observed category.
    Categorical,
}

impl Display for ColumnKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ColumnKind::Numeric => write!(f, "numeric"),
            ColumnKind::Categorical => write!(f, "categorical"),
        }
    }
}

/// A typed feature column descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureSpec {
    pub name: String,
    pub kind: ColumnKind,
}

impl FeatureSpec {
    pub fn numeric(name: &str) -> Self {
        FeatureSpec {
            name: name.to_string(),
            kind: ColumnKind::Numeric,
        }
    }

    pub fn categorical(name: &str) -> Self {
        FeatureSpec {
            name: name.to_string(),
            kind: ColumnKind::Categorical,
        }
    }
}

/// Storage for a single dataset column.
#[derive(Debug, Clone, PartialEq)]
pub enum Column {
    Numeric(Vec<f64>),
    Categorical(Vec<String>),
}

impl Column {
    pub fn len(&self) -> usize {
        match self {
            Column::Numeric(v) => v.len(),
            Column::Categorical(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn kind(&self) -> ColumnKind {
        match self {
            Column::Numeric(_) => ColumnKind::Numeric,
            Column::Categorical(_) => ColumnKind::Categorical,
        }
    }

    /// Gather the given rows into a new column.
    pub fn take(&self, rows: &[usize]) -> Column {
        match self {
            Column::Numeric(v) => Column::Numeric(rows.iter().map(|&i| v[i]).collect()),
            Column::Categorical(v) => Column::Categorical(rows.iter().map(|&i| v[i].clone()).collect()),
        }
    }
}

/// Owned, column-oriented table of named, typed columns.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    names: Vec<String>,
    columns: Vec<Column>,
    rows: usize,
}

impl Dataset {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder style version of [`Dataset::push_column`].
    pub fn with_column(mut self, name: &str, column: Column) -> Result<Self, UpliftError> {
        self.push_column(name, column)?;
        Ok(self)
    }

    /// Add a column, or replace the column with the same name.
    ///
    /// All columns must have the same number of rows.
    pub fn push_column(&mut self, name: &str, column: Column) -> Result<(), UpliftError> {
        if self.columns.is_empty() {
            self.rows = column.len();
        } else if column.len() != self.rows {
            return Err(UpliftError::LengthMismatch(name.to_string(), self.rows, column.len()));
        }
        match self.position(name) {
            Some(i) => self.columns[i] = column,
            None => {
                self.names.push(name.to_string());
                self.columns.push(column);
            }
        }
        Ok(())
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    pub fn column_names(&self) -> &[String] {
        &self.names
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    pub fn column(&self, name: &str) -> Result<&Column, UpliftError> {
        self.position(name)
            .map(|i| &self.columns[i])
            .ok_or_else(|| UpliftError::ColumnNotFound(name.to_string()))
    }

    pub fn numeric(&self, name: &str) -> Result<&[f64], UpliftError> {
        match self.column(name)? {
            Column::Numeric(v) => Ok(v),
            Column::Categorical(_) => Err(UpliftError::ColumnType(name.to_string(), ColumnKind::Numeric.to_string())),
        }
    }

    pub fn categorical(&self, name: &str) -> Result<&[String], UpliftError> {
        match self.column(name)? {
            Column::Categorical(v) => Ok(v),
            Column::Numeric(_) => Err(UpliftError::ColumnType(
                name.to_string(),
                ColumnKind::Categorical.to_string(),
            )),
        }
    }

    /// Iterate over `(name, column)` pairs in column order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Column)> {
        self.names.iter().map(|n| n.as_str()).zip(self.columns.iter())
    }

    /// Gather the given rows into a new dataset with the same columns.
    pub fn take(&self, rows: &[usize]) -> Dataset {
        Dataset {
            names: self.names.clone(),
            columns: self.columns.iter().map(|c| c.take(rows)).collect(),
            rows: rows.len(),
        }
    }

    /// Load a comma separated file with a header row.
    ///
    /// Header names are lower cased. A column is stored as numeric when every non-empty
    /// cell parses as a float (empty cells become NaN), otherwise it is categorical.
    pub fn from_csv<P: AsRef<Path>>(path: P) -> Result<Self, UpliftError> {
        let path_str = path.as_ref().display().to_string();
        let file = File::open(path.as_ref()).map_err(|e| UpliftError::UnableToRead(format!("{}: {}", path_str, e)))?;
        Self::from_reader(BufReader::new(file)).map_err(|e| match e {
            UpliftError::UnableToRead(msg) => UpliftError::UnableToRead(format!("{}: {}", path_str, msg)),
            other => other,
        })
    }

    /// Same as [`Dataset::from_csv`], reading from any reader.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, UpliftError> {
        let mut csv_reader = csv::ReaderBuilder::new().has_headers(true).from_reader(reader);
        let headers: Vec<String> = csv_reader
            .headers()
            .map_err(|e| UpliftError::UnableToRead(e.to_string()))?
            .iter()
            .map(|h| h.trim().to_lowercase())
            .collect();

        let mut raw: Vec<Vec<String>> = vec![Vec::new(); headers.len()];
        for result in csv_reader.records() {
            let record = result.map_err(|e| UpliftError::UnableToRead(e.to_string()))?;
            for (i, cell) in record.iter().enumerate().take(headers.len()) {
                raw[i].push(cell.trim().to_string());
            }
        }

        let mut dataset = Dataset::new();
        for (name, cells) in headers.iter().zip(raw) {
            dataset.push_column(name, parse_column(cells))?;
        }
        Ok(dataset)
    }
}

fn parse_column(cells: Vec<String>) -> Column {
    let parsed: Option<Vec<f64>> = cells
        .iter()
        .map(|c| if c.is_empty() { Some(f64::NAN) } else { c.parse::<f64>().ok() })
        .collect();
    match parsed {
        Some(values) if cells.iter().any(|c| !c.is_empty()) => Column::Numeric(values),
        _ => Column::Categorical(cells),
    }
}

/// Restrict the data to two segments and derive the binary treatment column.
///
/// Rows whose `segment` equals `treat_label` get treatment 1, rows equal to
/// `control_label` get 0, every other row is dropped. Row order is preserved.
pub fn prepare_treatment(df: &Dataset, treat_label: &str, control_label: &str) -> Result<Dataset, UpliftError> {
    if treat_label == control_label {
        return Err(UpliftError::InvalidParameter(
            "control_label".to_string(),
            format!("a segment different from {}", treat_label),
            control_label.to_string(),
        ));
    }
    let segment = df.categorical(SEGMENT_COL)?;
    let rows: Vec<usize> = segment
        .iter()
        .enumerate()
        .filter(|(_, s)| s.as_str() == treat_label || s.as_str() == control_label)
        .map(|(i, _)| i)
        .collect();
    let treatment: Vec<f64> = rows
        .iter()
        .map(|&i| if segment[i] == treat_label { 1.0 } else { 0.0 })
        .collect();

    let mut sub = df.take(&rows);
    sub.push_column(TREATMENT_COL, Column::Numeric(treatment))?;
    Ok(sub)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn segments() -> Dataset {
        Dataset::new()
            .with_column(
                "segment",
                Column::Categorical(
                    ["Mens E-Mail", "No E-Mail", "Womens E-Mail", "No E-Mail", "Mens E-Mail"]
                        .iter()
                        .map(|s| s.to_string())
                        .collect(),
                ),
            )
            .unwrap()
            .with_column("conversion", Column::Numeric(vec![1., 0., 0., 1., 0.]))
            .unwrap()
    }

    #[test]
    fn test_matrix_access() {
        let v = vec![1, 2, 3, 5, 6, 7];
        let m = Matrix::new(&v, 3, 2);
        assert_eq!(m.get_col(1), &vec![5, 6, 7]);
        assert_eq!(m.get_row(2), vec![3, 7]);
        assert_eq!(*m.get(0, 0), 1);
        assert_eq!(*m.get(1, 0), 2);
        assert_eq!(*m.get(0, 1), 5);
    }

    #[test]
    fn test_matrix_select_rows() {
        let v = vec![1, 2, 3, 5, 6, 7];
        let m = Matrix::new(&v, 3, 2);
        assert_eq!(m.select_rows(&[2, 0]), vec![3, 1, 7, 5]);
    }

    #[test]
    fn test_push_column_length_mismatch() {
        let mut ds = segments();
        let res = ds.push_column("visit", Column::Numeric(vec![1.0]));
        assert!(matches!(res, Err(UpliftError::LengthMismatch(_, 5, 1))));
    }

    #[test]
    fn test_column_type_errors() {
        let ds = segments();
        assert!(matches!(ds.numeric("segment"), Err(UpliftError::ColumnType(..))));
        assert!(matches!(ds.categorical("conversion"), Err(UpliftError::ColumnType(..))));
        assert!(matches!(ds.column("spend"), Err(UpliftError::ColumnNotFound(_))));
    }

    #[test]
    fn test_prepare_treatment() {
        let sub = prepare_treatment(&segments(), "Mens E-Mail", "No E-Mail").unwrap();
        assert_eq!(sub.rows(), 4);
        assert_eq!(sub.numeric("treatment").unwrap(), &[1., 0., 0., 1.]);
        assert_eq!(sub.numeric("conversion").unwrap(), &[1., 0., 1., 0.]);
    }

    #[test]
    fn test_prepare_treatment_same_labels() {
        assert!(prepare_treatment(&segments(), "No E-Mail", "No E-Mail").is_err());
    }

    #[test]
    fn test_from_reader_infers_storage() {
        let csv = "Recency,Channel,Spend\n10,Web,0\n6,Phone,\n7,Web,29.99\n";
        let ds = Dataset::from_reader(csv.as_bytes()).unwrap();
        assert_eq!(ds.rows(), 3);
        assert_eq!(ds.column_names(), &["recency", "channel", "spend"]);
        assert_eq!(ds.numeric("recency").unwrap(), &[10., 6., 7.]);
        assert_eq!(ds.categorical("channel").unwrap()[1], "Phone");
        let spend = ds.numeric("spend").unwrap();
        assert!(spend[1].is_nan());
        assert_eq!(spend[2], 29.99);
    }
}
