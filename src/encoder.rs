//! Feature Encoder
//!
//! Turns a [`Dataset`] into a dense, column-major feature matrix. Numeric columns are
//! passed through untouched, categorical columns are one-hot encoded using the
//! categories seen at fit time. Categories that were not seen at fit time are
//! encoded as an all-zero block rather than raising an error.
use crate::data::{ColumnKind, Dataset, FeatureSpec, Matrix};
use crate::errors::UpliftError;
use hashbrown::{HashMap, HashSet};

/// Encoded, column-major feature values.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedFeatures {
    pub data: Vec<f64>,
    pub rows: usize,
    pub cols: usize,
}

impl EncodedFeatures {
    /// Borrow the encoded values as a [`Matrix`].
    pub fn matrix(&self) -> Matrix<'_, f64> {
        Matrix::new(&self.data, self.rows, self.cols)
    }
}

/// Categories of one column, in output column order.
#[derive(Debug, Clone)]
struct CategoryLevels {
    values: Vec<String>,
    index: HashMap<String, usize>,
}

impl CategoryLevels {
    fn from_values(values: &[String]) -> Self {
        let mut unique: Vec<String> = values
            .iter()
            .collect::<HashSet<_>>()
            .into_iter()
            .cloned()
            .collect();
        unique.sort();
        let index = unique.iter().enumerate().map(|(i, v)| (v.clone(), i)).collect();
        CategoryLevels { values: unique, index }
    }
}

/// Column transformer fitted once and applied unchanged to any partition.
#[derive(Debug, Clone)]
pub struct FeatureEncoder {
    specs: Vec<FeatureSpec>,
    // One entry per feature, `None` for numeric columns.
    levels: Option<Vec<Option<CategoryLevels>>>,
}

impl FeatureEncoder {
    /// Create an unfitted encoder from an explicit schema.
    pub fn new(specs: Vec<FeatureSpec>) -> Result<Self, UpliftError> {
        if specs.is_empty() {
            return Err(UpliftError::InvalidParameter(
                "features".to_string(),
                "at least one feature".to_string(),
                "an empty list".to_string(),
            ));
        }
        {
            let mut seen = HashSet::new();
            for s in &specs {
                if !seen.insert(s.name.as_str()) {
                    return Err(UpliftError::InvalidParameter(
                        "features".to_string(),
                        "unique feature names".to_string(),
                        format!("{} more than once", s.name),
                    ));
                }
            }
        }
        Ok(FeatureEncoder { specs, levels: None })
    }

    pub fn specs(&self) -> &[FeatureSpec] {
        &self.specs
    }

    pub fn is_fitted(&self) -> bool {
        self.levels.is_some()
    }

    /// Learn the category sets of the categorical columns.
    pub fn fit(&mut self, df: &Dataset) -> Result<(), UpliftError> {
        let levels = self
            .specs
            .iter()
            .map(|spec| match spec.kind {
                ColumnKind::Numeric => df.numeric(&spec.name).map(|_| None),
                ColumnKind::Categorical => df
                    .categorical(&spec.name)
                    .map(|values| Some(CategoryLevels::from_values(values))),
            })
            .collect::<Result<Vec<_>, _>>()?;
        self.levels = Some(levels);
        Ok(())
    }

    pub fn fit_transform(&mut self, df: &Dataset) -> Result<EncodedFeatures, UpliftError> {
        self.fit(df)?;
        self.transform(df)
    }

    /// Apply the fitted layout to `df`.
    pub fn transform(&self, df: &Dataset) -> Result<EncodedFeatures, UpliftError> {
        let levels = self.levels.as_ref().ok_or(UpliftError::NotFitted)?;
        let rows = df.rows();
        let cols = self.n_features_out()?;
        let mut data = Vec::with_capacity(rows * cols);

        for (spec, level) in self.specs.iter().zip(levels) {
            match level {
                None => data.extend_from_slice(df.numeric(&spec.name)?),
                Some(level) => {
                    let values = df.categorical(&spec.name)?;
                    let start = data.len();
                    data.resize(start + rows * level.values.len(), 0.0);
                    for (i, v) in values.iter().enumerate() {
                        if let Some(&j) = level.index.get(v.as_str()) {
                            data[start + j * rows + i] = 1.0;
                        }
                    }
                }
            }
        }
        Ok(EncodedFeatures { data, rows, cols })
    }

    /// Number of encoded output columns.
    pub fn n_features_out(&self) -> Result<usize, UpliftError> {
        let levels = self.levels.as_ref().ok_or(UpliftError::NotFitted)?;
        Ok(levels.iter().map(|l| l.as_ref().map_or(1, |l| l.values.len())).sum())
    }

    /// Names of the encoded output columns, `name` for numeric
    /// columns and `name=value` for indicator columns.
    pub fn feature_names(&self) -> Result<Vec<String>, UpliftError> {
        let levels = self.levels.as_ref().ok_or(UpliftError::NotFitted)?;
        let mut names = Vec::new();
        for (spec, level) in self.specs.iter().zip(levels) {
            match level {
                None => names.push(spec.name.clone()),
                Some(l) => names.extend(l.values.iter().map(|v| format!("{}={}", spec.name, v))),
            }
        }
        Ok(names)
    }
}
