// Column names used by the Hillstrom e-mail dataset.
pub const SEGMENT_COL: &str = "segment";
pub const OUTCOME_COL: &str = "conversion";
pub const TREATMENT_COL: &str = "treatment";
pub const VISIT_COL: &str = "visit";
pub const SPEND_COL: &str = "spend";

/// Columns that are targets or arm labels and never used as model features.
pub const NON_FEATURE_COLS: [&str; 5] = [OUTCOME_COL, TREATMENT_COL, SEGMENT_COL, VISIT_COL, SPEND_COL];

// Segment labels.
pub const MENS_EMAIL: &str = "Mens E-Mail";
pub const WOMENS_EMAIL: &str = "Womens E-Mail";
pub const NO_EMAIL: &str = "No E-Mail";

/// Number of cross-validation folds used for isotonic calibration.
pub const CALIBRATION_FOLDS: usize = 3;

pub const DEFAULT_TEST_SIZE: f64 = 0.3;
pub const DEFAULT_SEED: u64 = 42;
pub const DEFAULT_N_ESTIMATORS: usize = 200;
pub const DEFAULT_MAX_DEPTH: usize = 6;

pub const DEFAULT_KS: [f64; 5] = [0.05, 0.10, 0.20, 0.30, 1.00];
pub const DEFAULT_MARGIN: f64 = 15.0;
pub const DEFAULT_COST_EMAIL: f64 = 0.10;

pub const DEFAULT_N_BOOT: usize = 5000;
