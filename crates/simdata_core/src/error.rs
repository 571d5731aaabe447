use std::path::PathBuf;

/// Errors raised by table construction and reshaping
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TableError {
    #[error("column '{column}' has {actual} values, expected {expected}")]
    LengthMismatch {
        column: String,
        expected: usize,
        actual: usize,
    },

    #[error("index key has {actual} levels, expected {expected}")]
    KeyWidth { expected: usize, actual: usize },

    #[error("column '{0}' not found")]
    MissingColumn(String),

    #[error("index level '{0}' not found")]
    MissingIndexLevel(String),

    #[error("duplicate column '{0}'")]
    DuplicateColumn(String),
}

/// Errors related to the shape and contents of an output record
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RecordError {
    #[error("'{key}' must be {expected}")]
    TypeMismatch { key: String, expected: &'static str },

    #[error("record has no '{0}' section")]
    MissingSection(&'static str),

    #[error("parameter sample has {rows} rows but log.sample_size is {sample_size}")]
    SampleSizeMismatch { rows: usize, sample_size: usize },

    #[error(transparent)]
    Table(#[from] TableError),

    #[error(transparent)]
    Sensitivity(#[from] SensitivityError),
}

/// Errors raised while computing sensitivity indices
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SensitivityError {
    #[error(
        "incorrect number of samples in model output: {len} is not a multiple of {step} \
         ({num_vars} parameters, second order: {second_order})"
    )]
    SampleLayout {
        len: usize,
        step: usize,
        num_vars: usize,
        second_order: bool,
    },

    #[error("no parameter ranges to analyze")]
    NoRanges,

    #[error("sample has {sample} varying parameters but {ranges} ranges were given")]
    ParameterCount { sample: usize, ranges: usize },

    #[error("reporter '{reporter}' holds a non-numeric value at row {row}")]
    NonNumeric { reporter: String, row: usize },

    #[error("invalid range for '{name}': low {low} must not exceed high {high}")]
    InvalidRange { name: String, low: f64, high: f64 },

    #[error("invalid option: {0}")]
    InvalidOption(String),
}

/// Errors raised by saving and loading records
#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    #[error("no experiment found with name '{name}' in path '{}'", path.display())]
    NotFound { name: String, path: PathBuf },

    #[error("experiment directory '{}' already exists", .0.display())]
    AlreadyExists(PathBuf),

    #[error("file type '{0}' not supported")]
    UnsupportedExtension(String),

    #[error("{0}")]
    Unserializable(String),

    #[error(transparent)]
    Record(#[from] RecordError),

    #[error(transparent)]
    Table(#[from] TableError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
