use thiserror::Error;

#[derive(Error, Debug)]
pub enum DcfModelError {
    /// Raised when the series a reporting period is selected from is empty
    /// or absent.
    #[error("No reporting period found: {0}")]
    MissingPeriod(String),

    #[error("Malformed value '{value}' for tag {tag}: expected {expected}")]
    MalformedValue {
        tag: String,
        value: String,
        expected: &'static str,
    },

    #[error("Model needs {required} columns but only {max} are representable")]
    ColumnRangeExceeded { required: u64, max: u32 },

    #[error("Cell {cell} would receive both {existing} and {incoming}")]
    ColumnConflict {
        cell: String,
        existing: String,
        incoming: String,
    },

    /// Records, columns and formulas that do not line up with the plan they
    /// are placed by.
    #[error("Inconsistent column plan: {0}")]
    PlanMismatch(String),

    #[error("Total of {item} in filing {filing} exceeds the numeric range")]
    Overflow { filing: String, item: String },

    #[error("Invalid column label: {0}")]
    InvalidColumnLabel(String),

    #[error("Year records must be strictly ascending: {next} follows {previous}")]
    YearsOutOfOrder { previous: i32, next: i32 },

    #[error("No annual filings to build a model from")]
    NoFilings,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, DcfModelError>;
