use crate::{PolicyId, RunId};

/// Error type
#[derive(Debug)]
pub enum Error {
    /// An IO error.
    Io(std::io::Error),

    /// Error while opening or querying the simulation store.
    Storage(rusqlite::Error),

    /// The row source failed while producing its next row.
    ///
    /// Aggregation is abandoned; no partial series survive.
    SourceRead(Box<dyn std::error::Error + Send + Sync>),

    /// A row lacked a requested field, or the field held a value that is not a number.
    MalformedRow {
        /// Name of the offending field
        field: String,
    },

    /// The run does not exist in the store.
    UnknownRun(RunId),

    /// The household policy does not exist in the store.
    UnknownPolicy(PolicyId),

    /// No household of the run follows the given policy.
    NoHouseholds {
        /// Run that was searched
        run: RunId,

        /// Policy that was searched for
        policy: PolicyId,
    },

    /// A policy chart was requested without selecting a policy.
    PolicyRequired,

    /// A chart could not be drawn.
    Render(String),
}

impl Error {
    /// Wraps any error raised by a row source.
    pub fn source_read<E: std::error::Error + Send + Sync + 'static>(e: E) -> Self {
        Self::SourceRead(Box::new(e))
    }

    /// Creates a [`Error::MalformedRow`] naming the given field.
    pub fn malformed<S: Into<String>>(field: S) -> Self {
        Self::MalformedRow {
            field: field.into(),
        }
    }
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        Self::Storage(value)
    }
}

impl From<std::io::Error> for Error {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Storage(e) => {
                write!(f, "{e}")
            }
            Self::Io(e) => {
                write!(f, "{e}")
            }
            Self::SourceRead(e) => {
                write!(f, "SourceRead: {e}")
            }
            Self::MalformedRow { field } => {
                write!(f, "MalformedRow: missing or invalid field {field:?}")
            }
            Self::UnknownRun(run) => {
                write!(f, "UnknownRun: {run}")
            }
            Self::UnknownPolicy(policy) => {
                write!(f, "UnknownPolicy: {policy}")
            }
            Self::NoHouseholds { run, policy } => {
                write!(f, "NoHouseholds: run {run} has no household with policy {policy}")
            }
            Self::PolicyRequired => {
                write!(f, "PolicyRequired")
            }
            Self::Render(msg) => {
                write!(f, "Render: {msg}")
            }
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Storage(e) => Some(e),
            Self::SourceRead(e) => Some(e.as_ref()),
            _ => None,
        }
    }
}

/// Result helper type
pub type Result<T> = std::result::Result<T, Error>;
