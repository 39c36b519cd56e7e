use std::error::Error as StdError;
use std::fmt;
use std::result;

/// A crate private constructor for `Error`.
pub(crate) fn new_error(kind: ErrorKind) -> Error {
    Error(Box::new(kind))
}

/// A type alias for `Result<T, coltok::Error>`.
pub type Result<T> = result::Result<T, Error>;

/// An error that can occur when tokenizing table text or converting a
/// field to a number.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Error(Box<ErrorKind>);

impl Error {
    /// Return the specific type of this error.
    pub fn kind(&self) -> &ErrorKind {
        &self.0
    }

    /// Unwrap this error into its underlying type.
    pub fn into_kind(self) -> ErrorKind {
        *self.0
    }
}

/// The specific type of an error.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ErrorKind {
    /// A header line was requested, but the source ended before the
    /// requested number of skipped lines could be consumed.
    InvalidLine,
    /// A data row produced more included fields than the declared number
    /// of output columns, or referenced a real column index past the end
    /// of the include flags.
    TooManyCols {
        /// The line on which the offending row ends.
        line: u64,
    },
    /// A data row finished with fewer included fields than the declared
    /// number of output columns while filling was disabled.
    NotEnoughCols {
        /// The line on which the offending row ends.
        line: u64,
    },
    /// A numeric conversion failed to parse a complete value.
    Conversion,
    /// A numeric conversion parsed a value out of range.
    Overflow,
}

impl StdError for Error {}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self.0 {
            ErrorKind::InvalidLine => {
                write!(f, "header requested but the source ended while skipping rows")
            }
            ErrorKind::TooManyCols { line } => {
                write!(f, "row on line {} has too many columns", line)
            }
            ErrorKind::NotEnoughCols { line } => {
                write!(f, "row on line {} has too few columns", line)
            }
            ErrorKind::Conversion => {
                write!(f, "field could not be parsed as a number")
            }
            ErrorKind::Overflow => {
                write!(f, "field holds a number out of range")
            }
        }
    }
}
