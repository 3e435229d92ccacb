use backtrace::Backtrace;
use std::error::Error;
use std::fmt::{Debug, Display, Formatter};
use std::result::Result;

use crate::util::{atomic, Atomic};

/// Error kinds for spatial index operations.
///
/// The kinds fall into three classes:
///
/// - **configuration** errors are raised while an index is being defined and
///   can be fixed by correcting the index definition;
/// - **data and storage** errors come from rows or from the backing store;
/// - **fatal** errors ([`ErrorKind::InternalError`]) mean the index and its
///   table have diverged or the index is being misused. They must never be
///   swallowed.
///
/// # Examples
///
/// ```rust
/// use spatial_tree_index::errors::{ErrorKind, IndexError, IndexResult};
///
/// fn example() -> IndexResult<()> {
///     Err(IndexError::new("can only do one column", ErrorKind::UnsupportedIndex))
/// }
///
/// assert!(example().unwrap_err().kind().is_configuration());
/// ```
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum ErrorKind {
    // Configuration Errors
    /// The index definition asks for something a spatial index cannot do
    UnsupportedIndex,
    /// The indexed column does not hold geometry values
    InvalidColumnType,
    /// The index identifier cannot address persistent storage
    InvalidIndexId,
    /// The index has no storage and was not asked to create it
    IndexNotFound,

    // Data Errors
    /// A row value has the wrong type for the indexed column
    InvalidDataType,
    /// The row storage layer does not know the requested row
    RowNotFound,
    /// The operation is not valid in the current state
    InvalidOperation,

    // IO and Storage Errors
    /// Generic IO error
    IOError,
    /// The file was not found
    FileNotFound,
    /// Permission denied for file operation
    PermissionDenied,
    /// File data is corrupted
    FileCorrupted,
    /// Error encoding or decoding data
    EncodingError,
    /// Store has already been closed
    StoreAlreadyClosed,

    /// Internal error (indicates a bug or an index out of sync with its table)
    InternalError,
}

impl ErrorKind {
    /// Returns `true` for errors reported while validating an index definition.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            ErrorKind::UnsupportedIndex
                | ErrorKind::InvalidColumnType
                | ErrorKind::InvalidIndexId
                | ErrorKind::IndexNotFound
        )
    }
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::UnsupportedIndex => write!(f, "Unsupported index"),
            ErrorKind::InvalidColumnType => write!(f, "Invalid column type"),
            ErrorKind::InvalidIndexId => write!(f, "Invalid index id"),
            ErrorKind::IndexNotFound => write!(f, "Index not found"),
            ErrorKind::InvalidDataType => write!(f, "Invalid data type"),
            ErrorKind::RowNotFound => write!(f, "Row not found"),
            ErrorKind::InvalidOperation => write!(f, "Invalid operation"),
            ErrorKind::IOError => write!(f, "IO error"),
            ErrorKind::FileNotFound => write!(f, "File not found"),
            ErrorKind::PermissionDenied => write!(f, "Permission denied"),
            ErrorKind::FileCorrupted => write!(f, "File corrupted"),
            ErrorKind::EncodingError => write!(f, "Encoding error"),
            ErrorKind::StoreAlreadyClosed => write!(f, "Store already closed"),
            ErrorKind::InternalError => write!(f, "Internal error"),
        }
    }
}

/// Error type of the spatial index.
///
/// `IndexError` carries a message, an [`ErrorKind`], an optional cause and
/// the backtrace captured where it was created.
#[derive(Clone)]
pub struct IndexError {
    message: String,
    error_kind: ErrorKind,
    cause: Option<Box<IndexError>>,
    backtrace: Atomic<Backtrace>,
}

impl IndexError {
    /// Creates a new `IndexError` with the specified message and error kind.
    pub fn new(message: &str, error_kind: ErrorKind) -> Self {
        IndexError {
            message: message.to_string(),
            error_kind,
            cause: None,
            backtrace: atomic(Backtrace::new()),
        }
    }

    /// Creates a new `IndexError` wrapping a cause.
    pub fn new_with_cause(message: &str, error_kind: ErrorKind, cause: IndexError) -> Self {
        IndexError {
            message: message.to_string(),
            error_kind,
            cause: Some(Box::new(cause)),
            backtrace: atomic(Backtrace::new()),
        }
    }

    /// Creates a fatal internal error and logs it.
    pub fn internal(message: &str) -> Self {
        log::error!("Internal spatial index error: {}", message);
        IndexError::new(message, ErrorKind::InternalError)
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn kind(&self) -> &ErrorKind {
        &self.error_kind
    }

    pub fn cause(&self) -> Option<&IndexError> {
        self.cause.as_deref()
    }

    /// Returns `true` if this error signals a logic bug or a consistency
    /// violation rather than a recoverable condition.
    pub fn is_fatal(&self) -> bool {
        self.error_kind == ErrorKind::InternalError
    }
}

impl Display for IndexError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl Debug for IndexError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.cause {
            Some(cause) => write!(f, "{}\nCaused by: {:?}", self.message, cause),
            None => write!(f, "{}\n{:?}", self.message, self.backtrace.read()),
        }
    }
}

impl Error for IndexError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match &self.cause {
            Some(cause) => Some(cause.as_ref()),
            None => None,
        }
    }
}

/// Result alias used by every fallible operation of this crate.
pub type IndexResult<T> = Result<T, IndexError>;

impl From<std::io::Error> for IndexError {
    fn from(err: std::io::Error) -> Self {
        let error_kind = match err.kind() {
            std::io::ErrorKind::NotFound => ErrorKind::FileNotFound,
            std::io::ErrorKind::PermissionDenied => ErrorKind::PermissionDenied,
            _ => ErrorKind::IOError,
        };
        IndexError::new(&format!("IO error: {}", err), error_kind)
    }
}
