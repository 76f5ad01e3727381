//! Runtime errors
//!
//! Every failure is returned as a value. [`ErrorKind::category`] folds the
//! detailed variants onto the four classes generated code distinguishes.

use crate::kind::ElementKind;
use std::fmt;

pub type Result<T> = std::result::Result<T, NativeError>;

/// Coarse error class visible to generated code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ErrorCategory {
    Allocation = 1,
    Conversion = 2,
    Index = 3,
    Shape = 4,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// Native memory could not be obtained
    Allocation { entity: &'static str, bytes: usize },
    /// Host value or type incompatible with the requested representation
    Conversion { expected: String, found: String },
    /// The host raised while unwrapping; its own error state is pending
    HostError { expected: &'static str },
    /// Two containers or an element and a container disagree on kind
    KindMismatch { expected: ElementKind, found: ElementKind },
    /// Index outside container bounds
    Index { index: usize, len: usize },
    /// Rank or extent mismatch
    Shape { expected: String, found: String },
}

impl ErrorKind {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Allocation { .. } => ErrorCategory::Allocation,
            Self::Conversion { .. } | Self::HostError { .. } | Self::KindMismatch { .. } => {
                ErrorCategory::Conversion
            }
            Self::Index { .. } => ErrorCategory::Index,
            Self::Shape { .. } => ErrorCategory::Shape,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Allocation { entity, bytes } => {
                write!(f, "Failed to allocate {} bytes for {}", bytes, entity)
            }
            Self::Conversion { expected, found } => {
                write!(f, "Cannot convert {} to {}", found, expected)
            }
            Self::HostError { expected } => {
                write!(f, "Host raised while converting to {}", expected)
            }
            Self::KindMismatch { expected, found } => {
                write!(f, "Element kind mismatch: expected {}, found {}", expected, found)
            }
            Self::Index { index, len } => {
                write!(f, "Index {} out of range for length {}", index, len)
            }
            Self::Shape { expected, found } => {
                write!(f, "Shape mismatch: expected {}, found {}", expected, found)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NativeError {
    pub kind: ErrorKind,
    /// Name of the generated-code argument being processed, if known
    pub argument: Option<String>,
}

impl NativeError {
    pub fn new(kind: ErrorKind) -> Self {
        Self { kind, argument: None }
    }

    pub fn with_argument(mut self, argument: impl Into<String>) -> Self {
        self.argument = Some(argument.into());
        self
    }

    pub fn category(&self) -> ErrorCategory {
        self.kind.category()
    }

    pub fn allocation(entity: &'static str, bytes: usize) -> Self {
        Self::new(ErrorKind::Allocation { entity, bytes })
    }

    pub fn conversion(expected: impl Into<String>, found: impl Into<String>) -> Self {
        Self::new(ErrorKind::Conversion {
            expected: expected.into(),
            found: found.into(),
        })
    }

    pub fn host_error(expected: &'static str) -> Self {
        Self::new(ErrorKind::HostError { expected })
    }

    pub fn kind_mismatch(expected: ElementKind, found: ElementKind) -> Self {
        Self::new(ErrorKind::KindMismatch { expected, found })
    }

    pub fn index(index: usize, len: usize) -> Self {
        Self::new(ErrorKind::Index { index, len })
    }

    pub fn shape(expected: impl Into<String>, found: impl Into<String>) -> Self {
        Self::new(ErrorKind::Shape {
            expected: expected.into(),
            found: found.into(),
        })
    }

    /// Whether the host already carries an error describing this failure
    pub fn is_host_error(&self) -> bool {
        matches!(self.kind, ErrorKind::HostError { .. })
    }
}

impl fmt::Display for NativeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.argument {
            Some(arg) => write!(f, "argument '{}': {}", arg, self.kind),
            None => write!(f, "{}", self.kind),
        }
    }
}

impl std::error::Error for NativeError {}

impl From<ErrorKind> for NativeError {
    fn from(kind: ErrorKind) -> Self {
        Self::new(kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_categories() {
        assert_eq!(NativeError::allocation("buffer", 64).category(), ErrorCategory::Allocation);
        assert_eq!(NativeError::host_error("int64").category(), ErrorCategory::Conversion);
        assert_eq!(
            NativeError::kind_mismatch(ElementKind::Int32, ElementKind::Float64).category(),
            ErrorCategory::Conversion
        );
        assert_eq!(NativeError::index(4, 2).category(), ErrorCategory::Index);
        assert_eq!(NativeError::shape("rank 2", "rank 1").category(), ErrorCategory::Shape);
    }

    #[test]
    fn test_display_names_argument() {
        let err = NativeError::shape("rank 2", "rank 3").with_argument("x");
        assert_eq!(err.to_string(), "argument 'x': Shape mismatch: expected rank 2, found rank 3");

        let err = NativeError::conversion("bool", "int");
        assert_eq!(err.to_string(), "Cannot convert int to bool");
    }
}
