use crate::{
    codec::{json::ParseError, wire::WireError},
    compile::CompileError,
    validate::ValidationErrors,
};
use std::fmt;
use thiserror::Error as ThisError;

///
/// Error
///
/// Crate-level error joining every subsystem failure, with a stable
/// class/origin classification for callers that route on it.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum Error {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Wire(#[from] WireError),

    #[error(transparent)]
    Compile(#[from] CompileError),

    #[error(transparent)]
    Validation(#[from] ValidationErrors),
}

impl Error {
    #[must_use]
    pub const fn origin(&self) -> ErrorOrigin {
        match self {
            Self::Parse(_) => ErrorOrigin::Declarative,
            Self::Wire(_) => ErrorOrigin::Wire,
            Self::Compile(_) => ErrorOrigin::Compile,
            Self::Validation(_) => ErrorOrigin::Validate,
        }
    }

    #[must_use]
    pub const fn class(&self) -> ErrorClass {
        match self {
            Self::Parse(ParseError::UnknownQuery { .. })
            | Self::Wire(WireError::UnknownNodeType { .. }) => ErrorClass::Unsupported,
            Self::Wire(WireError::TrailingBytes { .. }) | Self::Parse(_) | Self::Validation(_) => {
                ErrorClass::InvalidInput
            }
            Self::Wire(_) => ErrorClass::Corruption,
            Self::Compile(CompileError::UnmappedField { .. }) => ErrorClass::Unmapped,
            Self::Compile(CompileError::NotQueryable { .. }) => ErrorClass::Unsupported,
            Self::Compile(_) => ErrorClass::InvalidInput,
        }
    }

    /// Whether the failing stream or document must be abandoned.
    ///
    /// Only wire corruption and unknown wire type ids qualify: the reader
    /// position is meaningless after either.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        match self {
            Self::Wire(err) => err.is_fatal(),
            _ => false,
        }
    }

    #[must_use]
    pub fn display_with_class(&self) -> String {
        format!("{}:{}: {}", self.origin(), self.class(), self)
    }
}

///
/// ErrorClass
///

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ErrorClass {
    InvalidInput,
    Corruption,
    Unsupported,
    Unmapped,
}

impl fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::InvalidInput => "invalid_input",
            Self::Corruption => "corruption",
            Self::Unsupported => "unsupported",
            Self::Unmapped => "unmapped",
        };
        write!(f, "{label}")
    }
}

///
/// ErrorOrigin
///

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ErrorOrigin {
    Declarative,
    Wire,
    Compile,
    Validate,
}

impl fmt::Display for ErrorOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Declarative => "declarative",
            Self::Wire => "wire",
            Self::Compile => "compile",
            Self::Validate => "validate",
        };
        write!(f, "{label}")
    }
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_wire_type_is_fatal_and_unsupported() {
        let err = Error::from(WireError::UnknownNodeType {
            type_id: "fuzzy".to_string(),
        });

        assert!(err.is_fatal());
        assert_eq!(err.class(), ErrorClass::Unsupported);
        assert_eq!(err.origin(), ErrorOrigin::Wire);
    }

    #[test]
    fn trailing_bytes_are_recoverable_input_errors() {
        let err = Error::from(WireError::TrailingBytes { remaining: 2 });

        assert!(!err.is_fatal());
        assert_eq!(err.class(), ErrorClass::InvalidInput);
    }

    #[test]
    fn compile_errors_classify_by_cause() {
        let unmapped = Error::from(CompileError::UnmappedField {
            field: "nope".to_string(),
        });
        assert_eq!(unmapped.class(), ErrorClass::Unmapped);
        assert!(!unmapped.is_fatal());
        assert_eq!(
            unmapped.display_with_class(),
            "compile:unmapped: field 'nope' is not mapped in the active types"
        );
    }
}
