//! Error types shared by the whole crate

use thiserror::Error;

/// Result type for crate operations
pub type Result<T> = std::result::Result<T, IgdeError>;

/// Error raised while parsing a trigger expression in strict mode
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("trigger expression error at position {position}: {message}")]
pub struct ExpressionParseError {
    pub message: String,
    /// Character offset into the parsed string
    pub position: usize,
}

impl ExpressionParseError {
    pub fn new(message: impl Into<String>, position: usize) -> Self {
        Self {
            message: message.into(),
            position,
        }
    }
}

/// Main error type
#[derive(Debug, Error)]
pub enum IgdeError {
    /// A required argument is missing or malformed
    #[error("invalid parameter: {0}")]
    InvalidParam(String),

    /// A trigger target with this name is already registered
    #[error("trigger target '{0}' already exists")]
    DuplicateTarget(String),

    #[error(transparent)]
    ExpressionParse(#[from] ExpressionParseError),

    /// World file could not be read or is malformed
    #[error("world file '{path}': {message}")]
    WorldFile { path: String, message: String },

    /// Animator file could not be read or is malformed
    #[error("animator file '{path}': {message}")]
    AnimatorFile { path: String, message: String },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration or game definition could not be parsed
    #[error("config error: {0}")]
    Config(String),
}

impl IgdeError {
    pub fn invalid_param(message: impl Into<String>) -> Self {
        IgdeError::InvalidParam(message.into())
    }

    pub fn world_file(path: impl Into<String>, message: impl Into<String>) -> Self {
        IgdeError::WorldFile {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn animator_file(path: impl Into<String>, message: impl Into<String>) -> Self {
        IgdeError::AnimatorFile {
            path: path.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_display() {
        let err = ExpressionParseError::new("unexpected ')'", 4);
        let s = err.to_string();
        assert!(s.contains("position 4"));
        assert!(s.contains("unexpected ')'"));
    }

    #[test]
    fn test_parse_error_converts() {
        let err: IgdeError = ExpressionParseError::new("bad", 0).into();
        assert!(matches!(err, IgdeError::ExpressionParse(_)));
    }

    #[test]
    fn test_duplicate_display() {
        let err = IgdeError::DuplicateTarget("door".into());
        assert_eq!(err.to_string(), "trigger target 'door' already exists");
    }
}
