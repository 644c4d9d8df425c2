use thiserror::Error;

/// Main error type for Tabrag
#[derive(Error, Debug)]
pub enum TabragError {
    /// File system I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Archive container errors (unreadable zip, missing member)
    #[error("Archive error: {0}")]
    Archive(String),

    /// Tabular parse errors (chunk-level read failures)
    #[error("Parse error: {0}")]
    Parse(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Embedding service errors
    #[error("Embedding error: {0}")]
    Embedding(String),

    /// Vector index errors (dimension mismatch, corrupt serialization)
    #[error("Index error: {0}")]
    Index(String),

    /// Text generation service errors
    #[error("Generation error: {0}")]
    Generation(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Convenient Result type using TabragError
pub type Result<T> = std::result::Result<T, TabragError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = TabragError::Config("Test error".to_string());
        assert!(err.to_string().contains("Configuration error"));
        assert!(err.to_string().contains("Test error"));
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let tabrag_err: TabragError = io_err.into();
        assert!(matches!(tabrag_err, TabragError::Io(_)));
    }

    #[test]
    fn test_index_error_message() {
        let err = TabragError::Index("expected dimension 384, got 512".to_string());
        assert!(err.to_string().contains("dimension 384"));
    }
}
