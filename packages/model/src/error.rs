//! Error types for the data model.

use thiserror::Error;

/// Main error type for model construction.
#[derive(Debug, Error)]
pub enum ModelError {
    /// A state symbol was declared twice in the same alphabet.
    #[error("Duplicate state symbol '{symbol}' in alphabet '{alphabet}'")]
    DuplicateStateSymbol { symbol: String, alphabet: String },

    /// A multi-state member refers to a state handle that does not exist yet.
    #[error("Unknown member state handle {handle} in alphabet '{alphabet}'")]
    UnknownMemberState { handle: usize, alphabet: String },

    /// A multi-state was declared with no member states.
    #[error("Multi-state '{symbol}' in alphabet '{alphabet}' has no member states")]
    EmptyMemberSet { symbol: String, alphabet: String },
}

/// Result type alias for model operations.
pub type Result<T> = std::result::Result<T, ModelError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ModelError::DuplicateStateSymbol {
            symbol: "A".to_string(),
            alphabet: "dna".to_string(),
        };
        assert!(err.to_string().contains("'A'"));
        assert!(err.to_string().contains("'dna'"));
    }
}
