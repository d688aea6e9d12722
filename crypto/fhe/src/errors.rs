//! Coprocessor error types

use thiserror::Error;

/// Errors that can occur during coprocessor operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FheError {
    /// Handle does not reference any ciphertext held by the coprocessor
    #[error("Unknown handle: {0}")]
    UnknownHandle(String),

    /// Handle references a ciphertext of the wrong type (uint vs bool)
    #[error("Type mismatch for handle {0}")]
    TypeMismatch(String),

    /// Key generation failed
    #[error("Key generation failed: {0}")]
    KeyGenerationFailed(String),

    /// Encryption failed
    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    /// Decryption failed
    #[error("Decryption failed: {0}")]
    DecryptionFailed(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Decryption oracle failure
    #[error("Oracle request failed: {0}")]
    OracleFailure(String),
}
