//! Opaque ciphertext handles and account addresses
//!
//! A [`Handle`] references an encrypted value held by the coprocessor. It
//! carries no plaintext, supports equality but no ordering or arithmetic,
//! and is immutable once issued. The all-zero handle is a well-known value
//! denoting "absent or zero" and requires no coprocessor interaction.

use serde::{Deserialize, Serialize};

/// Identifier of a pending public-decryption request
pub type RequestId = u64;

/// Opaque reference to an encrypted value held by the coprocessor
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Handle([u8; 32]);

impl Handle {
    /// The well-known zero handle: an absent or zero value
    pub const ZERO: Handle = Handle([0u8; 32]);

    /// Create from raw bytes
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Get the underlying bytes
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Whether this is the zero handle
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 32]
    }
}

impl std::fmt::Debug for Handle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_zero() {
            write!(f, "Handle(zero)")
        } else {
            write!(f, "Handle({})", hex::encode(&self.0[..8]))
        }
    }
}

/// Account identifier on the ledger
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Address([u8; 32]);

impl Address {
    /// The null account, invalid as a transfer endpoint
    pub const NULL: Address = Address([0u8; 32]);

    /// Create from raw bytes
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Get the underlying bytes
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Whether this is the null account
    pub fn is_null(&self) -> bool {
        self.0 == [0u8; 32]
    }
}

impl std::fmt::Debug for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_null() {
            write!(f, "Address(null)")
        } else {
            write!(f, "Address({})", hex::encode(&self.0[..8]))
        }
    }
}

/// Proof binding an encrypted input handle to an account and a ledger instance
///
/// Produced alongside the input ciphertext by the coprocessor's input
/// tooling; the ledger only forwards it to [`Coprocessor::verify_input`]
/// and never inspects it.
///
/// [`Coprocessor::verify_input`]: crate::Coprocessor::verify_input
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputProof(Vec<u8>);

impl InputProof {
    /// Create from raw proof bytes
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    /// Get the underlying bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl std::fmt::Debug for InputProof {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "InputProof({} bytes)", self.0.len())
    }
}
