//! VEIL FHE Coprocessor Interface
//!
//! Confidential values never appear in plaintext inside the ledger. Instead,
//! every encrypted value is referenced by an opaque [`Handle`] and all
//! arithmetic is delegated to a homomorphic coprocessor.
//!
//! # Key Features:
//! - Opaque, copyable ciphertext handles with a well-known zero handle
//! - [`Coprocessor`] trait: add/sub/compare/select over handles, plus
//!   encrypted-input verification
//! - [`DecryptionOracle`] trait: asynchronous public-decryption requests
//! - [`MockCoprocessor`]: deterministic plaintext-table backend for tests
//! - [`TfheCoprocessor`]: real TFHE-rs backend
//!
//! # Architecture:
//! The ledger only ever sees handles. The coprocessor owns the ciphertexts,
//! performs the homomorphic computation, and issues a fresh handle per
//! derived value. Handles are immutable once issued; new values always get
//! new handles.

pub mod coprocessor;
pub mod errors;
pub mod handle;
pub mod mock;
pub mod tfhe_backend;

pub use coprocessor::{Coprocessor, DecryptionOracle};
pub use errors::FheError;
pub use handle::{Address, Handle, InputProof, RequestId};
pub use mock::{MockCoprocessor, MockOracle};
pub use tfhe_backend::{FheConfig, LedgerKeys, TfheCoprocessor};

/// Result type for coprocessor operations
pub type FheResult<T> = Result<T, FheError>;
