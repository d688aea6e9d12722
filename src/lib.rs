//! VEIL: Confidential Token Ledger
//!
//! This is the root crate that re-exports all VEIL components for
//! integration testing and provides unified access to the ledger
//! primitives.
//!
//! ## Architecture Overview
//!
//! VEIL keeps account balances and total supply as opaque ciphertext
//! handles manipulated by an external homomorphic coprocessor:
//!
//! - **Opaque Handles**: balances are never plaintext inside the ledger
//! - **Guarded Arithmetic**: add/sub return encrypted success flags, so
//!   insufficient balance is data, not control flow
//! - **Explicit Access Control**: a (handle, reader) relation gates every
//!   plaintext disclosure
//! - **Checkpointed History**: point-in-time balance and supply lookups
//!
//! ## Crate Organization
//!
//! - `veil-fhe`: ciphertext handles, coprocessor and oracle interfaces,
//!   mock and TFHE-rs backends
//! - `veil-acl`: the handle access-control relation
//! - `veil-token`: safe arithmetic, checkpoint traces, and the ledger core

// Re-export all crates for integration testing
pub use veil_acl as acl;
pub use veil_fhe as fhe;
pub use veil_token as token;

/// VEIL protocol version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
