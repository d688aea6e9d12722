//! Coprocessor and oracle collaborator interfaces
//!
//! The ledger depends on these traits only. Every method is a synchronous
//! round-trip completing inside the caller's atomic unit of work; the one
//! asynchronous boundary is the decryption oracle, which delivers plaintext
//! in a later, independent unit correlated by request id.

use crate::handle::{Address, Handle, InputProof, RequestId};
use crate::FheResult;

/// Homomorphic coprocessor operating on opaque handles
///
/// All arithmetic is 64-bit modular. Comparison results are encrypted
/// booleans, themselves referenced by handles. The ledger never inspects
/// plaintext through this interface.
pub trait Coprocessor: Send + Sync {
    /// Wrapping addition of two encrypted u64 values
    fn add(&self, a: Handle, b: Handle) -> FheResult<Handle>;

    /// Wrapping subtraction of two encrypted u64 values
    fn sub(&self, a: Handle, b: Handle) -> FheResult<Handle>;

    /// Encrypted `a >= b`
    fn ge(&self, a: Handle, b: Handle) -> FheResult<Handle>;

    /// Encrypted `a <= b`
    fn le(&self, a: Handle, b: Handle) -> FheResult<Handle>;

    /// Encrypted conditional: `if cond { a } else { b }`
    ///
    /// `cond` must reference an encrypted boolean. This is the only way the
    /// ledger acts on an encrypted comparison; host-language branching on
    /// secret data is never allowed.
    fn select(&self, cond: Handle, a: Handle, b: Handle) -> FheResult<Handle>;

    /// Trivial encryption of a public u64 constant
    fn trivial_u64(&self, value: u64) -> FheResult<Handle>;

    /// Trivial encryption of a public boolean constant
    fn trivial_bool(&self, value: bool) -> FheResult<Handle>;

    /// Verify that `proof` binds the input `handle` to `account` and the
    /// `ledger` instance it was produced for
    fn verify_input(
        &self,
        handle: Handle,
        proof: &InputProof,
        account: Address,
        ledger: Address,
    ) -> FheResult<bool>;
}

/// Asynchronous public-decryption oracle
///
/// Registers a decryption request and returns its id. The plaintext is
/// delivered later by the oracle calling back into the ledger's
/// `finalize_disclose`; attestation authenticity is the oracle's
/// responsibility.
pub trait DecryptionOracle: Send + Sync {
    /// Register a public-decryption request for `handle`
    fn request_public_decrypt(&self, handle: Handle) -> FheResult<RequestId>;
}

impl std::fmt::Debug for dyn Coprocessor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Coprocessor").finish()
    }
}

impl std::fmt::Debug for dyn DecryptionOracle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DecryptionOracle").finish()
    }
}
