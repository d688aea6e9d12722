//! Deterministic plaintext-table coprocessor for tests
//!
//! Implements the [`Coprocessor`] contract over an in-memory table of
//! plaintext values. Handle ids are derived with blake3 from an instance
//! seed and a counter, so runs are reproducible. The mock also exposes the
//! encryption/decryption surface that the real input tooling and
//! reencryption gateway would provide, which tests use to stage inputs and
//! check outcomes.

use crate::coprocessor::{Coprocessor, DecryptionOracle};
use crate::errors::FheError;
use crate::handle::{Address, Handle, InputProof, RequestId};
use crate::FheResult;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug, Default)]
struct MockState {
    seed: [u8; 32],
    counter: u64,
    uints: HashMap<Handle, u64>,
    bools: HashMap<Handle, bool>,
    /// Input binding digests, keyed by input handle
    inputs: HashMap<Handle, [u8; 32]>,
}

impl MockState {
    fn fresh_handle(&mut self, domain: &[u8]) -> Handle {
        self.counter += 1;
        let mut hasher = blake3::Hasher::new();
        hasher.update(&self.seed);
        hasher.update(domain);
        hasher.update(&self.counter.to_le_bytes());
        Handle::from_bytes(*hasher.finalize().as_bytes())
    }

    /// The zero handle reads as plaintext zero without a table entry
    fn uint(&self, handle: Handle) -> FheResult<u64> {
        if handle.is_zero() {
            return Ok(0);
        }
        self.uints
            .get(&handle)
            .copied()
            .ok_or_else(|| FheError::UnknownHandle(hex::encode(&handle.as_bytes()[..8])))
    }

    fn boolean(&self, handle: Handle) -> FheResult<bool> {
        self.bools
            .get(&handle)
            .copied()
            .ok_or_else(|| FheError::UnknownHandle(hex::encode(&handle.as_bytes()[..8])))
    }

    fn store_uint(&mut self, value: u64) -> Handle {
        let handle = self.fresh_handle(b"uint");
        self.uints.insert(handle, value);
        handle
    }

    fn store_bool(&mut self, value: bool) -> Handle {
        let handle = self.fresh_handle(b"bool");
        self.bools.insert(handle, value);
        handle
    }
}

fn input_digest(handle: Handle, account: Address, ledger: Address) -> [u8; 32] {
    let mut hasher = blake3::Hasher::new();
    hasher.update(b"veil-input");
    hasher.update(handle.as_bytes());
    hasher.update(account.as_bytes());
    hasher.update(ledger.as_bytes());
    *hasher.finalize().as_bytes()
}

/// Plaintext-backed coprocessor for deterministic tests
///
/// Cloning shares the underlying table, so a [`MockOracle`] built from a
/// clone decrypts the same handles.
#[derive(Clone, Debug, Default)]
pub struct MockCoprocessor {
    state: Arc<RwLock<MockState>>,
}

impl MockCoprocessor {
    /// Create a mock with an all-zero seed
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mock with an explicit seed for handle derivation
    pub fn with_seed(seed: [u8; 32]) -> Self {
        Self {
            state: Arc::new(RwLock::new(MockState {
                seed,
                ..MockState::default()
            })),
        }
    }

    /// Encrypt a value without input binding (internal staging)
    pub fn encrypt(&self, value: u64) -> Handle {
        self.state.write().store_uint(value)
    }

    /// Encrypt a value as an external input bound to `(account, ledger)`
    ///
    /// Mirrors the input tooling of the real coprocessor: the returned proof
    /// only verifies for exactly this handle, account, and ledger instance.
    pub fn encrypt_input(
        &self,
        value: u64,
        account: Address,
        ledger: Address,
    ) -> (Handle, InputProof) {
        let mut state = self.state.write();
        let handle = state.store_uint(value);
        let digest = input_digest(handle, account, ledger);
        state.inputs.insert(handle, digest);
        (handle, InputProof::from_bytes(digest.to_vec()))
    }

    /// Plaintext behind a u64 handle (test-only reencryption stand-in)
    pub fn plaintext_of(&self, handle: Handle) -> FheResult<u64> {
        self.state.read().uint(handle)
    }

    /// Plaintext behind an encrypted-boolean handle
    pub fn bool_of(&self, handle: Handle) -> FheResult<bool> {
        self.state.read().boolean(handle)
    }
}

impl Coprocessor for MockCoprocessor {
    fn add(&self, a: Handle, b: Handle) -> FheResult<Handle> {
        let mut state = self.state.write();
        let sum = state.uint(a)?.wrapping_add(state.uint(b)?);
        Ok(state.store_uint(sum))
    }

    fn sub(&self, a: Handle, b: Handle) -> FheResult<Handle> {
        let mut state = self.state.write();
        let diff = state.uint(a)?.wrapping_sub(state.uint(b)?);
        Ok(state.store_uint(diff))
    }

    fn ge(&self, a: Handle, b: Handle) -> FheResult<Handle> {
        let mut state = self.state.write();
        let result = state.uint(a)? >= state.uint(b)?;
        Ok(state.store_bool(result))
    }

    fn le(&self, a: Handle, b: Handle) -> FheResult<Handle> {
        let mut state = self.state.write();
        let result = state.uint(a)? <= state.uint(b)?;
        Ok(state.store_bool(result))
    }

    fn select(&self, cond: Handle, a: Handle, b: Handle) -> FheResult<Handle> {
        let mut state = self.state.write();
        let chosen = if state.boolean(cond)? {
            state.uint(a)?
        } else {
            state.uint(b)?
        };
        Ok(state.store_uint(chosen))
    }

    fn trivial_u64(&self, value: u64) -> FheResult<Handle> {
        Ok(self.state.write().store_uint(value))
    }

    fn trivial_bool(&self, value: bool) -> FheResult<Handle> {
        Ok(self.state.write().store_bool(value))
    }

    fn verify_input(
        &self,
        handle: Handle,
        proof: &InputProof,
        account: Address,
        ledger: Address,
    ) -> FheResult<bool> {
        let state = self.state.read();
        let Some(stored) = state.inputs.get(&handle) else {
            return Ok(false);
        };
        let expected = input_digest(handle, account, ledger);
        Ok(*stored == expected && proof.as_bytes() == expected.as_slice())
    }
}

/// Mock decryption oracle sharing the mock coprocessor's table
///
/// Hands out monotonically increasing request ids and records the handle
/// behind each, so tests can play the oracle and deliver the plaintext to
/// the ledger's finalize entry point.
#[derive(Clone, Debug)]
pub struct MockOracle {
    coprocessor: MockCoprocessor,
    requests: Arc<RwLock<HashMap<RequestId, Handle>>>,
    next_id: Arc<RwLock<RequestId>>,
}

impl MockOracle {
    /// Create an oracle over the given mock coprocessor
    pub fn new(coprocessor: MockCoprocessor) -> Self {
        Self {
            coprocessor,
            requests: Arc::new(RwLock::new(HashMap::new())),
            next_id: Arc::new(RwLock::new(0)),
        }
    }

    /// The handle behind a registered request, if any
    pub fn pending_handle(&self, request_id: RequestId) -> Option<Handle> {
        self.requests.read().get(&request_id).copied()
    }

    /// Decrypt the value behind a registered request
    ///
    /// This is what the real oracle would deliver in its callback.
    pub fn decrypt_pending(&self, request_id: RequestId) -> FheResult<u64> {
        let handle = self
            .pending_handle(request_id)
            .ok_or_else(|| FheError::OracleFailure(format!("no request {request_id}")))?;
        self.coprocessor.plaintext_of(handle)
    }
}

impl DecryptionOracle for MockOracle {
    fn request_public_decrypt(&self, handle: Handle) -> FheResult<RequestId> {
        let mut next = self.next_id.write();
        *next += 1;
        let id = *next;
        self.requests.write().insert(id, handle);
        Ok(id)
    }
}
