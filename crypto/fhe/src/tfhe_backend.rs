//! TFHE-rs backed coprocessor
//!
//! Real homomorphic computation using TFHE-rs. Ciphertexts live in an
//! internal table keyed by handle; the ledger never touches them directly.
//!
//! # Key Management:
//! - ClientKey: encryption/decryption, held by the ledger operator
//! - ServerKey: homomorphic operations, installed globally before use
//!
//! TFHE-rs requires the server key to be set in the executing thread before
//! any homomorphic operator runs; [`TfheCoprocessor::new`] installs it.

use crate::coprocessor::Coprocessor;
use crate::errors::FheError;
use crate::handle::{Address, Handle, InputProof};
use crate::FheResult;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tfhe::prelude::*;
use tfhe::{generate_keys, set_server_key, ConfigBuilder, FheBool, FheUint64};
use tfhe::{ClientKey as TfheClientKey, ServerKey as TfheServerKey};

/// FHE backend configuration
#[derive(Clone, Debug)]
pub struct FheConfig {
    /// Security parameter (bits)
    pub security_bits: u32,
}

impl Default for FheConfig {
    fn default() -> Self {
        Self { security_bits: 128 }
    }
}

/// Key pair backing one ledger instance
///
/// WARNING: key generation is slow (tens of seconds).
#[derive(Clone)]
pub struct LedgerKeys {
    client: TfheClientKey,
    server: TfheServerKey,
}

impl LedgerKeys {
    /// Generate a fresh key pair
    pub fn generate(_config: &FheConfig) -> Self {
        let tfhe_config = ConfigBuilder::default().build();
        let (client, server) = generate_keys(tfhe_config);
        Self { client, server }
    }

    /// Install the server key for homomorphic operations in this thread
    pub fn install_server_key(&self) {
        set_server_key(self.server.clone());
    }

    /// Reference to the client key
    pub fn client(&self) -> &TfheClientKey {
        &self.client
    }
}

impl std::fmt::Debug for LedgerKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LedgerKeys").finish()
    }
}

#[derive(Clone)]
enum Ciphertext {
    U64(FheUint64),
    Bool(FheBool),
}

struct TfheState {
    counter: u64,
    ciphertexts: HashMap<Handle, Ciphertext>,
    inputs: HashMap<Handle, [u8; 32]>,
}

/// Coprocessor backend computing on real TFHE ciphertexts
pub struct TfheCoprocessor {
    keys: LedgerKeys,
    state: Arc<RwLock<TfheState>>,
}

impl TfheCoprocessor {
    /// Create a backend from existing keys and install the server key
    pub fn new(keys: LedgerKeys) -> Self {
        keys.install_server_key();
        Self {
            keys,
            state: Arc::new(RwLock::new(TfheState {
                counter: 0,
                ciphertexts: HashMap::new(),
                inputs: HashMap::new(),
            })),
        }
    }

    fn fresh_handle(state: &mut TfheState) -> Handle {
        state.counter += 1;
        let mut hasher = blake3::Hasher::new();
        hasher.update(b"veil-tfhe");
        hasher.update(&state.counter.to_le_bytes());
        Handle::from_bytes(*hasher.finalize().as_bytes())
    }

    fn uint(&self, handle: Handle) -> FheResult<FheUint64> {
        if handle.is_zero() {
            return Ok(FheUint64::encrypt(0u64, &self.keys.client));
        }
        match self.state.read().ciphertexts.get(&handle) {
            Some(Ciphertext::U64(ct)) => Ok(ct.clone()),
            Some(Ciphertext::Bool(_)) => {
                Err(FheError::TypeMismatch(hex::encode(&handle.as_bytes()[..8])))
            }
            None => Err(FheError::UnknownHandle(hex::encode(
                &handle.as_bytes()[..8],
            ))),
        }
    }

    fn boolean(&self, handle: Handle) -> FheResult<FheBool> {
        match self.state.read().ciphertexts.get(&handle) {
            Some(Ciphertext::Bool(ct)) => Ok(ct.clone()),
            Some(Ciphertext::U64(_)) => {
                Err(FheError::TypeMismatch(hex::encode(&handle.as_bytes()[..8])))
            }
            None => Err(FheError::UnknownHandle(hex::encode(
                &handle.as_bytes()[..8],
            ))),
        }
    }

    fn store_uint(&self, ct: FheUint64) -> Handle {
        let mut state = self.state.write();
        let handle = Self::fresh_handle(&mut state);
        state.ciphertexts.insert(handle, Ciphertext::U64(ct));
        handle
    }

    fn store_bool(&self, ct: FheBool) -> Handle {
        let mut state = self.state.write();
        let handle = Self::fresh_handle(&mut state);
        state.ciphertexts.insert(handle, Ciphertext::Bool(ct));
        handle
    }

    /// Encrypt a value for internal staging
    pub fn encrypt(&self, value: u64) -> Handle {
        self.store_uint(FheUint64::encrypt(value, &self.keys.client))
    }

    /// Encrypt a value as an external input bound to `(account, ledger)`
    pub fn encrypt_input(
        &self,
        value: u64,
        account: Address,
        ledger: Address,
    ) -> (Handle, InputProof) {
        let handle = self.encrypt(value);
        let digest = Self::input_digest(handle, account, ledger);
        self.state.write().inputs.insert(handle, digest);
        (handle, InputProof::from_bytes(digest.to_vec()))
    }

    /// Decrypt a u64 handle with the client key
    pub fn decrypt_u64(&self, handle: Handle) -> FheResult<u64> {
        if handle.is_zero() {
            return Ok(0);
        }
        let ct = self.uint(handle)?;
        Ok(ct.decrypt(&self.keys.client))
    }

    /// Decrypt an encrypted-boolean handle with the client key
    pub fn decrypt_bool(&self, handle: Handle) -> FheResult<bool> {
        let ct = self.boolean(handle)?;
        Ok(ct.decrypt(&self.keys.client))
    }

    fn input_digest(handle: Handle, account: Address, ledger: Address) -> [u8; 32] {
        let mut hasher = blake3::Hasher::new();
        hasher.update(b"veil-input");
        hasher.update(handle.as_bytes());
        hasher.update(account.as_bytes());
        hasher.update(ledger.as_bytes());
        *hasher.finalize().as_bytes()
    }
}

impl std::fmt::Debug for TfheCoprocessor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TfheCoprocessor")
            .field("ciphertexts", &self.state.read().ciphertexts.len())
            .finish()
    }
}

impl Coprocessor for TfheCoprocessor {
    fn add(&self, a: Handle, b: Handle) -> FheResult<Handle> {
        let (a, b) = (self.uint(a)?, self.uint(b)?);
        Ok(self.store_uint(&a + &b))
    }

    fn sub(&self, a: Handle, b: Handle) -> FheResult<Handle> {
        let (a, b) = (self.uint(a)?, self.uint(b)?);
        Ok(self.store_uint(&a - &b))
    }

    fn ge(&self, a: Handle, b: Handle) -> FheResult<Handle> {
        let (a, b) = (self.uint(a)?, self.uint(b)?);
        Ok(self.store_bool(a.ge(&b)))
    }

    fn le(&self, a: Handle, b: Handle) -> FheResult<Handle> {
        let (a, b) = (self.uint(a)?, self.uint(b)?);
        Ok(self.store_bool(a.le(&b)))
    }

    fn select(&self, cond: Handle, a: Handle, b: Handle) -> FheResult<Handle> {
        let cond = self.boolean(cond)?;
        let (a, b) = (self.uint(a)?, self.uint(b)?);
        Ok(self.store_uint(cond.if_then_else(&a, &b)))
    }

    fn trivial_u64(&self, value: u64) -> FheResult<Handle> {
        // Trivial in the protocol sense: the value is public knowledge.
        Ok(self.encrypt(value))
    }

    fn trivial_bool(&self, value: bool) -> FheResult<Handle> {
        let zero = FheUint64::encrypt(0u64, &self.keys.client);
        let ct = if value { zero.le(&zero) } else { zero.gt(&zero) };
        Ok(self.store_bool(ct))
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
        let expected = Self::input_digest(handle, account, ledger);
        Ok(*stored == expected && proof.as_bytes() == expected.as_slice())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Keygen takes tens of seconds, so everything shares one backend.
    #[test]
    fn test_tfhe_backend_operations() {
        let keys = LedgerKeys::generate(&FheConfig::default());
        let cop = TfheCoprocessor::new(keys);

        let a = cop.encrypt(100);
        let b = cop.encrypt(30);

        let sum = cop.add(a, b).unwrap();
        assert_eq!(cop.decrypt_u64(sum).unwrap(), 130);

        let diff = cop.sub(a, b).unwrap();
        assert_eq!(cop.decrypt_u64(diff).unwrap(), 70);

        let le = cop.le(b, a).unwrap();
        assert!(cop.decrypt_bool(le).unwrap());

        let picked = cop.select(le, a, b).unwrap();
        assert_eq!(cop.decrypt_u64(picked).unwrap(), 100);

        // Wrapping subtraction, as the safe-math layer relies on
        let wrapped = cop.sub(b, a).unwrap();
        assert_eq!(cop.decrypt_u64(wrapped).unwrap(), 0u64.wrapping_sub(70));

        // Zero handle reads as plaintext zero
        let with_zero = cop.add(a, Handle::ZERO).unwrap();
        assert_eq!(cop.decrypt_u64(with_zero).unwrap(), 100);

        // Trivial booleans decrypt to their constant
        let t = cop.trivial_bool(true).unwrap();
        let f = cop.trivial_bool(false).unwrap();
        assert!(cop.decrypt_bool(t).unwrap());
        assert!(!cop.decrypt_bool(f).unwrap());

        // Input binding
        let alice = Address::from_bytes([1u8; 32]);
        let ledger = Address::from_bytes([0xee; 32]);
        let (input, proof) = cop.encrypt_input(5, alice, ledger);
        assert!(cop.verify_input(input, &proof, alice, ledger).unwrap());
        assert!(!cop
            .verify_input(input, &proof, Address::from_bytes([2u8; 32]), ledger)
            .unwrap());
    }
}
