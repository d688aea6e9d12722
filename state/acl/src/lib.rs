//! VEIL Handle Access Manager
//!
//! Owns the permission relation between ciphertext handles and readers.
//! Before any party may request the plaintext of a handle, an explicit
//! grant must exist in this relation. The manager owns only the relation;
//! it never owns or deletes the underlying ciphertexts.
//!
//! # Grant Scopes:
//! - **Persistent**: survives across operations until the ledger is dropped
//! - **Transient**: recorded in a scratch set and cleared when the enclosing
//!   atomic operation completes, on success and failure paths alike
//!
//! All operations are total functions over the relation: unknown handles
//! simply read as not-allowed, grants on the zero handle are no-ops, and
//! the zero handle is always readable (zero is public knowledge).

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use veil_fhe::{Address, Handle};

/// The (handle, reader) access relation with persistent and transient scopes
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct AccessManager {
    persistent: HashMap<Handle, HashSet<Address>>,
    transient: HashMap<Handle, HashSet<Address>>,
}

impl AccessManager {
    /// Create an empty relation
    pub fn new() -> Self {
        Self::default()
    }

    /// Grant `account` persistent permission to request plaintext of `handle`
    ///
    /// No-op on the zero handle.
    pub fn allow(&mut self, handle: Handle, account: Address) {
        if handle.is_zero() {
            return;
        }
        self.persistent.entry(handle).or_default().insert(account);
    }

    /// Grant permission valid only for the current atomic operation
    ///
    /// No-op on the zero handle. Cleared by [`clear_transient`].
    ///
    /// [`clear_transient`]: AccessManager::clear_transient
    pub fn allow_transient(&mut self, handle: Handle, account: Address) {
        if handle.is_zero() {
            return;
        }
        self.transient.entry(handle).or_default().insert(account);
    }

    /// Whether a persistent or still-live transient grant exists
    ///
    /// The zero handle is always allowed. No side effects.
    pub fn is_allowed(&self, handle: Handle, account: Address) -> bool {
        if handle.is_zero() {
            return true;
        }
        self.persistent
            .get(&handle)
            .is_some_and(|set| set.contains(&account))
            || self
                .transient
                .get(&handle)
                .is_some_and(|set| set.contains(&account))
    }

    /// Drop every transient grant
    ///
    /// Called at the end of each atomic operation regardless of the path
    /// taken inside it.
    pub fn clear_transient(&mut self) {
        self.transient.clear();
    }

    /// Number of live transient grants
    pub fn transient_len(&self) -> usize {
        self.transient.values().map(HashSet::len).sum()
    }
}
