//! Ledger event journal
//!
//! Every state transition is recorded as an event. Transfer events carry
//! the encrypted actual amount, which may decrypt to zero on insufficient
//! balance; emitting the zero-amount event instead of failing is the
//! confidentiality-preserving substitute for a revert.

use serde::{Deserialize, Serialize};
use veil_fhe::{Address, Handle, RequestId};

/// Events emitted by the confidential ledger
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Event {
    /// Value moved between accounts; `from` is null for mints and `to` is
    /// null for burns. `amount` is the encrypted actually-moved amount.
    Transfer {
        from: Address,
        to: Address,
        amount: Handle,
    },

    /// `operator` may act for `holder` while the current time is before
    /// `until`
    OperatorSet {
        holder: Address,
        operator: Address,
        until: u64,
    },

    /// A public-decryption request was registered with the oracle
    DiscloseRequested {
        request_id: RequestId,
        handle: Handle,
        requester: Address,
    },

    /// The oracle delivered a plaintext for a previously requested handle
    AmountDisclosed { handle: Handle, amount: u64 },
}
