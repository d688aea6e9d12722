//! Transfer receiver hooks
//!
//! Contract accounts may expose a hook that is invoked synchronously after
//! a transfer credits them. The hook receives mutable ledger access, so it
//! may itself issue a reverse transfer within the same atomic operation.
//! Rejecting or failing aborts the whole transfer.

use crate::errors::TokenResult;
use crate::ledger::ConfidentialToken;
use veil_fhe::{Address, Handle};

/// Hook exposed by contract accounts receiving confidential transfers
pub trait TransferReceiver {
    /// Called after `amount` has been credited to `to`
    ///
    /// Returning `Ok(false)` or `Err(_)` rejects the transfer; the ledger
    /// then rolls the operation back and fails with `InvalidReceiver`.
    fn on_confidential_transfer_received(
        &mut self,
        token: &mut ConfidentialToken,
        from: Address,
        to: Address,
        amount: Handle,
        data: &[u8],
    ) -> TokenResult<bool>;
}

/// The receiving side of a transfer-with-callback
///
/// Plain accounts trivially accept without any invocation; contract
/// accounts get their hook called.
pub enum Recipient<'a> {
    /// A plain account with no hook
    Account,
    /// A contract account exposing [`TransferReceiver`]
    Contract(&'a mut dyn TransferReceiver),
}

impl std::fmt::Debug for Recipient<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Recipient::Account => write!(f, "Recipient::Account"),
            Recipient::Contract(_) => write!(f, "Recipient::Contract"),
        }
    }
}
