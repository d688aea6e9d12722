//! Error types for the confidential ledger
//!
//! Every variant here is a hard failure for a structurally invalid call:
//! bad addresses, missing authorization, malformed proofs, broken history
//! ordering. Insufficient encrypted balance is never an error; it is a
//! soft outcome carried as an encrypted zero amount, so that control flow
//! leaks nothing about balances.

use thiserror::Error;
use veil_fhe::{Address, FheError, Handle, RequestId};

/// Errors from the checkpoint trace
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TraceError {
    #[error("Unordered insertion: key {new} precedes last checkpoint key {last}")]
    UnorderedInsertion { last: u64, new: u64 },

    #[error("Checkpoint index {index} out of range: length is {len}")]
    IndexOutOfRange { index: usize, len: usize },
}

/// Result type for checkpoint-trace operations
pub type TraceResult<T> = Result<T, TraceError>;

/// Errors from ledger operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TokenError {
    #[error("Invalid receiver: {0:?}")]
    InvalidReceiver(Address),

    #[error("Invalid sender: {0:?}")]
    InvalidSender(Address),

    #[error("Spender {spender:?} has no live operator grant from holder {holder:?}")]
    UnauthorizedSpender { holder: Address, spender: Address },

    #[error("Transfer from {0:?} with no backing balance")]
    ZeroBalance(Address),

    #[error("Account {account:?} is not allowed to use encrypted amount {handle:?}")]
    UnauthorizedUseOfEncryptedAmount { handle: Handle, account: Address },

    #[error("Invalid input proof for handle {0:?}")]
    InvalidProof(Handle),

    #[error("Unknown or already finalized disclosure request {0}")]
    InvalidGatewayRequest(RequestId),

    #[error("Caller {0:?} is not authorized for this entry point")]
    UnauthorizedCaller(Address),

    #[error(transparent)]
    Trace(#[from] TraceError),

    #[error("Coprocessor failure: {0}")]
    Fhe(#[from] FheError),
}

/// Result type for ledger operations
pub type TokenResult<T> = Result<T, TokenError>;
