//! VEIL Confidential Token Ledger
//!
//! A fungible token whose balances and total supply exist only as opaque
//! ciphertext handles computed on by an external FHE coprocessor.
//!
//! # Key Properties:
//! - **No plaintext balances**: the ledger stores and moves handles only
//! - **No secret-dependent branching**: arithmetic goes through guarded
//!   add/sub primitives returning encrypted success flags; insufficient
//!   balance transfers zero instead of failing
//! - **Auditable access**: every derived handle gets explicit grants in
//!   the access-control relation before anyone may request its plaintext
//! - **Point-in-time history**: optional checkpoint traces answer past
//!   balance and supply queries for e.g. voting power
//!
//! # Module Organization:
//! - [`safe_math`]: guarded homomorphic add/subtract
//! - [`checkpoints`]: append-only (key, handle) history with binary search
//! - [`ledger`]: the token core (mint/burn/transfer/operators/disclosure)
//! - [`receiver`]: transfer receiver hooks for contract accounts
//! - [`events`]: the emitted event journal

pub mod checkpoints;
pub mod errors;
pub mod events;
pub mod ledger;
pub mod receiver;
pub mod safe_math;

pub use checkpoints::{Checkpoint, Trace};
pub use errors::{TokenError, TokenResult, TraceError, TraceResult};
pub use events::Event;
pub use ledger::{ConfidentialToken, TokenConfig};
pub use receiver::{Recipient, TransferReceiver};
pub use safe_math::{try_decrease, try_increase, Guarded};
