//! Confidential token ledger
//!
//! Balances and total supply are opaque ciphertext handles; every mutation
//! goes through the safe-arithmetic guards and every produced handle gets
//! explicit access grants before anyone may request its plaintext.
//!
//! # Design invariants:
//! - Balances and supply are replaced, never mutated in place
//! - Insufficient balance is a soft outcome: the emitted amount encrypts
//!   zero and the call succeeds, so control flow never leaks comparisons
//! - Transient access grants are cleared when an operation returns, on
//!   success and error paths alike
//! - Disclosure requests are single-use and finalized only by the oracle

use crate::checkpoints::Trace;
use crate::errors::{TokenError, TokenResult};
use crate::events::Event;
use crate::receiver::Recipient;
use crate::safe_math::{try_decrease, try_increase};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;
use veil_acl::AccessManager;
use veil_fhe::{Address, Coprocessor, DecryptionOracle, Handle, InputProof, RequestId};

/// Static token metadata and feature switches
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TokenConfig {
    /// Token name
    pub name: String,
    /// Token symbol
    pub symbol: String,
    /// Metadata URI
    pub token_uri: String,
    /// Record per-account and supply history checkpoints
    pub track_history: bool,
}

impl TokenConfig {
    /// Create a configuration with history tracking disabled
    pub fn new(
        name: impl Into<String>,
        symbol: impl Into<String>,
        token_uri: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            symbol: symbol.into(),
            token_uri: token_uri.into(),
            track_history: false,
        }
    }

    /// Enable checkpointed balance/supply history
    pub fn with_history(mut self) -> Self {
        self.track_history = true;
        self
    }
}

/// A disclosure request awaiting the oracle's callback
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct PendingDisclosure {
    handle: Handle,
    requester: Address,
}

/// Checkpointed history of balances and supply
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
struct History {
    balances: HashMap<Address, Trace>,
    supply: Trace,
}

/// Rollback point for the receiver-hook abort path
///
/// Covers everything a re-entrant hook can mutate before rejecting,
/// operator grants and pending disclosure requests included.
struct Snapshot {
    balances: HashMap<Address, Handle>,
    total_supply: Handle,
    operators: HashMap<(Address, Address), u64>,
    pending: HashMap<RequestId, PendingDisclosure>,
    events_len: usize,
    history: Option<History>,
}

/// The confidential token ledger
pub struct ConfidentialToken {
    /// Address identifying this ledger instance (input proofs bind to it)
    address: Address,
    config: TokenConfig,
    coprocessor: Arc<dyn Coprocessor>,
    oracle: Arc<dyn DecryptionOracle>,
    /// The only caller accepted by [`finalize_disclose`]
    ///
    /// [`finalize_disclose`]: ConfidentialToken::finalize_disclose
    oracle_caller: Address,
    acl: AccessManager,
    balances: HashMap<Address, Handle>,
    total_supply: Handle,
    /// (holder, operator) -> expiry; live while current time < expiry
    operators: HashMap<(Address, Address), u64>,
    pending: HashMap<RequestId, PendingDisclosure>,
    events: Vec<Event>,
    history: Option<History>,
    /// Re-entrancy depth; transient grants clear when the outermost
    /// operation returns
    op_depth: u32,
}

impl ConfidentialToken {
    /// Create an empty ledger
    pub fn new(
        address: Address,
        config: TokenConfig,
        coprocessor: Arc<dyn Coprocessor>,
        oracle: Arc<dyn DecryptionOracle>,
        oracle_caller: Address,
    ) -> Self {
        let history = config.track_history.then(History::default);
        Self {
            address,
            config,
            coprocessor,
            oracle,
            oracle_caller,
            acl: AccessManager::new(),
            balances: HashMap::new(),
            total_supply: Handle::ZERO,
            operators: HashMap::new(),
            pending: HashMap::new(),
            events: Vec::new(),
            history,
            op_depth: 0,
        }
    }

    /// Run `f` as (part of) one atomic operation
    ///
    /// Transient grants live until the outermost operation completes,
    /// whichever path it takes; a hook re-entering the ledger stays inside
    /// the same scope.
    fn scoped<T>(&mut self, f: impl FnOnce(&mut Self) -> TokenResult<T>) -> TokenResult<T> {
        self.op_depth += 1;
        let outcome = f(self);
        self.op_depth -= 1;
        if self.op_depth == 0 {
            self.acl.clear_transient();
        }
        outcome
    }

    /// Address of this ledger instance
    pub fn address(&self) -> Address {
        self.address
    }

    /// Token name
    pub fn name(&self) -> &str {
        &self.config.name
    }

    /// Token symbol
    pub fn symbol(&self) -> &str {
        &self.config.symbol
    }

    /// Metadata URI
    pub fn token_uri(&self) -> &str {
        &self.config.token_uri
    }

    /// Display decimals; fixed at 9, since amounts are 64-bit encrypted
    /// integers and never rescaled on-ledger
    pub fn decimals(&self) -> u8 {
        9
    }

    /// Current balance handle of `account` (zero handle if never credited)
    pub fn balance_of(&self, account: Address) -> Handle {
        self.balances.get(&account).copied().unwrap_or(Handle::ZERO)
    }

    /// Current total-supply handle
    pub fn total_supply(&self) -> Handle {
        self.total_supply
    }

    /// Expiry of the (holder, operator) grant, if one was ever set
    pub fn operator_expiry(&self, holder: Address, operator: Address) -> Option<u64> {
        self.operators.get(&(holder, operator)).copied()
    }

    /// Whether `operator` may currently act for `holder`
    pub fn is_operator(&self, holder: Address, operator: Address, now: u64) -> bool {
        self.operators
            .get(&(holder, operator))
            .is_some_and(|&until| now < until)
    }

    /// Read access to the handle access relation
    pub fn acl(&self) -> &AccessManager {
        &self.acl
    }

    /// Events emitted so far, oldest first
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// Balance of `account` as of `key`, from the checkpoint history
    ///
    /// Zero handle when history tracking is disabled or no checkpoint
    /// precedes `key`.
    pub fn balance_at(&self, account: Address, key: u64) -> Handle {
        self.history
            .as_ref()
            .and_then(|history| history.balances.get(&account))
            .map_or(Handle::ZERO, |trace| trace.upper_lookup_recent(key))
    }

    /// Total supply as of `key`, from the checkpoint history
    pub fn total_supply_at(&self, key: u64) -> Handle {
        self.history
            .as_ref()
            .map_or(Handle::ZERO, |history| {
                history.supply.upper_lookup_recent(key)
            })
    }

    /// Create new tokens for `to`
    ///
    /// `proof` must bind `amount` to the caller and this ledger instance.
    /// The overflow flag of the supply update is deliberately ignored: mint
    /// amounts are integrator-controlled and saturate silently rather than
    /// failing.
    pub fn mint(
        &mut self,
        caller: Address,
        now: u64,
        to: Address,
        amount: Handle,
        proof: &InputProof,
    ) -> TokenResult<Handle> {
        self.scoped(|token| token.mint_inner(caller, now, to, amount, proof))
    }

    fn mint_inner(
        &mut self,
        caller: Address,
        now: u64,
        to: Address,
        amount: Handle,
        proof: &InputProof,
    ) -> TokenResult<Handle> {
        if to.is_null() {
            return Err(TokenError::InvalidReceiver(to));
        }
        self.check_input(amount, proof, caller)?;

        let credited = try_increase(&*self.coprocessor, self.balance_of(to), amount)?;
        let supply = try_increase(&*self.coprocessor, self.total_supply, amount)?;

        self.record_balance(to, credited.result, now)?;
        self.record_supply(supply.result, now)?;

        self.balances.insert(to, credited.result);
        self.total_supply = supply.result;

        self.acl.allow(amount, to);
        self.acl.allow(amount, self.address);
        self.acl.allow(credited.result, to);
        self.acl.allow(credited.result, self.address);
        self.acl.allow(supply.result, self.address);

        self.events.push(Event::Transfer {
            from: Address::NULL,
            to,
            amount,
        });
        debug!(?to, "minted confidential amount");
        Ok(amount)
    }

    /// Destroy tokens held by `from`
    ///
    /// If the balance is insufficient, zero is burned: the returned handle
    /// encrypts zero and the call still succeeds.
    pub fn burn(
        &mut self,
        caller: Address,
        now: u64,
        from: Address,
        amount: Handle,
        proof: &InputProof,
    ) -> TokenResult<Handle> {
        self.scoped(|token| token.burn_inner(caller, now, from, amount, proof))
    }

    fn burn_inner(
        &mut self,
        caller: Address,
        now: u64,
        from: Address,
        amount: Handle,
        proof: &InputProof,
    ) -> TokenResult<Handle> {
        if from.is_null() {
            return Err(TokenError::InvalidSender(from));
        }
        self.check_input(amount, proof, caller)?;

        let debited = try_decrease(&*self.coprocessor, self.balance_of(from), amount)?;
        let zero = self.coprocessor.trivial_u64(0)?;
        let burned = self.coprocessor.select(debited.success, amount, zero)?;
        let supply = try_decrease(&*self.coprocessor, self.total_supply, burned)?;

        self.record_balance(from, debited.result, now)?;
        self.record_supply(supply.result, now)?;

        self.balances.insert(from, debited.result);
        self.total_supply = supply.result;

        self.acl.allow(burned, from);
        self.acl.allow(burned, self.address);
        self.acl.allow(debited.result, from);
        self.acl.allow(debited.result, self.address);
        self.acl.allow(supply.result, self.address);

        self.events.push(Event::Transfer {
            from,
            to: Address::NULL,
            amount: burned,
        });
        debug!(?from, "burned confidential amount");
        Ok(burned)
    }

    /// Move tokens from `from` to `to`
    ///
    /// The caller must be `from` or a live operator of `from`. With a
    /// proof, `amount` is verified as an external input bound to the
    /// caller; without one, the caller must hold an access grant on
    /// `amount` and `from` must have a backing balance.
    ///
    /// Returns the encrypted actually-transferred amount, which decrypts to
    /// zero when the balance was insufficient; the emitted event carries
    /// the same handle.
    pub fn transfer(
        &mut self,
        caller: Address,
        now: u64,
        from: Address,
        to: Address,
        amount: Handle,
        proof: Option<&InputProof>,
    ) -> TokenResult<Handle> {
        self.scoped(|token| token.transfer_inner(caller, now, from, to, amount, proof))
    }

    /// [`transfer`], then invoke the recipient's hook if it is a contract
    ///
    /// The hook runs after both balances are updated and may re-enter the
    /// ledger (e.g. to transfer back). A rejecting or failing hook undoes
    /// the whole operation and fails with `InvalidReceiver`.
    ///
    /// [`transfer`]: ConfidentialToken::transfer
    #[allow(clippy::too_many_arguments)]
    pub fn transfer_and_call(
        &mut self,
        caller: Address,
        now: u64,
        from: Address,
        to: Address,
        amount: Handle,
        proof: Option<&InputProof>,
        data: &[u8],
        recipient: Recipient<'_>,
    ) -> TokenResult<Handle> {
        self.scoped(|token| {
            token.transfer_and_call_inner(caller, now, from, to, amount, proof, data, recipient)
        })
    }

    #[allow(clippy::too_many_arguments)]
    fn transfer_and_call_inner(
        &mut self,
        caller: Address,
        now: u64,
        from: Address,
        to: Address,
        amount: Handle,
        proof: Option<&InputProof>,
        data: &[u8],
        recipient: Recipient<'_>,
    ) -> TokenResult<Handle> {
        let snapshot = self.snapshot();
        let actual = self.transfer_inner(caller, now, from, to, amount, proof)?;

        if let Recipient::Contract(hook) = recipient {
            // The receiving contract may use the amount for the remainder
            // of this operation only.
            self.acl.allow_transient(actual, to);
            match hook.on_confidential_transfer_received(self, from, to, actual, data) {
                Ok(true) => {}
                Ok(false) | Err(_) => {
                    self.restore(snapshot);
                    return Err(TokenError::InvalidReceiver(to));
                }
            }
        }
        Ok(actual)
    }

    fn transfer_inner(
        &mut self,
        caller: Address,
        now: u64,
        from: Address,
        to: Address,
        amount: Handle,
        proof: Option<&InputProof>,
    ) -> TokenResult<Handle> {
        if from.is_null() {
            return Err(TokenError::InvalidSender(from));
        }
        if to.is_null() {
            return Err(TokenError::InvalidReceiver(to));
        }
        if caller != from && !self.is_operator(from, caller, now) {
            return Err(TokenError::UnauthorizedSpender {
                holder: from,
                spender: caller,
            });
        }
        match proof {
            Some(proof) => self.check_input(amount, proof, caller)?,
            None => {
                if !self.acl.is_allowed(amount, caller) {
                    return Err(TokenError::UnauthorizedUseOfEncryptedAmount {
                        handle: amount,
                        account: caller,
                    });
                }
                // Reusing someone else's handle against an unset balance
                // would only probe the ACL; refuse it outright.
                if self.balance_of(from).is_zero() {
                    return Err(TokenError::ZeroBalance(from));
                }
            }
        }

        let debited = try_decrease(&*self.coprocessor, self.balance_of(from), amount)?;
        let zero = self.coprocessor.trivial_u64(0)?;
        let actual = self.coprocessor.select(debited.success, amount, zero)?;

        // The sender's balance must be written before the receiver's is
        // read, so a self-transfer nets out instead of double-crediting.
        self.record_balance(from, debited.result, now)?;
        self.balances.insert(from, debited.result);

        let credited = try_increase(&*self.coprocessor, self.balance_of(to), actual)?;
        self.record_balance(to, credited.result, now)?;
        self.balances.insert(to, credited.result);

        self.acl.allow(actual, from);
        self.acl.allow(actual, to);
        self.acl.allow(actual, self.address);
        self.acl.allow(debited.result, from);
        self.acl.allow(debited.result, self.address);
        self.acl.allow(credited.result, to);
        self.acl.allow(credited.result, self.address);

        self.events.push(Event::Transfer {
            from,
            to,
            amount: actual,
        });
        debug!(?from, ?to, "transferred confidential amount");
        Ok(actual)
    }

    /// Authorize `operator` to act for the caller until `until`
    ///
    /// Setting an expiry at or before the current time revokes immediately;
    /// the value itself is not validated.
    pub fn set_operator(&mut self, caller: Address, operator: Address, until: u64) {
        self.operators.insert((caller, operator), until);
        self.events.push(Event::OperatorSet {
            holder: caller,
            operator,
            until,
        });
        debug!(holder = ?caller, ?operator, until, "operator set");
    }

    /// Request public disclosure of an encrypted amount
    ///
    /// The caller must hold an access grant on `handle`. Returns the
    /// oracle's request id; the plaintext arrives later through
    /// [`finalize_disclose`].
    ///
    /// [`finalize_disclose`]: ConfidentialToken::finalize_disclose
    pub fn disclose_encrypted_amount(
        &mut self,
        caller: Address,
        handle: Handle,
    ) -> TokenResult<RequestId> {
        if !self.acl.is_allowed(handle, caller) {
            return Err(TokenError::UnauthorizedUseOfEncryptedAmount {
                handle,
                account: caller,
            });
        }
        let request_id = self.oracle.request_public_decrypt(handle)?;
        self.pending.insert(
            request_id,
            PendingDisclosure {
                handle,
                requester: caller,
            },
        );
        self.events.push(Event::DiscloseRequested {
            request_id,
            handle,
            requester: caller,
        });
        debug!(request_id, "disclosure requested");
        Ok(request_id)
    }

    /// Oracle callback delivering the plaintext for a pending request
    ///
    /// Only the configured oracle caller is accepted, each request id is
    /// consumed exactly once, and unknown ids are rejected rather than
    /// crashing. Attestation authenticity is the oracle's responsibility
    /// and is not re-verified here.
    pub fn finalize_disclose(
        &mut self,
        caller: Address,
        request_id: RequestId,
        plaintext: u64,
        _attestation: &[u8],
    ) -> TokenResult<Handle> {
        if caller != self.oracle_caller {
            return Err(TokenError::UnauthorizedCaller(caller));
        }
        let pending = self
            .pending
            .remove(&request_id)
            .ok_or(TokenError::InvalidGatewayRequest(request_id))?;
        self.events.push(Event::AmountDisclosed {
            handle: pending.handle,
            amount: plaintext,
        });
        debug!(request_id, "disclosure finalized");
        Ok(pending.handle)
    }

    fn check_input(
        &self,
        amount: Handle,
        proof: &InputProof,
        caller: Address,
    ) -> TokenResult<()> {
        if self
            .coprocessor
            .verify_input(amount, proof, caller, self.address)?
        {
            Ok(())
        } else {
            Err(TokenError::InvalidProof(amount))
        }
    }

    fn record_balance(&mut self, account: Address, value: Handle, key: u64) -> TokenResult<()> {
        if let Some(history) = &mut self.history {
            history
                .balances
                .entry(account)
                .or_default()
                .push(key, value)?;
        }
        Ok(())
    }

    fn record_supply(&mut self, value: Handle, key: u64) -> TokenResult<()> {
        if let Some(history) = &mut self.history {
            history.supply.push(key, value)?;
        }
        Ok(())
    }

    fn snapshot(&self) -> Snapshot {
        Snapshot {
            balances: self.balances.clone(),
            total_supply: self.total_supply,
            operators: self.operators.clone(),
            pending: self.pending.clone(),
            events_len: self.events.len(),
            history: self.history.clone(),
        }
    }

    /// Undo every state change since `snapshot`
    ///
    /// Persistent access grants issued for the undone leg survive, but the
    /// handles they cover are no longer reachable from ledger state.
    fn restore(&mut self, snapshot: Snapshot) {
        self.balances = snapshot.balances;
        self.total_supply = snapshot.total_supply;
        self.operators = snapshot.operators;
        self.pending = snapshot.pending;
        self.events.truncate(snapshot.events_len);
        self.history = snapshot.history;
    }
}

impl std::fmt::Debug for ConfidentialToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfidentialToken")
            .field("address", &self.address)
            .field("name", &self.config.name)
            .field("accounts", &self.balances.len())
            .field("events", &self.events.len())
            .finish()
    }
}
