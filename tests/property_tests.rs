//! Property-Based Tests for VEIL Ledger Primitives
//!
//! Uses proptest to generate random inputs and verify the checkpoint,
//! safe-arithmetic, and conservation properties hold.

use proptest::prelude::*;
use std::sync::Arc;
use veil::fhe::{Address, Handle, MockCoprocessor, MockOracle};
use veil::token::{try_decrease, try_increase, ConfidentialToken, TokenConfig, Trace};

// =============================================================================
// PROPTEST STRATEGIES
// =============================================================================

/// Strategy for a strictly increasing sequence of (key, value) checkpoints
fn checkpoint_seq() -> impl Strategy<Value = Vec<(u64, u8)>> {
    prop::collection::vec((1u64..50, any::<u8>()), 0..40).prop_map(|gaps| {
        let mut key = 0u64;
        gaps.into_iter()
            .map(|(gap, value)| {
                key += gap;
                (key, value)
            })
            .collect()
    })
}

fn handle_of(value: u8) -> Handle {
    let mut bytes = [0u8; 32];
    bytes[0] = value;
    bytes[31] = 1; // never the zero handle
    Handle::from_bytes(bytes)
}

/// One step of a random ledger workload over three accounts
#[derive(Clone, Debug)]
enum LedgerOp {
    Mint { to: u8, value: u32 },
    Transfer { from: u8, to: u8, value: u32 },
    Burn { from: u8, value: u32 },
}

fn ledger_op() -> impl Strategy<Value = LedgerOp> {
    prop_oneof![
        (0u8..3, any::<u32>()).prop_map(|(to, value)| LedgerOp::Mint { to, value }),
        (0u8..3, 0u8..3, any::<u32>())
            .prop_map(|(from, to, value)| LedgerOp::Transfer { from, to, value }),
        (0u8..3, any::<u32>()).prop_map(|(from, value)| LedgerOp::Burn { from, value }),
    ]
}

fn account(index: u8) -> Address {
    Address::from_bytes([index + 1; 32])
}

// =============================================================================
// CHECKPOINT TRACE PROPERTIES
// =============================================================================

proptest! {
    /// Property: upper_lookup matches a naive reverse scan
    #[test]
    fn trace_upper_lookup_matches_naive(entries in checkpoint_seq(), probe in 0u64..2500) {
        let mut trace = Trace::new();
        for &(key, value) in &entries {
            trace.push(key, handle_of(value)).unwrap();
        }

        let expected = entries
            .iter()
            .rev()
            .find(|&&(key, _)| key <= probe)
            .map_or(Handle::ZERO, |&(_, value)| handle_of(value));
        prop_assert_eq!(trace.upper_lookup(probe), expected);
    }

    /// Property: lower_lookup matches a naive forward scan
    #[test]
    fn trace_lower_lookup_matches_naive(entries in checkpoint_seq(), probe in 0u64..2500) {
        let mut trace = Trace::new();
        for &(key, value) in &entries {
            trace.push(key, handle_of(value)).unwrap();
        }

        let expected = entries
            .iter()
            .find(|&&(key, _)| key >= probe)
            .map_or(Handle::ZERO, |&(_, value)| handle_of(value));
        prop_assert_eq!(trace.lower_lookup(probe), expected);
    }

    /// Property: the tail-biased lookup is indistinguishable from the plain one
    #[test]
    fn trace_upper_lookup_recent_is_equivalent(entries in checkpoint_seq(), probe in 0u64..2500) {
        let mut trace = Trace::new();
        for &(key, value) in &entries {
            trace.push(key, handle_of(value)).unwrap();
        }
        prop_assert_eq!(trace.upper_lookup_recent(probe), trace.upper_lookup(probe));
    }
}

// =============================================================================
// SAFE ARITHMETIC PROPERTIES
// =============================================================================

proptest! {
    /// Property: try_increase never overflows; on overflow the original survives
    #[test]
    fn try_increase_never_overflows(a in any::<u64>(), b in any::<u64>()) {
        let cop = MockCoprocessor::new();
        let ha = cop.encrypt(a);
        let hb = cop.encrypt(b);

        let out = try_increase(&cop, ha, hb).unwrap();
        let success = cop.bool_of(out.success).unwrap();
        let result = cop.plaintext_of(out.result).unwrap();

        match a.checked_add(b) {
            Some(sum) => {
                prop_assert!(success);
                prop_assert_eq!(result, sum);
            }
            None => {
                prop_assert!(!success);
                prop_assert_eq!(result, a);
            }
        }
    }

    /// Property: try_decrease never underflows; on insufficiency the original survives
    #[test]
    fn try_decrease_never_underflows(a in any::<u64>(), b in any::<u64>()) {
        let cop = MockCoprocessor::new();
        let ha = cop.encrypt(a);
        let hb = cop.encrypt(b);

        let out = try_decrease(&cop, ha, hb).unwrap();
        let success = cop.bool_of(out.success).unwrap();
        let result = cop.plaintext_of(out.result).unwrap();

        match a.checked_sub(b) {
            Some(diff) => {
                prop_assert!(success);
                prop_assert_eq!(result, diff);
            }
            None => {
                prop_assert!(!success);
                prop_assert_eq!(result, a);
            }
        }
    }
}

// =============================================================================
// LEDGER CONSERVATION PROPERTIES
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Property: total supply always equals the sum of all balances, and no
    /// operation in the workload ever hard-fails on balance grounds
    #[test]
    fn supply_equals_sum_of_balances(ops in prop::collection::vec(ledger_op(), 0..30)) {
        let cop = MockCoprocessor::new();
        let oracle = MockOracle::new(cop.clone());
        let ledger_addr = Address::from_bytes([0xee; 32]);
        let mut token = ConfidentialToken::new(
            ledger_addr,
            TokenConfig::new("Veil", "VEIL", "uri"),
            Arc::new(cop.clone()),
            Arc::new(oracle),
            Address::from_bytes([0xaa; 32]),
        );

        for (step, op) in ops.into_iter().enumerate() {
            let now = step as u64 + 1;
            match op {
                LedgerOp::Mint { to, value } => {
                    let to = account(to);
                    let (amount, proof) = cop.encrypt_input(value as u64, to, ledger_addr);
                    token.mint(to, now, to, amount, &proof).unwrap();
                }
                LedgerOp::Transfer { from, to, value } => {
                    let (from, to) = (account(from), account(to));
                    let (amount, proof) = cop.encrypt_input(value as u64, from, ledger_addr);
                    token
                        .transfer(from, now, from, to, amount, Some(&proof))
                        .unwrap();
                }
                LedgerOp::Burn { from, value } => {
                    let from = account(from);
                    let (amount, proof) = cop.encrypt_input(value as u64, from, ledger_addr);
                    token.burn(from, now, from, amount, &proof).unwrap();
                }
            }
        }

        let sum: u64 = (0..3)
            .map(|index| cop.plaintext_of(token.balance_of(account(index))).unwrap())
            .sum();
        let supply = cop.plaintext_of(token.total_supply()).unwrap();
        prop_assert_eq!(supply, sum);
    }
}
