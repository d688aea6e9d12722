//! Performance Benchmarks for VEIL Ledger Primitives
//!
//! Run with: cargo bench

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use std::sync::Arc;
use veil::fhe::{Address, MockCoprocessor, MockOracle};
use veil::token::{try_decrease, try_increase, ConfidentialToken, Trace, TokenConfig};

fn handle_for(index: u64) -> veil::fhe::Handle {
    let mut bytes = [0u8; 32];
    bytes[..8].copy_from_slice(&index.to_le_bytes());
    bytes[31] = 1;
    veil::fhe::Handle::from_bytes(bytes)
}

// =============================================================================
// CHECKPOINT TRACE BENCHMARKS
// =============================================================================

fn bench_trace_lookups(c: &mut Criterion) {
    let mut group = c.benchmark_group("trace_lookups");

    for size in [100usize, 10_000, 100_000] {
        let mut trace = Trace::new();
        for index in 0..size as u64 {
            trace.push(index * 2, handle_for(index)).unwrap();
        }
        let recent_key = (size as u64 * 2).saturating_sub(7);

        group.bench_with_input(
            BenchmarkId::new("upper_lookup", size),
            &recent_key,
            |b, &key| b.iter(|| trace.upper_lookup(key)),
        );
        group.bench_with_input(
            BenchmarkId::new("upper_lookup_recent", size),
            &recent_key,
            |b, &key| b.iter(|| trace.upper_lookup_recent(key)),
        );
    }

    group.finish();
}

// =============================================================================
// SAFE ARITHMETIC BENCHMARKS
// =============================================================================

fn bench_safe_math(c: &mut Criterion) {
    let cop = MockCoprocessor::new();
    let a = cop.encrypt(1_000_000);
    let b = cop.encrypt(250);

    c.bench_function("try_increase", |bench| {
        bench.iter(|| try_increase(&cop, a, b).unwrap())
    });
    c.bench_function("try_decrease", |bench| {
        bench.iter(|| try_decrease(&cop, a, b).unwrap())
    });
}

// =============================================================================
// LEDGER BENCHMARKS
// =============================================================================

fn bench_transfer(c: &mut Criterion) {
    let cop = MockCoprocessor::new();
    let oracle = MockOracle::new(cop.clone());
    let ledger_addr = Address::from_bytes([0xee; 32]);
    let holder = Address::from_bytes([1u8; 32]);
    let recipient = Address::from_bytes([2u8; 32]);

    let mut token = ConfidentialToken::new(
        ledger_addr,
        TokenConfig::new("Veil", "VEIL", "uri"),
        Arc::new(cop.clone()),
        Arc::new(oracle),
        Address::from_bytes([0xaa; 32]),
    );
    let (amount, proof) = cop.encrypt_input(u64::MAX / 2, holder, ledger_addr);
    token.mint(holder, 1, holder, amount, &proof).unwrap();

    c.bench_function("transfer", |bench| {
        let mut now = 1;
        bench.iter(|| {
            now += 1;
            let (amount, proof) = cop.encrypt_input(1, holder, ledger_addr);
            token
                .transfer(holder, now, holder, recipient, amount, Some(&proof))
                .unwrap()
        })
    });
}

criterion_group!(benches, bench_trace_lookups, bench_safe_math, bench_transfer);
criterion_main!(benches);
