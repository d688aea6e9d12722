//! Safe homomorphic arithmetic
//!
//! The only primitives by which the ledger mutates balances. Each returns
//! a new value handle together with an encrypted success flag instead of
//! branching or failing: on overflow or insufficient value the original
//! handle is returned unchanged and the flag encrypts `false`. Nothing in
//! control flow, timing, or call pattern depends on the secret comparison.
//!
//! Zero-handle operands are treated as the plaintext-zero constant and
//! short-circuited without asking the coprocessor for that operand.

use veil_fhe::{Coprocessor, FheResult, Handle};

/// Result of a guarded homomorphic mutation
///
/// `success` references an encrypted boolean; `result` the (possibly
/// unchanged) value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Guarded {
    pub success: Handle,
    pub result: Handle,
}

/// Compute `a + b` with an encrypted no-overflow flag
///
/// `result` is `select(success, a + b, a)`: on wraparound the original
/// value survives instead of a garbage wrapped sum.
pub fn try_increase(cop: &dyn Coprocessor, a: Handle, b: Handle) -> FheResult<Guarded> {
    if a.is_zero() {
        return Ok(Guarded {
            success: cop.trivial_bool(true)?,
            result: b,
        });
    }
    if b.is_zero() {
        return Ok(Guarded {
            success: cop.trivial_bool(true)?,
            result: a,
        });
    }
    let sum = cop.add(a, b)?;
    let success = cop.ge(sum, a)?;
    let result = cop.select(success, sum, a)?;
    Ok(Guarded { success, result })
}

/// Compute `a - b` with an encrypted no-underflow flag
///
/// `result` is `select(success, a - b, a)`: on insufficient value the
/// original survives.
pub fn try_decrease(cop: &dyn Coprocessor, a: Handle, b: Handle) -> FheResult<Guarded> {
    if b.is_zero() {
        return Ok(Guarded {
            success: cop.trivial_bool(true)?,
            result: a,
        });
    }
    if a.is_zero() {
        // Decreasing an absent value succeeds only if b encrypts zero, and
        // either way the value stays absent.
        let zero = cop.trivial_u64(0)?;
        return Ok(Guarded {
            success: cop.le(b, zero)?,
            result: Handle::ZERO,
        });
    }
    let success = cop.le(b, a)?;
    let diff = cop.sub(a, b)?;
    let result = cop.select(success, diff, a)?;
    Ok(Guarded { success, result })
}
