//! Checkpointed history of encrypted values
//!
//! A [`Trace`] records (key, handle) pairs as a tracked quantity changes at
//! non-decreasing keys (block heights, timestamps), and answers
//! point-in-time lookups by binary search. Values are opaque handles, so
//! the history never sees plaintext either.
//!
//! Keys must be pushed in non-decreasing order; pushing the current last
//! key again replaces that entry's value in place. Entries are never
//! removed.

use crate::errors::{TraceError, TraceResult};
use serde::{Deserialize, Serialize};
use veil_fhe::Handle;

/// One history entry
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub key: u64,
    pub value: Handle,
}

/// Append-only ordered history of (key, handle) pairs
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Trace {
    checkpoints: Vec<Checkpoint>,
}

impl Trace {
    /// Create an empty trace
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `value` at `key`
    ///
    /// Fails with [`TraceError::UnorderedInsertion`] if `key` precedes the
    /// last stored key. Pushing the last key again replaces its value
    /// without growing the trace. Returns the previous latest value and the
    /// new one.
    pub fn push(&mut self, key: u64, value: Handle) -> TraceResult<(Handle, Handle)> {
        let previous = self.latest();
        match self.checkpoints.last_mut() {
            Some(last) if last.key > key => Err(TraceError::UnorderedInsertion {
                last: last.key,
                new: key,
            }),
            Some(last) if last.key == key => {
                last.value = value;
                Ok((previous, value))
            }
            _ => {
                self.checkpoints.push(Checkpoint { key, value });
                Ok((previous, value))
            }
        }
    }

    /// Value of the most recent checkpoint, or the zero handle if empty
    pub fn latest(&self) -> Handle {
        self.checkpoints
            .last()
            .map_or(Handle::ZERO, |checkpoint| checkpoint.value)
    }

    /// Key and value of the most recent checkpoint, if any
    pub fn latest_checkpoint(&self) -> Option<(u64, Handle)> {
        self.checkpoints
            .last()
            .map(|checkpoint| (checkpoint.key, checkpoint.value))
    }

    /// Value of the first (oldest) checkpoint with key >= `key`, or the
    /// zero handle if none qualifies
    pub fn lower_lookup(&self, key: u64) -> Handle {
        let pos = self.checkpoints.partition_point(|c| c.key < key);
        self.checkpoints
            .get(pos)
            .map_or(Handle::ZERO, |checkpoint| checkpoint.value)
    }

    /// Value of the last (most recent) checkpoint with key <= `key`, or the
    /// zero handle if `key` precedes the first entry
    pub fn upper_lookup(&self, key: u64) -> Handle {
        self.upper_lookup_in(key, 0, self.checkpoints.len())
    }

    /// [`upper_lookup`] optimized for keys near the most recent checkpoint
    ///
    /// Scans a √n-sized tail window first and binary-searches only the side
    /// the key falls in. Results are identical to [`upper_lookup`] for all
    /// inputs.
    ///
    /// [`upper_lookup`]: Trace::upper_lookup
    pub fn upper_lookup_recent(&self, key: u64) -> Handle {
        let len = self.checkpoints.len();
        let (mut low, mut high) = (0, len);
        if len > 5 {
            let mid = len - isqrt(len);
            if key < self.checkpoints[mid].key {
                high = mid;
            } else {
                low = mid;
            }
        }
        self.upper_lookup_in(key, low, high)
    }

    fn upper_lookup_in(&self, key: u64, low: usize, high: usize) -> Handle {
        let slice = &self.checkpoints[low..high];
        let pos = slice.partition_point(|c| c.key <= key);
        if pos == 0 {
            Handle::ZERO
        } else {
            slice[pos - 1].value
        }
    }

    /// Checkpoint at `index`, oldest first
    pub fn at(&self, index: usize) -> TraceResult<Checkpoint> {
        self.checkpoints
            .get(index)
            .copied()
            .ok_or(TraceError::IndexOutOfRange {
                index,
                len: self.checkpoints.len(),
            })
    }

    /// Number of checkpoints
    pub fn len(&self) -> usize {
        self.checkpoints.len()
    }

    /// Whether the trace holds no checkpoints
    pub fn is_empty(&self) -> bool {
        self.checkpoints.is_empty()
    }
}

fn isqrt(n: usize) -> usize {
    if n < 2 {
        return n;
    }
    let mut x = n;
    let mut y = (x + 1) / 2;
    while y < x {
        x = y;
        y = (x + n / x) / 2;
    }
    x
}

#[cfg(test)]
mod tests {
    use super::*;

    fn handle(byte: u8) -> Handle {
        Handle::from_bytes([byte; 32])
    }

    fn sample_trace() -> Trace {
        let mut trace = Trace::new();
        for (key, value) in [(2, 17), (3, 42), (5, 101), (7, 23), (11, 99)] {
            trace.push(key, handle(value)).unwrap();
        }
        trace
    }

    #[test]
    fn test_empty_trace() {
        let trace = Trace::new();
        assert!(trace.is_empty());
        assert_eq!(trace.latest(), Handle::ZERO);
        assert_eq!(trace.latest_checkpoint(), None);
        assert_eq!(trace.upper_lookup(5), Handle::ZERO);
        assert_eq!(trace.lower_lookup(5), Handle::ZERO);
        assert!(matches!(
            trace.at(0),
            Err(TraceError::IndexOutOfRange { index: 0, len: 0 })
        ));
    }

    #[test]
    fn test_push_and_lookups() {
        let trace = sample_trace();
        assert_eq!(trace.len(), 5);
        assert_eq!(
            trace.at(0).unwrap(),
            Checkpoint {
                key: 2,
                value: handle(17)
            }
        );
        assert_eq!(trace.latest_checkpoint(), Some((11, handle(99))));
        assert_eq!(trace.latest(), handle(99));

        assert_eq!(trace.lower_lookup(4), handle(101));
        assert_eq!(trace.upper_lookup(4), handle(42));
        assert_eq!(trace.upper_lookup(12), handle(99));
        assert_eq!(trace.upper_lookup(1), Handle::ZERO);
        assert_eq!(trace.lower_lookup(12), Handle::ZERO);
    }

    #[test]
    fn test_unordered_insertion_fails() {
        let mut trace = sample_trace();
        assert_eq!(
            trace.push(1, handle(1)),
            Err(TraceError::UnorderedInsertion { last: 11, new: 1 })
        );
        // Failed push leaves the trace untouched
        assert_eq!(trace.len(), 5);
        assert_eq!(trace.latest(), handle(99));
    }

    #[test]
    fn test_same_key_replaces() {
        let mut trace = sample_trace();
        let (previous, new) = trace.push(11, handle(7)).unwrap();
        assert_eq!(previous, handle(99));
        assert_eq!(new, handle(7));
        assert_eq!(trace.len(), 5);
        assert_eq!(trace.latest(), handle(7));
    }

    #[test]
    fn test_push_returns_previous_latest() {
        let mut trace = Trace::new();
        let (previous, _) = trace.push(1, handle(10)).unwrap();
        assert_eq!(previous, Handle::ZERO);
        let (previous, _) = trace.push(2, handle(20)).unwrap();
        assert_eq!(previous, handle(10));
    }

    #[test]
    fn test_upper_lookup_recent_matches_upper_lookup() {
        let mut trace = Trace::new();
        for key in 0..64u64 {
            trace.push(key * 3, handle((key + 1) as u8)).unwrap();
        }
        for probe in 0..200u64 {
            assert_eq!(
                trace.upper_lookup_recent(probe),
                trace.upper_lookup(probe),
                "probe {probe}"
            );
        }
    }
}
