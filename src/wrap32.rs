//! 32-bit wrapping sequence numbers (RFC 793 §3.2).
//!
//! A [`Wrap32`] is the wire-visible, wraps-every-4GiB view of a stream
//! index. [`Wrap32::unwrap`] recovers the 64-bit absolute index nearest a
//! given checkpoint, which is how a receiver with a large-but-finite
//! amount of already-delivered history turns a wrapped seqno back into
//! "the byte at position N in the stream".

use std::fmt;
use std::ops::Add;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Wrap32 {
    raw: u32,
}

impl Wrap32 {
    pub fn new(raw: u32) -> Self {
        Wrap32 { raw }
    }

    pub fn raw_value(self) -> u32 {
        self.raw
    }

    /// `zero_point + (n mod 2^32)`.
    pub fn wrap(n: u64, zero_point: Wrap32) -> Wrap32 {
        Wrap32 {
            raw: zero_point.raw.wrapping_add(n as u32),
        }
    }

    /// The 64-bit absolute index nearest `checkpoint` that wraps to `self`
    /// relative to `zero_point`. Ties break toward the smaller value.
    pub fn unwrap(self, zero_point: Wrap32, checkpoint: u64) -> u64 {
        let offset = self.raw.wrapping_sub(zero_point.raw) as u64;
        let high_bits = checkpoint & !0xFFFF_FFFFu64;
        let candidate = high_bits + offset;

        let mut best = candidate;
        let mut best_dist = abs_diff(candidate, checkpoint);

        // Ties break toward the smaller value, so the lower candidate
        // wins on an equal distance, not just a strictly shorter one.
        if let Some(lower) = candidate.checked_sub(1u64 << 32) {
            let dist = abs_diff(lower, checkpoint);
            if dist <= best_dist {
                best = lower;
                best_dist = dist;
            }
        }

        if let Some(upper) = candidate.checked_add(1u64 << 32) {
            let dist = abs_diff(upper, checkpoint);
            if dist < best_dist {
                best = upper;
            }
        }

        best
    }
}

fn abs_diff(a: u64, b: u64) -> u64 {
    if a > b {
        a - b
    } else {
        b - a
    }
}

impl Add<u64> for Wrap32 {
    type Output = Wrap32;
    fn add(self, rhs: u64) -> Wrap32 {
        Wrap32::wrap(rhs, self)
    }
}

impl fmt::Display for Wrap32 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrap_then_unwrap_recovers_small_values() {
        let zero = Wrap32::new(0);
        for n in [0u64, 1, 17, 1000, u32::MAX as u64] {
            let wrapped = Wrap32::wrap(n, zero);
            assert_eq!(wrapped.unwrap(zero, n), n);
        }
    }

    #[test]
    fn unwrap_picks_nearest_checkpoint_across_wraparound() {
        let zero = Wrap32::new(0);
        // raw value 2 could be absolute 2, 2 + 2^32, 2 - 2^32 (invalid, negative).
        let wrapped = Wrap32::new(2);
        assert_eq!(wrapped.unwrap(zero, 0), 2);
        let far_checkpoint = 3u64 << 32;
        assert_eq!(
            wrapped.unwrap(zero, far_checkpoint),
            far_checkpoint + 2,
        );
    }

    #[test]
    fn unwrap_never_returns_a_value_that_would_have_underflowed() {
        // zero_point far ahead of raw 0: candidate - 2^32 would underflow, must be skipped.
        let zero_point = Wrap32::new(500);
        let wrapped = Wrap32::new(0);
        let result = wrapped.unwrap(zero_point, 0);
        // wrapping_sub(0 - 500) = -500 as u32 = huge offset; nearest valid absolute
        // index to checkpoint 0 that isn't negative.
        assert!(result < 1u64 << 33);
    }

    #[test]
    fn ties_break_toward_the_smaller_value() {
        let zero = Wrap32::new(0);
        // checkpoint exactly between two candidates differing by 2^32.
        let checkpoint = 1u64 << 31;
        let wrapped = Wrap32::wrap(0, zero);
        let result = wrapped.unwrap(zero, checkpoint);
        assert_eq!(result, 0);
    }

    #[test]
    fn ties_break_toward_the_smaller_value_across_a_nonzero_zero_point() {
        let zero_point = Wrap32::new(0x8000_0000);
        let checkpoint = 1u64 << 32;
        let raw = Wrap32::new(0);
        // candidate = 2^32 + 2^31, lower = 2^31, both exactly 2^31 away
        // from the checkpoint; the smaller one must win.
        assert_eq!(raw.unwrap(zero_point, checkpoint), 1u64 << 31);
    }

    #[test]
    fn wrap_round_trips_under_arbitrary_zero_points() {
        for zero_raw in [0u32, 1, 1 << 16, u32::MAX] {
            let zero = Wrap32::new(zero_raw);
            for n in [0u64, 5, 4096, (1u64 << 32) - 1] {
                let checkpoint = n;
                assert_eq!(Wrap32::wrap(n, zero).unwrap(zero, checkpoint), n);
            }
        }
    }
}
