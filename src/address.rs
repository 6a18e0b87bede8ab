//! Arena address resolution
//!
//! Command indices are 1-based and may be negative (counted back from the end
//! of their scope), ranged, or relative to an enclosing edge or block. Device
//! addresses are 0-based. Everything here is pure.
//!
//! Modulo is floored ([`i64::rem_euclid`]) so that negative offsets walk
//! backwards around the ring.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};

/// Map a negative scalar index into `[1, space]`.
///
/// A scope of one slot keeps the magnitude of the index.
pub fn wrap_negative(space: i64, n: i64) -> i64 {
    if space == 1 {
        n.saturating_abs()
    } else {
        n.rem_euclid(space) + 1
    }
}

/// Map `local` (relative to scope number `scope`, `per_scope` items each)
/// into a 1-based index over `total` items.
///
/// Local index `0` is the slot right before the scope, so a scope's
/// neighbors are reachable with `0`, negative, or past-the-end indices.
/// With one item per scope the local index passes through unchanged.
///
/// `total` must be at least 1. The ring arithmetic is widened to `i128`, so
/// any `i64` input lands in `1..=total`.
#[allow(clippy::cast_possible_truncation)]
pub fn relative_to_absolute(scope: i64, per_scope: i64, local: i64, total: i64) -> i64 {
    if per_scope == 1 {
        return local;
    }
    let total = i128::from(total.max(1));
    let per_scope = i128::from(per_scope);
    let offset = i128::from(scope) * per_scope - (per_scope - i128::from(local));
    let index = if local < 0 {
        offset.rem_euclid(total) + 1
    } else {
        match offset.rem_euclid(total) {
            0 => total,
            index => index,
        }
    };
    // 1 <= index <= total, and total came from an i64.
    index as i64
}

/// Longest range [`expand_range`] will produce.
pub const MAX_RANGE_LEN: u64 = 1 << 16;

/// Expand `[i]`, `[start, end]` or `[start, end, step]` into indices.
///
/// Ranges are inclusive and run downwards when `start > end`. The sign of
/// `step` is ignored. Ranges longer than [`MAX_RANGE_LEN`] are rejected.
pub fn expand_range(spec: &[i64]) -> Result<Vec<i64>> {
    expand_range_within(spec, MAX_RANGE_LEN)
}

/// [`expand_range`], rejecting ranges of more than `limit` indices.
pub fn expand_range_within(spec: &[i64], limit: u64) -> Result<Vec<i64>> {
    let (start, end, step) = match *spec {
        [index] => return Ok(vec![index]),
        [start, end] => (start, end, 1),
        [start, end, step] => (start, end, step),
        [] => return Err(Error::index("empty index list")),
        _ => {
            return Err(Error::index(format!(
                "expected at most 3 elements, got {}",
                spec.len()
            )));
        }
    };
    if step == 0 {
        return Err(Error::index("range step must not be zero"));
    }
    let step = step.unsigned_abs();
    let len = start.abs_diff(end) / step + 1;
    if len > limit {
        return Err(Error::index(format!(
            "range {start}..={end} has {len} indices, at most {limit} allowed"
        )));
    }

    let mut out = Vec::new();
    let mut current = Some(start);
    while let Some(index) = current {
        out.push(index);
        current = if start <= end {
            index.checked_add_unsigned(step).filter(|next| *next <= end)
        } else {
            index.checked_sub_unsigned(step).filter(|next| *next >= end)
        };
    }
    Ok(out)
}

/// Resolve a 1-based top-level index against a scope of `space` items.
///
/// Negative indices wrap; zero and indices past the end are rejected.
pub fn resolve_index(space: i64, n: i64) -> Result<i64> {
    let index = if n < 0 { wrap_negative(space, n) } else { n };
    if index < 1 || index > space {
        return Err(Error::index(format!("index {n} outside 1..={space}")));
    }
    Ok(index)
}

/// Locate a 1-based absolute LED: `(block address, slot within block)`,
/// both 0-based.
pub fn locate_led(leds_per_block: i64, led: i64) -> (i64, i64) {
    let block = (led - 1).div_euclid(leds_per_block);
    // Remainder zero is the last slot. Callers pass resolved indices (>= 1).
    let slot = match led % leds_per_block {
        0 => leds_per_block,
        rem => rem,
    };
    (block, slot - 1)
}

/// Raw index list from a command payload.
///
/// Kept unparsed until generation so that one bad override is skipped
/// instead of rejecting the whole arena.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IndexSpec(Vec<Value>);

impl IndexSpec {
    pub fn new(indices: impl IntoIterator<Item = i64>) -> Self {
        Self(indices.into_iter().map(Value::from).collect())
    }

    /// The integers of the spec.
    pub fn values(&self) -> Result<Vec<i64>> {
        if self.0.is_empty() {
            return Err(Error::index("empty index list"));
        }
        self.0
            .iter()
            .map(|value| {
                value
                    .as_i64()
                    .ok_or_else(|| Error::index(format!("non-integer index {value}")))
            })
            .collect()
    }

    /// The spec expanded through [`expand_range`].
    pub fn expand(&self) -> Result<Vec<i64>> {
        expand_range(&self.values()?)
    }

    /// The spec expanded through [`expand_range_within`].
    pub fn expand_within(&self, limit: u64) -> Result<Vec<i64>> {
        expand_range_within(&self.values()?, limit)
    }
}

impl From<Vec<i64>> for IndexSpec {
    fn from(indices: Vec<i64>) -> Self {
        Self::new(indices)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relative_zero_wraps_to_previous_scope() {
        // Block 0 of edge 1 is the last block of the ring.
        assert_eq!(relative_to_absolute(1, 2, 0, 8), 8);
        // Block 0 of edge 2 is the last block of edge 1.
        assert_eq!(relative_to_absolute(2, 2, 0, 8), 2);
    }

    #[test]
    fn test_relative_negative() {
        assert_eq!(relative_to_absolute(1, 2, -1, 8), 8);
        assert_eq!(relative_to_absolute(3, 2, -1, 8), 4);
    }

    #[test]
    fn test_relative_extreme_locals_stay_on_ring() {
        assert_eq!(relative_to_absolute(1, 2, i64::MIN, 8), 1);
        assert_eq!(relative_to_absolute(1, 2, i64::MAX, 8), 7);
        assert_eq!(relative_to_absolute(i64::MAX, 4, i64::MAX, 4), 3);
    }

    #[test]
    fn test_expand_range_near_limits() {
        assert_eq!(
            expand_range(&[i64::MAX - 1, i64::MAX]).unwrap(),
            vec![i64::MAX - 1, i64::MAX]
        );
        assert_eq!(
            expand_range(&[i64::MIN + 1, i64::MIN]).unwrap(),
            vec![i64::MIN + 1, i64::MIN]
        );
        assert_eq!(expand_range(&[i64::MAX - 2, i64::MAX, i64::MIN]).unwrap(), vec![i64::MAX - 2]);
    }

    #[test]
    fn test_locate_led_last_slot() {
        assert_eq!(locate_led(8, 8), (0, 7));
        assert_eq!(locate_led(8, 9), (1, 0));
        assert_eq!(locate_led(1, 5), (4, 0));
    }
}
