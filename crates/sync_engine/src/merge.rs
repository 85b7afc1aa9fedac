//! Dual-head stamp pairing.
//!
//! Two heads of a rig record on their own clocks at the same nominal rate. The
//! pairing walks both series with two pointers; at every step the head that is
//! behind scans forward on its own series up to the other head's current stamp,
//! and the nearer of its two local candidates is paired with it.

use std::cmp::Ordering;

use contracts::{ContractError, SkewBounds, StampPair, Timestamp};
use tracing::{debug, instrument};

/// Pairs the stamps of two heads.
///
/// Produces at most `min(left.len(), right.len())` pairs. Every pair chosen as a
/// nearest candidate is within `bounds.nearest_ns`; both local candidates are
/// within `bounds.hard_ns`.
///
/// # Errors
/// [`ContractError::SyncViolation`] on the first pair outside either bound. The
/// run is not expected to continue after that.
#[instrument(
    name = "merge_stamps",
    skip_all,
    fields(left = left.len(), right = right.len())
)]
pub fn merge_stamps(
    left: &[Timestamp],
    right: &[Timestamp],
    bounds: &SkewBounds,
) -> Result<Vec<StampPair>, ContractError> {
    let mut pairs = Vec::with_capacity(left.len().min(right.len()));
    let mut i = 0usize;
    let mut j = 0usize;

    while i < left.len() && j < right.len() {
        let pair = match left[i].cmp(&right[j]) {
            Ordering::Less => {
                i = nearest_candidate(left, i, right[j], bounds)?;
                StampPair::new(left[i], right[j])
            }
            Ordering::Greater => {
                j = nearest_candidate(right, j, left[i], bounds)?;
                StampPair::new(left[i], right[j])
            }
            Ordering::Equal => StampPair::new(left[i], right[j]),
        };

        pairs.push(pair);
        i += 1;
        j += 1;
    }

    debug!(
        pairs = pairs.len(),
        left_unpaired = left.len() - i.min(left.len()),
        right_unpaired = right.len() - j.min(right.len()),
        "stamp pairing done"
    );

    Ok(pairs)
}

/// Scans `series` forward from `cursor` up to `target` and returns the index of
/// the nearer of the two local candidates, ties going to the later one.
fn nearest_candidate(
    series: &[Timestamp],
    mut cursor: usize,
    target: Timestamp,
    bounds: &SkewBounds,
) -> Result<usize, ContractError> {
    while cursor + 1 < series.len() && series[cursor + 1] <= target {
        cursor += 1;
    }

    let current_skew = series[cursor].abs_diff(target);
    let Some(&next) = series.get(cursor + 1) else {
        check_skew(target, series[cursor], current_skew, bounds.nearest_ns)?;
        return Ok(cursor);
    };
    let next_skew = next.abs_diff(target);

    let chosen = if current_skew < next_skew {
        check_skew(target, series[cursor], current_skew, bounds.nearest_ns)?;
        cursor
    } else {
        check_skew(target, next, next_skew, bounds.nearest_ns)?;
        cursor + 1
    };

    check_skew(target, series[cursor], current_skew, bounds.hard_ns)?;
    check_skew(target, next, next_skew, bounds.hard_ns)?;

    Ok(chosen)
}

#[inline]
fn check_skew(
    reference: Timestamp,
    candidate: Timestamp,
    skew_ns: u64,
    limit_ns: u64,
) -> Result<(), ContractError> {
    if skew_ns < limit_ns {
        Ok(())
    } else {
        observability::record_sync_violation(skew_ns, limit_ns);
        Err(ContractError::SyncViolation {
            reference,
            candidate,
            skew_ns,
            limit_ns,
        })
    }
}
