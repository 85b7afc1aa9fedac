//! Nearest-timestamp matching between two ordered stamp series.

use contracts::{ContractError, Timestamp};
use tracing::instrument;

/// For every stamp in `base`, returns the index of the nearest stamp in `other`.
///
/// The cursor into `other` only moves forward: it advances while the next
/// candidate is still earlier than the current base stamp, then the closer of
/// `other[cursor]` and `other[cursor + 1]` is chosen. Ties go to the earlier
/// index. Past the last lookahead entry the cursor itself is returned.
///
/// Both series must be sorted ascending. Runs in `O(base.len() + other.len())`.
///
/// # Errors
/// [`ContractError::CountMismatch`] when `base` is non-empty and `other` is empty.
#[instrument(
    level = "debug",
    name = "match_nearest",
    skip_all,
    fields(base = base.len(), other = other.len())
)]
pub fn match_nearest(base: &[Timestamp], other: &[Timestamp]) -> Result<Vec<usize>, ContractError> {
    if base.is_empty() {
        return Ok(Vec::new());
    }
    if other.is_empty() {
        return Err(ContractError::count_mismatch("match candidates", 1, 0));
    }

    let mut cursor = 0usize;
    let mut matches = Vec::with_capacity(base.len());

    for &stamp in base {
        while cursor + 1 < other.len() && other[cursor + 1] < stamp {
            cursor += 1;
        }

        if let Some(&next) = other.get(cursor + 1) {
            if next.abs_diff(stamp) < other[cursor].abs_diff(stamp) {
                cursor += 1;
            }
        }
        matches.push(cursor);
    }

    Ok(matches)
}
