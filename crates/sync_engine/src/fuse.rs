//! K-way merge of individually sorted record streams.

use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::fmt;

use contracts::{Timestamp, Timestamped};
use tracing::warn;

/// Pull-based merge of sorted streams into one global timestamp order.
///
/// Keeps one head per input in a min-heap keyed by `(timestamp, stream index)`,
/// so equal timestamps come out in input order and the result equals a stable
/// sort of the concatenated inputs. Single pass; the merge cannot be rewound.
pub struct TimeOrderedMerge<I: Iterator> {
    streams: Vec<I>,
    heads: Vec<Option<I::Item>>,
    heap: BinaryHeap<Reverse<(Timestamp, usize)>>,
    out_of_order: u64,
}

impl<I> TimeOrderedMerge<I>
where
    I: Iterator,
    I::Item: Timestamped,
{
    pub fn new(streams: impl IntoIterator<Item = I>) -> Self {
        let mut streams: Vec<I> = streams.into_iter().collect();
        let mut heads = Vec::with_capacity(streams.len());
        let mut heap = BinaryHeap::with_capacity(streams.len());

        for (index, stream) in streams.iter_mut().enumerate() {
            let head = stream.next();
            if let Some(item) = &head {
                heap.push(Reverse((item.timestamp(), index)));
            }
            heads.push(head);
        }

        Self {
            streams,
            heads,
            heap,
            out_of_order: 0,
        }
    }

    /// Number of input streams
    pub fn stream_count(&self) -> usize {
        self.streams.len()
    }

    /// Items that arrived earlier than their own stream's previous item
    pub fn out_of_order(&self) -> u64 {
        self.out_of_order
    }
}

impl<I> Iterator for TimeOrderedMerge<I>
where
    I: Iterator,
    I::Item: Timestamped,
{
    type Item = I::Item;

    fn next(&mut self) -> Option<Self::Item> {
        let Reverse((timestamp, index)) = self.heap.pop()?;
        let item = self.heads[index].take()?;

        if let Some(next) = self.streams[index].next() {
            let next_ts = next.timestamp();
            if next_ts < timestamp {
                self.out_of_order += 1;
                warn!(
                    stream = index,
                    previous = timestamp,
                    timestamp = next_ts,
                    "input stream is not sorted, global order is no longer guaranteed"
                );
                metrics::counter!("kuc_fuse_out_of_order_total").increment(1);
            }
            self.heap.push(Reverse((next_ts, index)));
            self.heads[index] = Some(next);
        }

        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let buffered = self.heap.len();
        self.streams
            .iter()
            .map(Iterator::size_hint)
            .fold((buffered, Some(buffered)), |(lo, hi), (s_lo, s_hi)| {
                (
                    lo.saturating_add(s_lo),
                    hi.zip(s_hi).and_then(|(a, b)| a.checked_add(b)),
                )
            })
    }
}

impl<I: Iterator> fmt::Debug for TimeOrderedMerge<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimeOrderedMerge")
            .field("streams", &self.streams.len())
            .field("pending", &self.heap.len())
            .field("out_of_order", &self.out_of_order)
            .finish()
    }
}

/// Merges sorted collections into one lazily produced, globally ordered stream.
pub fn fuse<S>(streams: impl IntoIterator<Item = S>) -> TimeOrderedMerge<S::IntoIter>
where
    S: IntoIterator,
    S::Item: Timestamped,
{
    TimeOrderedMerge::new(streams.into_iter().map(IntoIterator::into_iter))
}
