//! Batch planning.

use std::ops::Range;

/// How a record set is split for processing and persistence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Batching {
    /// Everything in one batch, persisted under the bare technique name.
    Single,
    /// Fixed-size chunks; the last one may be shorter.
    Chunked(usize),
}

impl Batching {
    /// `None` or a size of zero mean a single batch.
    pub fn from_size(size: Option<usize>) -> Self {
        match size {
            Some(n) if n > 0 => Self::Chunked(n),
            _ => Self::Single,
        }
    }

    pub fn is_chunked(&self) -> bool {
        matches!(self, Self::Chunked(_))
    }

    /// Number of batches for `total` records: `ceil(total / size)`.
    pub fn batch_count(&self, total: usize) -> usize {
        match self {
            Self::Single => usize::from(total > 0),
            Self::Chunked(size) => total.div_ceil(*size),
        }
    }

    /// Index ranges of every batch, in order.
    pub fn ranges(&self, total: usize) -> Vec<Range<usize>> {
        let size = match self {
            Self::Single => total.max(1),
            Self::Chunked(size) => *size,
        };
        (0..self.batch_count(total))
            .map(|i| {
                let start = i * size;
                start..(start + size).min(total)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunked_ranges_25_by_10() {
        let batching = Batching::Chunked(10);
        assert_eq!(batching.batch_count(25), 3);
        assert_eq!(batching.ranges(25), vec![0..10, 10..20, 20..25]);
    }

    #[test]
    fn test_exact_multiple_has_no_empty_tail() {
        let batching = Batching::Chunked(5);
        assert_eq!(batching.batch_count(10), 2);
        assert_eq!(batching.ranges(10), vec![0..5, 5..10]);
    }

    #[test]
    fn test_single_batch() {
        assert_eq!(Batching::Single.ranges(7), vec![0..7]);
        assert_eq!(Batching::Single.batch_count(0), 0);
        assert!(Batching::Single.ranges(0).is_empty());
    }

    #[test]
    fn test_from_size() {
        assert_eq!(Batching::from_size(None), Batching::Single);
        assert_eq!(Batching::from_size(Some(0)), Batching::Single);
        assert_eq!(Batching::from_size(Some(3)), Batching::Chunked(3));
        assert!(Batching::from_size(Some(3)).is_chunked());
    }

    #[test]
    fn test_batch_sizes_sum_to_total() {
        for total in 0..40usize {
            for size in 1..12usize {
                let ranges = Batching::Chunked(size).ranges(total);
                assert_eq!(ranges.len(), total.div_ceil(size));
                let sum: usize = ranges.iter().map(|r| r.len()).sum();
                assert_eq!(sum, total);
                if let Some((last, rest)) = ranges.split_last() {
                    assert!(rest.iter().all(|r| r.len() == size));
                    assert!(!last.is_empty() && last.len() <= size);
                }
            }
        }
    }
}
