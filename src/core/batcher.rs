/*!
 * Batching and worker partitioning
 *
 * `batches` is the plain lazy batcher: fixed-size windows over any iterator,
 * with a shorter final window. `partition` builds on it to hand exactly one
 * batch to each worker, folding the leftover items into the last batch.
 * Both stream: only the batch being built is held in memory, and restarting
 * means calling them again on a fresh iterator.
 */

/// Lazy fixed-size batches over an iterator
#[derive(Debug, Clone)]
pub struct Batches<I> {
    iter: I,
    size: usize,
}

/// Split `items` into batches of `size`; the last one may be shorter
///
/// Yields nothing for an empty input.
///
/// # Panics
///
/// Panics if `size` is zero.
pub fn batches<I: IntoIterator>(items: I, size: usize) -> Batches<I::IntoIter> {
    assert!(size >= 1, "batch size must be at least 1");
    Batches {
        iter: items.into_iter(),
        size,
    }
}

impl<I: Iterator> Iterator for Batches<I> {
    type Item = Vec<I::Item>;

    fn next(&mut self) -> Option<Self::Item> {
        let batch: Vec<I::Item> = self.iter.by_ref().take(self.size).collect();
        if batch.is_empty() {
            None
        } else {
            Some(batch)
        }
    }
}

/// Worker count and batch size for one run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerPlan {
    pub item_count: usize,

    /// `min(item_count, parallelism)`, so no worker gets an empty batch
    pub worker_count: usize,

    /// `floor(item_count / worker_count)`
    pub batch_size: usize,
}

impl WorkerPlan {
    pub fn new(item_count: usize, parallelism: usize) -> Self {
        let worker_count = item_count.min(parallelism.max(1));
        let batch_size = if worker_count == 0 {
            0
        } else {
            item_count / worker_count
        };

        Self {
            item_count,
            worker_count,
            batch_size,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.worker_count == 0
    }
}

/// One batch per worker, remainder folded into the last batch
#[derive(Debug, Clone)]
pub struct Partition<I> {
    iter: I,
    batch_size: usize,
    remaining: usize,
}

/// Partition `items` into `plan.worker_count` batches
///
/// Every batch except the last has exactly `plan.batch_size` items; the last
/// one takes whatever is left. 7 items over 3 workers gives `[2, 2, 3]`.
pub fn partition<I: IntoIterator>(items: I, plan: &WorkerPlan) -> Partition<I::IntoIter> {
    Partition {
        iter: items.into_iter(),
        batch_size: plan.batch_size,
        remaining: plan.worker_count,
    }
}

impl<I: Iterator> Iterator for Partition<I> {
    type Item = Vec<I::Item>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;

        let batch: Vec<I::Item> = if self.remaining == 0 {
            self.iter.by_ref().collect()
        } else {
            self.iter.by_ref().take(self.batch_size).collect()
        };

        if batch.is_empty() {
            self.remaining = 0;
            None
        } else {
            Some(batch)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sizes<T>(batches: &[Vec<T>]) -> Vec<usize> {
        batches.iter().map(Vec::len).collect()
    }

    #[test]
    fn test_batches_keep_order_and_size() {
        let items: Vec<u32> = (0..7).collect();
        let out: Vec<Vec<u32>> = batches(items.clone(), 2).collect();

        assert_eq!(sizes(&out), vec![2, 2, 2, 1]);
        assert_eq!(out.concat(), items);
    }

    #[test]
    fn test_batches_empty_input() {
        for size in 1..5 {
            assert_eq!(batches(Vec::<u8>::new(), size).count(), 0);
        }
    }

    #[test]
    fn test_batches_exact_multiple() {
        let out: Vec<Vec<u32>> = batches(0..6, 3).collect();
        assert_eq!(sizes(&out), vec![3, 3]);
    }

    #[test]
    fn test_batches_are_lazy() {
        // Pulling one batch consumes exactly that many items
        let mut source = 0..100;
        let first = batches(source.by_ref(), 10).next().unwrap();
        assert_eq!(first, (0..10).collect::<Vec<_>>());
        assert_eq!(source.next(), Some(10));
    }

    #[test]
    #[should_panic(expected = "batch size must be at least 1")]
    fn test_zero_batch_size_panics() {
        let _ = batches(vec![1], 0);
    }

    #[test]
    fn test_batches_property_over_many_lengths() {
        for len in 1..40usize {
            for parallelism in 1..10usize {
                let plan = WorkerPlan::new(len, parallelism);
                let items: Vec<usize> = (0..len).collect();
                let out: Vec<Vec<usize>> = batches(items.clone(), plan.batch_size).collect();

                assert_eq!(out.concat(), items);
                let (last, full) = out.split_last().unwrap();
                assert!(full.iter().all(|b| b.len() == plan.batch_size));
                assert!(!last.is_empty() && last.len() <= plan.batch_size);
            }
        }
    }

    #[test]
    fn test_plan_seven_items_three_workers() {
        let plan = WorkerPlan::new(7, 3);
        assert_eq!(plan.worker_count, 3);
        assert_eq!(plan.batch_size, 2);

        let out: Vec<Vec<char>> = partition("abcdefg".chars(), &plan).collect();
        assert_eq!(sizes(&out), vec![2, 2, 3]);
        assert_eq!(out.concat().into_iter().collect::<String>(), "abcdefg");
    }

    #[test]
    fn test_plan_clamps_workers_to_items() {
        let plan = WorkerPlan::new(2, 16);
        assert_eq!(plan.worker_count, 2);
        assert_eq!(plan.batch_size, 1);

        let out: Vec<Vec<u8>> = partition(vec![1, 2], &plan).collect();
        assert_eq!(out, vec![vec![1], vec![2]]);
    }

    #[test]
    fn test_plan_empty() {
        let plan = WorkerPlan::new(0, 8);
        assert!(plan.is_empty());
        assert_eq!(partition(Vec::<u8>::new(), &plan).count(), 0);
    }

    #[test]
    fn test_partition_one_batch_per_worker() {
        for len in 1..50usize {
            for parallelism in 1..12usize {
                let plan = WorkerPlan::new(len, parallelism);
                let items: Vec<usize> = (0..len).collect();
                let out: Vec<Vec<usize>> = partition(items.clone(), &plan).collect();

                assert_eq!(out.len(), plan.worker_count, "len={len} p={parallelism}");
                assert_eq!(out.concat(), items);
                let (last, rest) = out.split_last().unwrap();
                assert!(rest.iter().all(|b| b.len() == plan.batch_size));
                assert!(last.len() >= plan.batch_size);
            }
        }
    }
}
