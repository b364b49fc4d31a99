use std::num::NonZeroUsize;

use ndarray::s;

use super::dataset::{BatchRef, InMemoryDataset};

/// DataLoader producing borrowed batches in dataset order (zero-copy).
#[derive(Debug, Clone)]
pub struct DataLoader {
    dataset: InMemoryDataset,
    batch_size: NonZeroUsize,
    cursor: usize,
}

impl DataLoader {
    pub fn new(dataset: InMemoryDataset, batch_size: NonZeroUsize) -> Self {
        Self {
            dataset,
            batch_size,
            cursor: 0,
        }
    }

    /// Creates a `DataLoader` that yields the whole dataset as a single batch.
    pub fn full_batch(dataset: InMemoryDataset) -> Self {
        let batch_size = NonZeroUsize::new(dataset.len()).unwrap_or(NonZeroUsize::MIN);
        Self::new(dataset, batch_size)
    }

    #[inline]
    pub fn dataset(&self) -> &InMemoryDataset {
        &self.dataset
    }

    #[inline]
    pub fn batch_size(&self) -> NonZeroUsize {
        self.batch_size
    }

    #[inline]
    pub fn reset(&mut self) {
        self.cursor = 0;
    }

    /// Returns the next borrowed batch, or None if exhausted.
    pub fn next_batch(&mut self) -> Option<BatchRef<'_>> {
        let len = self.dataset.len();
        if self.cursor >= len {
            return None;
        }

        let end = (self.cursor + self.batch_size.get()).min(len);
        let x = self.dataset.x().slice_move(s![self.cursor..end, ..]);
        let y = self.dataset.y().slice_move(s![self.cursor..end]);

        self.cursor = end;
        Some(BatchRef { x, y })
    }
}
