// batcher.rs - splits titles into provider-sized requests

/// Splits an ordered list of texts into contiguous chunks.
#[derive(Debug, Clone, Copy)]
pub struct Batcher {
    pub batch_size: usize,
}

impl Batcher {
    /// A zero batch size is treated as one.
    pub fn new(batch_size: usize) -> Self {
        Self {
            batch_size: batch_size.max(1),
        }
    }

    /// Chunks come back in input order, so concatenating them restores `items`.
    pub fn split<'a>(&self, items: &'a [String]) -> Vec<&'a [String]> {
        items.chunks(self.batch_size).collect()
    }
}
