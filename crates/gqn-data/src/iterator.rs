use rand::Rng;
use rand::seq::SliceRandom;

/// Shuffled index batches over one subset.
///
/// Only full batches are produced; leftover scenes are skipped for this pass.
#[derive(Clone, Debug)]
pub struct BatchIterator {
    indices: Vec<usize>,
    batch_size: usize,
    position: usize,
}

impl BatchIterator {
    pub fn new<R: Rng + ?Sized>(len: usize, batch_size: usize, rng: &mut R) -> Self {
        let mut indices: Vec<usize> = (0..len).collect();
        indices.shuffle(rng);

        let dropped = if batch_size == 0 { len } else { len % batch_size };
        if dropped > 0 {
            log::warn!("Skipping {dropped} of {len} scenes that do not fill a batch of {batch_size}");
        }

        Self {
            indices,
            batch_size,
            position: 0,
        }
    }

    /// Number of batches this pass will yield
    pub fn num_batches(&self) -> usize {
        if self.batch_size == 0 {
            0
        } else {
            self.indices.len() / self.batch_size
        }
    }
}

impl Iterator for BatchIterator {
    type Item = Vec<usize>;

    fn next(&mut self) -> Option<Self::Item> {
        let end = self.position + self.batch_size;
        if self.batch_size == 0 || end > self.indices.len() {
            return None;
        }

        let batch = self.indices[self.position..end].to_vec();
        self.position = end;
        Some(batch)
    }
}
