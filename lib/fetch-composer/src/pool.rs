use std::ops::{Deref, DerefMut};

use parking_lot::Mutex;

/// Working buffers of one finalize pass.
#[derive(Debug, Default)]
pub struct ScratchBuffers {
    /// The printed upstream operation.
    pub printed: String,
    /// The serialized fetch input.
    pub input: String,
}

impl ScratchBuffers {
    fn reset(&mut self) {
        self.printed.clear();
        self.input.clear();
    }
}

/// A bounded pool of scratch buffers shared by the planners of a data source.
#[derive(Debug)]
pub struct ScratchPool {
    buffers: Mutex<Vec<ScratchBuffers>>,
    capacity: usize,
}

impl Default for ScratchPool {
    fn default() -> Self {
        Self::new(8)
    }
}

impl ScratchPool {
    pub fn new(capacity: usize) -> Self {
        Self {
            buffers: Mutex::new(Vec::with_capacity(capacity)),
            capacity,
        }
    }

    /// Takes a set of empty buffers out of the pool. They go back, reset, when the
    /// guard is dropped.
    pub fn checkout(&self) -> ScratchGuard<'_> {
        let buffers = self.buffers.lock().pop().unwrap_or_default();
        ScratchGuard {
            pool: self,
            buffers,
        }
    }

    /// Number of idle buffer sets.
    pub fn available(&self) -> usize {
        self.buffers.lock().len()
    }

    fn release(&self, mut buffers: ScratchBuffers) {
        buffers.reset();
        let mut idle = self.buffers.lock();
        if idle.len() < self.capacity {
            idle.push(buffers);
        }
    }
}

pub struct ScratchGuard<'a> {
    pool: &'a ScratchPool,
    buffers: ScratchBuffers,
}

impl Deref for ScratchGuard<'_> {
    type Target = ScratchBuffers;

    fn deref(&self) -> &Self::Target {
        &self.buffers
    }
}

impl DerefMut for ScratchGuard<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.buffers
    }
}

impl Drop for ScratchGuard<'_> {
    fn drop(&mut self) {
        self.pool.release(std::mem::take(&mut self.buffers));
    }
}
