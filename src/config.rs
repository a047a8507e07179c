//! Stream tuning knobs.

/// Bytes reserved on the first non-empty write.
pub const DEFAULT_INITIAL_CAPACITY: usize = 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamConfig {
    /// Minimum capacity reserved when storage is first allocated.
    /// Zero defers to the allocator's own growth policy.
    pub initial_capacity: usize,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            initial_capacity: DEFAULT_INITIAL_CAPACITY,
        }
    }
}

impl StreamConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn initial_capacity(mut self, bytes: usize) -> Self {
        self.initial_capacity = bytes;
        self
    }
}
