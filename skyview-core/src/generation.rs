use std::sync::atomic::{AtomicU64, Ordering};

/// Tag for one user-initiated async sequence.
///
/// Results carry the generation they were started under and are only applied
/// while it is still the latest one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Generation(u64);

impl Generation {
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl std::fmt::Display for Generation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Shareable monotonically increasing counter.
#[derive(Debug, Default)]
pub struct GenerationCounter(AtomicU64);

impl GenerationCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new sequence, superseding every earlier one.
    pub fn advance(&self) -> Generation {
        Generation(self.0.fetch_add(1, Ordering::SeqCst) + 1)
    }

    pub fn current(&self) -> Generation {
        Generation(self.0.load(Ordering::SeqCst))
    }

    pub fn is_current(&self, generation: Generation) -> bool {
        self.current() == generation
    }
}
