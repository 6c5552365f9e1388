/// Configuration for a single [`crate::Ring`].
///
/// A sink's ring may have an arbitrary capacity, so this stores a plain
/// slot count and indexes with a modulo rather than a power-of-two mask.
#[derive(Debug, Clone, Copy)]
pub struct Config {
    /// Number of slots in the ring.
    pub capacity: usize,
}

impl Config {
    /// Creates a new configuration with the given capacity.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    pub const fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "ring capacity must be at least 1");
        Self { capacity }
    }
}

impl Default for Config {
    /// Matches the console sink's default (64 events per ring).
    fn default() -> Self {
        Self { capacity: 64 }
    }
}
