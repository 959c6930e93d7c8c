//! Countdown latch aggregating sub-object load completion

/// Counts outstanding sub-object loads of one rebuild
///
/// A rebuild arms the latch with one sentinel count before creating
/// sub-objects, adds one count per sub-object and counts the sentinel down
/// once all sub-objects exist. Sub-objects finishing synchronously during
/// creation therefore cannot release the latch early.
#[derive(Debug, Default)]
pub struct LoadLatch {
    count: usize,
}

impl LoadLatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset the latch to the sentinel count
    pub fn arm(&mut self) {
        self.count = 1;
    }

    /// Register one more outstanding load
    pub fn add(&mut self) {
        self.count += 1;
    }

    /// Count one load down. Returns true if this released the latch.
    pub fn count_down(&mut self) -> bool {
        if self.count == 0 {
            log::warn!("Load latch counted down while already released");
            return false;
        }
        self.count -= 1;
        self.count == 0
    }

    pub fn is_released(&self) -> bool {
        self.count == 0
    }

    /// Outstanding loads including the sentinel
    pub fn pending(&self) -> usize {
        self.count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sentinel_holds_latch() {
        let mut latch = LoadLatch::new();
        latch.arm();
        latch.add();
        latch.add();

        assert!(!latch.count_down());
        assert!(!latch.count_down());
        assert_eq!(latch.pending(), 1);
        assert!(latch.count_down());
        assert!(latch.is_released());
    }

    #[test]
    fn test_no_work_releases_on_sentinel() {
        let mut latch = LoadLatch::new();
        latch.arm();
        assert!(latch.count_down());
    }

    #[test]
    fn test_underflow_is_ignored() {
        let mut latch = LoadLatch::new();
        assert!(latch.is_released());
        assert!(!latch.count_down());
        assert_eq!(latch.pending(), 0);
    }
}
