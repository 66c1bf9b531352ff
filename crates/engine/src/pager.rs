//! Result paging state
//!
//! A [`ResultPager`] tracks one monotonically advancing position over a
//! fixed result count. It never rewinds and saturates at the end; the
//! result cursor drains it one position per pull.

/// Monotonic position over a fixed number of results
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultPager {
    offset: usize,
    count: usize,
}

impl ResultPager {
    /// Pager over `count` results, starting at position zero
    pub fn new(count: usize) -> Self {
        ResultPager { offset: 0, count }
    }

    /// Claim the current position and advance past it
    ///
    /// Returns `None` once every position has been handed out.
    pub fn advance(&mut self) -> Option<usize> {
        if self.offset >= self.count {
            return None;
        }
        let current = self.offset;
        self.offset += 1;
        Some(current)
    }

    /// Total number of results under the pager
    pub fn count(&self) -> usize {
        self.count
    }

    /// Positions not yet handed out
    pub fn remaining(&self) -> usize {
        self.count - self.offset
    }

    /// True once `advance` has handed out every position
    pub fn is_exhausted(&self) -> bool {
        self.offset >= self.count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_advance_walks_every_position_once() {
        let mut pager = ResultPager::new(3);
        assert_eq!(pager.advance(), Some(0));
        assert_eq!(pager.advance(), Some(1));
        assert_eq!(pager.advance(), Some(2));
        assert_eq!(pager.advance(), None);
        assert_eq!(pager.advance(), None);
    }

    #[test]
    fn test_remaining_tracks_advance() {
        let mut pager = ResultPager::new(2);
        assert_eq!(pager.remaining(), 2);
        pager.advance();
        assert_eq!(pager.remaining(), 1);
        pager.advance();
        assert_eq!(pager.remaining(), 0);
        assert!(pager.is_exhausted());
    }

    #[test]
    fn test_zero_count_starts_exhausted() {
        let mut pager = ResultPager::new(0);
        assert!(pager.is_exhausted());
        assert_eq!(pager.advance(), None);
    }
}
