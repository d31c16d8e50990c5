use std::fmt;

/// A simple type for sequence coordinate ranges
///
/// All ranges follow the bed file range convention: 0-indexed, half-closed, [start,end)
///
/// An empty range (start == end) is meaningful here: it marks the junction point of a pure
/// insertion on the reference, or of a pure deletion on the consensus.
///
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd)]
pub struct IntRange {
    pub start: i64,
    pub end: i64,
}

impl IntRange {
    pub fn from_pair(start: i64, end: i64) -> Self {
        Self { start, end }
    }

    pub fn size(&self) -> i64 {
        self.end - self.start
    }

    pub fn as_usize_range(&self) -> std::ops::Range<usize> {
        (self.start as usize)..(self.end as usize)
    }
}

impl fmt::Debug for IntRange {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "[{}-{})", self.start, self.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_range() {
        let r = IntRange::from_pair(5, 5);
        assert_eq!(r.size(), 0);
        assert_eq!(r.as_usize_range(), 5..5);

        let r = IntRange::from_pair(5, 8);
        assert_eq!(r.size(), 3);
    }

    #[test]
    fn test_range_format() {
        let r = IntRange::from_pair(12, 14);
        assert_eq!(r.as_usize_range(), 12..14);
        assert_eq!(format!("{r:?}"), "[12-14)");
    }
}
