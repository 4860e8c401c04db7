use std::{
    cmp::{max, min},
    ops::{Index, Range},
};

/// A byte range within some source text.
///
/// Errors hold on to a `Region` so they can point at the offending text
/// when displayed.
#[derive(Debug, PartialEq, Copy, Clone)]
pub struct Region {
    /// First byte of the range, inclusive.
    pub begin: usize,
    /// Last byte of the range, exclusive.
    pub end: usize,
}

impl Region {
    /// Create a new Region from the given range.
    pub fn new(range: Range<usize>) -> Self {
        Self {
            begin: range.start,
            end: range.end,
        }
    }

    /// Return a Region spanning both this Region and the given one.
    pub fn combine(self, other: Self) -> Self {
        Self {
            begin: min(self.begin, other.begin),
            end: max(self.end, other.end),
        }
    }

    /// Return the text this Region covers within the given source.
    ///
    /// # Panics
    ///
    /// Panics when the Region is out of bounds in the source, which means
    /// the Region was created over different text.
    pub fn literal<'source>(&self, source: &'source str) -> &'source str {
        source
            .get(self.begin..self.end)
            .expect("region should always be in bounds of its source")
    }
}

impl Index<Region> for str {
    type Output = str;

    fn index(&self, region: Region) -> &Self::Output {
        &self[region.begin..region.end]
    }
}

impl From<Range<usize>> for Region {
    fn from(value: Range<usize>) -> Self {
        Self {
            begin: value.start,
            end: value.end,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_combine() {
        let combined = Region::new(5..10).combine(Region::new(8..15));

        assert_eq!(combined, Region::new(5..15));
    }

    #[test]
    fn test_literal() {
        let source = "$for n in nums";

        assert_eq!(Region::new(1..4).literal(source), "for");
        assert_eq!(&source[Region::new(5..6)], "n");
    }

    #[test]
    #[should_panic]
    fn test_literal_out_of_bounds() {
        Region::new(10..20).literal("too short");
    }
}
