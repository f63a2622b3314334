use crate::error::{Error, Result};

/// A contiguous `[start, start + size)` run of the backing storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeBlock {
  start: usize,
  size: usize,
}

impl RangeBlock {
  pub fn new(
    start: usize,
    size: usize,
  ) -> Result<Self> {
    if size == 0 {
      return Err(Error::InvalidArgument("range size must be positive"));
    }

    if start.checked_add(size).is_none() {
      return Err(Error::InvalidArgument("range end overflows the address width"));
    }

    Ok(Self { start, size })
  }

  pub fn start(&self) -> usize {
    self.start
  }

  pub fn size(&self) -> usize {
    self.size
  }

  /// One past the last offset covered by this range.
  pub fn end(&self) -> usize {
    self.start + self.size
  }

  pub fn overlaps(
    &self,
    other: &RangeBlock,
  ) -> bool {
    self.start < other.end() && other.start < self.end()
  }

  /// Splits off the first `head` units, returning `(head, tail)`.
  ///
  /// `head` must be strictly between zero and `size`, otherwise one side
  /// would be empty.
  pub(crate) fn split_at(
    &self,
    head: usize,
  ) -> Result<(RangeBlock, RangeBlock)> {
    if head == 0 || head >= self.size {
      return Err(Error::InvalidArgument("split point must fall inside the range"));
    }

    Ok((
      RangeBlock::new(self.start, head)?,
      RangeBlock::new(self.start + head, self.size - head)?,
    ))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_rejects_empty_range() {
    assert!(matches!(RangeBlock::new(3, 0), Err(Error::InvalidArgument(_))));
    assert!(matches!(
      RangeBlock::new(usize::MAX, 2),
      Err(Error::InvalidArgument(_))
    ));
  }

  #[test]
  fn test_overlaps() {
    let a = RangeBlock::new(0, 4).unwrap();
    let b = RangeBlock::new(4, 2).unwrap();
    let c = RangeBlock::new(3, 2).unwrap();

    assert_eq!(a.end(), 4);
    assert!(!a.overlaps(&b));
    assert!(!b.overlaps(&a));
    assert!(a.overlaps(&c));
    assert!(c.overlaps(&b));
  }

  #[test]
  fn test_split_at() {
    let range = RangeBlock::new(10, 5).unwrap();

    let (head, tail) = range.split_at(2).unwrap();
    assert_eq!((head.start(), head.size()), (10, 2));
    assert_eq!((tail.start(), tail.size()), (12, 3));

    assert!(range.split_at(0).is_err());
    assert!(range.split_at(5).is_err());
  }
}
