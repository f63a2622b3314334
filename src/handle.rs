use std::{fmt, mem, sync::Arc};

use log::error;

use crate::{
  error::{Error, Result},
  range::RangeBlock,
  space::Shared,
};

/// Identifies a handle within the address space that issued it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HandleId(pub(crate) u64);

impl fmt::Display for HandleId {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>,
  ) -> fmt::Result {
    write!(f, "#{}", self.0)
  }
}

/// One outstanding allocation.
///
/// The logical block `[0, size)` is stitched together from the physical
/// ranges in order:
///
/// ```text
///   logical   0   1   2   3   4
///           ┌───┬───┬───┬───┬───┐
///           │ a │ b │ c │ d │ e │
///           └───┴───┴───┴───┴───┘
///             └─┬─┘   └───┬───┘
///   physical  [7, +2)   [2, +3)
/// ```
///
/// Dropping a handle that was never released gives its ranges back.
#[derive(Debug)]
pub struct MemoryHandle {
  id: HandleId,
  size: usize,
  ranges: Vec<RangeBlock>,
  released: bool,
  space: Arc<Shared>,
}

/// Checks that `ranges` supply exactly `size` units.
pub(crate) fn check_cover(
  ranges: &[RangeBlock],
  size: usize,
) -> Result<()> {
  if size == 0 {
    return Err(Error::InvalidArgument("handle size must be positive"));
  }

  if ranges.is_empty() {
    return Err(Error::InvalidArgument("handle needs at least one range"));
  }

  let covered: usize = ranges.iter().map(RangeBlock::size).sum();
  if covered != size {
    return Err(Error::InternalInvariantViolation(format!(
      "ranges cover {covered} units for a handle of size {size}"
    )));
  }

  Ok(())
}

impl MemoryHandle {
  /// `ranges` must already have passed [`check_cover`] for `size`.
  pub(crate) fn new(
    space: Arc<Shared>,
    id: HandleId,
    ranges: Vec<RangeBlock>,
    size: usize,
  ) -> Self {
    Self {
      id,
      size,
      ranges,
      released: false,
      space,
    }
  }

  pub fn id(&self) -> HandleId {
    self.id
  }

  pub fn size(&self) -> usize {
    self.size
  }

  /// Physical ranges backing this block, in logical order. Empty once
  /// released.
  pub fn ranges(&self) -> &[RangeBlock] {
    &self.ranges
  }

  pub fn is_released(&self) -> bool {
    self.released
  }

  pub(crate) fn belongs_to(
    &self,
    space: &Arc<Shared>,
  ) -> bool {
    Arc::ptr_eq(&self.space, space)
  }

  pub fn read(
    &self,
    index: usize,
  ) -> Result<u8> {
    let offset = self.translate(index)?;

    Ok(self.space.storage.lock().as_slice()[offset])
  }

  pub fn write(
    &mut self,
    index: usize,
    value: u8,
  ) -> Result<()> {
    let offset = self.translate(index)?;

    self.space.storage.lock().as_mut_slice()[offset] = value;
    Ok(())
  }

  /// Copies `len` units starting at logical `start`, crossing range
  /// boundaries as needed.
  pub fn read_range(
    &self,
    start: usize,
    len: usize,
  ) -> Result<Vec<u8>> {
    let chunks = self.chunks(start, len)?;
    let storage = self.space.storage.lock();

    let mut out = Vec::with_capacity(len);
    for (offset, count) in chunks {
      out.extend_from_slice(&storage.as_slice()[offset..offset + count]);
    }

    Ok(out)
  }

  pub fn write_slice(
    &mut self,
    start: usize,
    bytes: &[u8],
  ) -> Result<()> {
    let chunks = self.chunks(start, bytes.len())?;
    let mut storage = self.space.storage.lock();

    let mut cursor = 0;
    for (offset, count) in chunks {
      storage.as_mut_slice()[offset..offset + count]
        .copy_from_slice(&bytes[cursor..cursor + count]);
      cursor += count;
    }

    Ok(())
  }

  /// Gives the ranges back to the pool. Only the first call succeeds.
  pub fn release(&mut self) -> Result<()> {
    if self.released {
      return Err(Error::AlreadyReleased(self.id));
    }

    self.released = true;
    let ranges = mem::take(&mut self.ranges);

    self.space.reclaim(self.id, ranges)
  }

  fn ensure_live(&self) -> Result<()> {
    if self.released {
      return Err(Error::AlreadyReleased(self.id));
    }

    Ok(())
  }

  /// Maps a logical index to its physical offset in the storage.
  fn translate(
    &self,
    index: usize,
  ) -> Result<usize> {
    self.ensure_live()?;

    if index >= self.size {
      return Err(Error::IndexOutOfRange {
        index,
        size: self.size,
      });
    }

    let mut rest = index;
    for range in &self.ranges {
      if rest < range.size() {
        return Ok(range.start() + rest);
      }
      rest -= range.size();
    }

    Err(Error::InternalInvariantViolation(format!(
      "index {index} not covered by the ranges of handle {}",
      self.id
    )))
  }

  /// Physical `(offset, count)` pieces covering logical `[start, start + len)`.
  fn chunks(
    &self,
    start: usize,
    len: usize,
  ) -> Result<Vec<(usize, usize)>> {
    self.ensure_live()?;

    let in_bounds = start
      .checked_add(len)
      .is_some_and(|end| end <= self.size);
    if !in_bounds {
      return Err(Error::IndexOutOfRange {
        index: start.max(self.size),
        size: self.size,
      });
    }

    let mut chunks = Vec::new();
    let mut skip = start;
    let mut wanted = len;

    for range in &self.ranges {
      if wanted == 0 {
        break;
      }

      if skip >= range.size() {
        skip -= range.size();
        continue;
      }

      let count = (range.size() - skip).min(wanted);
      chunks.push((range.start() + skip, count));
      skip = 0;
      wanted -= count;
    }

    if wanted > 0 {
      return Err(Error::InternalInvariantViolation(format!(
        "handle {} is short of {wanted} units",
        self.id
      )));
    }

    Ok(chunks)
  }
}

impl Drop for MemoryHandle {
  fn drop(&mut self) {
    if self.released {
      return;
    }

    if let Err(err) = self.release() {
      error!("failed to release handle {} on drop: {err}", self.id);
    }
  }
}
