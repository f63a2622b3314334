use std::collections::VecDeque;

use log::{error, trace};

use crate::{
  error::{Error, Result},
  range::RangeBlock,
};

/// The set of currently unused ranges, served first-fit in arrival order.
///
/// ```text
///   front                                              back
///   ┌──────────┬──────────┬──────────┬─────────────────────┐
///   │ [1, 1)   │ [3, 1)   │ [9, 2)   │ residual of a split │
///   └──────────┴──────────┴──────────┴─────────────────────┘
///        ▲                                       ▲
///        └── next request starts here            └── returns land here
/// ```
///
/// Split residuals and returned ranges go to the back, so the oldest free
/// range is always reused first. Adjacent free ranges are never merged.
#[derive(Debug)]
pub struct FreeRangePool {
  ranges: VecDeque<RangeBlock>,
  available: usize,
  capacity: usize,
}

impl FreeRangePool {
  pub fn new(
    start: usize,
    size: usize,
  ) -> Result<Self> {
    let initial = RangeBlock::new(start, size)?;

    let mut ranges = VecDeque::new();
    ranges.push_back(initial);

    Ok(Self {
      ranges,
      available: size,
      capacity: size,
    })
  }

  pub fn available(&self) -> usize {
    self.available
  }

  /// Number of free ranges; grows with fragmentation.
  pub fn len(&self) -> usize {
    self.ranges.len()
  }

  pub fn is_empty(&self) -> bool {
    self.ranges.is_empty()
  }

  pub fn iter(&self) -> impl Iterator<Item = &RangeBlock> {
    self.ranges.iter()
  }

  /// Takes ranges from the front of the pool until `requested` units are
  /// covered, splitting the last one if it is larger than needed.
  ///
  /// Either the whole request is satisfied or the pool is left untouched.
  pub fn get_free_ranges(
    &mut self,
    requested: usize,
  ) -> Result<Vec<RangeBlock>> {
    if requested == 0 {
      return Err(Error::InvalidArgument("requested size must be positive"));
    }

    if requested > self.available {
      return Err(Error::OutOfMemory {
        requested,
        available: self.available,
      });
    }

    let mut taken = Vec::new();
    let mut remaining = requested;

    while remaining > 0 {
      let Some(front) = self.ranges.pop_front() else {
        return Err(self.rollback(taken, requested, remaining));
      };

      if front.size() <= remaining {
        remaining -= front.size();
        self.available -= front.size();
        taken.push(front);
        continue;
      }

      let (head, tail) = front.split_at(remaining)?;
      trace!(
        "split [{}, +{}) into [{}, +{}) and [{}, +{})",
        front.start(),
        front.size(),
        head.start(),
        head.size(),
        tail.start(),
        tail.size()
      );

      self.ranges.push_back(tail);
      self.available -= remaining;
      remaining = 0;
      taken.push(head);
    }

    Ok(taken)
  }

  /// Appends `ranges` to the back of the pool. Ownership of the ranges is
  /// not checked; callers hand back exactly what they were given, once.
  pub fn return_free_ranges<I>(
    &mut self,
    ranges: I,
  ) where
    I: IntoIterator<Item = RangeBlock>,
  {
    for range in ranges {
      trace!("returned [{}, +{})", range.start(), range.size());

      self.available += range.size();
      self.ranges.push_back(range);
    }

    debug_assert!(self.available <= self.capacity);
  }

  /// Puts back whatever a failed request consumed and builds the fatal error.
  fn rollback(
    &mut self,
    taken: Vec<RangeBlock>,
    requested: usize,
    remaining: usize,
  ) -> Error {
    for range in taken.into_iter().rev() {
      self.available += range.size();
      self.ranges.push_front(range);
    }

    let message = format!(
      "pool ran dry with {remaining} of {requested} units outstanding while tracking {} available",
      self.available
    );
    error!("{message}");

    Error::InternalInvariantViolation(message)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn spans(pool: &FreeRangePool) -> Vec<(usize, usize)> {
    pool.iter().map(|r| (r.start(), r.size())).collect()
  }

  #[test]
  fn test_new_validates_extent() {
    assert!(matches!(
      FreeRangePool::new(0, 0),
      Err(Error::InvalidArgument(_))
    ));

    let pool = FreeRangePool::new(4, 8).unwrap();
    assert_eq!(pool.available(), 8);
    assert_eq!(spans(&pool), vec![(4, 8)]);
  }

  #[test]
  fn test_split_appends_residual() {
    let mut pool = FreeRangePool::new(0, 10).unwrap();

    let taken = pool.get_free_ranges(3).unwrap();
    assert_eq!(taken, vec![RangeBlock::new(0, 3).unwrap()]);
    assert_eq!(pool.available(), 7);
    assert_eq!(spans(&pool), vec![(3, 7)]);
  }

  #[test]
  fn test_exact_fit_removes_range() {
    let mut pool = FreeRangePool::new(0, 4).unwrap();

    let taken = pool.get_free_ranges(4).unwrap();
    assert_eq!(taken.len(), 1);
    assert_eq!(pool.available(), 0);
    assert!(pool.is_empty());
  }

  #[test]
  fn test_multi_range_request_is_first_fit_by_arrival() {
    let mut pool = FreeRangePool::new(0, 10).unwrap();
    let _ = pool.get_free_ranges(10).unwrap();

    pool.return_free_ranges([
      RangeBlock::new(6, 2).unwrap(),
      RangeBlock::new(1, 1).unwrap(),
      RangeBlock::new(3, 3).unwrap(),
    ]);
    assert_eq!(pool.available(), 6);

    let taken = pool.get_free_ranges(4).unwrap();
    assert_eq!(
      taken,
      vec![
        RangeBlock::new(6, 2).unwrap(),
        RangeBlock::new(1, 1).unwrap(),
        RangeBlock::new(3, 1).unwrap(),
      ]
    );
    assert_eq!(spans(&pool), vec![(4, 2)]);
    assert_eq!(pool.available(), 2);
  }

  #[test]
  fn test_returned_ranges_are_not_merged() {
    let mut pool = FreeRangePool::new(0, 2).unwrap();
    let taken = pool.get_free_ranges(2).unwrap();
    assert!(pool.is_empty());

    pool.return_free_ranges(taken);
    pool.return_free_ranges(Vec::new());
    assert_eq!(spans(&pool), vec![(0, 2)]);

    let mut pool = FreeRangePool::new(0, 2).unwrap();
    let first = pool.get_free_ranges(1).unwrap();
    let second = pool.get_free_ranges(1).unwrap();
    pool.return_free_ranges(first);
    pool.return_free_ranges(second);

    assert_eq!(spans(&pool), vec![(0, 1), (1, 1)]);
    assert_eq!(pool.len(), 2);
  }

  #[test]
  fn test_rejected_requests_leave_pool_untouched() {
    let mut pool = FreeRangePool::new(0, 5).unwrap();

    assert!(matches!(
      pool.get_free_ranges(0),
      Err(Error::InvalidArgument(_))
    ));
    assert!(matches!(
      pool.get_free_ranges(6),
      Err(Error::OutOfMemory {
        requested: 6,
        available: 5
      })
    ));
    assert_eq!(spans(&pool), vec![(0, 5)]);
    assert_eq!(pool.available(), 5);
  }

  #[test]
  fn test_out_of_sync_counter_is_fatal() {
    let mut pool = FreeRangePool::new(0, 4).unwrap();
    pool.available = 6;

    let err = pool.get_free_ranges(5).unwrap_err();
    assert!(err.is_fatal());
    assert_eq!(spans(&pool), vec![(0, 4)]);
    assert_eq!(pool.available(), 6);
  }
}
