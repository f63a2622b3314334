use std::{
  collections::HashMap,
  sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
  },
};

use log::{debug, info};
use parking_lot::Mutex;

use crate::{
  error::{Error, Result},
  handle::{HandleId, MemoryHandle, check_cover},
  pool::FreeRangePool,
  range::RangeBlock,
  storage::Storage,
};

/// Largest capacity accepted unless a config raises it.
pub const DEFAULT_MAX_CAPACITY: usize = i32::MAX as usize;

static NEXT_SPACE_ID: AtomicU64 = AtomicU64::new(0);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
  pub capacity: usize,
  pub max_capacity: usize,
}

impl Config {
  pub fn new(capacity: usize) -> Self {
    Self {
      capacity,
      max_capacity: DEFAULT_MAX_CAPACITY,
    }
  }

  pub fn with_max_capacity(
    mut self,
    max_capacity: usize,
  ) -> Self {
    self.max_capacity = max_capacity;
    self
  }
}

/// Point-in-time view of an address space, taken under a single lock so
/// `available + live_bytes == capacity` always holds for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stats {
  pub capacity: usize,
  pub available: usize,
  pub live_count: usize,
  pub live_bytes: usize,
  pub free_ranges: usize,
}

#[derive(Debug)]
struct State {
  pool: FreeRangePool,
  live: HashMap<HandleId, usize>,
  next_handle: u64,
}

impl State {
  fn register(
    &mut self,
    size: usize,
  ) -> HandleId {
    let id = HandleId(self.next_handle);
    self.next_handle += 1;
    self.live.insert(id, size);
    id
  }
}

/// Everything handles and their space have in common.
#[derive(Debug)]
pub(crate) struct Shared {
  id: u64,
  capacity: usize,
  state: Mutex<State>,
  pub(crate) storage: Mutex<Storage>,
}

impl Shared {
  /// Deregisters `id` and puts its ranges back in the pool, atomically.
  pub(crate) fn reclaim(
    &self,
    id: HandleId,
    ranges: Vec<RangeBlock>,
  ) -> Result<()> {
    let mut state = self.state.lock();

    let Some(size) = state.live.remove(&id) else {
      return Err(Error::InvalidHandle(id));
    };

    state.pool.return_free_ranges(ranges);
    debug!(
      "space {}: released handle {id} ({size} units), {} available",
      self.id,
      state.pool.available()
    );

    Ok(())
  }
}

/// A fixed-capacity simulated memory region and the allocator over it.
///
/// Cloning is cheap and yields another view of the same region. All
/// allocator bookkeeping sits behind one lock, so allocations and releases
/// from different threads are serialized.
#[derive(Debug, Clone)]
pub struct AddressSpace {
  shared: Arc<Shared>,
}

impl AddressSpace {
  pub fn new(capacity: usize) -> Result<Self> {
    Self::with_config(Config::new(capacity))
  }

  pub fn with_config(config: Config) -> Result<Self> {
    let Config {
      capacity,
      max_capacity,
    } = config;

    if capacity == 0 {
      return Err(Error::InvalidArgument("capacity must be positive"));
    }

    if capacity > max_capacity {
      return Err(Error::InvalidArgument("capacity exceeds the maximum storage size"));
    }

    let storage = Storage::new(capacity)?;
    let pool = FreeRangePool::new(0, capacity)?;
    let id = NEXT_SPACE_ID.fetch_add(1, Ordering::Relaxed);

    info!("space {id}: created with {} units of storage", storage.len());

    Ok(Self {
      shared: Arc::new(Shared {
        id,
        capacity,
        state: Mutex::new(State {
          pool,
          live: HashMap::new(),
          next_handle: 0,
        }),
        storage: Mutex::new(storage),
      }),
    })
  }

  pub fn capacity(&self) -> usize {
    self.shared.capacity
  }

  pub fn available(&self) -> usize {
    self.shared.state.lock().pool.available()
  }

  /// Number of handles allocated and not yet released.
  pub fn live_count(&self) -> usize {
    self.shared.state.lock().live.len()
  }

  /// The free ranges in the order they will be handed out.
  pub fn free_ranges(&self) -> Vec<RangeBlock> {
    self.shared.state.lock().pool.iter().copied().collect()
  }

  pub fn stats(&self) -> Stats {
    let state = self.shared.state.lock();

    Stats {
      capacity: self.shared.capacity,
      available: state.pool.available(),
      live_count: state.live.len(),
      live_bytes: state.live.values().sum(),
      free_ranges: state.pool.len(),
    }
  }

  /// Reserves `size` units, possibly spread over several physical ranges.
  ///
  /// Fails with [`Error::OutOfMemory`] when fewer than `size` units are
  /// free in total; the pool is then left as it was.
  pub fn allocate(
    &self,
    size: usize,
  ) -> Result<MemoryHandle> {
    if size == 0 {
      return Err(Error::InvalidArgument("allocation size must be positive"));
    }

    let mut state = self.shared.state.lock();

    let ranges = state.pool.get_free_ranges(size)?;
    if let Err(err) = check_cover(&ranges, size) {
      state.pool.return_free_ranges(ranges);
      return Err(err);
    }

    let id = state.register(size);
    debug!(
      "space {}: allocated handle {id} ({size} units in {} ranges), {} available",
      self.shared.id,
      ranges.len(),
      state.pool.available()
    );
    drop(state);

    Ok(MemoryHandle::new(Arc::clone(&self.shared), id, ranges, size))
  }

  /// Returns `handle`'s ranges to the pool.
  ///
  /// Fails with [`Error::InvalidHandle`] for a handle issued by another
  /// space and with [`Error::AlreadyReleased`] on a second release.
  pub fn release(
    &self,
    handle: &mut MemoryHandle,
  ) -> Result<()> {
    if !handle.belongs_to(&self.shared) {
      return Err(Error::InvalidHandle(handle.id()));
    }

    handle.release()
  }
}
