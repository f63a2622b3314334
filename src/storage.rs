use std::{io, ptr, ptr::NonNull, slice};

use libc::{MAP_ANONYMOUS, MAP_FAILED, MAP_PRIVATE, PROT_READ, PROT_WRITE, c_void};

use crate::{
  align::page_size,
  align_to,
  error::{Error, Result},
};

/// The flat buffer every handle reads and writes through.
///
/// Backed by a private anonymous mapping so the OS hands out zeroed pages
/// lazily; a large capacity costs nothing until it is touched.
///
/// ```text
///   mapped (page aligned)
///   ┌─────────────────────────────────────────┬─────────┐
///   │              len usable bytes           │ padding │
///   └─────────────────────────────────────────┴─────────┘
///   ▲
///   └── ptr
/// ```
pub struct Storage {
  ptr: NonNull<u8>,
  len: usize,
  mapped: usize,
}

// The mapping is owned exclusively by this value and only reached through it.
unsafe impl Send for Storage {}

impl Storage {
  pub fn new(len: usize) -> Result<Self> {
    let page = page_size();

    if len == 0 {
      return Err(Error::InvalidArgument("storage length must be positive"));
    }

    if len > isize::MAX as usize - page {
      return Err(Error::InvalidArgument("storage length exceeds the address space"));
    }

    let mapped = align_to!(len, page);

    let address = unsafe {
      libc::mmap(
        ptr::null_mut(),
        mapped,
        PROT_READ | PROT_WRITE,
        MAP_PRIVATE | MAP_ANONYMOUS,
        -1,
        0,
      )
    };

    if address == MAP_FAILED {
      return Err(Error::Map(io::Error::last_os_error()));
    }

    let ptr = NonNull::new(address as *mut u8)
      .ok_or_else(|| Error::Map(io::Error::other("mmap returned null")))?;

    Ok(Self { ptr, len, mapped })
  }

  pub fn len(&self) -> usize {
    self.len
  }

  pub fn as_slice(&self) -> &[u8] {
    unsafe { slice::from_raw_parts(self.ptr.as_ptr(), self.len) }
  }

  pub fn as_mut_slice(&mut self) -> &mut [u8] {
    unsafe { slice::from_raw_parts_mut(self.ptr.as_ptr(), self.len) }
  }
}

impl Drop for Storage {
  fn drop(&mut self) {
    unsafe {
      libc::munmap(self.ptr.as_ptr() as *mut c_void, self.mapped);
    }
  }
}

impl std::fmt::Debug for Storage {
  fn fmt(
    &self,
    f: &mut std::fmt::Formatter<'_>,
  ) -> std::fmt::Result {
    f.debug_struct("Storage")
      .field("ptr", &self.ptr)
      .field("len", &self.len)
      .field("mapped", &self.mapped)
      .finish()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_storage_is_zeroed_and_writable() {
    let mut storage = Storage::new(10).unwrap();

    assert_eq!(storage.len(), 10);
    assert!(storage.as_slice().iter().all(|b| *b == 0));

    storage.as_mut_slice()[9] = 0xAB;
    assert_eq!(storage.as_slice()[9], 0xAB);
  }

  #[test]
  fn test_mapping_is_page_aligned() {
    let storage = Storage::new(page_size() + 1).unwrap();

    assert_eq!(storage.mapped, 2 * page_size());
    assert_eq!(storage.ptr.as_ptr() as usize % page_size(), 0);
  }

  #[test]
  fn test_rejects_bad_lengths() {
    assert!(matches!(Storage::new(0), Err(Error::InvalidArgument(_))));
    assert!(matches!(
      Storage::new(usize::MAX),
      Err(Error::InvalidArgument(_))
    ));
  }
}
