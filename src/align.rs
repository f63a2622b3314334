/// Rounds `value` up to the next multiple of `align`, which must be a power
/// of two.
///
/// # Examples
///
/// ```rust
/// use rangealloc::align_to;
///
/// assert_eq!(align_to!(1, 4096), 4096);
/// assert_eq!(align_to!(4096, 4096), 4096);
/// assert_eq!(align_to!(4097, 4096), 8192);
/// ```
#[macro_export]
macro_rules! align_to {
  ($value:expr, $align:expr) => {
    ($value + $align - 1) & !($align - 1)
  };
}

const FALLBACK_PAGE_SIZE: usize = 4096;

/// Size of a virtual memory page as reported by the OS.
pub fn page_size() -> usize {
  let size = unsafe { libc::sysconf(libc::_SC_PAGESIZE) };

  if size > 0 && (size as usize).is_power_of_two() {
    size as usize
  } else {
    FALLBACK_PAGE_SIZE
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_align_to() {
    let page = page_size();

    let mut alignments = Vec::new();

    for i in 0..10 {
      let sizes = (page * i + 1)..=(page * (i + 1));

      let expected_alignment = page * (i + 1);

      alignments.push((sizes, expected_alignment));
    }

    for (sizes, expected) in alignments {
      for size in sizes.step_by(511) {
        assert_eq!(expected, align_to!(size, page));
      }
      assert_eq!(expected, align_to!(expected, page));
    }
  }

  #[test]
  fn test_page_size_is_power_of_two() {
    assert!(page_size().is_power_of_two());
  }
}
