use clap::Parser;
use log::LevelFilter;
use rangealloc::{AddressSpace, Error, MemoryHandle};
use simple_logger::SimpleLogger;

/// Walks an address space through allocation, fragmentation and reuse.
#[derive(Parser, Debug)]
#[clap(name = "fragmentation")]
struct Args {
  /// Number of units in the simulated memory region.
  #[clap(long, env = "RANGEALLOC_CAPACITY", default_value = "5")]
  capacity: usize,

  /// Log level for the allocator (error, warn, info, debug, trace).
  #[clap(long, env = "RANGEALLOC_LOG", default_value = "info")]
  log_level: LevelFilter,
}

/// Prints the pool in the order requests will consume it.
fn print_pool(
  label: &str,
  space: &AddressSpace,
) {
  let stats = space.stats();
  let ranges: Vec<String> = space
    .free_ranges()
    .iter()
    .map(|r| format!("[{}, +{})", r.start(), r.size()))
    .collect();

  println!(
    "[{}] available = {}/{}, live = {}, pool = {}",
    label,
    stats.available,
    stats.capacity,
    stats.live_count,
    ranges.join(" ")
  );
}

fn print_handle(
  label: &str,
  handle: &MemoryHandle,
) {
  let ranges: Vec<String> = handle
    .ranges()
    .iter()
    .map(|r| format!("[{}, +{})", r.start(), r.size()))
    .collect();

  println!(
    "[{}] handle {} of size {} backed by {}",
    label,
    handle.id(),
    handle.size(),
    ranges.join(" ")
  );
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
  let args = Args::parse();

  SimpleLogger::new().with_level(args.log_level).init()?;

  if args.capacity < 5 {
    return Err("the demo needs a capacity of at least 5".into());
  }

  let space = AddressSpace::new(args.capacity)?;
  print_pool("start", &space);

  // --------------------------------------------------------------------
  // 1) Five single-unit blocks, one letter each.
  // --------------------------------------------------------------------
  let mut blocks = Vec::new();
  for letter in b"abcde" {
    let mut block = space.allocate(1)?;
    block.write(0, *letter)?;
    blocks.push(block);
  }
  print_pool("1", &space);

  // --------------------------------------------------------------------
  // 2) Punch two holes: release the 'b' and 'd' blocks.
  // --------------------------------------------------------------------
  space.release(&mut blocks[1])?;
  space.release(&mut blocks[3])?;
  print_pool("2", &space);

  // --------------------------------------------------------------------
  // 3) A two-unit request is stitched together from the holes,
  //    plus whatever residual a larger capacity left behind.
  // --------------------------------------------------------------------
  let mut joined = space.allocate(2)?;
  joined.write_slice(0, b"XY")?;
  print_handle("3", &joined);
  println!("[3] contents = {:?}", String::from_utf8_lossy(&joined.read_range(0, 2)?));
  print_pool("3", &space);

  // --------------------------------------------------------------------
  // 4) Releasing twice is refused instead of crediting the pool again.
  // --------------------------------------------------------------------
  space.release(&mut joined)?;
  match space.release(&mut joined) {
    Err(Error::AlreadyReleased(id)) => println!("[4] second release of {} refused", id),
    other => println!("[4] unexpected result {:?}", other),
  }

  // --------------------------------------------------------------------
  // 5) Everything goes back; the whole region is allocatable again,
  //    now as a chain of fragments.
  // --------------------------------------------------------------------
  drop(blocks);
  print_pool("5", &space);

  let whole = space.allocate(space.capacity())?;
  print_handle("5", &whole);

  println!("\n[6] End of demo.");
  Ok(())
}
