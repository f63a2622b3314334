use std::io;

use thiserror::Error;

use crate::handle::HandleId;

#[derive(Error, Debug)]
pub enum Error {
  #[error("invalid argument: {0}")]
  InvalidArgument(&'static str),
  #[error("requested {requested} units but only {available} are available")]
  OutOfMemory { requested: usize, available: usize },
  #[error("index {index} is out of range for a block of size {size}")]
  IndexOutOfRange { index: usize, size: usize },
  #[error("handle {0} does not belong to this address space")]
  InvalidHandle(HandleId),
  #[error("handle {0} was already released")]
  AlreadyReleased(HandleId),
  /// The pool's bookkeeping no longer matches its contents. Never recoverable.
  #[error("internal invariant violated: {0}")]
  InternalInvariantViolation(String),
  #[error("failed to map backing storage: {0}")]
  Map(#[from] io::Error),
}

impl Error {
  pub fn is_fatal(&self) -> bool {
    matches!(self, Error::InternalInvariantViolation(_))
  }
}

pub type Result<T> = std::result::Result<T, Error>;
