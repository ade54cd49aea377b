//! Random-access files: read and write at arbitrary byte offsets.
//!
//! [`RandomAccessFile`] keeps its own cursor and does the argument checks and
//! end-of-file bookkeeping; the actual I/O goes through a [`RawChannel`]
//! produced by an [`Opener`]. [`NativeOpener`] targets the local file system,
//! [`MemoryFileSystem`] keeps everything in memory.
//!
//! # Examples
//!
//! ```rust
//! use rafile::{MemoryFileSystem, Newline, Options, RandomAccessError, RandomAccessFile};
//!
//! # fn main() -> rafile::Result<()> {
//! let fs = MemoryFileSystem::new();
//! let mut file = RandomAccessFile::with_opener(fs)
//!     .with_options(Options::new().newline(Newline::Lf).create(true));
//!
//! file.open("/notes.txt")?;
//! file.write_line("first")?;
//! file.write_line("second")?;
//!
//! file.go_to_beginning()?;
//! assert_eq!(file.read_line()?, "first");
//! assert_eq!(file.read_lines()?, vec!["second"]);
//! assert_eq!(file.read_to_end(), Err(RandomAccessError::EndOfFile));
//!
//! file.close()?;
//! # Ok(())
//! # }
//! ```

pub mod channel;
pub mod error;
mod file;
mod memory;
mod options;
mod random_access;

pub use channel::{NativeChannel, NativeOpener, Opener, RawChannel};
pub use error::RandomAccessError;
pub use memory::{MemoryChannel, MemoryFileSystem};
pub use options::{Newline, Options};
pub use random_access::RandomAccessFile;

pub type Result<T> = std::result::Result<T, RandomAccessError>;
