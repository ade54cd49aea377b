//! Raw file channels.
//!
//! A channel is the primitive layer underneath [`RandomAccessFile`](crate::RandomAccessFile):
//! it knows how to seek, read, write and report its extent, and nothing else.
//! The wrapper does all validation and position bookkeeping on top of it, so any
//! channel (the OS-backed [`NativeChannel`], the in-memory
//! [`MemoryChannel`](crate::MemoryChannel), or a test double) can be swapped in.

use std::{
    fs::{File, OpenOptions, TryLockError},
    io::{self, Read, Seek, SeekFrom, Write},
    path::Path,
};

use log::debug;

use crate::options::Options;

/// Primitive operations over an open file.
pub trait RawChannel: Read + Write + Seek + Send {
    /// Current extent of the file in bytes.
    fn len(&self) -> io::Result<u64>;

    /// Releases whatever the channel holds open. Called at most once.
    fn close(&mut self) -> io::Result<()> { self.flush() }
}

/// Produces channels for paths.
pub trait Opener {
    type Channel: RawChannel;

    /// Opens `path` for simultaneous reading and writing.
    ///
    /// A missing file must be reported as [`io::ErrorKind::NotFound`] unless
    /// `options` asks for creation.
    fn open(&self, path: &Path, options: &Options) -> io::Result<Self::Channel>;
}

/// Opens files on the local file system.
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeOpener;

impl Opener for NativeOpener {
    type Channel = NativeChannel;

    fn open(&self, path: &Path, options: &Options) -> io::Result<NativeChannel> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(options.creates())
            .truncate(false)
            .open(path)?;

        match file.try_lock() {
            Ok(()) => {}
            Err(TryLockError::WouldBlock) => {
                return Err(io::Error::new(
                    io::ErrorKind::WouldBlock,
                    "file is locked by another handle",
                ));
            }
            Err(TryLockError::Error(err)) => return Err(err),
        }

        debug!("locked {} for random access", path.display());
        Ok(NativeChannel { file })
    }
}

/// A [`File`] holding an exclusive advisory lock for as long as it is open.
///
/// Dropping the channel closes the descriptor, which releases the lock too.
#[derive(Debug)]
pub struct NativeChannel {
    file: File,
}

impl Read for NativeChannel {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> { self.file.read(buf) }
}

impl Write for NativeChannel {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> { self.file.write(buf) }

    fn flush(&mut self) -> io::Result<()> { self.file.flush() }
}

impl Seek for NativeChannel {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> { self.file.seek(pos) }
}

impl RawChannel for NativeChannel {
    fn len(&self) -> io::Result<u64> { self.file.metadata().map(|meta| meta.len()) }

    fn close(&mut self) -> io::Result<()> {
        self.file.flush()?;
        self.file.unlock()
    }
}
