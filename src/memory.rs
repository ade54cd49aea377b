use std::{
    collections::HashMap,
    io::{self, Read, Seek, SeekFrom, Write},
    path::Path,
    sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard},
};

use log::{debug, trace};

use crate::{
    Result,
    channel::{Opener, RawChannel},
    error::RandomAccessError,
    file::FileData,
    options::Options,
};

type Files = Arc<RwLock<HashMap<String, FileData>>>;

/// An in-memory file system that stores files as byte arrays.
///
/// Clones share the same files. Besides the direct offset-based API it acts as
/// an [`Opener`], so a [`RandomAccessFile`](crate::RandomAccessFile) can run
/// against it exactly as against the disk.
///
/// # Examples
///
/// ```rust
/// use rafile::MemoryFileSystem;
///
/// # fn main() -> rafile::Result<()> {
/// let fs = MemoryFileSystem::new();
///
/// fs.touch("/log.txt")?;
/// fs.write("/log.txt", 0, b"hello")?;
/// fs.write("/log.txt", 5, b" world")?;
///
/// assert_eq!(fs.read("/log.txt", 0, 11)?, b"hello world");
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryFileSystem {
    files: Files,
}

impl MemoryFileSystem {
    /// Creates a new empty file system.
    pub fn new() -> Self { Self::default() }

    /// Creates a file at `path` if it doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns `RandomAccessError::InvalidArgument` if the path is empty.
    pub fn touch(&self, path: &str) -> Result<()> {
        check_path(path)?;
        let mut files = write_lock(&self.files)?;
        files.entry(path.to_string()).or_insert_with(FileData::new);
        Ok(())
    }

    /// Writes `data` at `offset`, creating the file if needed and zero-filling
    /// any gap past the current end.
    ///
    /// # Errors
    ///
    /// Returns `RandomAccessError::InvalidArgument` if the path is empty.
    /// Returns `RandomAccessError::InputOutput` if the write would overflow,
    /// the file cannot grow that far, or a channel holds the file.
    pub fn write(&self, path: &str, offset: usize, data: &[u8]) -> Result<()> {
        check_path(path)?;
        if offset.checked_add(data.len()).is_none() {
            return Err(RandomAccessError::InputOutput(
                "Write operation would cause overflow".to_string(),
            ));
        }

        let mut files = write_lock(&self.files)?;
        let file = files.entry(path.to_string()).or_insert_with(FileData::new);
        if file.is_held() {
            return Err(RandomAccessError::InputOutput(format!("{path} is open")));
        }
        file.write_at(offset, data)?;
        Ok(())
    }

    /// Reads up to `len` bytes starting at `offset`.
    ///
    /// A missing file, or an offset past the end, yields an empty vector. The
    /// result is shorter than `len` when the file ends first.
    ///
    /// # Errors
    ///
    /// Returns `RandomAccessError::InvalidArgument` if the path is empty.
    /// Returns `RandomAccessError::InputOutput` if the read would overflow.
    pub fn read(&self, path: &str, offset: usize, len: usize) -> Result<Vec<u8>> {
        check_path(path)?;
        if len == 0 {
            return Ok(Vec::new());
        }
        if offset.checked_add(len).is_none() {
            return Err(RandomAccessError::InputOutput(
                "Read operation would cause overflow".to_string(),
            ));
        }

        let files = read_lock(&self.files)?;
        match files.get(path) {
            Some(file) => {
                let mut buf = vec![0; len.min(file.len().saturating_sub(offset))];
                let count = file.read_at(offset, &mut buf);
                buf.truncate(count);
                Ok(buf)
            }
            None => Ok(Vec::new()),
        }
    }

    pub fn exists(&self, path: &str) -> Result<bool> {
        Ok(read_lock(&self.files)?.contains_key(path))
    }

    /// Size of the file at `path`, or `None` if it does not exist.
    pub fn len(&self, path: &str) -> Result<Option<usize>> {
        Ok(read_lock(&self.files)?.get(path).map(FileData::len))
    }

    /// Deletes the file at `path`. Removing a missing file is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `RandomAccessError::InputOutput` while a channel holds the file.
    pub fn remove(&self, path: &str) -> Result<()> {
        let mut files = write_lock(&self.files)?;
        if files.get(path).is_some_and(FileData::is_held) {
            return Err(RandomAccessError::InputOutput(format!("{path} is open")));
        }
        files.remove(path);
        Ok(())
    }
}

impl Opener for MemoryFileSystem {
    type Channel = MemoryChannel;

    fn open(&self, path: &Path, options: &Options) -> io::Result<MemoryChannel> {
        let key = path.to_string_lossy().into_owned();
        if key.is_empty() {
            return Err(io::Error::new(io::ErrorKind::InvalidInput, "path cannot be empty"));
        }

        let mut files = self.files.write().map_err(|_| poisoned())?;
        if !files.contains_key(&key) {
            if !options.creates() {
                return Err(io::Error::new(io::ErrorKind::NotFound, key));
            }
            files.insert(key.clone(), FileData::new());
        }

        let file = files.get_mut(&key).ok_or_else(|| io::Error::from(io::ErrorKind::NotFound))?;
        if file.is_held() {
            return Err(io::Error::new(
                io::ErrorKind::WouldBlock,
                "file is locked by another handle",
            ));
        }
        file.set_held(true);

        debug!("memory channel opened for {key}");
        Ok(MemoryChannel {
            files: Arc::clone(&self.files),
            key,
            cursor: 0,
            released: false,
        })
    }
}

/// A channel over one file of a [`MemoryFileSystem`].
#[derive(Debug)]
pub struct MemoryChannel {
    files: Files,
    key: String,
    cursor: u64,
    released: bool,
}

impl MemoryChannel {
    fn cursor(&self) -> io::Result<usize> {
        usize::try_from(self.cursor)
            .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "offset out of range"))
    }

    fn release(&mut self) -> io::Result<()> {
        if self.released {
            return Ok(());
        }
        self.released = true;

        let mut files = self.files.write().map_err(|_| poisoned())?;
        if let Some(file) = files.get_mut(&self.key) {
            file.set_held(false);
        }
        debug!("memory channel released {}", self.key);
        Ok(())
    }
}

impl Read for MemoryChannel {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let offset = self.cursor()?;
        let files = self.files.read().map_err(|_| poisoned())?;
        let file = files.get(&self.key).ok_or_else(|| io::Error::from(io::ErrorKind::NotFound))?;

        let count = file.read_at(offset, buf);
        self.cursor += count as u64;
        trace!("memory read {count} bytes at {offset} from {}", self.key);
        Ok(count)
    }
}

impl Write for MemoryChannel {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let offset = self.cursor()?;
        if offset.checked_add(buf.len()).is_none() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "Write operation would cause overflow",
            ));
        }

        let mut files = self.files.write().map_err(|_| poisoned())?;
        let file =
            files.get_mut(&self.key).ok_or_else(|| io::Error::from(io::ErrorKind::NotFound))?;

        file.write_at(offset, buf)?;
        self.cursor += buf.len() as u64;
        trace!("memory wrote {} bytes at {offset} to {}", buf.len(), self.key);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> { Ok(()) }
}

impl Seek for MemoryChannel {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let (base, delta) = match pos {
            SeekFrom::Start(offset) => {
                self.cursor = offset;
                return Ok(offset);
            }
            SeekFrom::End(delta) => (self.len()?, delta),
            SeekFrom::Current(delta) => (self.cursor, delta),
        };

        match base.checked_add_signed(delta) {
            Some(offset) => {
                self.cursor = offset;
                Ok(offset)
            }
            None => Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "invalid seek to a negative or overflowing position",
            )),
        }
    }
}

impl RawChannel for MemoryChannel {
    fn len(&self) -> io::Result<u64> {
        let files = self.files.read().map_err(|_| poisoned())?;
        files
            .get(&self.key)
            .map(|file| file.len() as u64)
            .ok_or_else(|| io::Error::from(io::ErrorKind::NotFound))
    }

    fn close(&mut self) -> io::Result<()> { self.release() }
}

impl Drop for MemoryChannel {
    fn drop(&mut self) { let _ = self.release(); }
}

fn check_path(path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(RandomAccessError::InvalidArgument("Path cannot be empty".to_string()));
    }
    Ok(())
}

fn poisoned() -> io::Error { io::Error::other("memory file system lock poisoned") }

fn read_lock(files: &Files) -> Result<RwLockReadGuard<'_, HashMap<String, FileData>>> {
    files.read().map_err(|_| poisoned().into())
}

fn write_lock(files: &Files) -> Result<RwLockWriteGuard<'_, HashMap<String, FileData>>> {
    files.write().map_err(|_| poisoned().into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_operations() -> Result<()> {
        let fs = MemoryFileSystem::new();

        fs.touch("/log.txt")?;

        fs.write("/log.txt", 0, b"hello")?;
        fs.write("/log.txt", 5, b" world")?;

        let content = fs.read("/log.txt", 0, 11)?;
        assert_eq!(content, b"hello world");

        Ok(())
    }

    #[test]
    fn test_read_beyond_file() -> Result<()> {
        let fs = MemoryFileSystem::new();

        fs.write("/test.txt", 0, b"hello")?;

        assert_eq!(fs.read("/test.txt", 3, 10)?, b"lo");
        assert_eq!(fs.read("/test.txt", 10, 5)?, b"");
        assert_eq!(fs.read("/missing.txt", 0, 10)?, b"");

        Ok(())
    }

    #[test]
    fn test_write_with_gap() -> Result<()> {
        let fs = MemoryFileSystem::new();

        fs.write("/gap.txt", 0, b"hello")?;
        fs.write("/gap.txt", 10, b"world")?;

        assert_eq!(fs.read("/gap.txt", 0, 15)?, b"hello\0\0\0\0\0world");
        assert_eq!(fs.len("/gap.txt")?, Some(15));

        Ok(())
    }

    #[test]
    fn test_error_handling() {
        let fs = MemoryFileSystem::new();

        assert!(matches!(fs.touch(""), Err(RandomAccessError::InvalidArgument(_))));
        assert!(matches!(fs.write("", 0, b"test"), Err(RandomAccessError::InvalidArgument(_))));
        assert!(matches!(fs.read("", 0, 5), Err(RandomAccessError::InvalidArgument(_))));

        let result = fs.write("/test.txt", usize::MAX, b"data");
        assert!(matches!(result, Err(RandomAccessError::InputOutput(_))));

        let result = fs.read("/test.txt", usize::MAX, 10);
        assert!(matches!(result, Err(RandomAccessError::InputOutput(_))));
    }

    #[test]
    fn test_open_missing_without_create() {
        let fs = MemoryFileSystem::new();
        let result = fs.open(Path::new("/missing.txt"), &Options::new());
        assert_eq!(result.unwrap_err().kind(), io::ErrorKind::NotFound);
        assert!(!fs.exists("/missing.txt").unwrap());
    }

    #[test]
    fn test_open_with_create() -> io::Result<()> {
        let fs = MemoryFileSystem::new();
        let channel = fs.open(Path::new("/new.txt"), &Options::new().create(true))?;
        assert_eq!(channel.len()?, 0);
        assert!(fs.exists("/new.txt").unwrap());
        Ok(())
    }

    #[test]
    fn test_channel_is_exclusive_until_closed() -> io::Result<()> {
        let fs = MemoryFileSystem::new();
        fs.touch("/one.txt").unwrap();

        let mut first = fs.open(Path::new("/one.txt"), &Options::new())?;
        let second = fs.open(Path::new("/one.txt"), &Options::new());
        assert_eq!(second.unwrap_err().kind(), io::ErrorKind::WouldBlock);
        assert!(matches!(fs.remove("/one.txt"), Err(RandomAccessError::InputOutput(_))));

        first.close()?;
        let third = fs.open(Path::new("/one.txt"), &Options::new())?;
        drop(third);
        fs.open(Path::new("/one.txt"), &Options::new())?;
        Ok(())
    }

    #[test]
    fn test_direct_write_refused_while_held() -> Result<()> {
        let fs = MemoryFileSystem::new();
        fs.write("/held.txt", 0, b"hello")?;

        let channel = fs.open(Path::new("/held.txt"), &Options::new())?;
        let result = fs.write("/held.txt", 0, b"j");
        assert!(matches!(result, Err(RandomAccessError::InputOutput(_))));
        assert_eq!(fs.read("/held.txt", 0, 5)?, b"hello");

        drop(channel);
        fs.write("/held.txt", 0, b"j")?;
        assert_eq!(fs.read("/held.txt", 0, 5)?, b"jello");
        Ok(())
    }

    #[test]
    fn test_direct_write_too_far() {
        let fs = MemoryFileSystem::new();

        let result = fs.write("/huge.bin", usize::MAX / 2, b"x");
        assert!(matches!(result, Err(RandomAccessError::InputOutput(_))));
        assert_eq!(fs.len("/huge.bin").unwrap(), Some(0));
    }

    #[test]
    fn test_channel_read_write_seek() -> io::Result<()> {
        let fs = MemoryFileSystem::new();
        fs.write("/rw.txt", 0, b"hello dlrow").unwrap();

        let mut channel = fs.open(Path::new("/rw.txt"), &Options::new())?;
        channel.seek(SeekFrom::Start(6))?;
        channel.write_all(b"world")?;
        assert_eq!(channel.seek(SeekFrom::Current(0))?, 11);

        channel.seek(SeekFrom::End(-5))?;
        let mut buf = String::new();
        channel.read_to_string(&mut buf)?;
        assert_eq!(buf, "world");

        assert!(channel.seek(SeekFrom::Current(-100)).is_err());
        Ok(())
    }

    #[test]
    fn test_channel_seek_past_end_then_write() -> io::Result<()> {
        let fs = MemoryFileSystem::new();
        let mut channel = fs.open(Path::new("/sparse.bin"), &Options::new().create(true))?;

        channel.seek(SeekFrom::Start(3))?;
        channel.write_all(b"z")?;
        assert_eq!(channel.len()?, 4);
        assert_eq!(fs.read("/sparse.bin", 0, 4).unwrap(), b"\0\0\0z");
        Ok(())
    }
}
