use std::{
    fmt,
    io::{self, Read, Seek, SeekFrom, Write},
    path::{Path, PathBuf},
};

use log::{debug, trace, warn};

use crate::{
    Result,
    channel::{NativeOpener, Opener, RawChannel},
    error::RandomAccessError,
    options::{Newline, Options},
};

const READ_CHUNK: usize = 256;

/// A file opened for reading and writing at arbitrary byte offsets.
///
/// The instance starts closed. [`open`](Self::open) attaches it to a path and
/// puts the cursor at the beginning; every read and write then happens at the
/// cursor and advances it by the number of bytes actually transferred.
///
/// Text is handled as bytes: writes encode as UTF-8, reads decode lossily, so
/// single-byte text round-trips exactly.
pub struct RandomAccessFile<O: Opener = NativeOpener> {
    opener: O,
    options: Options,
    path: Option<PathBuf>,
    channel: Option<O::Channel>,
    position: u64,
}

impl RandomAccessFile {
    /// A closed instance that opens files on the local file system.
    pub fn new() -> Self { Self::with_opener(NativeOpener) }
}

impl Default for RandomAccessFile {
    fn default() -> Self { Self::new() }
}

impl<O: Opener> RandomAccessFile<O> {
    /// A closed instance that obtains its channels from `opener`.
    pub fn with_opener(opener: O) -> Self {
        Self {
            opener,
            options: Options::default(),
            path: None,
            channel: None,
            position: 0,
        }
    }

    /// Replaces the options used by the next [`open`](Self::open) and by the
    /// line operations.
    pub fn with_options(mut self, options: Options) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &Options { &self.options }

    /// Path of the open file, `None` while closed.
    pub fn path(&self) -> Option<&Path> { self.path.as_deref() }

    pub fn is_open(&self) -> bool { self.channel.is_some() }

    /// Opens `path` for reading and writing with the cursor at offset 0.
    ///
    /// A file that is already open on this instance is closed first. On failure
    /// the instance is left closed.
    ///
    /// # Errors
    ///
    /// Returns `RandomAccessError::FileNotFound` if `path` does not exist and
    /// the options do not ask for creation, `RandomAccessError::InputOutput` for
    /// anything else (permissions, a lock held by another handle, ...).
    pub fn open(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        self.close()?;

        let channel = self
            .opener
            .open(path, &self.options)
            .map_err(|err| RandomAccessError::from_open(err, &path.display().to_string()))?;

        debug!("opened {} for random access", path.display());
        self.channel = Some(channel);
        self.path = Some(path.to_path_buf());
        self.position = 0;
        Ok(())
    }

    /// Releases the underlying handle. Closing a closed instance does nothing.
    ///
    /// The handle is released even when the channel reports a failure while
    /// closing; that failure is returned.
    pub fn close(&mut self) -> Result<()> {
        let Some(mut channel) = self.channel.take() else {
            return Ok(());
        };
        let path = self.path.take();
        self.position = 0;

        let result = channel.close();
        drop(channel);

        if let Some(path) = path {
            debug!("closed {}", path.display());
        }
        result.map_err(Into::into)
    }

    /// Current byte offset of the cursor.
    pub fn position(&self) -> u64 { self.position }

    /// Moves the cursor to `position`.
    ///
    /// Positions past the end of file are allowed; a later write there extends
    /// the file, zero-filling the gap.
    ///
    /// # Errors
    ///
    /// Returns `RandomAccessError::InvalidArgument` for a negative position,
    /// without touching the channel or the current position.
    pub fn set_position(&mut self, position: i64) -> Result<()> {
        let target = u64::try_from(position).map_err(|_| {
            RandomAccessError::InvalidArgument(format!("position {position} is negative"))
        })?;

        self.channel_mut()?.seek(SeekFrom::Start(target))?;
        self.position = target;
        trace!("seek to {target}");
        Ok(())
    }

    pub fn go_to_beginning(&mut self) -> Result<()> { self.set_position(0) }

    /// Current extent of the file in bytes.
    pub fn len(&self) -> Result<u64> { Ok(self.channel_ref()?.len()?) }

    /// Whether the cursor is at or past the current end of file.
    ///
    /// The end moves as writes extend the file, so this is recomputed on every call.
    pub fn is_at_end_of_file(&self) -> Result<bool> { Ok(self.position >= self.len()?) }

    /// Reads up to `count` bytes; fewer are returned when the file ends first.
    ///
    /// A short read, including an empty one at end of file, is not an error.
    pub fn read_bytes(&mut self, count: usize) -> Result<Vec<u8>> {
        if count == 0 {
            return Ok(Vec::new());
        }

        let mut buf = Vec::with_capacity(count.min(READ_CHUNK * 16));
        Read::take(self.synced_channel()?, count as u64).read_to_end(&mut buf)?;

        self.position += buf.len() as u64;
        trace!("read {} of {count} bytes, now at {}", buf.len(), self.position);
        Ok(buf)
    }

    /// Text version of [`read_bytes`](Self::read_bytes).
    pub fn read(&mut self, count: usize) -> Result<String> {
        Ok(String::from_utf8_lossy(&self.read_bytes(count)?).into_owned())
    }

    /// Reads everything from the cursor to the end of file.
    ///
    /// # Errors
    ///
    /// Returns `RandomAccessError::EndOfFile` if the cursor is already at the end.
    pub fn read_to_end_bytes(&mut self) -> Result<Vec<u8>> {
        if self.is_at_end_of_file()? {
            return Err(RandomAccessError::EndOfFile);
        }

        let mut buf = Vec::new();
        self.synced_channel()?.read_to_end(&mut buf)?;

        self.position += buf.len() as u64;
        trace!("read remaining {} bytes, now at {}", buf.len(), self.position);
        Ok(buf)
    }

    /// Text version of [`read_to_end_bytes`](Self::read_to_end_bytes).
    pub fn read_to_end(&mut self) -> Result<String> {
        Ok(String::from_utf8_lossy(&self.read_to_end_bytes()?).into_owned())
    }

    /// Reads up to the next newline sequence, which is consumed but not returned.
    ///
    /// Without a newline the rest of the file is returned. At end of file the
    /// result is empty and the cursor stays put.
    pub fn read_line(&mut self) -> Result<String> {
        let newline = self.options.newline_sequence();
        let start = self.position;
        let channel = self.synced_channel()?;

        let mut line = Vec::new();
        let mut chunk = [0u8; READ_CHUNK];
        let mut scanned = 0;
        let consumed = loop {
            let count = read_some(channel, &mut chunk)?;
            if count == 0 {
                break line.len();
            }
            line.extend_from_slice(&chunk[..count]);

            if let Some(idx) = newline.find_in(&line[scanned..]) {
                line.truncate(scanned + idx);
                break line.len() + newline.len();
            }
            // a terminator may straddle two chunks
            scanned = line.len().saturating_sub(newline.len() - 1);
        };

        let position = start + consumed as u64;
        channel.seek(SeekFrom::Start(position))?;
        self.position = position;
        trace!("read line of {} bytes, now at {position}", line.len());
        Ok(String::from_utf8_lossy(&line).into_owned())
    }

    /// Reads the rest of the file split on the newline sequence.
    ///
    /// A trailing newline does not produce an empty last element.
    ///
    /// # Errors
    ///
    /// Returns `RandomAccessError::EndOfFile` if the cursor is already at the end.
    pub fn read_lines(&mut self) -> Result<Vec<String>> {
        let content = self.read_to_end_bytes()?;
        Ok(split_lines(&content, self.options.newline_sequence()))
    }

    /// Writes `data` at the cursor, overwriting existing bytes and extending the
    /// file as needed.
    pub fn write_bytes(&mut self, data: &[u8]) -> Result<()> {
        self.synced_channel()?.write_all(data)?;
        self.position += data.len() as u64;
        trace!("wrote {} bytes, now at {}", data.len(), self.position);
        Ok(())
    }

    pub fn write(&mut self, text: &str) -> Result<()> { self.write_bytes(text.as_bytes()) }

    /// Writes `text` followed by the newline sequence.
    pub fn write_line(&mut self, text: &str) -> Result<()> {
        let newline = self.options.newline_sequence();
        let mut data = Vec::with_capacity(text.len() + newline.len());
        data.extend_from_slice(text.as_bytes());
        data.extend_from_slice(newline.as_bytes());
        self.write_bytes(&data)
    }

    pub fn flush(&mut self) -> Result<()> { Ok(self.channel_mut()?.flush()?) }

    fn channel_ref(&self) -> Result<&O::Channel> {
        self.channel.as_ref().ok_or_else(RandomAccessError::not_open)
    }

    fn channel_mut(&mut self) -> Result<&mut O::Channel> {
        self.channel.as_mut().ok_or_else(RandomAccessError::not_open)
    }

    /// The channel with its cursor moved to ours.
    fn synced_channel(&mut self) -> Result<&mut O::Channel> {
        let position = self.position;
        let channel = self.channel_mut()?;
        channel.seek(SeekFrom::Start(position))?;
        Ok(channel)
    }
}

impl<O: Opener> Drop for RandomAccessFile<O> {
    fn drop(&mut self) {
        if let Err(err) = self.close() {
            warn!("failed to close random-access file: {err}");
        }
    }
}

impl<O: Opener> fmt::Debug for RandomAccessFile<O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RandomAccessFile")
            .field("path", &self.path)
            .field("position", &self.position)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

fn read_some<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    loop {
        match reader.read(buf) {
            Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
            other => return other,
        }
    }
}

fn split_lines(mut rest: &[u8], newline: Newline) -> Vec<String> {
    let mut lines = Vec::new();
    while !rest.is_empty() {
        match newline.find_in(rest) {
            Some(idx) => {
                lines.push(String::from_utf8_lossy(&rest[..idx]).into_owned());
                rest = &rest[idx + newline.len()..];
            }
            None => {
                lines.push(String::from_utf8_lossy(rest).into_owned());
                break;
            }
        }
    }
    lines
}
