use std::io;

/// Contents of one in-memory file, plus whether a channel currently holds it.
#[derive(Debug, Clone, Default)]
pub(crate) struct FileData {
    bytes: Vec<u8>,
    held: bool,
}

impl FileData {
    pub(crate) fn new() -> Self { Self::default() }

    pub(crate) fn len(&self) -> usize { self.bytes.len() }

    pub(crate) fn is_held(&self) -> bool { self.held }

    pub(crate) fn set_held(&mut self, held: bool) { self.held = held; }

    /// Writes `data` at `offset`, zero-filling any gap past the current end.
    ///
    /// Fails with [`io::ErrorKind::OutOfMemory`] when the file cannot grow to
    /// `offset + data.len()` bytes; the contents are left untouched then.
    pub(crate) fn write_at(&mut self, offset: usize, data: &[u8]) -> io::Result<()> {
        if data.is_empty() {
            return Ok(());
        }

        let end_pos = offset.checked_add(data.len()).ok_or_else(|| too_large(offset))?;
        if end_pos > self.bytes.len() {
            self.bytes
                .try_reserve(end_pos - self.bytes.len())
                .map_err(|_| too_large(end_pos))?;
            self.bytes.resize(end_pos, 0);
        }

        self.bytes[offset..end_pos].copy_from_slice(data);
        Ok(())
    }

    /// Copies bytes starting at `offset` into `buf`, returning how many were copied.
    pub(crate) fn read_at(&self, offset: usize, buf: &mut [u8]) -> usize {
        if offset >= self.bytes.len() {
            return 0;
        }

        let end_pos = std::cmp::min(offset.saturating_add(buf.len()), self.bytes.len());
        let count = end_pos - offset;
        buf[..count].copy_from_slice(&self.bytes[offset..end_pos]);
        count
    }
}

fn too_large(size: usize) -> io::Error {
    io::Error::new(io::ErrorKind::OutOfMemory, format!("cannot grow file to {size} bytes"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_extends_with_zeros() {
        let mut file = FileData::new();
        file.write_at(3, b"xy").unwrap();
        assert_eq!(file.len(), 5);

        let mut buf = [0xffu8; 5];
        assert_eq!(file.read_at(0, &mut buf), 5);
        assert_eq!(&buf, b"\0\0\0xy");
    }

    #[test]
    fn test_short_read() {
        let mut file = FileData::new();
        file.write_at(0, b"hello").unwrap();

        let mut buf = [0u8; 10];
        assert_eq!(file.read_at(3, &mut buf), 2);
        assert_eq!(&buf[..2], b"lo");
        assert_eq!(file.read_at(5, &mut buf), 0);
    }

    #[test]
    fn test_write_too_far_fails_without_growing() {
        let mut file = FileData::new();
        file.write_at(0, b"abc").unwrap();

        let err = file.write_at(usize::MAX / 2, b"x").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::OutOfMemory);
        assert_eq!(file.len(), 3);

        let err = file.write_at(usize::MAX, b"x").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::OutOfMemory);
    }
}
