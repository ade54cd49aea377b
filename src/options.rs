/// Line terminator used by the line-oriented operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Newline {
    /// `\n`
    Lf,
    /// `\r\n`
    CrLf,
}

impl Newline {
    /// The convention of the platform this crate was compiled for.
    pub const fn platform() -> Self {
        if cfg!(windows) { Newline::CrLf } else { Newline::Lf }
    }

    pub const fn as_bytes(self) -> &'static [u8] {
        match self {
            Newline::Lf => b"\n",
            Newline::CrLf => b"\r\n",
        }
    }

    pub const fn len(self) -> usize { self.as_bytes().len() }

    /// Position of the first terminator in `haystack`, if any.
    pub(crate) fn find_in(self, haystack: &[u8]) -> Option<usize> {
        let needle = self.as_bytes();
        haystack.windows(needle.len()).position(|window| window == needle)
    }
}

impl Default for Newline {
    fn default() -> Self { Self::platform() }
}

/// Settings applied when a [`RandomAccessFile`](crate::RandomAccessFile) is opened.
///
/// ```rust
/// use rafile::{Newline, Options};
///
/// let options = Options::new().newline(Newline::CrLf).create(true);
/// assert_eq!(options.newline_sequence(), Newline::CrLf);
/// assert!(options.creates());
/// ```
#[derive(Debug, Clone, Default)]
pub struct Options {
    newline: Newline,
    create: bool,
}

impl Options {
    pub fn new() -> Self { Self::default() }

    /// Sets the terminator for `read_line`, `read_lines` and `write_line`.
    pub fn newline(mut self, newline: Newline) -> Self {
        self.newline = newline;
        self
    }

    /// Creates a missing file on open instead of failing with `FileNotFound`.
    pub fn create(mut self, create: bool) -> Self {
        self.create = create;
        self
    }

    pub fn newline_sequence(&self) -> Newline { self.newline }

    pub fn creates(&self) -> bool { self.create }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequences() {
        assert_eq!(Newline::Lf.as_bytes(), b"\n");
        assert_eq!(Newline::CrLf.as_bytes(), b"\r\n");
        assert_eq!(Newline::CrLf.len(), 2);
    }

    #[test]
    fn test_find_in() {
        assert_eq!(Newline::Lf.find_in(b"abc\ndef"), Some(3));
        assert_eq!(Newline::CrLf.find_in(b"abc\ndef\r\n"), Some(7));
        assert_eq!(Newline::CrLf.find_in(b"abc\r"), None);
        assert_eq!(Newline::Lf.find_in(b""), None);
    }

    #[test]
    fn test_defaults() {
        let options = Options::default();
        assert_eq!(options.newline_sequence(), Newline::platform());
        assert!(!options.creates());
    }
}
