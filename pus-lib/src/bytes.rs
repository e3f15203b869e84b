use std::collections::VecDeque;
use std::io::{self, ErrorKind, Read, Seek, SeekFrom};

/// Bytes provides the ability to read bytes from a reader and push them
/// back if they are not needed, i.e., Peek-and-push. The original order of
/// the bytes is preserved when pushing bytes back.
///
/// It also tracks the offset of the next byte it will provide, relative to where the
/// reader was when it was wrapped.
pub(crate) struct Bytes<R> {
    reader: R,
    num_read: u64,
    cache: VecDeque<u8>,
}

impl<R> Bytes<R>
where
    R: Read,
{
    pub fn new(reader: R) -> Self {
        Bytes {
            reader,
            num_read: 0,
            cache: VecDeque::new(),
        }
    }

    /// Next byte, or `None` at the end of the stream.
    pub fn next(&mut self) -> io::Result<Option<u8>> {
        let mut buf = [0u8; 1];
        match self.read_full(&mut buf)? {
            0 => Ok(None),
            _ => Ok(Some(buf[0])),
        }
    }

    /// Like [Self::next], but the byte stays available.
    pub fn peek(&mut self) -> io::Result<Option<u8>> {
        let b = self.next()?;
        if let Some(b) = b {
            self.push(b);
        }
        Ok(b)
    }

    /// Consume bytes while they equal `value`, returning how many were consumed.
    pub fn skip_while(&mut self, value: u8) -> io::Result<u64> {
        let mut skipped = 0;
        while let Some(b) = self.next()? {
            if b != value {
                self.push(b);
                break;
            }
            skipped += 1;
        }
        Ok(skipped)
    }

    /// Fill as much of `buf` as possible, returning the number of bytes filled. A result
    /// smaller than `buf.len()` means the end of the stream was reached.
    pub fn read_full(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        read_full(self, buf)
    }

    /// Push `b` back so it is the next byte provided.
    pub fn push(&mut self, b: u8) {
        self.cache.push_front(b);
    }

    /// Offset of the next byte that will be provided.
    pub fn offset(&self) -> u64 {
        self.num_read - self.cache.len() as u64
    }
}

impl<R> Bytes<R>
where
    R: Read + Seek,
{
    /// Seek to `pos`, dropping any pushed back bytes. Like [Self::offset], `pos` counts from
    /// where the reader was when it was wrapped.
    pub fn seek(&mut self, pos: u64) -> io::Result<u64> {
        let origin = self
            .reader
            .stream_position()?
            .saturating_sub(self.num_read);
        self.reader.seek(SeekFrom::Start(origin + pos))?;
        self.cache.clear();
        self.num_read = pos;
        Ok(pos)
    }
}

impl<R> Read for Bytes<R>
where
    R: Read,
{
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        if self.cache.is_empty() {
            let n = self.reader.read(buf)?;
            self.num_read += n as u64;
            return Ok(n);
        }
        let mut n = 0;
        while n < buf.len() {
            match self.cache.pop_front() {
                Some(b) => {
                    buf[n] = b;
                    n += 1;
                }
                None => break,
            }
        }
        Ok(n)
    }
}

/// Read from `r` until `buf` is full or the end of the stream, returning the number of bytes
/// read. Unlike [Read::read_exact] the number of bytes available before the end is known.
pub(crate) fn read_full<R: Read + ?Sized>(r: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match r.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => return Err(err),
        }
    }
    Ok(filled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test() {
        let dat = [0, 1, 2, 3, 4, 5, 6, 7, 8, 9];
        let mut bytes = Bytes::new(&dat[..]);

        let b = bytes.next().unwrap();
        assert_eq!(b, Some(0), "first byte has bad value");
        assert_eq!(bytes.offset(), 1);

        let b = bytes.next().unwrap().unwrap();
        assert_eq!(b, 1, "second byte has bad value");
        assert_eq!(bytes.offset(), 2);

        bytes.push(b);
        assert_eq!(bytes.cache, [1]);
        assert_eq!(bytes.offset(), 1);

        let b = bytes.next().unwrap();
        assert_eq!(
            b,
            Some(1),
            "Byte should be the same as second call to next following a push"
        );
        assert_eq!(bytes.offset(), 2);
        assert_eq!(bytes.cache.len(), 0);

        let buf = &mut [0u8; 3][..];
        assert_eq!(bytes.read_full(buf).unwrap(), 3);
        assert_eq!(bytes.offset(), 5);
        assert_eq!(buf, [2, 3, 4]);
    }

    #[test]
    fn read_full_spans_cache_and_reader() {
        let dat = [1, 2, 3, 4, 5, 6];
        let mut bytes = Bytes::new(&dat[..]);

        assert_eq!(bytes.peek().unwrap(), Some(1));
        assert_eq!(bytes.offset(), 0, "peek should not move the offset");

        let buf = &mut [0u8; 4][..];
        assert_eq!(bytes.read_full(buf).unwrap(), 4);
        assert_eq!(buf, [1, 2, 3, 4]);
        assert_eq!(bytes.num_read, 4);
        assert_eq!(bytes.offset(), 4);
    }

    #[test]
    fn read_full_reports_short_reads() {
        let dat = [1, 2];
        let mut bytes = Bytes::new(&dat[..]);

        let buf = &mut [0u8; 3][..];
        assert_eq!(bytes.read_full(buf).unwrap(), 2);
        assert_eq!(bytes.read_full(buf).unwrap(), 0);
        assert_eq!(bytes.next().unwrap(), None);
    }

    #[test]
    fn skip_while_stops_at_other_value() {
        let dat = [0, 0, 0, 7, 0];
        let mut bytes = Bytes::new(&dat[..]);

        assert_eq!(bytes.skip_while(0).unwrap(), 3);
        assert_eq!(bytes.offset(), 3);
        assert_eq!(bytes.next().unwrap(), Some(7));
        assert_eq!(bytes.skip_while(0).unwrap(), 1);
        assert_eq!(bytes.peek().unwrap(), None);
    }

    #[test]
    fn seek_drops_cache() {
        let dat = vec![1, 2, 3, 4, 5, 6];
        let mut bytes = Bytes::new(Cursor::new(dat));

        bytes.peek().unwrap();
        assert_eq!(bytes.seek(4).unwrap(), 4);
        assert_eq!(bytes.offset(), 4);
        assert_eq!(bytes.next().unwrap(), Some(5));
    }

    #[test]
    fn seek_is_relative_to_wrap_position() {
        let mut cursor = Cursor::new(vec![1, 2, 3, 4, 5, 6]);
        cursor.set_position(2);
        let mut bytes = Bytes::new(cursor);

        assert_eq!(bytes.next().unwrap(), Some(3));
        assert_eq!(bytes.next().unwrap(), Some(4));
        assert_eq!(bytes.offset(), 2);

        assert_eq!(bytes.seek(1).unwrap(), 1);
        assert_eq!(bytes.offset(), 1);
        assert_eq!(bytes.next().unwrap(), Some(4));

        bytes.peek().unwrap();
        assert_eq!(bytes.seek(0).unwrap(), 0);
        assert_eq!(bytes.next().unwrap(), Some(3));
    }
}
