use std::cmp;

use memchr::memchr;

/// Initial capacity of a column buffer, in bytes.
const INITIAL_CAPACITY: usize = 50;

/// A growing byte buffer holding the concatenated fields of one output
/// column (or of the header).
///
/// Fields are appended as their raw payload bytes followed by a single
/// 0x00 terminator. A field whose payload would otherwise be empty is
/// stored as the two bytes `0x01 0x00`; the 0x01 marker keeps an empty
/// field distinguishable from the zero-filled tail of the buffer during
/// iteration.
#[derive(Clone, Debug)]
pub(crate) struct ColumnBuffer {
    /// Zero-initialized storage, doubled whenever an append could reach
    /// its end.
    data: Vec<u8>,
    /// The append cursor.
    pos: usize,
}

impl ColumnBuffer {
    /// A buffer with no storage, used before any pass has run.
    pub(crate) fn empty() -> ColumnBuffer {
        ColumnBuffer { data: Vec::new(), pos: 0 }
    }

    /// A zero-filled buffer ready for appending.
    pub(crate) fn new() -> ColumnBuffer {
        ColumnBuffer { data: vec![0; INITIAL_CAPACITY], pos: 0 }
    }

    /// Append raw payload bytes at the cursor.
    ///
    /// The capacity check precedes the write: the buffer doubles until the
    /// write no longer reaches its end, and the new half is zero-filled so
    /// the tail test during iteration stays valid.
    pub(crate) fn push(&mut self, bytes: &[u8]) {
        while self.pos + bytes.len() > self.data.len() {
            self.grow();
        }
        self.data[self.pos..self.pos + bytes.len()].copy_from_slice(bytes);
        self.pos += bytes.len();
    }

    fn grow(&mut self) {
        let new_len = self.data.len().checked_mul(2).unwrap();
        self.data.resize(cmp::max(INITIAL_CAPACITY, new_len), 0);
    }

    /// Terminate the field accumulating at the cursor.
    ///
    /// With `strip_whitespace` the cursor first walks back over trailing
    /// spaces and tabs, overwriting them with 0x00. A field left with no
    /// payload is recorded as the 0x01 empty marker before the 0x00
    /// terminator.
    pub(crate) fn end_field(&mut self, strip_whitespace: bool) {
        if strip_whitespace {
            while self.pos > 0
                && (self.data[self.pos - 1] == b' ' || self.data[self.pos - 1] == b'\t')
            {
                self.pos -= 1;
                self.data[self.pos] = 0;
            }
        }
        if self.pos == 0 || self.data[self.pos - 1] == 0 {
            self.push(&[0x01]);
        }
        self.push(&[0x00]);
    }

    /// Iterate the terminated fields recorded so far.
    pub(crate) fn fields(&self) -> FieldIter {
        FieldIter { buf: &self.data, pos: 0 }
    }
}

/// An iterator over the fields of one output column (or of the header).
///
/// Each field's payload is yielded as a byte slice without its 0x00
/// terminator. A field recorded with the empty marker surfaces as the
/// empty slice, so callers never observe the 0x01 byte.
#[derive(Clone, Debug)]
pub struct FieldIter<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Iterator for FieldIter<'a> {
    type Item = &'a [u8];

    fn next(&mut self) -> Option<&'a [u8]> {
        // The tail of a column buffer is zero-filled, so reaching either
        // the end of the buffer or a 0x00 at the cursor means end of data.
        if self.pos >= self.buf.len() || self.buf[self.pos] == 0 {
            return None;
        }
        let start = self.pos;
        let end = match memchr(0, &self.buf[start..]) {
            Some(i) => start + i,
            None => self.buf.len(),
        };
        self.pos = end + 1;
        let field = &self.buf[start..end];
        if field[0] == 0x01 {
            Some(&[])
        } else {
            Some(field)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ColumnBuffer, INITIAL_CAPACITY};

    fn collected(buf: &ColumnBuffer) -> Vec<Vec<u8>> {
        buf.fields().map(|f| f.to_vec()).collect()
    }

    #[test]
    fn push_and_terminate() {
        let mut buf = ColumnBuffer::new();
        buf.push(b"10");
        buf.end_field(false);
        buf.push(b"1");
        buf.end_field(false);

        assert_eq!(collected(&buf), vec![b"10".to_vec(), b"1".to_vec()]);
    }

    #[test]
    fn empty_field_marker() {
        let mut buf = ColumnBuffer::new();
        buf.end_field(false);
        buf.push(b"x");
        buf.end_field(false);
        buf.end_field(false);

        assert_eq!(
            collected(&buf),
            vec![Vec::new(), b"x".to_vec(), Vec::new()],
        );
    }

    #[test]
    fn strip_trailing_whitespace() {
        let mut buf = ColumnBuffer::new();
        buf.push(b"a b \t ");
        buf.end_field(true);

        assert_eq!(collected(&buf), vec![b"a b".to_vec()]);
    }

    #[test]
    fn strip_to_empty() {
        let mut buf = ColumnBuffer::new();
        buf.push(b"  \t");
        buf.end_field(true);

        assert_eq!(collected(&buf), vec![Vec::new()]);
    }

    #[test]
    fn strip_stops_at_previous_terminator() {
        let mut buf = ColumnBuffer::new();
        buf.push(b"a");
        buf.end_field(true);
        buf.push(b" ");
        buf.end_field(true);

        assert_eq!(collected(&buf), vec![b"a".to_vec(), Vec::new()]);
    }

    #[test]
    fn growth_preserves_fields() {
        let mut buf = ColumnBuffer::new();
        let long = vec![b'x'; 3 * INITIAL_CAPACITY];
        buf.push(&long);
        buf.end_field(false);
        buf.push(b"tail");
        buf.end_field(false);

        assert_eq!(collected(&buf), vec![long, b"tail".to_vec()]);
    }

    #[test]
    fn iteration_of_unused_buffer() {
        let buf = ColumnBuffer::new();
        assert_eq!(buf.fields().count(), 0);

        let buf = ColumnBuffer::empty();
        assert_eq!(buf.fields().count(), 0);
    }
}
