use bytes::{Bytes, BytesMut};
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FrameError {
    /// The unterminated tail of the buffer grew past its capacity. The
    /// record can never complete, so the connection should be closed.
    #[error("record exceeds {capacity} bytes without a delimiter")]
    Overflow { capacity: usize },
}

/// Reassembles newline-delimited records from a byte stream.
///
/// A TCP read may carry a fragment of a record, several records, or both;
/// the framer buffers the unterminated tail between reads. The buffer is
/// bounded: a peer streaming bytes with no delimiter gets an `Overflow`
/// rather than silently losing a prefix.
#[derive(Debug)]
pub struct LineFramer {
    buf: BytesMut,
    capacity: usize,
}

impl LineFramer {
    pub fn new(capacity: usize) -> Self {
        Self {
            buf: BytesMut::with_capacity(capacity),
            capacity,
        }
    }

    /// Feeds raw bytes and returns every record completed by this chunk.
    ///
    /// A record is the bytes up to (not including) the `\n`; a trailing
    /// `\r` is also stripped. After an `Overflow` the framer holds the
    /// oversized tail and callers are expected to drop the connection.
    pub fn push(&mut self, chunk: &[u8]) -> Result<Vec<Bytes>, FrameError> {
        self.buf.extend_from_slice(chunk);

        let mut records = Vec::new();
        while let Some(pos) = self.buf.iter().position(|&b| b == b'\n') {
            let mut record = self.buf.split_to(pos + 1);
            record.truncate(pos);
            if record.last() == Some(&b'\r') {
                record.truncate(record.len() - 1);
            }
            records.push(record.freeze());
        }

        if self.buf.len() > self.capacity {
            return Err(FrameError::Overflow {
                capacity: self.capacity,
            });
        }

        Ok(records)
    }

    /// Number of buffered bytes still waiting for a delimiter.
    pub fn pending(&self) -> usize {
        self.buf.len()
    }
}
