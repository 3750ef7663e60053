use crate::{error::Error, normalizer::EventNormalizer, types::NormalizedEvent, value::RawValue};
use bytes::BytesMut;
use tokio_util::codec::Decoder;
use tracing::debug;

/// Default upper bound on a single payload line.
pub const DEFAULT_MAX_LINE_BYTES: usize = 1024 * 1024;

/// A newline-delimited JSON event stream decoder.
///
/// Each non-blank line is one event payload; it is decoded and normalized.
#[derive(Debug)]
pub struct EventDecoder {
    normalizer: EventNormalizer,
    max_line_bytes: usize,
    /// Bytes of the buffered partial line already searched for a newline
    scanned: usize,
}

impl Default for EventDecoder {
    fn default() -> Self {
        Self::new(EventNormalizer::new())
    }
}

impl EventDecoder {
    pub fn new(normalizer: EventNormalizer) -> Self {
        Self {
            normalizer,
            max_line_bytes: DEFAULT_MAX_LINE_BYTES,
            scanned: 0,
        }
    }

    pub fn with_max_line_bytes(mut self, max_line_bytes: usize) -> Self {
        self.max_line_bytes = max_line_bytes;
        self
    }

    pub fn max_line_bytes(&self) -> usize {
        self.max_line_bytes
    }

    fn decode_line(&self, line: &[u8]) -> Result<Option<NormalizedEvent>, Error> {
        if line.len() > self.max_line_bytes {
            return Err(Error::LineTooLong {
                observed: line.len(),
                limit: self.max_line_bytes,
            });
        }
        let line = line.trim_ascii();
        if line.is_empty() {
            return Ok(None);
        }
        let raw: RawValue = serde_json::from_slice(line)?;
        Ok(Some(self.normalizer.normalize(&raw)))
    }
}

impl Decoder for EventDecoder {
    type Item = NormalizedEvent;
    type Error = Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        // Loop until we've got an event or need more data
        loop {
            let newline = src[self.scanned..].iter().position(|b| *b == b'\n');
            let Some(offset) = newline else {
                self.scanned = src.len();
                if src.len() > self.max_line_bytes {
                    return Err(Error::LineTooLong {
                        observed: src.len(),
                        limit: self.max_line_bytes,
                    });
                }
                return Ok(None);
            };

            let line_end = self.scanned + offset;
            self.scanned = 0;
            let line = src.split_to(line_end + 1);
            // Strip the newline, a trailing '\r' is trimmed with the rest of the whitespace
            if let Some(event) = self.decode_line(&line[..line_end])? {
                return Ok(Some(event));
            }
            debug!("Skipped blank payload line");
        }
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if let Some(event) = self.decode(src)? {
            return Ok(Some(event));
        }
        if src.is_empty() {
            return Ok(None);
        }
        // Final line without a trailing newline
        self.scanned = 0;
        let line = src.split();
        self.decode_line(&line)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::types::Level;

    #[test]
    fn decodes_lines_incrementally() {
        let mut dec = EventDecoder::default();
        let mut buf = BytesMut::from(&b"{\"level\":\"info\"}\n\n{\"level\":"[..]);
        let ev = dec.decode(&mut buf).unwrap().unwrap();
        assert_eq!(ev.level, Level::Info);
        assert_eq!(dec.decode(&mut buf).unwrap(), None);
        buf.extend_from_slice(b"\"debug\"}\r\n");
        let ev = dec.decode(&mut buf).unwrap().unwrap();
        assert_eq!(ev.level, Level::Debug);
        assert!(buf.is_empty());
    }

    #[test]
    fn final_line_without_newline() {
        let mut dec = EventDecoder::default();
        let mut buf = BytesMut::from(&b"{\"level\":\"fatal\"}"[..]);
        assert_eq!(dec.decode(&mut buf).unwrap(), None);
        let ev = dec.decode_eof(&mut buf).unwrap().unwrap();
        assert_eq!(ev.level, Level::Fatal);
        assert_eq!(dec.decode_eof(&mut buf).unwrap(), None);
    }

    #[test]
    fn oversized_lines_are_rejected() {
        let mut dec = EventDecoder::default().with_max_line_bytes(8);
        let mut buf = BytesMut::from(&b"{\"level\":\"info\"}"[..]);
        assert!(matches!(
            dec.decode(&mut buf),
            Err(Error::LineTooLong {
                observed: 16,
                limit: 8
            })
        ));
    }

    #[test]
    fn invalid_json_is_an_error() {
        let mut dec = EventDecoder::default();
        let mut buf = BytesMut::from(&b"{not json}\n"[..]);
        assert!(matches!(dec.decode(&mut buf), Err(Error::Json(_))));
    }
}
