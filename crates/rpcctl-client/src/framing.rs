//! Incremental framing for responses that arrive in arbitrary chunks.
//!
//! The engine writes one JSON document per response with no length prefix or
//! delimiter, so the only way to find the end of a message is to attempt a
//! parse. [`ResponseBuffer::try_parse`] performs that attempt without
//! consuming anything and reports an incomplete document as a value rather
//! than an error.

use serde_json::Value;

/// Result of one parse attempt over the buffered bytes.
#[derive(Debug, PartialEq)]
pub(crate) enum Frame {
    /// More bytes are needed before a document can be produced.
    Incomplete,
    /// A full document was decoded.
    Complete {
        document: Value,
        /// Non-whitespace bytes that followed the document.
        trailing: usize,
    },
}

/// Bytes accumulated for the call in progress.
#[derive(Debug, Default)]
pub(crate) struct ResponseBuffer {
    bytes: Vec<u8>,
}

impl ResponseBuffer {
    pub(crate) fn extend(&mut self, chunk: &[u8]) {
        self.bytes.extend_from_slice(chunk);
    }

    pub(crate) fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// Attempts to decode the first JSON document in the buffer.
    ///
    /// Truncated input is reported as [`Frame::Incomplete`]; any other
    /// syntax error is returned so the caller can fail fast instead of
    /// waiting for bytes that can never repair the document.
    pub(crate) fn try_parse(&self) -> Result<Frame, serde_json::Error> {
        let mut stream = serde_json::Deserializer::from_slice(&self.bytes).into_iter::<Value>();
        match stream.next() {
            None => Ok(Frame::Incomplete),
            Some(Err(error)) if error.is_eof() => Ok(Frame::Incomplete),
            Some(Err(error)) => Err(error),
            Some(Ok(document)) => {
                let trailing = self
                    .bytes
                    .get(stream.byte_offset()..)
                    .map_or(0, |rest| {
                        rest.iter().filter(|byte| !byte.is_ascii_whitespace()).count()
                    });
                Ok(Frame::Complete { document, trailing })
            }
        }
    }
}
