//! Content-Length framing using tokio-util.
//!
//! [`FrameCodec`] frames JSON documents the same way the Debug Adapter
//! Protocol does, so the backend can reuse any DAP-style framing code:
//! ```text
//! Content-Length: <length>\r\n
//! \r\n
//! <JSON body>
//! ```

use std::marker::PhantomData;

use bytes::{Buf, BufMut, BytesMut};
use serde::{Serialize, de::DeserializeOwned};
use tokio_util::codec::{Decoder, Encoder};

use crate::error::CodecError;

/// Default maximum frame size (16 MB).
pub const DEFAULT_MAX_MESSAGE_SIZE: usize = 16 * 1024 * 1024;

/// Codec decoding frames into `T` and encoding `T` into frames.
#[derive(Debug)]
pub struct FrameCodec<T> {
    max_message_size: usize,
    _message: PhantomData<fn() -> T>,
}

impl<T> FrameCodec<T> {
    /// Create a new codec with default settings.
    pub fn new() -> Self {
        Self::with_max_size(DEFAULT_MAX_MESSAGE_SIZE)
    }

    /// Create a new codec with a custom maximum message size.
    ///
    /// Frames larger than this are rejected with [`CodecError::MessageTooLarge`].
    pub fn with_max_size(max_message_size: usize) -> Self {
        Self {
            max_message_size,
            _message: PhantomData,
        }
    }

    pub fn max_message_size(&self) -> usize {
        self.max_message_size
    }
}

impl<T> Default for FrameCodec<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for FrameCodec<T> {
    fn clone(&self) -> Self {
        Self::with_max_size(self.max_message_size)
    }
}

impl<T> Decoder for FrameCodec<T>
where
    T: DeserializeOwned,
{
    type Item = T;
    type Error = CodecError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        let Some(header_end) = find_header_end(src) else {
            return Ok(None);
        };

        let content_length = parse_content_length(&src[..header_end])?;
        if content_length > self.max_message_size {
            return Err(CodecError::MessageTooLarge {
                size: content_length,
                max: self.max_message_size,
            });
        }

        // header + \r\n\r\n + body
        let total_length = header_end + 4 + content_length;
        if src.len() < total_length {
            src.reserve(total_length - src.len());
            return Ok(None);
        }

        let body_bytes = &src[header_end + 4..total_length];
        let message: T =
            serde_json::from_slice(body_bytes).map_err(CodecError::JsonDeserialize)?;

        src.advance(total_length);

        Ok(Some(message))
    }
}

impl<T> Encoder<T> for FrameCodec<T>
where
    T: Serialize,
{
    type Error = CodecError;

    fn encode(&mut self, item: T, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let json = serde_json::to_vec(&item).map_err(CodecError::JsonSerialize)?;
        if json.len() > self.max_message_size {
            return Err(CodecError::MessageTooLarge {
                size: json.len(),
                max: self.max_message_size,
            });
        }

        dst.reserve(32 + json.len());
        dst.put_slice(b"Content-Length: ");
        dst.put_slice(json.len().to_string().as_bytes());
        dst.put_slice(b"\r\n\r\n");
        dst.put_slice(&json);

        Ok(())
    }
}

/// Index of the first `\r` of the header/body separator.
fn find_header_end(buf: &[u8]) -> Option<usize> {
    buf.windows(4).position(|w| w == b"\r\n\r\n")
}

fn parse_content_length(header: &[u8]) -> Result<usize, CodecError> {
    let header_str = std::str::from_utf8(header).map_err(|_| CodecError::InvalidUtf8)?;

    for line in header_str.split("\r\n") {
        if let Some(value) = line.strip_prefix("Content-Length:") {
            return value
                .trim()
                .parse()
                .map_err(|_| CodecError::MalformedContentLength);
        }
    }

    Err(CodecError::MissingContentLength)
}
