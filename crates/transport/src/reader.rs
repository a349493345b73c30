//! Framed message reader.

use std::pin::Pin;
use std::task::{Context, Poll};

use futures::Stream;
use pin_project_lite::pin_project;
use serde::de::DeserializeOwned;
use tokio::io::AsyncRead;
use tokio_util::codec::FramedRead;

use crate::codec::FrameCodec;
use crate::error::CodecError;

pin_project! {
    /// An async stream of decoded frames.
    ///
    /// Clients read [`crate::Message`]s; a backend (or a test double) reads
    /// [`crate::Request`]s.
    pub struct FrameReader<R, T> {
        #[pin]
        inner: FramedRead<R, FrameCodec<T>>,
    }
}

impl<R, T> FrameReader<R, T>
where
    R: AsyncRead + Unpin,
    T: DeserializeOwned,
{
    pub fn new(reader: R) -> Self {
        Self::with_codec(reader, FrameCodec::new())
    }

    /// Create a reader with a custom codec, e.g. to change the maximum frame size.
    pub fn with_codec(reader: R, codec: FrameCodec<T>) -> Self {
        Self {
            inner: FramedRead::new(reader, codec),
        }
    }

    pub fn into_inner(self) -> R {
        self.inner.into_inner()
    }
}

impl<R, T> Stream for FrameReader<R, T>
where
    R: AsyncRead + Unpin,
    T: DeserializeOwned,
{
    type Item = Result<T, CodecError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.project().inner.poll_next(cx)
    }
}
