//! Framed message writer.

use std::pin::Pin;
use std::task::{Context, Poll};

use futures::Sink;
use pin_project_lite::pin_project;
use serde::Serialize;
use tokio::io::AsyncWrite;
use tokio_util::codec::FramedWrite;

use crate::codec::FrameCodec;
use crate::error::CodecError;

pin_project! {
    /// An async sink that frames outgoing messages.
    pub struct FrameWriter<W, T> {
        #[pin]
        inner: FramedWrite<W, FrameCodec<T>>,
    }
}

impl<W, T> FrameWriter<W, T>
where
    W: AsyncWrite + Unpin,
    T: Serialize,
{
    pub fn new(writer: W) -> Self {
        Self::with_codec(writer, FrameCodec::new())
    }

    pub fn with_codec(writer: W, codec: FrameCodec<T>) -> Self {
        Self {
            inner: FramedWrite::new(writer, codec),
        }
    }

    /// Encode, write and flush a single message.
    pub async fn send(&mut self, msg: T) -> Result<(), CodecError> {
        use futures::SinkExt;
        SinkExt::send(&mut self.inner, msg).await
    }

    pub fn into_inner(self) -> W {
        self.inner.into_inner()
    }
}

impl<W, T> Sink<T> for FrameWriter<W, T>
where
    W: AsyncWrite + Unpin,
    T: Serialize,
{
    type Error = CodecError;

    fn poll_ready(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.project().inner.poll_ready(cx)
    }

    fn start_send(self: Pin<&mut Self>, item: T) -> Result<(), Self::Error> {
        self.project().inner.start_send(item)
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.project().inner.poll_flush(cx)
    }

    fn poll_close(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.project().inner.poll_close(cx)
    }
}
