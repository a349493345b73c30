//! Transport abstraction and split functionality.

use serde::{Serialize, de::DeserializeOwned};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};

use crate::codec::FrameCodec;
use crate::reader::FrameReader;
use crate::writer::FrameWriter;

/// A byte stream that can be split into separate read and write halves.
///
/// Implemented for TCP and for the in-memory [`crate::testing::MemoryTransport`].
pub trait Transport: Send + 'static {
    type Read: AsyncRead + Unpin + Send + 'static;
    type Write: AsyncWrite + Unpin + Send + 'static;

    fn into_split(self) -> (Self::Read, Self::Write);
}

impl Transport for TcpStream {
    type Read = OwnedReadHalf;
    type Write = OwnedWriteHalf;

    fn into_split(self) -> (Self::Read, Self::Write) {
        TcpStream::into_split(self)
    }
}

/// Split a transport into a framed reader of `In` and a framed writer of `Out`.
///
/// A client splits with `In = Message, Out = Request`; a backend the other
/// way around.
pub fn split<T, In, Out>(transport: T) -> (FrameReader<T::Read, In>, FrameWriter<T::Write, Out>)
where
    T: Transport,
    In: DeserializeOwned,
    Out: Serialize,
{
    split_with_max_size(transport, crate::codec::DEFAULT_MAX_MESSAGE_SIZE)
}

/// Like [`split`], rejecting frames larger than `max_message_size` in either direction.
pub fn split_with_max_size<T, In, Out>(
    transport: T,
    max_message_size: usize,
) -> (FrameReader<T::Read, In>, FrameWriter<T::Write, Out>)
where
    T: Transport,
    In: DeserializeOwned,
    Out: Serialize,
{
    let (read, write) = transport.into_split();
    (
        FrameReader::with_codec(read, FrameCodec::with_max_size(max_message_size)),
        FrameWriter::with_codec(write, FrameCodec::with_max_size(max_message_size)),
    )
}
