//! Command connections.
//!
//! Every debugger command gets its own connection: the client writes a single
//! `command` request and then reads [`StreamFrame`]s until the backend closes
//! the connection.

use std::pin::Pin;
use std::task::{Context, Poll};

use futures::{Stream, StreamExt, ready};
use tokio::{
    io::{AsyncRead, AsyncWrite},
    net::{TcpStream, ToSocketAddrs, tcp},
};

use crate::{
    codec::DEFAULT_MAX_MESSAGE_SIZE,
    error::ClientError,
    message::{CommandArguments, Message, Request, RequestBody, StreamFrame},
    reader::FrameReader,
    transport::{Transport, split_with_max_size},
    writer::FrameWriter,
};

/// The frames produced by one running command.
pub struct CommandStream<R, W> {
    reader: FrameReader<R, Message>,
    // held so the backend does not see the client hang up mid-command
    _writer: FrameWriter<W, Request>,
}

impl CommandStream<tcp::OwnedReadHalf, tcp::OwnedWriteHalf> {
    /// Open a new TCP connection and start `command` on it.
    pub async fn open(
        addr: impl ToSocketAddrs,
        command: &str,
        max_message_size: usize,
    ) -> Result<Self, ClientError> {
        let stream = TcpStream::connect(addr)
            .await
            .map_err(ClientError::Connect)?;
        Self::start_with_max_size(stream, command, max_message_size).await
    }
}

impl<R, W> CommandStream<R, W>
where
    R: AsyncRead + Unpin + Send + 'static,
    W: AsyncWrite + Unpin + Send + 'static,
{
    /// Start `command` on an already connected transport.
    pub async fn start<T>(transport: T, command: &str) -> Result<Self, ClientError>
    where
        T: Transport<Read = R, Write = W>,
    {
        Self::start_with_max_size(transport, command, DEFAULT_MAX_MESSAGE_SIZE).await
    }

    #[tracing::instrument(skip(transport, max_message_size))]
    pub async fn start_with_max_size<T>(
        transport: T,
        command: &str,
        max_message_size: usize,
    ) -> Result<Self, ClientError>
    where
        T: Transport<Read = R, Write = W>,
    {
        let (reader, mut writer) = split_with_max_size(transport, max_message_size);
        writer
            .send(Request {
                seq: 0,
                body: RequestBody::Command(CommandArguments {
                    command: command.to_string(),
                }),
            })
            .await?;
        tracing::debug!("command stream opened");

        Ok(Self {
            reader,
            _writer: writer,
        })
    }
}

impl<R, W> Stream for CommandStream<R, W>
where
    R: AsyncRead + Unpin,
    W: Unpin,
{
    type Item = Result<StreamFrame, ClientError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        loop {
            let item = match ready!(this.reader.poll_next_unpin(cx)) {
                Some(Ok(Message::Stream(frame))) => Ok(frame),
                Some(Ok(Message::Response(resp))) if !resp.success => Err(ClientError::Rejected {
                    action: "command",
                    message: resp.message.unwrap_or_default(),
                }),
                Some(Ok(Message::Response(resp))) => {
                    tracing::debug!(?resp, "ignoring acknowledgement on command stream");
                    continue;
                }
                Some(Err(e)) => Err(e.into()),
                None => return Poll::Ready(None),
            };
            return Poll::Ready(Some(item));
        }
    }
}
