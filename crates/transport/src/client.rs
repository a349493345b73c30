//! One-shot request/response client.
//!
//! [`Client`] is a cheap handle to an actor task that owns the backend
//! connection. The actor assigns sequence numbers, writes requests and routes
//! each response back to the caller waiting on it.

use std::collections::HashMap;

use futures::StreamExt;
use serde::de::DeserializeOwned;
use tokio::{
    io::{AsyncRead, AsyncWrite},
    net::{TcpStream, ToSocketAddrs},
    sync::{mpsc, oneshot},
};

use crate::{
    codec::DEFAULT_MAX_MESSAGE_SIZE,
    error::ClientError,
    message::{Message, Request, RequestBody, Response, Seq},
    reader::FrameReader,
    transport::{Transport, split_with_max_size},
    writer::FrameWriter,
};

type ResponseSender = oneshot::Sender<Result<Response, ClientError>>;

#[derive(Debug)]
enum ClientMessage {
    Send {
        request: RequestBody,
        response_chan: ResponseSender,
    },
    Execute {
        request: RequestBody,
        written: oneshot::Sender<Result<(), ClientError>>,
    },
}

/// Handle to the request connection. Clones share the same connection.
#[derive(Clone, Debug)]
pub struct Client {
    sender: mpsc::Sender<ClientMessage>,
}

impl Client {
    /// Connect to the backend over TCP.
    pub async fn connect(addr: impl ToSocketAddrs) -> Result<Self, ClientError> {
        Self::connect_with_max_size(addr, DEFAULT_MAX_MESSAGE_SIZE).await
    }

    pub async fn connect_with_max_size(
        addr: impl ToSocketAddrs,
        max_message_size: usize,
    ) -> Result<Self, ClientError> {
        let stream = TcpStream::connect(addr)
            .await
            .map_err(ClientError::Connect)?;
        Ok(Self::with_max_size(stream, max_message_size))
    }

    /// Start the connection actor on an existing transport.
    ///
    /// Must be called from within a tokio runtime.
    pub fn new<T: Transport>(transport: T) -> Self {
        Self::with_max_size(transport, DEFAULT_MAX_MESSAGE_SIZE)
    }

    pub fn with_max_size<T: Transport>(transport: T, max_message_size: usize) -> Self {
        let (reader, writer) = split_with_max_size(transport, max_message_size);
        let (sender, receiver) = mpsc::channel(100);
        tokio::spawn(handle_messages(reader, writer, receiver));
        Self { sender }
    }

    /// Send a request and wait for its response, whatever its `success` flag.
    #[tracing::instrument(skip(self), fields(action = request.action()))]
    pub async fn send(&self, request: RequestBody) -> Result<Response, ClientError> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(ClientMessage::Send {
                request,
                response_chan: tx,
            })
            .await
            .map_err(|_| ClientError::Disconnected)?;
        rx.await.map_err(|_| ClientError::Disconnected)?
    }

    /// Send a request, fail on `success: false` and decode the body.
    ///
    /// Returns `None` when the backend replied without a body.
    pub async fn call<B>(&self, request: RequestBody) -> Result<Option<B>, ClientError>
    where
        B: DeserializeOwned,
    {
        let action = request.action();
        let response = self.send(request).await?;
        if !response.success {
            return Err(ClientError::Rejected {
                action,
                message: response.message.unwrap_or_default(),
            });
        }

        match response.body {
            None | Some(serde_json::Value::Null) => Ok(None),
            Some(body) => serde_json::from_value(body)
                .map(Some)
                .map_err(|source| ClientError::Body { action, source }),
        }
    }

    /// Write a request without waiting for a response.
    ///
    /// Resolves once the request is on the wire.
    #[tracing::instrument(skip(self), fields(action = request.action()))]
    pub async fn execute(&self, request: RequestBody) -> Result<(), ClientError> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(ClientMessage::Execute {
                request,
                written: tx,
            })
            .await
            .map_err(|_| ClientError::Disconnected)?;
        rx.await.map_err(|_| ClientError::Disconnected)?
    }
}

async fn handle_messages<R, W>(
    mut reader: FrameReader<R, Message>,
    mut writer: FrameWriter<W, Request>,
    mut incoming: mpsc::Receiver<ClientMessage>,
) where
    R: AsyncRead + Unpin + Send + 'static,
    W: AsyncWrite + Unpin + Send + 'static,
{
    let mut responses = HashMap::<Seq, ResponseSender>::new();
    let mut seq_num: Seq = 0;
    loop {
        tokio::select! {
            cmd = incoming.recv() => {
                let Some(cmd) = cmd else {
                    tracing::debug!("all client handles dropped");
                    break;
                };

                let current_seq_num = seq_num;
                seq_num += 1;
                match cmd {
                    ClientMessage::Send { request, response_chan } => {
                        match writer.send(Request { seq: current_seq_num, body: request }).await {
                            Ok(()) => {
                                responses.insert(current_seq_num, response_chan);
                            }
                            Err(e) => {
                                let _ = response_chan.send(Err(e.into()));
                            }
                        }
                    }
                    ClientMessage::Execute { request, written } => {
                        let result = writer
                            .send(Request { seq: current_seq_num, body: request })
                            .await
                            .map_err(ClientError::from);
                        let _ = written.send(result);
                    }
                }
            }
            msg = reader.next() => {
                match msg {
                    Some(Ok(Message::Response(resp))) => {
                        match responses.remove(&resp.request_seq) {
                            Some(tx) => {
                                let _ = tx.send(Ok(resp));
                            }
                            None => tracing::warn!(request_seq = resp.request_seq, "response for unknown request"),
                        }
                    }
                    Some(Ok(Message::Stream(frame))) => {
                        tracing::warn!(?frame, "stream frame on request connection");
                    }
                    Some(Err(e)) => {
                        tracing::error!(error = %e, "transport error");
                        break;
                    }
                    None => {
                        tracing::debug!("backend closed request connection");
                        break;
                    }
                }
            }
        }
    }
    // dropping `responses` wakes every waiting caller with `Disconnected`
}
