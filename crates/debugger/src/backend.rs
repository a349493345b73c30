//! The seam between the controller and the debugger backend.

use std::future::Future;

use futures::stream::{self, BoxStream, StreamExt};
use transport::{
    BreakpointArguments, BreakpointBody, Client, CommandStream, ListArguments, ListingBody,
    RequestBody, StreamFrame, UpdateArguments, UpdateBody,
};

use crate::error::BackendError;

/// One event of a running command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    Output(String),
    Navigation {
        filename: String,
        line: usize,
        show_arrow: bool,
    },
    Terminated(bool),
}

impl StreamEvent {
    /// Expand a wire frame into events: navigation, then output, then termination.
    pub fn from_frame(frame: StreamFrame) -> Vec<StreamEvent> {
        let mut events = Vec::with_capacity(3);
        if let Some(list) = frame.list {
            events.push(StreamEvent::Navigation {
                filename: list.filename,
                line: list.line,
                show_arrow: list.show_arrow,
            });
        }
        if !frame.out.is_empty() {
            events.push(StreamEvent::Output(frame.out));
        }
        if frame.quit {
            events.push(StreamEvent::Terminated(true));
        }
        events
    }
}

/// Events of one command, ending when the backend closes the stream.
pub type EventStream = BoxStream<'static, Result<StreamEvent, BackendError>>;

/// Operations the controller needs from a debugger backend.
pub trait Backend: Send + Sync + 'static {
    /// Start `command` and stream its events.
    fn open_command(
        &self,
        command: &str,
    ) -> impl Future<Output = Result<EventStream, BackendError>> + Send;

    /// Fetch the listing around `line` together with the file's breakpoints.
    fn list(
        &self,
        filename: &str,
        line: usize,
        show_arrow: bool,
    ) -> impl Future<Output = Result<ListingBody, BackendError>> + Send;

    /// Create the breakpoint at a line or flip its enabled flag.
    fn toggle(
        &self,
        args: BreakpointArguments,
    ) -> impl Future<Output = Result<BreakpointBody, BackendError>> + Send;

    /// Delete the breakpoint at a line, returning what was deleted.
    fn delete(
        &self,
        args: BreakpointArguments,
    ) -> impl Future<Output = Result<BreakpointBody, BackendError>> + Send;

    /// Replace a breakpoint's configuration. `Ok(false)` means the backend
    /// refused it.
    fn update_config(
        &self,
        name: &str,
        config: &str,
    ) -> impl Future<Output = Result<bool, BackendError>> + Send;

    /// Ask the backend to halt the debuggee.
    fn interrupt(&self) -> impl Future<Output = Result<(), BackendError>> + Send;
}

/// A backend reached over TCP.
///
/// One-shot requests share a persistent [`Client`] connection; every command
/// opens its own connection.
#[derive(Debug, Clone)]
pub struct TcpBackend {
    client: Client,
    address: String,
    max_frame_size: usize,
}

impl TcpBackend {
    #[tracing::instrument]
    pub async fn connect(address: &str, max_frame_size: usize) -> Result<Self, BackendError> {
        let client = Client::connect_with_max_size(address, max_frame_size).await?;
        tracing::debug!("connected to backend");
        Ok(Self {
            client,
            address: address.to_string(),
            max_frame_size,
        })
    }

    pub async fn from_config(config: &config::Config) -> Result<Self, BackendError> {
        Self::connect(&config.address, config.max_frame_size).await
    }
}

impl Backend for TcpBackend {
    async fn open_command(&self, command: &str) -> Result<EventStream, BackendError> {
        let frames =
            CommandStream::open(self.address.as_str(), command, self.max_frame_size).await?;

        let events = frames.flat_map(|frame| {
            let items: Vec<Result<StreamEvent, BackendError>> = match frame {
                Ok(frame) => StreamEvent::from_frame(frame).into_iter().map(Ok).collect(),
                Err(e) => vec![Err(e.into())],
            };
            stream::iter(items)
        });
        Ok(events.boxed())
    }

    async fn list(
        &self,
        filename: &str,
        line: usize,
        show_arrow: bool,
    ) -> Result<ListingBody, BackendError> {
        self.client
            .call(RequestBody::List(ListArguments {
                filename: filename.to_string(),
                line,
                show_arrow,
            }))
            .await?
            .ok_or(BackendError::MissingBody("list"))
    }

    async fn toggle(&self, args: BreakpointArguments) -> Result<BreakpointBody, BackendError> {
        self.client
            .call(RequestBody::Toggle(args))
            .await?
            .ok_or(BackendError::MissingBody("toggle"))
    }

    async fn delete(&self, args: BreakpointArguments) -> Result<BreakpointBody, BackendError> {
        self.client
            .call(RequestBody::Delete(args))
            .await?
            .ok_or(BackendError::MissingBody("delete"))
    }

    async fn update_config(&self, name: &str, config: &str) -> Result<bool, BackendError> {
        let body: Option<UpdateBody> = self
            .client
            .call(RequestBody::Update(UpdateArguments {
                name: name.to_string(),
                config: config.to_string(),
            }))
            .await?;
        body.map(|b| b.ok).ok_or(BackendError::MissingBody("update"))
    }

    async fn interrupt(&self) -> Result<(), BackendError> {
        self.client.execute(RequestBody::Interrupt).await?;
        Ok(())
    }
}
