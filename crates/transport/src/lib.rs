//! Transport between the vdlv controller and its debugger backend.
//!
//! Messages are JSON documents framed with a `Content-Length` header, the
//! same framing the Debug Adapter Protocol uses.
//!
//! # Architecture
//!
//! - [`FrameCodec`] implements tokio-util's `Encoder` and `Decoder`
//! - [`FrameReader`] and [`FrameWriter`] wrap byte streams as a `Stream` and a `Sink`
//! - [`Client`] multiplexes one-shot requests over a persistent connection
//! - [`CommandStream`] runs a single debugger command on its own connection
//!
//! # Usage
//!
//! ```ignore
//! use futures::StreamExt;
//! use transport::{Client, CommandStream, RequestBody};
//!
//! let client = Client::connect("127.0.0.1:8888").await?;
//! client.execute(RequestBody::Interrupt).await?;
//!
//! let mut frames = CommandStream::open("127.0.0.1:8888", "continue", 1 << 20).await?;
//! while let Some(frame) = frames.next().await {
//!     print!("{}", frame?.out);
//! }
//! ```
//!
//! This crate only moves messages. Session state, breakpoint reconciliation
//! and listing management live in the `debugger` crate.

mod client;
mod codec;
mod error;
mod message;
mod reader;
mod stream;
mod transport;
mod writer;

pub mod testing;

pub use client::Client;
pub use codec::{DEFAULT_MAX_MESSAGE_SIZE, FrameCodec};
pub use error::{ClientError, CodecError};
pub use message::{
    BreakpointArguments, BreakpointBody, CommandArguments, ListArguments, ListTarget,
    ListingBody, Message, Request, RequestBody, Response, Seq, SourceLine, StreamFrame,
    UpdateArguments, UpdateBody,
};
pub use reader::FrameReader;
pub use stream::CommandStream;
pub use transport::{Transport, split, split_with_max_size};
pub use writer::FrameWriter;

/// Default address of the backend.
pub const DEFAULT_BACKEND_ADDRESS: &str = "127.0.0.1:8888";
