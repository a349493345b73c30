//! Session and breakpoint synchronisation for a remote debugging console.
//!
//! [`Controller`] serialises command execution against one backend, streams
//! command output and listing navigation back to the renderer as [`Event`]s,
//! and keeps a client-side [`BreakpointRegistry`] consistent with the
//! backend's breakpoints.
mod backend;
mod breakpoints;
mod controller;
mod error;
mod events;
mod history;
mod scrollback;
mod session;
mod source_view;
mod view;

pub mod testing;

pub use backend::{Backend, EventStream, StreamEvent, TcpBackend};
pub use breakpoints::{Anchor, Breakpoint, BreakpointRegistry, ConfigRow};
pub use controller::{Controller, Dispatch};
pub use error::{BackendError, SessionError};
pub use events::{Event, EventReceiver, Listing};
pub use history::{CommandHistory, extract_command};
pub use scrollback::Scrollback;
pub use session::SessionState;
pub use source_view::{ListingView, ScrollTarget};
pub use view::{Gesture, LineDescriptor, Marker};
