use tokio::sync::mpsc;

use crate::session::SessionState;
use crate::source_view::ScrollTarget;
use crate::view::LineDescriptor;

/// A rendered listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Listing {
    pub filename: String,
    pub focus_line: usize,
    pub lines: Vec<LineDescriptor>,
    pub scroll: ScrollTarget,
    pub error: Option<String>,
}

/// Updates published by the controller for the renderer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// Text appended to the scrollback.
    Output(String),
    /// The listing was replaced.
    Listing(Listing),
    /// Breakpoint annotations of the current listing changed.
    Breakpoints(Vec<LineDescriptor>),
    State(SessionState),
    /// An operation was refused and the operator should be told.
    Alert(String),
}

/// Event receiver that wraps tokio mpsc
pub struct EventReceiver {
    rx: mpsc::UnboundedReceiver<Event>,
}

impl EventReceiver {
    pub(crate) fn new(rx: mpsc::UnboundedReceiver<Event>) -> Self {
        Self { rx }
    }

    /// Receive next event asynchronously
    pub async fn recv(&mut self) -> Option<Event> {
        self.rx.recv().await
    }

    /// Take an event if one is already queued.
    pub fn try_recv(&mut self) -> Option<Event> {
        self.rx.try_recv().ok()
    }
}
