//! The session-and-breakpoint controller.
//!
//! All state lives in one [`Internals`] value behind an async mutex. Backend
//! calls are made without holding the lock; their results are applied under
//! it. Each dispatched command gets a task that drains the command's event
//! stream in arrival order.

use std::sync::Arc;

use futures::StreamExt;
use tokio::sync::{Mutex, mpsc};
use tokio::task::{JoinError, JoinHandle};
use tokio_util::sync::CancellationToken;
use transport::BreakpointArguments;

use crate::{
    backend::{Backend, EventStream, StreamEvent},
    breakpoints::{Anchor, Breakpoint, BreakpointRegistry, ConfigRow},
    error::{BackendError, SessionError},
    events::{Event, EventReceiver, Listing},
    history::{CommandHistory, extract_command},
    scrollback::Scrollback,
    session::{Session, SessionState},
    source_view::ListingView,
    view::{Gesture, LineDescriptor},
};

#[derive(Debug, Clone)]
struct Settings {
    prompt: String,
    scroll_context: usize,
}

struct Internals {
    session: Session,
    history: CommandHistory,
    scrollback: Scrollback,
    registry: BreakpointRegistry,
    listing: Option<ListingView>,
}

impl Internals {
    fn render(&self, view: &ListingView, scroll_context: usize) -> Listing {
        Listing {
            filename: view.filename.clone(),
            focus_line: view.focus_line,
            lines: self.registry.descriptors(view),
            scroll: view.scroll_target(scroll_context),
            error: view.error.clone(),
        }
    }
}

struct Shared<B> {
    internals: Mutex<Internals>,
    backend: B,
    // held for the whole of a breakpoint mutation
    breakpoint_op: Mutex<()>,
    events: mpsc::UnboundedSender<Event>,
    settings: Settings,
}

impl<B: Backend> Shared<B> {
    fn emit(&self, event: Event) {
        // the renderer may have gone away
        let _ = self.events.send(event);
    }

    fn emit_breakpoints(&self, internals: &Internals) {
        if let Some(view) = &internals.listing {
            self.emit(Event::Breakpoints(internals.registry.descriptors(view)));
        }
    }

    async fn ensure_idle(&self) -> Result<(), SessionError> {
        let state = self.internals.lock().await.session.state();
        state.ensure_idle().inspect_err(|e| {
            tracing::debug!(?state, "operation refused");
            self.emit(Event::Alert(e.to_string()));
        })
    }

    async fn reload(&self, filename: &str, line: usize, show_arrow: bool) -> Result<(), SessionError> {
        let fetched = self.backend.list(filename, line, show_arrow).await;

        let mut internals = self.internals.lock().await;
        let (view, result) = match fetched {
            Ok(body) => {
                internals
                    .registry
                    .apply_snapshot(body.breakpoints.into_iter().map(Breakpoint::from));
                (ListingView::new(filename, line, show_arrow, body.lines), Ok(()))
            }
            Err(source) => {
                tracing::warn!(error = %source, %filename, line, "listing fetch failed");
                let view = ListingView::failed(filename, line, show_arrow, source.to_string());
                let err = SessionError::ListingFailed {
                    filename: filename.to_string(),
                    line,
                    source,
                };
                (view, Err(err))
            }
        };

        let listing = internals.render(&view, self.settings.scroll_context);
        internals.listing = Some(view);
        self.emit(Event::Listing(listing));
        result
    }

    async fn append_output(&self, chunk: &str) {
        let mut internals = self.internals.lock().await;
        let added = internals.scrollback.append(chunk);
        self.emit(Event::Output(added));
    }

    /// Return to idle after a command, re-arming the prompt.
    async fn close_command(&self) -> SessionState {
        let mut internals = self.internals.lock().await;
        if internals.session.finish() {
            let added = internals.scrollback.rearm();
            self.emit(Event::Output(added));
            self.emit(Event::State(SessionState::Idle));
        }
        internals.session.state()
    }
}

/// Handle to a dispatched command.
#[derive(Debug)]
pub struct Dispatch {
    command: String,
    handle: JoinHandle<SessionState>,
}

impl Dispatch {
    pub fn command(&self) -> &str {
        &self.command
    }

    /// Wait until the command's stream has been drained.
    ///
    /// Resolves to the session state after the command.
    pub async fn finished(self) -> Result<SessionState, JoinError> {
        self.handle.await
    }
}

/// Controls the debugging session.
///
/// At most one command runs at a time. Breakpoint operations are refused
/// while a command runs and are serialised among themselves.
pub struct Controller<B> {
    shared: Arc<Shared<B>>,
    cancel_token: CancellationToken,
}

impl<B: Backend> Controller<B> {
    pub fn new(backend: B, config: &config::Config) -> (Self, EventReceiver) {
        let (events, rx) = mpsc::unbounded_channel();
        let internals = Internals {
            session: Session::default(),
            history: CommandHistory::new(config.history_limit),
            scrollback: Scrollback::new(&config.prompt),
            registry: BreakpointRegistry::new(config.min_config_rows),
            listing: None,
        };
        let shared = Arc::new(Shared {
            internals: Mutex::new(internals),
            backend,
            breakpoint_op: Mutex::new(()),
            events,
            settings: Settings {
                prompt: config.prompt.clone(),
                scroll_context: config.scroll_context,
            },
        });

        let controller = Self {
            shared,
            cancel_token: CancellationToken::new(),
        };
        (controller, EventReceiver::new(rx))
    }

    /// Submit console input.
    ///
    /// The last non-blank line of `raw` is the command, minus any leading
    /// prompt. Blank input re-runs the previous command.
    #[tracing::instrument(skip(self))]
    pub async fn submit(&self, raw: &str) -> Result<Dispatch, SessionError> {
        let candidate = extract_command(raw, &self.shared.settings.prompt);

        let command = {
            let mut internals = self.shared.internals.lock().await;
            let command = internals.session.begin(&candidate).inspect_err(|e| {
                if e.is_session_state() {
                    self.shared.emit(Event::Alert(e.to_string()));
                }
            })?;
            internals.history.push(&command);
            let echoed = internals.scrollback.echo(&command);
            self.shared.emit(Event::Output(echoed));
            self.shared.emit(Event::State(SessionState::Running));
            command
        };

        let stream = match self.shared.backend.open_command(&command).await {
            Ok(stream) => stream,
            Err(source) => {
                tracing::warn!(error = %source, "could not start command");
                self.shared.append_output(&format!("{source}\n")).await;
                self.shared.close_command().await;
                return Err(SessionError::CommandFailed { command, source });
            }
        };

        let handle = tokio::spawn(dispatch(
            Arc::clone(&self.shared),
            stream,
            self.cancel_token.child_token(),
        ));
        Ok(Dispatch { command, handle })
    }

    /// Ask the backend to halt the debuggee.
    ///
    /// Allowed in every state. Local state is left alone; whatever the
    /// backend does about it arrives over the running command's stream.
    #[tracing::instrument(skip(self))]
    pub async fn interrupt(&self) -> Result<(), BackendError> {
        self.shared
            .backend
            .interrupt()
            .await
            .inspect_err(|e| tracing::warn!(error = %e, "interrupt failed"))
    }

    /// Re-fetch the listing around `line` and merge its breakpoints.
    #[tracing::instrument(skip(self))]
    pub async fn reload(
        &self,
        filename: &str,
        line: usize,
        show_arrow: bool,
    ) -> Result<(), SessionError> {
        self.shared.reload(filename, line, show_arrow).await
    }

    /// Toggle or delete the breakpoint at a line.
    ///
    /// `line_contents` is the line's text as the operator sees it. On failure
    /// the backend's message is shown on that line until the next successful
    /// operation there.
    #[tracing::instrument(skip(self, line_contents))]
    pub async fn toggle_breakpoint(
        &self,
        filename: &str,
        line: usize,
        line_contents: &str,
        gesture: Gesture,
    ) -> Result<Breakpoint, SessionError> {
        let shared = &self.shared;
        let _op = shared.breakpoint_op.lock().await;
        shared.ensure_idle().await?;

        let args = BreakpointArguments {
            filename: filename.to_string(),
            line,
            line_contents: line_contents.to_string(),
        };
        let result = match gesture {
            Gesture::Toggle => shared.backend.toggle(args).await,
            Gesture::Delete => shared.backend.delete(args).await,
        };

        let anchor = Anchor::new(filename, line);
        let mut internals = shared.internals.lock().await;
        match result {
            Ok(body) => {
                let breakpoint = Breakpoint::from(body);
                internals.registry.clear_line_error(&anchor);
                match gesture {
                    Gesture::Toggle => internals.registry.merge(breakpoint.clone()),
                    Gesture::Delete => {
                        if internals.registry.remove(&breakpoint.name).is_none() {
                            internals.registry.remove_at(&anchor);
                        }
                    }
                }
                tracing::debug!(name = %breakpoint.name, enabled = breakpoint.enabled, "breakpoint updated");
                shared.emit_breakpoints(&internals);
                Ok(breakpoint)
            }
            Err(e) => {
                tracing::warn!(error = %e, "breakpoint request failed");
                let reason = e.to_string();
                internals.registry.record_line_error(anchor, reason.clone());
                shared.emit_breakpoints(&internals);
                Err(SessionError::BreakpointRequestFailed {
                    filename: filename.to_string(),
                    line,
                    reason,
                })
            }
        }
    }

    /// Replace a breakpoint's configuration text.
    ///
    /// The text always stays in the row. A rejected edit marks the row
    /// invalid until an edit is accepted.
    #[tracing::instrument(skip(self, text))]
    pub async fn update_config(&self, name: &str, text: &str) -> Result<(), SessionError> {
        let shared = &self.shared;
        let _op = shared.breakpoint_op.lock().await;
        shared.ensure_idle().await?;

        let anchor = {
            let mut internals = shared.internals.lock().await;
            let anchor = internals.registry.edit_config(name, text)?;
            shared.emit_breakpoints(&internals);
            anchor
        };

        let result = shared.backend.update_config(name, text).await;

        let mut internals = shared.internals.lock().await;
        let accepted = matches!(result, Ok(true));
        internals.registry.resolve_config(name, accepted);
        shared.emit_breakpoints(&internals);

        match result {
            Ok(true) => Ok(()),
            Ok(false) => {
                tracing::debug!(%name, "configuration rejected");
                Err(SessionError::ConfigRejected {
                    name: name.to_string(),
                })
            }
            Err(e) => {
                tracing::warn!(error = %e, %name, "configuration update failed");
                Err(SessionError::BreakpointRequestFailed {
                    filename: anchor.filename,
                    line: anchor.line,
                    reason: e.to_string(),
                })
            }
        }
    }

    pub async fn state(&self) -> SessionState {
        self.shared.internals.lock().await.session.state()
    }

    pub async fn last_command(&self) -> String {
        self.shared
            .internals
            .lock()
            .await
            .session
            .last_command()
            .to_string()
    }

    pub async fn scrollback(&self) -> String {
        self.shared
            .internals
            .lock()
            .await
            .scrollback
            .as_str()
            .to_string()
    }

    /// Recall an older command from the history.
    pub async fn history_previous(&self) -> Option<String> {
        let mut internals = self.shared.internals.lock().await;
        internals.history.previous().map(str::to_string)
    }

    /// Recall a newer command. `None` means back at the current input.
    pub async fn history_next(&self) -> Option<String> {
        let mut internals = self.shared.internals.lock().await;
        internals.history.next().map(str::to_string)
    }

    pub async fn history(&self) -> Vec<String> {
        let internals = self.shared.internals.lock().await;
        internals.history.entries().map(str::to_string).collect()
    }

    pub async fn breakpoints(&self) -> Vec<Breakpoint> {
        self.shared.internals.lock().await.registry.breakpoints()
    }

    pub async fn config_row(&self, name: &str) -> Option<ConfigRow> {
        let internals = self.shared.internals.lock().await;
        internals.registry.config_row(name).cloned()
    }

    /// The current listing with its annotations.
    pub async fn listing(&self) -> Option<Listing> {
        let internals = self.shared.internals.lock().await;
        let view = internals.listing.as_ref()?;
        Some(internals.render(view, self.shared.settings.scroll_context))
    }

    /// Source text of `line` if the current listing shows `filename`.
    pub async fn line_text(&self, filename: &str, line: usize) -> Option<String> {
        let internals = self.shared.internals.lock().await;
        let view = internals
            .listing
            .as_ref()
            .filter(|view| view.filename == filename)?;
        view.line_text(line).map(str::to_string)
    }

    /// Descriptor of one line of the current listing.
    pub async fn line(&self, number: usize) -> Option<LineDescriptor> {
        self.listing()
            .await?
            .lines
            .into_iter()
            .find(|l| l.number == number)
    }
}

impl<B> Drop for Controller<B> {
    fn drop(&mut self) {
        self.cancel_token.cancel();
    }
}

async fn dispatch<B: Backend>(
    shared: Arc<Shared<B>>,
    mut stream: EventStream,
    cancel_token: CancellationToken,
) -> SessionState {
    loop {
        let next = tokio::select! {
            _ = cancel_token.cancelled() => {
                tracing::debug!("controller dropped, abandoning command");
                return shared.internals.lock().await.session.state();
            }
            next = stream.next() => next,
        };

        match next {
            Some(Ok(StreamEvent::Output(chunk))) => shared.append_output(&chunk).await,
            Some(Ok(StreamEvent::Navigation {
                filename,
                line,
                show_arrow,
            })) => {
                // a failed fetch is shown in the listing itself
                let _ = shared.reload(&filename, line, show_arrow).await;
            }
            Some(Ok(StreamEvent::Terminated(true))) => {
                let mut internals = shared.internals.lock().await;
                internals.session.terminate();
                shared.emit(Event::State(SessionState::Terminated));
            }
            Some(Ok(StreamEvent::Terminated(false))) => {}
            Some(Err(e)) => {
                tracing::warn!(error = %e, "command stream failed");
                shared.append_output(&format!("{e}\n")).await;
                break;
            }
            None => break,
        }
    }

    shared.close_command().await
}
