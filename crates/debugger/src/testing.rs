//! Testing utilities for the controller.
//!
//! [`MockBackend`] is an in-process fake of the debugger backend. It keeps
//! its own breakpoint table the way the real backend does, serves scripted
//! listings and command streams, and records every call it receives.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};

use futures::StreamExt;
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;
use transport::{BreakpointArguments, BreakpointBody, ClientError, ListingBody, SourceLine};

use crate::backend::{Backend, EventStream, StreamEvent};
use crate::error::BackendError;

/// A call received by [`MockBackend`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Command(String),
    List {
        filename: String,
        line: usize,
        show_arrow: bool,
    },
    Toggle(BreakpointArguments),
    Delete(BreakpointArguments),
    Update {
        name: String,
        config: String,
    },
    Interrupt,
}

impl Call {
    /// Whether the call touches the backend's breakpoints.
    pub fn is_breakpoint_call(&self) -> bool {
        matches!(self, Call::Toggle(_) | Call::Delete(_) | Call::Update { .. })
    }
}

enum Scripted {
    Stream(mpsc::UnboundedReceiver<Result<StreamEvent, BackendError>>),
    Fail(String),
}

#[derive(Default)]
struct MockState {
    calls: Vec<Call>,
    scripts: HashMap<String, VecDeque<Scripted>>,
    files: HashMap<String, Vec<SourceLine>>,
    breakpoints: Vec<BreakpointBody>,
    next_id: i64,
    rejected_configs: VecDeque<bool>,
    config_failures: VecDeque<String>,
    failures: VecDeque<String>,
}

/// Feeds the event stream of one scripted command.
///
/// Events pushed before the command starts are delivered as soon as it does.
/// Dropping the script closes the stream.
#[derive(Debug)]
pub struct CommandScript {
    tx: mpsc::UnboundedSender<Result<StreamEvent, BackendError>>,
}

impl CommandScript {
    pub fn output(&self, chunk: &str) -> &Self {
        self.send(Ok(StreamEvent::Output(chunk.to_string())))
    }

    pub fn navigate(&self, filename: &str, line: usize, show_arrow: bool) -> &Self {
        self.send(Ok(StreamEvent::Navigation {
            filename: filename.to_string(),
            line,
            show_arrow,
        }))
    }

    pub fn terminate(&self) -> &Self {
        self.send(Ok(StreamEvent::Terminated(true)))
    }

    /// Break the stream with a transport error.
    pub fn fail(&self) -> &Self {
        self.send(Err(BackendError::Transport(ClientError::Disconnected)))
    }

    /// Close the stream.
    pub fn close(self) {}

    fn send(&self, event: Result<StreamEvent, BackendError>) -> &Self {
        // the controller may already have dropped the stream
        let _ = self.tx.send(event);
        self
    }
}

/// In-process fake backend. Clones share state.
#[derive(Clone, Default)]
pub struct MockBackend {
    state: Arc<Mutex<MockState>>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().expect("mock backend state poisoned")
    }

    /// Script the next run of `command`.
    ///
    /// Commands without a script produce an empty stream.
    pub fn script(&self, command: &str) -> CommandScript {
        let (tx, rx) = mpsc::unbounded_channel();
        self.state()
            .scripts
            .entry(command.to_string())
            .or_default()
            .push_back(Scripted::Stream(rx));
        CommandScript { tx }
    }

    /// Make the next run of `command` fail to start.
    pub fn fail_command(&self, command: &str, message: &str) {
        self.state()
            .scripts
            .entry(command.to_string())
            .or_default()
            .push_back(Scripted::Fail(message.to_string()));
    }

    /// Serve `source` as the contents of `filename`.
    pub fn add_file(&self, filename: &str, source: &str) {
        let lines = source
            .lines()
            .enumerate()
            .map(|(i, text)| SourceLine {
                number: i + 1,
                text: text.to_string(),
            })
            .collect();
        self.state().files.insert(filename.to_string(), lines);
    }

    /// Serve a numbered placeholder file of `count` lines.
    pub fn add_numbered_file(&self, filename: &str, count: usize) {
        let source: Vec<String> = (1..=count).map(|n| format!("line {n}")).collect();
        self.add_file(filename, &source.join("\n"));
    }

    /// Add a breakpoint to the backend's table, as if set from elsewhere.
    pub fn insert_breakpoint(&self, breakpoint: BreakpointBody) {
        let mut state = self.state();
        state.next_id = state.next_id.max(breakpoint.id);
        state.breakpoints.push(breakpoint);
    }

    /// Move a breakpoint in the backend's table, as after source drift.
    pub fn move_breakpoint(&self, name: &str, line: usize) {
        let mut state = self.state();
        if let Some(bp) = state.breakpoints.iter_mut().find(|bp| bp.identity() == name) {
            bp.line = line;
        }
    }

    /// Reject the next configuration update.
    pub fn reject_next_config(&self) {
        self.state().rejected_configs.push_back(true);
    }

    /// Fail the next configuration update with `message`.
    pub fn fail_next_config(&self, message: &str) {
        self.state().config_failures.push_back(message.to_string());
    }

    /// Fail the next toggle or delete with `message`.
    pub fn fail_next_breakpoint_request(&self, message: &str) {
        self.state().failures.push_back(message.to_string());
    }

    pub fn breakpoints(&self) -> Vec<BreakpointBody> {
        self.state().breakpoints.clone()
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state().calls.clone()
    }

    /// Commands opened so far, in order.
    pub fn commands(&self) -> Vec<String> {
        self.state()
            .calls
            .iter()
            .filter_map(|c| match c {
                Call::Command(command) => Some(command.clone()),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: Call) {
        tracing::trace!(?call, "mock backend call");
        self.state().calls.push(call);
    }

    fn rejected(action: &'static str, message: impl Into<String>) -> BackendError {
        BackendError::Transport(ClientError::Rejected {
            action,
            message: message.into(),
        })
    }
}

impl Backend for MockBackend {
    async fn open_command(&self, command: &str) -> Result<EventStream, BackendError> {
        self.record(Call::Command(command.to_string()));

        let scripted = self
            .state()
            .scripts
            .get_mut(command)
            .and_then(VecDeque::pop_front);
        match scripted {
            Some(Scripted::Stream(rx)) => Ok(UnboundedReceiverStream::new(rx).boxed()),
            Some(Scripted::Fail(message)) => Err(Self::rejected("command", message)),
            None => Ok(futures::stream::empty().boxed()),
        }
    }

    async fn list(
        &self,
        filename: &str,
        line: usize,
        show_arrow: bool,
    ) -> Result<ListingBody, BackendError> {
        self.record(Call::List {
            filename: filename.to_string(),
            line,
            show_arrow,
        });

        let state = self.state();
        let lines = state
            .files
            .get(filename)
            .cloned()
            .ok_or_else(|| Self::rejected("list", format!("open {filename}: no such file")))?;
        let breakpoints = state
            .breakpoints
            .iter()
            .filter(|bp| bp.filename == filename)
            .cloned()
            .collect();
        Ok(ListingBody { lines, breakpoints })
    }

    async fn toggle(&self, args: BreakpointArguments) -> Result<BreakpointBody, BackendError> {
        self.record(Call::Toggle(args.clone()));

        let mut state = self.state();
        if let Some(message) = state.failures.pop_front() {
            return Err(Self::rejected("toggle", message));
        }

        if let Some(bp) = state
            .breakpoints
            .iter_mut()
            .find(|bp| bp.filename == args.filename && bp.line == args.line)
        {
            bp.enabled = !bp.enabled;
            return Ok(bp.clone());
        }

        state.next_id += 1;
        let bp = BreakpointBody {
            name: String::new(),
            id: state.next_id,
            function: "main.main".to_string(),
            filename: args.filename,
            line: args.line,
            line_contents: args.line_contents,
            config: String::new(),
            enabled: true,
        };
        state.breakpoints.push(bp.clone());
        Ok(bp)
    }

    async fn delete(&self, args: BreakpointArguments) -> Result<BreakpointBody, BackendError> {
        self.record(Call::Delete(args.clone()));

        let mut state = self.state();
        if let Some(message) = state.failures.pop_front() {
            return Err(Self::rejected("delete", message));
        }

        let index = state
            .breakpoints
            .iter()
            .position(|bp| bp.filename == args.filename && bp.line == args.line)
            .ok_or_else(|| {
                Self::rejected(
                    "delete",
                    format!("no breakpoint at {}:{}", args.filename, args.line),
                )
            })?;
        Ok(state.breakpoints.remove(index))
    }

    async fn update_config(&self, name: &str, config: &str) -> Result<bool, BackendError> {
        self.record(Call::Update {
            name: name.to_string(),
            config: config.to_string(),
        });

        let mut state = self.state();
        if let Some(message) = state.config_failures.pop_front() {
            return Err(Self::rejected("update", message));
        }
        if state.rejected_configs.pop_front().unwrap_or(false) {
            return Ok(false);
        }
        match state.breakpoints.iter_mut().find(|bp| bp.identity() == name) {
            Some(bp) => {
                bp.config = config.to_string();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn interrupt(&self) -> Result<(), BackendError> {
        self.record(Call::Interrupt);
        Ok(())
    }
}
