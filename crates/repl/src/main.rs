use std::io::{IsTerminal, Write};
use std::path::PathBuf;

use clap::Parser;
use eyre::WrapErr;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

use config::Config;
use debugger::{
    Controller, Event, EventReceiver, Gesture, LineDescriptor, Listing, SessionError,
    SessionState, TcpBackend,
};

mod input;

use input::{Input, Recall};

/// Lines of source shown per listing.
const LISTING_HEIGHT: usize = 20;

struct App {
    controller: Controller<TcpBackend>,
    events: EventReceiver,
    // echo of the last submitted command, already visible on the terminal
    pending_echo: Option<String>,
    recall: Recall,
}

impl App {
    fn new(controller: Controller<TcpBackend>, events: EventReceiver) -> Self {
        Self {
            controller,
            events,
            pending_echo: None,
            recall: Recall::default(),
        }
    }

    async fn run(&mut self) -> eyre::Result<()> {
        print!("{}", self.controller.scrollback().await);
        std::io::stdout().flush()?;

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            tokio::select! {
                line = lines.next_line() => {
                    let Some(line) = line.wrap_err("reading from stdin")? else {
                        tracing::debug!("stdin closed");
                        break;
                    };
                    if self.handle_input(&line).await? == ShouldQuit::True {
                        break;
                    }
                }
                event = self.events.recv() => {
                    let Some(event) = event else {
                        break;
                    };
                    self.handle_event(event).wrap_err("rendering event")?;
                }
                signal = tokio::signal::ctrl_c() => {
                    signal.wrap_err("listening for ctrl-c")?;
                    if let Err(e) = self.controller.interrupt().await {
                        eprintln!("interrupt failed: {e}");
                    }
                }
            }
            std::io::stdout().flush()?;
        }

        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn handle_input(&mut self, line: &str) -> eyre::Result<ShouldQuit> {
        let input = match input::parse(line) {
            Ok(input) => input,
            Err(e) => {
                eprintln!("{e}");
                return Ok(ShouldQuit::False);
            }
        };

        match input {
            Input::Command(raw) => {
                let command = self.recall.resolve(raw);
                match self.controller.submit(&command).await {
                    Ok(dispatch) => {
                        self.pending_echo = Some(format!("{}\n", dispatch.command()));
                    }
                    Err(SessionError::EmptyCommand) => self.print_prompt().await,
                    // already reported through an alert or the scrollback
                    Err(e) if e.is_session_state() => {}
                    Err(SessionError::CommandFailed { .. }) => {}
                    Err(e) => eprintln!("{e}"),
                }
            }
            Input::Toggle { filename, line } => {
                self.toggle(&filename, line, Gesture::Toggle).await;
            }
            Input::Delete { filename, line } => {
                self.toggle(&filename, line, Gesture::Delete).await;
            }
            Input::Config { name, text } => {
                match self.controller.update_config(&name, &text).await {
                    Ok(()) => println!("{name}: configuration accepted"),
                    Err(e) => eprintln!("{e}"),
                }
            }
            Input::List { filename, line } => {
                // failures are rendered as part of the listing
                let _ = self.controller.reload(&filename, line, false).await;
            }
            Input::Previous => {
                let recalled = self.controller.history_previous().await;
                match &recalled {
                    Some(command) => println!("{command}  (empty line to run)"),
                    None => println!("(no older command)"),
                }
                self.recall.set(recalled);
            }
            Input::Next => {
                let recalled = self.controller.history_next().await;
                match &recalled {
                    Some(command) => println!("{command}  (empty line to run)"),
                    None => println!("(current input)"),
                }
                self.recall.set(recalled);
            }
            Input::Quit => return Ok(ShouldQuit::True),
        }
        Ok(ShouldQuit::False)
    }

    async fn toggle(&self, filename: &str, line: usize, gesture: Gesture) {
        let contents = self
            .controller
            .line_text(filename, line)
            .await
            .unwrap_or_default();

        match self
            .controller
            .toggle_breakpoint(filename, line, &contents, gesture)
            .await
        {
            Ok(bp) if gesture == Gesture::Delete => println!("{} deleted", bp.name),
            Ok(bp) => println!(
                "{} at {}:{} {}",
                bp.name,
                bp.anchor.filename,
                bp.anchor.line,
                if bp.enabled { "enabled" } else { "disabled" }
            ),
            Err(e) if e.is_session_state() => {}
            Err(e) => eprintln!("{e}"),
        }
    }

    async fn print_prompt(&self) {
        let scrollback = self.controller.scrollback().await;
        let prompt = scrollback.rsplit('\n').next().unwrap_or_default();
        print!("{prompt}");
    }

    fn handle_event(&mut self, event: Event) -> eyre::Result<()> {
        match event {
            Event::Output(text) => {
                if self.pending_echo.take().is_some_and(|echo| echo == text) {
                    return Ok(());
                }
                print!("{text}");
            }
            Event::Listing(listing) => render_listing(&listing),
            Event::Breakpoints(lines) => {
                for line in lines.iter().filter(|l| l.marker.is_some() || l.error.is_some()) {
                    render_line(line);
                }
            }
            Event::State(SessionState::Terminated) => println!("debuggee exited, :q to quit"),
            Event::State(state) => tracing::debug!(?state, "session state changed"),
            Event::Alert(message) => eprintln!("! {message}"),
        }
        Ok(())
    }
}

fn render_listing(listing: &Listing) {
    println!("--- {}:{}", listing.filename, listing.focus_line);
    if let Some(error) = &listing.error {
        println!("{error}");
        return;
    }

    let first = listing.scroll.first_visible(LISTING_HEIGHT);
    for line in listing
        .lines
        .iter()
        .skip_while(|l| l.number < first)
        .take(LISTING_HEIGHT)
    {
        render_line(line);
    }
}

fn render_line(line: &LineDescriptor) {
    let marker = match &line.marker {
        Some(m) if m.enabled => format!("{:>5}", m.name),
        Some(m) => format!("({:>3})", m.name),
        None => "     ".to_string(),
    };
    let arrow = if line.arrow { "=>" } else { "  " };
    println!("{marker} {:>5} {arrow} {}", line.number, line.text);

    if let Some(row) = &line.config_row {
        let flag = if row.invalid { '!' } else { '|' };
        for text in row.text.split('\n') {
            println!("{:>14}{flag} {text}", "");
        }
    }
    if let Some(error) = &line.error {
        println!("{:>14}x {error}", "");
    }
}

#[derive(Debug, PartialEq, Eq)]
enum ShouldQuit {
    True,
    False,
}

#[derive(Debug, Parser)]
#[command(about = "Console for a remote vdlv debugger backend")]
struct Args {
    /// Backend address, overriding the config file.
    #[arg(short, long)]
    address: Option<String>,

    /// Config file to use instead of the default location.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

fn init_tracing() {
    if std::io::stderr().is_terminal() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .with_writer(std::io::stderr)
            .try_init();
    } else {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .with_writer(std::io::stderr)
            .json()
            .try_init();
    }
}

#[tokio::main]
async fn main() -> eyre::Result<()> {
    color_eyre::install().wrap_err("installing color_eyre")?;
    init_tracing();

    let args = Args::parse();
    let mut config = Config::load(args.config.as_deref()).wrap_err("loading config")?;
    if let Some(address) = args.address {
        config.address = address;
    }
    tracing::debug!(?config, "starting console");

    let backend = TcpBackend::from_config(&config)
        .await
        .wrap_err_with(|| format!("connecting to backend at {}", config.address))?;
    let (controller, events) = Controller::new(backend, &config);

    App::new(controller, events).run().await
}
