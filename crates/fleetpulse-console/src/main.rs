use std::error::Error;
use std::io;
use std::time::Duration;

use crossterm::event::{self, Event};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;

use fleetpulse_console::{
    ConsoleApp, DemoBackend, FavoritesStore, FleetBackend, HttpBackend, InputEvent, Poller,
    ScreenContext, DEFAULT_POLL_PERIOD,
};

/// Backend base URL when neither flag nor environment provides one.
const DEFAULT_BASE_URL: &str = "http://127.0.0.1:5000";

struct TerminalGuard {
    terminal: Terminal<CrosstermBackend<io::Stdout>>,
}

impl TerminalGuard {
    fn enter() -> Result<Self, Box<dyn Error>> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(
            stdout,
            EnterAlternateScreen,
            crossterm::event::EnableMouseCapture
        )?;
        let backend = CrosstermBackend::new(stdout);
        let terminal = Terminal::new(backend)?;
        Ok(Self { terminal })
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(
            self.terminal.backend_mut(),
            LeaveAlternateScreen,
            crossterm::event::DisableMouseCapture
        );
        let _ = self.terminal.show_cursor();
    }
}

const fn map_event(event: &Event) -> Option<InputEvent> {
    match event {
        Event::Key(key) => Some(InputEvent::Key(key.code, key.modifiers)),
        Event::Mouse(mouse) => Some(InputEvent::Mouse(mouse.kind, mouse.column, mouse.row)),
        Event::Resize(width, height) => Some(InputEvent::Resize(*width, *height)),
        Event::FocusGained | Event::FocusLost | Event::Paste(_) => None,
    }
}

#[derive(Debug, Clone)]
struct RuntimeOptions {
    base_url: String,
    demo_mode: bool,
    poll_period: Duration,
}

impl Default for RuntimeOptions {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_owned(),
            demo_mode: false,
            poll_period: DEFAULT_POLL_PERIOD,
        }
    }
}

fn parse_runtime_options() -> Result<RuntimeOptions, Box<dyn Error>> {
    let mut options = RuntimeOptions::default();
    let mut base_url_set = false;
    let mut poll_set = false;

    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--demo" => {
                options.demo_mode = true;
            }
            "--base-url" => {
                let value = args.next().ok_or_else(|| {
                    io::Error::new(
                        io::ErrorKind::InvalidInput,
                        "--base-url requires a URL argument",
                    )
                })?;
                options.base_url = value;
                base_url_set = true;
            }
            "--poll-ms" => {
                let value = args.next().ok_or_else(|| {
                    io::Error::new(
                        io::ErrorKind::InvalidInput,
                        "--poll-ms requires a millisecond argument",
                    )
                })?;
                let ms: u64 = value.parse().map_err(|_| {
                    io::Error::new(
                        io::ErrorKind::InvalidInput,
                        format!("invalid --poll-ms value: {value}"),
                    )
                })?;
                options.poll_period = Duration::from_millis(ms.max(250));
                poll_set = true;
            }
            "-h" | "--help" => {
                print_help();
                std::process::exit(0);
            }
            other => {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!("unknown argument: {other}"),
                )
                .into());
            }
        }
    }

    if !options.demo_mode
        && let Ok(value) = std::env::var("FLEETPULSE_DEMO")
    {
        let value = value.trim();
        options.demo_mode = matches!(value, "1" | "true" | "TRUE" | "True");
    }
    if !base_url_set
        && let Ok(value) = std::env::var("FLEETPULSE_BASE_URL")
    {
        let value = value.trim();
        if !value.is_empty() {
            options.base_url = value.to_owned();
        }
    }
    if !poll_set
        && let Ok(value) = std::env::var("FLEETPULSE_POLL_MS")
        && let Ok(ms) = value.trim().parse::<u64>()
    {
        options.poll_period = Duration::from_millis(ms.max(250));
    }

    Ok(options)
}

fn print_help() {
    println!("fleetpulse");
    println!();
    println!("Usage:");
    println!("  fleetpulse [--base-url <url>] [--poll-ms <n>] [--demo]");
    println!();
    println!("Flags:");
    println!("  --base-url <url>  Fleet backend base URL (default {DEFAULT_BASE_URL})");
    println!("  --poll-ms <n>     Snapshot poll period in milliseconds (default 2000)");
    println!("  --demo            Use the deterministic offline demo fleet");
    println!("  -h, --help        Show this help message");
    println!();
    println!("Environment:");
    println!("  FLEETPULSE_BASE_URL=<url>");
    println!("  FLEETPULSE_POLL_MS=<n>");
    println!("  FLEETPULSE_DEMO=true|false");
    println!("  FLEETPULSE_FAVORITES_PATH=<path>");
    println!("  FLEETPULSE_LOG=<tracing filter>   (logs to stderr)");
}

fn init_tracing() {
    // Opt-in only: an always-on stderr subscriber would fight the TUI.
    if let Ok(filter) = std::env::var("FLEETPULSE_LOG") {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::new(filter))
            .with_writer(io::stderr)
            .try_init();
    }
}

fn build_backend(options: &RuntimeOptions) -> Result<Box<dyn FleetBackend>, Box<dyn Error>> {
    if options.demo_mode {
        return Ok(Box::new(DemoBackend::sample(42)));
    }
    Ok(Box::new(HttpBackend::new(options.base_url.clone())?))
}

fn main() -> Result<(), Box<dyn Error>> {
    let options = parse_runtime_options()?;
    init_tracing();

    let favorites = FavoritesStore::load(FavoritesStore::default_path());
    let poller = Poller::spawn(build_backend(&options)?, options.poll_period);
    let mut app = ConsoleApp::new(poller, favorites);

    let mut terminal = TerminalGuard::enter()?;
    // Redraw often enough for the clock and spinner even when idle.
    let frame_budget = Duration::from_millis(250);

    while !app.should_quit() {
        app.drain_events();
        terminal.terminal.draw(|frame| app.render(frame))?;

        if event::poll(frame_budget)? {
            let raw = event::read()?;
            if let Some(input) = map_event(&raw) {
                let size = terminal.terminal.size()?;
                let ctx = ScreenContext {
                    terminal_width: size.width,
                    terminal_height: size.height,
                };
                app.handle_input(&input, &ctx);
            }
        }
    }

    Ok(())
}
