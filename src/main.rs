//! Command-line front panel for a Nucleo board.
//!
//! Subcommands:
//! - `poll`: connect and poll telemetry every interval until a failure or timeout
//! - `telemetry`: send one telemetry request
//! - `led`: switch LED1 or LED2
//! - `slider`: send a PWM slider value
//! - `raw`: send any command id/value pair
//! - `interactive`: menu-driven panel with background polling
//!
//! Set RUST_LOG to control logging:
//!   RUST_LOG=debug nucleo-link poll

use std::fmt;
use std::io;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use clap::{Parser, Subcommand, ValueEnum};
use inquire::{CustomType, InquireError, Select};
use log::{debug, info, warn};
use nucleo_link::constants::{DEFAULT_ENDPOINT, SLIDER_MAX};
use nucleo_link::session::{lock_session, spawn_poller};
use nucleo_link::{
    Config, Led, LogSink, Nucleo, NucleoError, OutputFormat, Panel, Result, Session,
};

/// Nucleo TCP panel client
#[derive(Parser, Debug)]
#[command(name = "nucleo-link")]
#[command(about = "Poll and control an mbed Nucleo board over its A5 5A TCP protocol")]
#[command(version)]
struct Args {
    /// Device address as host:port (overrides the config file)
    #[arg(short, long, global = true)]
    endpoint: Option<String>,

    /// JSON config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Print each exchange as a JSON line on stdout
    #[arg(long, global = true)]
    json: bool,

    /// Log every frame sent and received
    #[arg(long, global = true)]
    debug_frames: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Poll telemetry until a failure (or for a fixed time)
    Poll {
        /// Stop after this many seconds
        #[arg(short, long)]
        duration: Option<u64>,
    },

    /// Request telemetry once
    Telemetry,

    /// Switch an LED
    Led {
        /// LED number
        #[arg(value_parser = clap::value_parser!(u8).range(1..=2))]
        led: u8,

        /// New LED state
        state: Switch,
    },

    /// Send a slider (PWM percent) value
    Slider {
        /// Slider position, 0-100
        value: u8,
    },

    /// Send an arbitrary frame
    Raw {
        /// Command id (decimal or 0x-prefixed hex)
        #[arg(value_parser = parse_byte)]
        id: u8,

        /// Value byte (decimal or 0x-prefixed hex)
        #[arg(value_parser = parse_byte)]
        value: u8,
    },

    /// Menu-driven panel with background polling
    Interactive,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
enum Switch {
    On,
    Off,
}

fn parse_byte(s: &str) -> std::result::Result<u8, String> {
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u8::from_str_radix(hex, 16),
        None => s.parse::<u8>(),
    };
    parsed.map_err(|e| format!("{s:?} is not a byte: {e}"))
}

fn load_config(args: &Args) -> Result<Config> {
    let mut config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    if let Some(endpoint) = &args.endpoint {
        config.endpoint = endpoint.parse()?;
    }
    Ok(config)
}

fn main() -> Result<()> {
    // Initialize logger with default info level if RUST_LOG is not set
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let config = load_config(&args)?;
    let format = if args.json {
        OutputFormat::Json
    } else {
        OutputFormat::Log
    };

    let mut nucleo = Nucleo::new(config);
    nucleo.set_debug_print(args.debug_frames, args.debug_frames);
    info!(
        "Using Nucleo at {} (default {})",
        nucleo.config().endpoint,
        DEFAULT_ENDPOINT
    );

    match args.command {
        Command::Poll { duration } => cmd_poll(nucleo, format, duration.map(Duration::from_secs)),
        Command::Telemetry => {
            let mut session = Session::new(nucleo, LogSink::new(format));
            if session.request_telemetry()?.is_none() {
                warn!("Reply did not contain telemetry");
            }
            Ok(())
        }
        Command::Led { led, state } => {
            let led = if led == 1 { Led::Led1 } else { Led::Led2 };
            let mut session = Session::new(nucleo, LogSink::new(format));
            session.set_led(led, matches!(state, Switch::On))?;
            Ok(())
        }
        Command::Slider { value } => {
            let mut session = Session::new(nucleo, LogSink::new(format));
            session.release_slider(value)?;
            Ok(())
        }
        Command::Raw { id, value } => {
            let mut session = Session::new(nucleo, LogSink::new(format));
            session.send_raw(id, value)?;
            Ok(())
        }
        Command::Interactive => cmd_interactive(nucleo, format),
    }
}

fn cmd_poll(nucleo: Nucleo, format: OutputFormat, duration: Option<Duration>) -> Result<()> {
    let mut session = Session::new(nucleo, LogSink::new(format));
    session.poll_for(duration)?;
    Ok(())
}

// ==================== Interactive Command ====================

#[derive(Debug, Clone, Copy)]
enum MenuAction {
    ToggleConnection,
    ToggleLed1,
    ToggleLed2,
    Slider,
    Quit,
}

impl MenuAction {
    const ALL: [MenuAction; 5] = [
        MenuAction::ToggleConnection,
        MenuAction::ToggleLed1,
        MenuAction::ToggleLed2,
        MenuAction::Slider,
        MenuAction::Quit,
    ];
}

impl fmt::Display for MenuAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            MenuAction::ToggleConnection => "Connect / disconnect",
            MenuAction::ToggleLed1 => "Toggle LED1",
            MenuAction::ToggleLed2 => "Toggle LED2",
            MenuAction::Slider => "Set slider",
            MenuAction::Quit => "Quit",
        };
        f.write_str(label)
    }
}

type PanelSession = Session<(LogSink, Panel)>;

fn status_line(session: &PanelSession) -> String {
    let on_off = |on: bool| if on { "on" } else { "off" };
    let progress = match session.sink().1.telemetry {
        Some(t) => format!("{} / {}", t.first, t.second),
        None => "-".to_string(),
    };
    let mut line = format!(
        "[{}] LED1 {} | LED2 {} | slider {} | progress {}",
        session.state(),
        on_off(session.led(Led::Led1)),
        on_off(session.led(Led::Led2)),
        session.slider(),
        progress
    );
    if let Some(failure) = &session.sink().1.last_failure {
        line.push_str(&format!(" | last error: {}", failure));
    }
    line
}

fn prompt_error(e: InquireError) -> NucleoError {
    NucleoError::Io(io::Error::new(
        io::ErrorKind::Other,
        format!("Prompt failed: {}", e),
    ))
}

/// Manual command failures are already reported through the sink
fn report<T>(result: Result<T>) {
    if let Err(e) = result {
        debug!("Command failed: {}", e);
    }
}

fn cmd_interactive(nucleo: Nucleo, format: OutputFormat) -> Result<()> {
    let session: Arc<Mutex<PanelSession>> = Arc::new(Mutex::new(Session::new(
        nucleo,
        (LogSink::new(format), Panel::default()),
    )));
    let stop = Arc::new(AtomicBool::new(false));
    let poller = spawn_poller(Arc::clone(&session), Arc::clone(&stop));

    let outcome = loop {
        let prompt = status_line(&lock_session(&session));
        let action = match Select::new(&prompt, MenuAction::ALL.to_vec()).prompt() {
            Ok(action) => action,
            Err(InquireError::OperationCanceled | InquireError::OperationInterrupted) => {
                break Ok(());
            }
            Err(e) => break Err(prompt_error(e)),
        };

        match action {
            MenuAction::ToggleConnection => {
                lock_session(&session).toggle_connection();
            }
            MenuAction::ToggleLed1 => report(lock_session(&session).toggle_led(Led::Led1)),
            MenuAction::ToggleLed2 => report(lock_session(&session).toggle_led(Led::Led2)),
            MenuAction::Slider => {
                let value = CustomType::<u8>::new("Slider value:")
                    .with_help_message(&format!("0-{}", SLIDER_MAX))
                    .with_error_message("Enter a number between 0 and 255")
                    .prompt();
                match value {
                    Ok(value) => report(lock_session(&session).release_slider(value)),
                    Err(InquireError::OperationCanceled) => {}
                    Err(e) => break Err(prompt_error(e)),
                }
            }
            MenuAction::Quit => break Ok(()),
        }
    };

    stop.store(true, Ordering::Relaxed);
    if poller.join().is_err() {
        warn!("Poll thread panicked");
    }
    lock_session(&session).disconnect();
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_byte() {
        assert_eq!(parse_byte("16"), Ok(16));
        assert_eq!(parse_byte("0x30"), Ok(0x30));
        assert_eq!(parse_byte("0XFF"), Ok(0xFF));
        assert!(parse_byte("256").is_err());
        assert!(parse_byte("0xZZ").is_err());
    }

    #[test]
    fn test_args_parse() {
        let argv = ["nucleo-link", "--endpoint", "10.0.0.1:502", "led", "2", "on"];
        let args = Args::try_parse_from(argv).unwrap();
        assert_eq!(args.endpoint.as_deref(), Some("10.0.0.1:502"));
        assert!(matches!(
            args.command,
            Command::Led {
                led: 2,
                state: Switch::On,
            }
        ));

        assert!(Args::try_parse_from(["nucleo-link", "led", "3", "on"]).is_err());
    }

    #[test]
    fn test_endpoint_overrides_default() {
        let argv = ["nucleo-link", "-e", "127.0.0.1:6100", "telemetry"];
        let args = Args::try_parse_from(argv).unwrap();
        let config = load_config(&args).unwrap();
        assert_eq!(config.endpoint.to_string(), "127.0.0.1:6100");
        assert_eq!(config.poll_interval_ms, 1000);
    }

    #[test]
    fn test_status_line() {
        let sink = (LogSink::new(OutputFormat::Log), Panel::default());
        let session = Session::new(Nucleo::new(Config::default()), sink);
        assert_eq!(
            status_line(&session),
            "[disconnected] LED1 off | LED2 off | slider 0 | progress -"
        );
    }
}
