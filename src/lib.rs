//! # Nucleo Link
//!
//! A Rust library for polling and controlling an mbed Nucleo board over its
//! small `A5 5A` TCP panel protocol. The board reports two potentiometer
//! readings, drives two LEDs and takes a PWM value from a slider.
//!
//! ## Features
//!
//! - Encode 4-byte command frames and decode telemetry replies
//! - One TCP connection per request with a bounded connect timeout
//! - Disconnected/Polling state machine with LED toggles and slider updates
//! - Event sinks for log output, JSON lines or a terminal front panel
//!
//! ## Example
//!
//! ```no_run
//! use nucleo_link::{Led, Nucleo};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let nucleo = Nucleo::with_endpoint("192.168.137.120:61")?;
//!     if let Some(telemetry) = nucleo.request_telemetry()? {
//!         println!("Pot 1: {}  Pot 2: {}", telemetry.first, telemetry.second);
//!     }
//!     nucleo.set_led(Led::Led1, true)?;
//!     Ok(())
//! }
//! ```

pub mod codec;
pub mod config;
pub mod constants;
pub mod error;
pub mod protocol;
pub mod session;
pub mod types;

pub use config::{Config, Endpoint};
pub use error::{NucleoError, Result};
pub use protocol::Nucleo;
pub use session::{EventSink, LogSink, Panel, Session};
pub use types::*;
