use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::codec;
use crate::constants::*;

/// Potentiometer readings reported by a telemetry reply (0-255 each)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Telemetry {
    pub first: u8,
    pub second: u8,
}

/// Connection state of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LinkState {
    #[default]
    Disconnected,
    Polling,
}

impl fmt::Display for LinkState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LinkState::Disconnected => write!(f, "disconnected"),
            LinkState::Polling => write!(f, "connected"),
        }
    }
}

/// The two board LEDs driven by toggle commands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Led {
    Led1,
    Led2,
}

impl Led {
    pub fn command_id(self) -> u8 {
        match self {
            Led::Led1 => LED1_CMD,
            Led::Led2 => LED2_CMD,
        }
    }
}

/// A request the board understands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Telemetry,
    Led { led: Led, on: bool },
    Slider(u8),
    Raw { id: u8, value: u8 },
}

impl Command {
    pub fn id(&self) -> u8 {
        match *self {
            Command::Telemetry => TELEMETRY_CMD,
            Command::Led { led, .. } => led.command_id(),
            Command::Slider(_) => SLIDER_CMD,
            Command::Raw { id, .. } => id,
        }
    }

    pub fn value(&self) -> u8 {
        match *self {
            Command::Telemetry => TELEMETRY_VALUE,
            Command::Led { on, .. } => u8::from(on),
            Command::Slider(value) => value,
            Command::Raw { value, .. } => value,
        }
    }
}

/// Bytes received by a single read, with the number of bytes actually read
#[derive(Clone)]
pub struct Response {
    buf: [u8; RESPONSE_BUFFER_SIZE],
    len: usize,
}

impl Response {
    pub(crate) fn new(buf: [u8; RESPONSE_BUFFER_SIZE], len: usize) -> Self {
        Response {
            buf,
            len: len.min(RESPONSE_BUFFER_SIZE),
        }
    }

    /// Build a response from raw bytes, truncating to the buffer capacity
    pub fn from_bytes(bytes: &[u8]) -> Self {
        let len = bytes.len().min(RESPONSE_BUFFER_SIZE);
        let mut buf = [0u8; RESPONSE_BUFFER_SIZE];
        buf[..len].copy_from_slice(&bytes[..len]);
        Response { buf, len }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.buf[..self.len]
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn telemetry(&self) -> Option<Telemetry> {
        codec::decode_telemetry(self.bytes())
    }

    pub fn hex(&self) -> String {
        codec::to_hex(self.bytes())
    }
}

impl fmt::Debug for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Response")
            .field("len", &self.len)
            .field("bytes", &format_args!("{:02X?}", self.bytes()))
            .finish()
    }
}

/// One completed exchange, as reported to event sinks and JSON output
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExchangeRecord {
    pub timestamp: DateTime<Utc>,
    pub command_id: u8,
    pub value: u8,
    pub received: Vec<u8>,
    pub hex: String,
    pub telemetry: Option<Telemetry>,
}

impl ExchangeRecord {
    pub fn new(command: Command, response: &Response) -> Self {
        ExchangeRecord {
            timestamp: Utc::now(),
            command_id: command.id(),
            value: command.value(),
            received: response.bytes().to_vec(),
            hex: response.hex(),
            telemetry: response.telemetry(),
        }
    }
}

/// Output format options for the command-line front end
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Log,
    Json,
}
