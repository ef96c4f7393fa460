//! Protocol constants for Nucleo panel communication.
//!
//! This module defines all the constants used in the A5 5A TCP protocol,
//! including command ids, frame layout, and timing parameters.

/// First magic byte of every frame
pub const MAGIC_0: u8 = 0xA5;

/// Second magic byte of every frame
pub const MAGIC_1: u8 = 0x5A;

/// Magic prefix identifying a valid frame
pub const MAGIC: [u8; 2] = [MAGIC_0, MAGIC_1];

/// Length of an outgoing command frame
pub const FRAME_LEN: usize = 4;

/// LED1 toggle command (value 0/1)
pub const LED1_CMD: u8 = 0x01;

/// LED2 toggle command (value 0/1)
pub const LED2_CMD: u8 = 0x02;

/// Telemetry request command (asks for both potentiometer readings)
pub const TELEMETRY_CMD: u8 = 0x10;

/// Slider/PWM command on the request path, telemetry payload id on the reply path
pub const SLIDER_CMD: u8 = 0x30;

/// Telemetry reply id (same byte as the slider command)
pub const TELEMETRY_REPLY: u8 = 0x30;

/// Acknowledgement reply id, sent by the firmware after every command
pub const ACK_REPLY: u8 = 0x40;

/// Acknowledgement payload
pub const ACK_PAYLOAD: &[u8] = b"OK";

/// Value sent along with a telemetry request
pub const TELEMETRY_VALUE: u8 = 0x00;

/// Largest slider value the firmware maps to a PWM duty (value / 100)
pub const SLIDER_MAX: u8 = 100;

/// Offset of the first telemetry value in a reply
pub const TELEMETRY_FIRST_OFFSET: usize = 3;

/// Offset of the second telemetry value in a reply
pub const TELEMETRY_SECOND_OFFSET: usize = 4;

/// Receive buffer capacity (one read per exchange)
pub const RESPONSE_BUFFER_SIZE: usize = 100;

/// Default device endpoint
pub const DEFAULT_ENDPOINT: &str = "192.168.137.120:61";

/// Connect timeout in milliseconds
pub const CONNECT_TIMEOUT_MS: u64 = 1000;

/// Read timeout in milliseconds
pub const READ_TIMEOUT_MS: u64 = 2000;

/// Interval between telemetry requests while polling
pub const POLL_INTERVAL_MS: u64 = 1000;
