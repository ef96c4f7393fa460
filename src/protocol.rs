use crate::codec::{self, CommandFrame};
use crate::config::{Config, Endpoint};
use crate::constants::*;
use crate::error::{NucleoError, Result};
use crate::types::*;
use log::{debug, info, trace, warn};
use std::io::{self, Read, Write};
use std::net::{Shutdown, SocketAddr, TcpStream, ToSocketAddrs};

fn is_timeout(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock
    )
}

/// Map the last failed connect attempt to an error.
///
/// `None` means resolution produced no address to try.
fn connect_error(
    endpoint: &Endpoint,
    timeout_ms: u64,
    last_error: Option<io::Error>,
) -> NucleoError {
    match last_error {
        Some(e) if is_timeout(&e) => NucleoError::ConnectTimeout {
            endpoint: endpoint.to_string(),
            timeout_ms,
        },
        Some(e) => NucleoError::Connect(e),
        None => NucleoError::Resolve(endpoint.to_string()),
    }
}

/// Main Nucleo protocol interface.
///
/// Holds no connection: every request opens a new TCP connection, sends one
/// frame, reads once and closes.
#[derive(Debug, Clone)]
pub struct Nucleo {
    config: Config,
    print_tx: bool,
    print_rx: bool,
}

impl Nucleo {
    /// Create a new Nucleo interface
    pub fn new(config: Config) -> Self {
        Nucleo {
            config,
            print_tx: false,
            print_rx: false,
        }
    }

    /// Create an interface for a `host:port` endpoint with default timing
    pub fn with_endpoint(endpoint: &str) -> Result<Self> {
        Ok(Nucleo::new(Config::from_endpoint_str(endpoint)?))
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Enable/disable debug printing for TX/RX
    pub fn set_debug_print(&mut self, tx: bool, rx: bool) {
        self.print_tx = tx;
        self.print_rx = rx;
    }

    /// Resolve the endpoint and connect within the connect timeout
    fn open(&self) -> Result<TcpStream> {
        let endpoint = &self.config.endpoint;
        let timeout = self.config.connect_timeout();

        let addrs: Vec<SocketAddr> = (endpoint.host.as_str(), endpoint.port)
            .to_socket_addrs()
            .map_err(|e| NucleoError::Resolve(format!("{}: {}", endpoint, e)))?
            .collect();

        let mut last_error = None;
        for addr in addrs {
            match TcpStream::connect_timeout(&addr, timeout) {
                Ok(stream) => {
                    trace!("Connected to {}", addr);
                    return Ok(stream);
                }
                Err(e) => {
                    debug!("Connect to {} failed: {}", addr, e);
                    last_error = Some(e);
                }
            }
        }

        Err(connect_error(endpoint, self.config.connect_timeout_ms, last_error))
    }

    /// Write the frame and perform a single read
    fn exchange(&self, stream: &mut TcpStream, frame: &CommandFrame) -> Result<Response> {
        stream.set_read_timeout(self.config.read_timeout())?;
        // The frame is 4 bytes; the connect timeout also bounds the write
        stream.set_write_timeout(Some(self.config.connect_timeout()))?;

        if self.print_tx {
            info!("Sending:  {}", codec::to_hex(frame.as_bytes()));
        }
        stream.write_all(frame.as_bytes())?;
        stream.flush()?;

        let mut buf = [0u8; RESPONSE_BUFFER_SIZE];
        let len = match stream.read(&mut buf) {
            Ok(n) => n,
            Err(e) if is_timeout(&e) => return Err(NucleoError::ReadTimeout),
            Err(e) => return Err(e.into()),
        };

        let response = Response::new(buf, len);
        if self.print_rx {
            info!("Received: {}", response.hex());
        }
        Ok(response)
    }

    /// Send a raw command frame and return whatever a single read produced.
    ///
    /// The connection is closed before returning, on success and on error.
    pub fn send_command(&self, command_id: u8, value: u8) -> Result<Response> {
        let frame = CommandFrame::new(command_id, value);
        let mut stream = self.open()?;
        let result = self.exchange(&mut stream, &frame);
        let _ = stream.shutdown(Shutdown::Both);
        result
    }

    /// Send a typed command
    pub fn send(&self, command: Command) -> Result<Response> {
        self.send_command(command.id(), command.value())
    }

    /// Ask the board for both potentiometer readings.
    ///
    /// `Ok(None)` means the exchange worked but the reply was not telemetry.
    pub fn request_telemetry(&self) -> Result<Option<Telemetry>> {
        Ok(self.send(Command::Telemetry)?.telemetry())
    }

    /// Switch an LED on or off
    pub fn set_led(&self, led: Led, on: bool) -> Result<Response> {
        self.send(Command::Led { led, on })
    }

    /// Send a slider value (PWM duty in percent on the board)
    pub fn set_slider(&self, value: u8) -> Result<Response> {
        if value > SLIDER_MAX {
            warn!(
                "Slider value {} is above {}; the board will saturate the PWM duty",
                value, SLIDER_MAX
            );
        }
        self.send(Command::Slider(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn endpoint() -> Endpoint {
        Endpoint::new("192.168.137.120", 61)
    }

    #[test]
    fn test_connect_timeout_mapping() {
        let timed_out = io::Error::from(io::ErrorKind::TimedOut);
        let err = connect_error(&endpoint(), 1000, Some(timed_out));
        assert!(matches!(err, NucleoError::ConnectTimeout { .. }));
        assert!(err.is_communication_failure());
        assert_eq!(
            err.to_string(),
            "Connection to 192.168.137.120:61 timed out after 1000 ms"
        );

        let would_block = io::Error::from(io::ErrorKind::WouldBlock);
        let err = connect_error(&endpoint(), 250, Some(would_block));
        assert!(matches!(err, NucleoError::ConnectTimeout { .. }));
        assert!(err.to_string().ends_with("after 250 ms"));
    }

    #[test]
    fn test_refusal_is_not_a_timeout() {
        let refused = io::Error::from(io::ErrorKind::ConnectionRefused);
        let err = connect_error(&endpoint(), 1000, Some(refused));
        assert!(matches!(err, NucleoError::Connect(_)));
        assert!(err.is_communication_failure());
    }

    #[test]
    fn test_no_address_is_a_resolve_error() {
        let err = connect_error(&endpoint(), 1000, None);
        assert!(matches!(err, NucleoError::Resolve(_)));
    }
}
