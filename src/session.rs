//! Connection state machine and actuator toggles.
//!
//! A [`Session`] starts `Disconnected`. [`Session::toggle_connection`] moves it
//! to `Polling`, after which every [`Session::tick`] sends a telemetry
//! request. Any communication failure, from a tick or from a manual command,
//! drops the session back to `Disconnected` and reports the failure once.
//! LED and slider commands work in either state.
//!
//! Results are reported through an [`EventSink`] rather than returned to a
//! UI, so the same session drives log output, JSON lines or a terminal menu.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use log::{error, info, warn};

use crate::error::{NucleoError, Result};
use crate::protocol::Nucleo;
use crate::types::*;

/// Number of exchanges kept by [`Panel`]
pub const HISTORY_LEN: usize = 100;

/// Receiver for everything a session has to report
pub trait EventSink {
    /// Connection state was set (also sent on failure, even if already disconnected)
    fn on_status(&mut self, _state: LinkState) {}

    /// A telemetry reply arrived
    fn on_telemetry(&mut self, _telemetry: Telemetry) {}

    /// An exchange completed, whatever the reply contained
    fn on_exchange(&mut self, _record: &ExchangeRecord) {}

    /// A request failed and polling was stopped
    fn on_failure(&mut self, _error: &NucleoError) {}
}

impl<A: EventSink, B: EventSink> EventSink for (A, B) {
    fn on_status(&mut self, state: LinkState) {
        self.0.on_status(state);
        self.1.on_status(state);
    }

    fn on_telemetry(&mut self, telemetry: Telemetry) {
        self.0.on_telemetry(telemetry);
        self.1.on_telemetry(telemetry);
    }

    fn on_exchange(&mut self, record: &ExchangeRecord) {
        self.0.on_exchange(record);
        self.1.on_exchange(record);
    }

    fn on_failure(&mut self, error: &NucleoError) {
        self.0.on_failure(error);
        self.1.on_failure(error);
    }
}

/// Reports events through `log`, or as JSON lines on stdout
#[derive(Debug, Clone, Copy)]
pub struct LogSink {
    format: OutputFormat,
}

impl LogSink {
    pub fn new(format: OutputFormat) -> Self {
        LogSink { format }
    }
}

impl EventSink for LogSink {
    fn on_status(&mut self, state: LinkState) {
        info!("Status: {}", state);
    }

    fn on_telemetry(&mut self, telemetry: Telemetry) {
        if let OutputFormat::Log = self.format {
            info!("Progress: {} / {}", telemetry.first, telemetry.second);
        }
    }

    fn on_exchange(&mut self, record: &ExchangeRecord) {
        match self.format {
            OutputFormat::Log => info!("{}", record.hex),
            OutputFormat::Json => match serde_json::to_string(record) {
                Ok(line) => println!("{}", line),
                Err(e) => error!("Failed to encode exchange: {}", e),
            },
        }
    }

    fn on_failure(&mut self, error: &NucleoError) {
        error!("Connection error: {}", error);
    }
}

/// Keeps the latest state of everything a front panel would display
#[derive(Debug, Clone, Default)]
pub struct Panel {
    pub status: LinkState,
    pub telemetry: Option<Telemetry>,
    pub history: VecDeque<ExchangeRecord>,
    pub last_failure: Option<String>,
    pub failures: usize,
}

impl EventSink for Panel {
    fn on_status(&mut self, state: LinkState) {
        self.status = state;
    }

    fn on_telemetry(&mut self, telemetry: Telemetry) {
        self.telemetry = Some(telemetry);
    }

    fn on_exchange(&mut self, record: &ExchangeRecord) {
        if self.history.len() == HISTORY_LEN {
            self.history.pop_front();
        }
        self.history.push_back(record.clone());
    }

    fn on_failure(&mut self, error: &NucleoError) {
        self.last_failure = Some(error.to_string());
        self.failures += 1;
    }
}

/// Polling state machine plus the last-sent actuator state
#[derive(Debug)]
pub struct Session<S: EventSink> {
    nucleo: Nucleo,
    sink: S,
    state: LinkState,
    led1: bool,
    led2: bool,
    slider: u8,
}

impl<S: EventSink> Session<S> {
    pub fn new(nucleo: Nucleo, sink: S) -> Self {
        Session {
            nucleo,
            sink,
            state: LinkState::Disconnected,
            led1: false,
            led2: false,
            slider: 0,
        }
    }

    pub fn state(&self) -> LinkState {
        self.state
    }

    pub fn nucleo(&self) -> &Nucleo {
        &self.nucleo
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    /// Last state sent (or about to be sent) for an LED
    pub fn led(&self, led: Led) -> bool {
        match led {
            Led::Led1 => self.led1,
            Led::Led2 => self.led2,
        }
    }

    /// Last slider value sent
    pub fn slider(&self) -> u8 {
        self.slider
    }

    fn set_state(&mut self, state: LinkState) {
        self.state = state;
        self.sink.on_status(state);
    }

    /// Manual connect/disconnect trigger
    pub fn toggle_connection(&mut self) -> LinkState {
        let next = match self.state {
            LinkState::Disconnected => LinkState::Polling,
            LinkState::Polling => LinkState::Disconnected,
        };
        self.set_state(next);
        next
    }

    /// Start polling if not already polling
    pub fn connect(&mut self) {
        if self.state == LinkState::Disconnected {
            self.set_state(LinkState::Polling);
        }
    }

    /// Stop polling if polling
    pub fn disconnect(&mut self) {
        if self.state == LinkState::Polling {
            self.set_state(LinkState::Disconnected);
        }
    }

    fn execute(&mut self, command: Command) -> Result<Response> {
        let result = match command {
            Command::Slider(value) => self.nucleo.set_slider(value),
            _ => self.nucleo.send(command),
        };

        match result {
            Ok(response) => {
                let record = ExchangeRecord::new(command, &response);
                if let Some(telemetry) = record.telemetry {
                    self.sink.on_telemetry(telemetry);
                }
                self.sink.on_exchange(&record);
                Ok(response)
            }
            Err(e) => {
                if e.is_communication_failure() {
                    self.fail(&e);
                }
                Err(e)
            }
        }
    }

    /// Stop polling and report a communication failure
    fn fail(&mut self, error: &NucleoError) {
        self.set_state(LinkState::Disconnected);
        self.sink.on_failure(error);
    }

    /// One poll timer tick.
    ///
    /// Sends a telemetry request while polling and does nothing otherwise.
    /// Returns the telemetry from this tick, if any.
    pub fn tick(&mut self) -> Option<Telemetry> {
        if self.state != LinkState::Polling {
            return None;
        }
        self.request_telemetry().ok().flatten()
    }

    /// Send a single telemetry request regardless of state
    pub fn request_telemetry(&mut self) -> Result<Option<Telemetry>> {
        Ok(self.execute(Command::Telemetry)?.telemetry())
    }

    /// Set an LED explicitly and remember it as the toggle state
    pub fn set_led(&mut self, led: Led, on: bool) -> Result<Response> {
        match led {
            Led::Led1 => self.led1 = on,
            Led::Led2 => self.led2 = on,
        }
        self.execute(Command::Led { led, on })
    }

    /// Flip the stored LED state and send it.
    ///
    /// The stored state stays flipped even if the send fails.
    pub fn toggle_led(&mut self, led: Led) -> Result<Response> {
        let on = match led {
            Led::Led1 => {
                self.led1 = !self.led1;
                self.led1
            }
            Led::Led2 => {
                self.led2 = !self.led2;
                self.led2
            }
        };
        self.execute(Command::Led { led, on })
    }

    /// Send a slider value on release
    pub fn release_slider(&mut self, value: u8) -> Result<Response> {
        self.slider = value;
        self.execute(Command::Slider(value))
    }

    /// Send an arbitrary frame through the session
    pub fn send_raw(&mut self, id: u8, value: u8) -> Result<Response> {
        self.execute(Command::Raw { id, value })
    }

    /// Poll until `duration` elapses (forever if `None`) or a failure disconnects.
    ///
    /// The first request goes out one interval after connecting, like the
    /// background poller. Returns the number of ticks that ran, or the
    /// failure that stopped polling.
    pub fn poll_for(&mut self, duration: Option<Duration>) -> Result<usize> {
        let start = Instant::now();
        let deadline = duration.map(|limit| start + limit);
        let interval = self.nucleo.config().poll_interval();
        let mut ticks = 0;
        let mut next_tick = start;
        let mut failure = None;

        self.connect();
        while self.state == LinkState::Polling {
            next_tick += interval;
            let wake = match deadline {
                Some(deadline) => next_tick.min(deadline),
                None => next_tick,
            };
            let now = Instant::now();
            if wake > now {
                thread::sleep(wake - now);
            } else {
                next_tick = now;
            }

            if deadline.is_some_and(|deadline| Instant::now() >= deadline) {
                break;
            }

            ticks += 1;
            if let Err(e) = self.request_telemetry() {
                if e.is_communication_failure() {
                    failure = Some(e);
                    break;
                }
            }
        }

        self.disconnect();
        info!(
            "Polled {} times in {:.2} seconds",
            ticks,
            start.elapsed().as_secs_f64()
        );
        match failure {
            Some(e) => Err(e),
            None => Ok(ticks),
        }
    }
}

/// Lock a shared session, recovering it if a poll thread panicked
pub fn lock_session<S: EventSink>(session: &Mutex<Session<S>>) -> MutexGuard<'_, Session<S>> {
    match session.lock() {
        Ok(guard) => guard,
        Err(poisoned) => {
            warn!("Session lock was poisoned; continuing");
            poisoned.into_inner()
        }
    }
}

/// Run poll ticks on a background thread until `stop` is set.
///
/// The thread ticks every poll interval; ticks are no-ops while the session
/// is disconnected, so connect/disconnect can be toggled from another thread.
pub fn spawn_poller<S>(session: Arc<Mutex<Session<S>>>, stop: Arc<AtomicBool>) -> JoinHandle<()>
where
    S: EventSink + Send + 'static,
{
    let interval = lock_session(&session).nucleo().config().poll_interval();
    thread::spawn(move || {
        while !stop.load(Ordering::Relaxed) {
            thread::sleep(interval);
            if stop.load(Ordering::Relaxed) {
                break;
            }
            lock_session(&session).tick();
        }
    })
}
