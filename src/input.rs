//! Spin triggers from outside the window: debouncing, the one-line button
//! protocol, and the background readers for stdin and serial buttons.
//!
//! Readers never touch wheel state. They forward [`WheelCommand`]s over a
//! channel that the frame loop drains without blocking.

use log::{info, warn};
use std::io::{self, BufRead, BufReader};
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::Duration;

use crate::calibration::Offset;

pub const SERIAL_BAUD: u32 = 115_200;
pub const SERIAL_TIMEOUT: Duration = Duration::from_millis(50);
/// Boards like the Mega reset when the port opens.
pub const SERIAL_SETTLE: Duration = Duration::from_secs(2);
pub const SERIAL_RETRY: Duration = Duration::from_secs(3);

const PORT_HINTS: [&str; 9] = [
    "arduino",
    "mega",
    "ch340",
    "usb-serial",
    "usb serial",
    "cp210",
    "ttyusb",
    "ttyacm",
    "usbmodem",
];

/// Command enum for type-safe wheel control from outside the window
#[derive(Debug, Clone, PartialEq)]
pub enum WheelCommand {
    Spin,
    SpinTo(usize),
    AdjustOffset(Offset, f64),
    ResetCalibration,
    ToggleCalibration,
    /// Move the drawn wheel by whole pixels.
    Nudge(i32, i32),
}

/// Time based edge filter: accepts a trigger only if the previous accepted
/// one is at least `min_interval` seconds old.
#[derive(Debug, Clone)]
pub struct Debouncer {
    min_interval: f64,
    last_accepted: Option<f64>,
}

impl Debouncer {
    pub fn new(min_interval: f64) -> Self {
        Self {
            min_interval: min_interval.max(0.0),
            last_accepted: None,
        }
    }

    pub fn accept(&mut self, now: f64) -> bool {
        if let Some(last) = self.last_accepted {
            if now - last < self.min_interval {
                return false;
            }
        }
        self.last_accepted = Some(now);
        true
    }
}

/// Parse one line of the button protocol.
///
/// `1` or `spin` requests a spin, `spin N` a spin onto segment `N`. Anything
/// else is noise from the wire and is ignored.
pub fn parse_line(line: &str) -> Option<WheelCommand> {
    let mut words = line.split_whitespace();
    let command = match (words.next()?, words.next()) {
        ("1", None) => WheelCommand::Spin,
        (word, None) if word.eq_ignore_ascii_case("spin") => WheelCommand::Spin,
        (word, Some(index)) if word.eq_ignore_ascii_case("spin") => {
            WheelCommand::SpinTo(index.parse().ok()?)
        }
        _ => return None,
    };
    if words.next().is_some() {
        return None;
    }
    Some(command)
}

/// Forward every recognised line from `reader` until EOF, a read error, or
/// the receiving side hanging up. Returns whether the receiver is still there.
///
/// Bytes read before a timeout are kept, so a line split across reads still
/// counts. Lines that are not valid UTF-8 are decoded lossily and end up
/// ignored as noise.
fn pump_lines<R: BufRead>(mut reader: R, sender: &Sender<WheelCommand>) -> io::Result<bool> {
    let mut line = Vec::new();
    loop {
        let eof = match reader.read_until(b'\n', &mut line) {
            Ok(0) => true,
            Ok(_) if line.last() == Some(&b'\n') => false,
            // partial line; the next read either finishes it or reports EOF
            Ok(_) => continue,
            Err(err) if err.kind() == io::ErrorKind::TimedOut => continue,
            Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
            Err(err) => return Err(err),
        };
        if let Some(command) = parse_line(&String::from_utf8_lossy(&line)) {
            if sender.send(command).is_err() {
                return Ok(false);
            }
        }
        line.clear();
        if eof {
            return Ok(true);
        }
    }
}

/// Spawn a thread reading button lines from stdin.
pub fn spawn_stdin_reader() -> Receiver<WheelCommand> {
    let (sender, receiver) = mpsc::channel();
    thread::spawn(move || {
        let stdin = io::stdin();
        if let Err(err) = pump_lines(stdin.lock(), &sender) {
            warn!("stdin reader stopped: {err}");
        }
    });
    receiver
}

fn looks_like_button(name: &str, description: &str) -> bool {
    let name = name.to_lowercase();
    let description = description.to_lowercase();
    PORT_HINTS
        .iter()
        .any(|hint| description.contains(hint) || name.contains(hint))
}

fn port_description(port_type: &serialport::SerialPortType) -> String {
    match port_type {
        serialport::SerialPortType::UsbPort(usb) => format!(
            "{} {}",
            usb.manufacturer.as_deref().unwrap_or_default(),
            usb.product.as_deref().unwrap_or_default()
        ),
        _ => String::new(),
    }
}

/// First available port that looks like a USB serial button board.
pub fn find_button_port() -> Option<String> {
    let ports = match serialport::available_ports() {
        Ok(ports) => ports,
        Err(err) => {
            warn!("could not list serial ports: {err}");
            return None;
        }
    };
    ports
        .into_iter()
        .find(|port| looks_like_button(&port.port_name, &port_description(&port.port_type)))
        .map(|port| port.port_name)
}

fn open_button_port(path: &str) -> serialport::Result<Box<dyn serialport::SerialPort>> {
    let port = serialport::new(path, SERIAL_BAUD)
        .timeout(SERIAL_TIMEOUT)
        .open()?;
    thread::sleep(SERIAL_SETTLE);
    port.clear(serialport::ClearBuffer::Input)?;
    Ok(port)
}

/// Spawn a thread that keeps a serial button connected.
///
/// With no `path` the port is auto-detected on every attempt. Failed opens
/// and lost connections are retried every [`SERIAL_RETRY`].
pub fn spawn_serial_reader(path: Option<String>) -> Receiver<WheelCommand> {
    let (sender, receiver) = mpsc::channel();
    thread::spawn(move || loop {
        let target = path.clone().or_else(find_button_port);
        if let Some(target) = target {
            match open_button_port(&target) {
                Ok(port) => {
                    info!("serial button connected on {target}");
                    match pump_lines(BufReader::new(port), &sender) {
                        Ok(false) => return,
                        Ok(true) => warn!("serial button on {target} closed"),
                        Err(err) => warn!("serial connection on {target} lost: {err}"),
                    }
                }
                Err(err) => warn!("could not open {target}: {err}"),
            }
        }
        thread::sleep(SERIAL_RETRY);
    });
    receiver
}
