//! Serial port discovery for the stream panel
//!
//! Only enumeration lives here. Opening the port and talking to the
//! winder is done by `fiberpath stream`. Ports are ranked so the
//! likeliest winder controller comes first in the port picker.

use fiberpath_core::{Error, Result};
use serde::{Deserialize, Serialize};
use serialport::SerialPortType;

/// USB serial bridge a winder controller is usually reached through
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ControllerBoard {
    /// Genuine Arduino boards, native USB
    Arduino,
    /// Raspberry Pi RP2040 boards
    Rp2040,
    /// Teensy boards
    Teensy,
    /// Arduino clones on a CH340 bridge
    Ch340,
    /// FTDI bridges
    Ftdi,
    /// Silicon Labs CP210x bridges
    Cp210x,
}

impl ControllerBoard {
    /// Identify a board family by USB vendor id
    pub fn from_vid(vid: u16) -> Option<Self> {
        match vid {
            0x2341 | 0x2a03 => Some(Self::Arduino),
            0x2e8a => Some(Self::Rp2040),
            0x16c0 => Some(Self::Teensy),
            0x1a86 => Some(Self::Ch340),
            0x0403 => Some(Self::Ftdi),
            0x10c4 => Some(Self::Cp210x),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Arduino => "Arduino",
            Self::Rp2040 => "RP2040",
            Self::Teensy => "Teensy",
            Self::Ch340 => "CH340 (Arduino clone)",
            Self::Ftdi => "FTDI",
            Self::Cp210x => "CP210x",
        }
    }
}

/// A port the winder could be plugged into
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SerialPortInfo {
    /// Name to pass to `fiberpath stream --port`
    pub port: String,
    pub description: String,
    /// Recognised controller family, from the USB vendor id
    pub board: Option<ControllerBoard>,
    pub vid: Option<u16>,
    pub pid: Option<u16>,
    pub serial_number: Option<String>,
}

impl SerialPortInfo {
    fn from_enumerated(port: &serialport::SerialPortInfo) -> Self {
        let mut info = Self {
            port: port.port_name.clone(),
            description: "Serial port".to_string(),
            board: None,
            vid: None,
            pid: None,
            serial_number: None,
        };
        if let SerialPortType::UsbPort(usb) = &port.port_type {
            info.vid = Some(usb.vid);
            info.pid = Some(usb.pid);
            info.board = ControllerBoard::from_vid(usb.vid);
            info.serial_number = usb.serial_number.clone();
            info.description = describe_usb(info.board, usb.product.as_deref());
        }
        info
    }

    /// Whether this looks like a winder controller rather than some other
    /// serial device
    pub fn is_likely_controller(&self) -> bool {
        self.board.is_some()
    }
}

fn describe_usb(board: Option<ControllerBoard>, product: Option<&str>) -> String {
    match (board, product) {
        (Some(board), Some(product)) => format!("{} controller: {}", board.label(), product),
        (Some(board), None) => format!("{} controller", board.label()),
        (None, Some(product)) => format!("USB serial: {}", product),
        (None, None) => "USB serial device".to_string(),
    }
}

/// List serial ports a winding controller could be attached to, likeliest
/// controllers first
///
/// Keeps COM ports on Windows, `/dev/ttyUSB*` and `/dev/ttyACM*` on Linux,
/// `/dev/cu.usbserial-*` and `/dev/cu.usbmodem*` on macOS.
pub fn list_ports() -> Result<Vec<SerialPortInfo>> {
    let ports = serialport::available_ports().map_err(|e| {
        tracing::error!("Failed to enumerate serial ports: {}", e);
        Error::other(format!("Failed to enumerate ports: {}", e))
    })?;

    let mut found: Vec<SerialPortInfo> = ports
        .iter()
        .filter(|port| is_controller_port(&port.port_name))
        .map(SerialPortInfo::from_enumerated)
        .collect();
    rank_ports(&mut found);
    tracing::debug!(count = found.len(), "Serial ports enumerated");
    Ok(found)
}

/// Recognised boards first, in [`ControllerBoard`] order, then by port name
fn rank_ports(ports: &mut [SerialPortInfo]) {
    ports.sort_by(|a, b| match (a.board, b.board) {
        (Some(x), Some(y)) => x.cmp(&y).then_with(|| a.port.cmp(&b.port)),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => a.port.cmp(&b.port),
    });
}

fn is_controller_port(name: &str) -> bool {
    if let Some(number) = name.strip_prefix("COM") {
        return !number.is_empty() && number.chars().all(|c| c.is_ascii_digit());
    }

    name.starts_with("/dev/ttyUSB")
        || name.starts_with("/dev/ttyACM")
        || name.starts_with("/dev/cu.usbserial-")
        || name.starts_with("/dev/cu.usbmodem")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serialport::UsbPortInfo;

    fn usb_port(name: &str, vid: u16, product: Option<&str>) -> serialport::SerialPortInfo {
        serialport::SerialPortInfo {
            port_name: name.to_string(),
            port_type: SerialPortType::UsbPort(UsbPortInfo {
                vid,
                pid: 0x0043,
                serial_number: Some("7563".to_string()),
                manufacturer: None,
                product: product.map(str::to_string),
            }),
        }
    }

    #[test]
    fn test_controller_port_patterns() {
        assert!(is_controller_port("COM3"));
        assert!(is_controller_port("COM12"));
        assert!(is_controller_port("/dev/ttyUSB0"));
        assert!(is_controller_port("/dev/ttyACM1"));
        assert!(is_controller_port("/dev/cu.usbserial-1420"));
        assert!(is_controller_port("/dev/cu.usbmodem14101"));

        assert!(!is_controller_port("COM"));
        assert!(!is_controller_port("COMX"));
        assert!(!is_controller_port("/dev/ttyS0"));
        assert!(!is_controller_port("/dev/cu.Bluetooth-Incoming-Port"));
    }

    #[test]
    fn test_board_from_vendor_id() {
        assert_eq!(ControllerBoard::from_vid(0x2341), Some(ControllerBoard::Arduino));
        assert_eq!(ControllerBoard::from_vid(0x1a86), Some(ControllerBoard::Ch340));
        assert_eq!(ControllerBoard::from_vid(0x2e8a), Some(ControllerBoard::Rp2040));
        assert_eq!(ControllerBoard::from_vid(0x05ac), None);
    }

    #[test]
    fn test_usb_port_is_described_by_board() {
        let info = SerialPortInfo::from_enumerated(&usb_port(
            "/dev/ttyACM0",
            0x2341,
            Some("Mega 2560"),
        ));
        assert_eq!(info.board, Some(ControllerBoard::Arduino));
        assert_eq!(info.description, "Arduino controller: Mega 2560");
        assert_eq!(info.serial_number.as_deref(), Some("7563"));
        assert!(info.is_likely_controller());

        let unknown = SerialPortInfo::from_enumerated(&usb_port("/dev/ttyUSB3", 0x05ac, None));
        assert_eq!(unknown.description, "USB serial device");
        assert!(!unknown.is_likely_controller());

        let plain = SerialPortInfo::from_enumerated(&serialport::SerialPortInfo {
            port_name: "COM1".to_string(),
            port_type: SerialPortType::PciPort,
        });
        assert_eq!(plain.vid, None);
        assert_eq!(plain.description, "Serial port");
    }

    #[test]
    fn test_known_boards_rank_first() {
        let mut ports = vec![
            SerialPortInfo::from_enumerated(&usb_port("/dev/ttyUSB0", 0x05ac, None)),
            SerialPortInfo::from_enumerated(&usb_port("/dev/ttyUSB1", 0x1a86, None)),
            SerialPortInfo::from_enumerated(&usb_port("/dev/ttyACM1", 0x2341, None)),
            SerialPortInfo::from_enumerated(&usb_port("/dev/ttyACM0", 0x2341, None)),
        ];
        rank_ports(&mut ports);
        let names: Vec<&str> = ports.iter().map(|p| p.port.as_str()).collect();
        assert_eq!(
            names,
            vec!["/dev/ttyACM0", "/dev/ttyACM1", "/dev/ttyUSB1", "/dev/ttyUSB0"]
        );
    }

    #[test]
    fn test_port_info_serializes_camel_case() {
        let info = SerialPortInfo::from_enumerated(&usb_port("COM4", 0x0403, None));
        let json = serde_json::to_value(&info).unwrap();
        assert_eq!(json["board"], "ftdi");
        assert_eq!(json["serialNumber"], "7563");
    }
}
