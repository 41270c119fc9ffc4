//! Serial port link implementation
//!
//! Opens the controller's USB/RS-232 port with fixed 8N1 framing and a short
//! timeout, and hands out two handles to it (`try_clone`) so the reader
//! thread and the dispatcher never contend for a lock.
//!
//! Also provides port enumeration for the operator's port picker.

use super::{Connector, Link, LinkParams};
use shelfpick_core::{ConnectionError, Error, Result};

/// Information about an available serial port
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerialPortInfo {
    /// Port name (e.g., "/dev/ttyUSB0", "COM3")
    pub port_name: String,

    /// Port description (e.g., "USB Arduino Serial Port")
    pub description: String,

    /// Manufacturer name if available
    pub manufacturer: Option<String>,

    /// USB vendor ID if applicable
    pub vid: Option<u16>,

    /// USB product ID if applicable
    pub pid: Option<u16>,
}

impl SerialPortInfo {
    /// Create a new port info
    pub fn new(port_name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            port_name: port_name.into(),
            description: description.into(),
            manufacturer: None,
            vid: None,
            pid: None,
        }
    }

    /// Set manufacturer
    pub fn with_manufacturer(mut self, manufacturer: impl Into<String>) -> Self {
        self.manufacturer = Some(manufacturer.into());
        self
    }

    /// Set USB IDs
    pub fn with_usb_ids(mut self, vid: u16, pid: u16) -> Self {
        self.vid = Some(vid);
        self.pid = Some(pid);
        self
    }
}

/// List serial ports that could host the carriage controller
///
/// Filters to the usual microcontroller patterns:
/// - Windows: COM* (e.g., COM1, COM3)
/// - Linux: /dev/ttyUSB*, /dev/ttyACM*
/// - macOS: /dev/cu.usbserial-*, /dev/cu.usbmodem*
pub fn list_ports() -> Result<Vec<SerialPortInfo>> {
    let ports = serialport::available_ports().map_err(|e| {
        tracing::error!("Failed to enumerate serial ports: {}", e);
        Error::other(format!("Failed to enumerate ports: {}", e))
    })?;

    let mut infos: Vec<SerialPortInfo> = ports
        .iter()
        .filter(|port| is_controller_port(&port.port_name))
        .map(|port| {
            let info = SerialPortInfo::new(&port.port_name, port_description(port));
            match &port.port_type {
                serialport::SerialPortType::UsbPort(usb) => {
                    let info = info.with_usb_ids(usb.vid, usb.pid);
                    match &usb.manufacturer {
                        Some(mfg) => info.with_manufacturer(mfg),
                        None => info,
                    }
                }
                _ => info,
            }
        })
        .collect();

    infos.sort_by(|a, b| a.port_name.cmp(&b.port_name));
    Ok(infos)
}

fn is_controller_port(port_name: &str) -> bool {
    if let Some(digits) = port_name.strip_prefix("COM") {
        return !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit());
    }

    port_name.starts_with("/dev/ttyUSB")
        || port_name.starts_with("/dev/ttyACM")
        || port_name.starts_with("/dev/cu.usbserial-")
        || port_name.starts_with("/dev/cu.usbmodem")
}

fn port_description(port: &serialport::SerialPortInfo) -> String {
    match &port.port_type {
        serialport::SerialPortType::UsbPort(usb) => format!(
            "USB {} {}",
            usb.manufacturer.as_deref().unwrap_or("Device"),
            usb.product.as_deref().unwrap_or("Serial Port")
        ),
        serialport::SerialPortType::BluetoothPort => "Bluetooth Serial".to_string(),
        serialport::SerialPortType::PciPort => "PCI Serial".to_string(),
        _ => "Serial Port".to_string(),
    }
}

/// Opens real serial ports through the `serialport` crate
#[derive(Debug, Clone, Copy, Default)]
pub struct SerialConnector;

impl SerialConnector {
    /// Create a new serial connector
    pub fn new() -> Self {
        Self
    }
}

impl Connector for SerialConnector {
    fn open(&self, params: &LinkParams) -> std::result::Result<Link, ConnectionError> {
        let open_failed = |reason: String| ConnectionError::LinkOpenFailed {
            port: params.port.clone(),
            reason,
        };

        if params.port.trim().is_empty() {
            return Err(open_failed("no port selected".to_string()));
        }

        let port = serialport::new(&params.port, params.baud_rate)
            .data_bits(serialport::DataBits::Eight)
            .parity(serialport::Parity::None)
            .stop_bits(serialport::StopBits::One)
            .flow_control(serialport::FlowControl::None)
            .timeout(params.timeout())
            .open()
            .map_err(|e| {
                tracing::warn!("Failed to open serial port {}: {}", params.port, e);
                open_failed(e.to_string())
            })?;

        // Dropping `port` on this error path closes it again.
        let reader = port.try_clone().map_err(|e| {
            tracing::warn!("Failed to clone serial port {}: {}", params.port, e);
            open_failed(e.to_string())
        })?;

        tracing::info!(
            "Opened serial port {} at {} baud",
            params.port,
            params.baud_rate
        );

        Ok(Link {
            port: params.port.clone(),
            reader: Box::new(reader),
            writer: Box::new(port),
        })
    }
}
