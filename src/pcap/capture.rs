use super::decode::{LinkLayer, decode_frame};
use crate::dns::Frame;
use anyhow::{Context, Result, bail};
use log::{info, warn};
use pcap::{Capture, Device, Error};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Only outbound queries reach the classifier.
pub const CAPTURE_FILTER: &str = "udp and dst port 53";

const SNAPLEN: i32 = 65535;
const READ_TIMEOUT_MS: i32 = 100;
const CHANNEL_CAPACITY: usize = 10000;

pub struct CaptureLoader;

impl CaptureLoader {
    pub fn list_interfaces() -> Result<Vec<Device>> {
        Ok(Device::list()?)
    }

    pub fn select_default_interface() -> Result<String> {
        let devices = Device::list()?;

        for device in &devices {
            if device.name == "any" {
                continue;
            }
            if !device.flags.is_loopback() && device.flags.is_up() && device.flags.is_running() {
                return Ok(device.name.clone());
            }
        }

        for device in &devices {
            if device.name != "any" && device.flags.is_up() {
                return Ok(device.name.clone());
            }
        }

        bail!("No suitable network interface found")
    }

    /// Opens `interface`, installs the query filter and starts decoding frames
    /// on a blocking task. Fails before any frame is produced if the device
    /// cannot be opened or the filter does not compile.
    pub fn load(
        interface: &str,
    ) -> Result<(JoinHandle<()>, mpsc::Receiver<Frame>, CancellationToken)> {
        info!("Opening capture on interface: {interface}");

        let device: Device = if interface == "any" {
            "any".into()
        } else {
            Device::list()?
                .into_iter()
                .find(|d| d.name == interface)
                .context(format!("Interface {interface} not found"))?
        };

        let mut cap = Capture::from_device(device)
            .context(format!("Failed to prepare capture on {interface}"))?
            .promisc(true)
            .snaplen(SNAPLEN)
            .immediate_mode(true)
            .timeout(READ_TIMEOUT_MS)
            .open()
            .context(format!("Failed to open capture on {interface}"))?;

        cap.filter(CAPTURE_FILTER, true)
            .context(format!("Failed to install filter {CAPTURE_FILTER:?}"))?;

        let linktype = cap.get_datalink();
        let link = LinkLayer::from_linktype(linktype).context(format!(
            "Unsupported link type {linktype:?} on {interface}"
        ))?;

        info!("Capture started on interface: {interface} ({link:?}, filter {CAPTURE_FILTER:?})");

        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
        let cancel_token = CancellationToken::new();
        let token_clone = cancel_token.clone();

        let should_stop = Arc::new(AtomicBool::new(false));
        let should_stop_clone = should_stop.clone();

        let handle = tokio::task::spawn_blocking(move || {
            while !should_stop_clone.load(Ordering::Relaxed) {
                match cap.next_packet() {
                    Ok(packet) => {
                        if should_stop_clone.load(Ordering::Relaxed) {
                            break;
                        }

                        let frame = decode_frame(link, packet.data);
                        if tx.blocking_send(frame).is_err() {
                            info!("Channel closed, stopping capture");
                            break;
                        }
                    }
                    // Read timeout, loop back to check the stop flag
                    Err(Error::TimeoutExpired) => continue,
                    Err(e) => {
                        warn!("Error reading packet: {e}");
                        continue;
                    }
                }
            }
            info!("Packet capture task terminated");
        });

        let stop_handle = should_stop.clone();
        tokio::spawn(async move {
            token_clone.cancelled().await;
            stop_handle.store(true, Ordering::Relaxed);
        });

        Ok((handle, rx, cancel_token))
    }
}
