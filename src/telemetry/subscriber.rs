//! UDP multicast telemetry subscriber: joins the group, runs a background
//! thread, and tracks sequence gaps as a packet-loss indicator.

use std::net::{Ipv4Addr, SocketAddrV4, UdpSocket};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use socket2::{Domain, Protocol, Socket, Type};
use tracing::warn;

use super::packet::{TelemetryPacket, DEFAULT_MULTICAST_GROUP, DEFAULT_MULTICAST_PORT, TELEMETRY_PACKET_SIZE};

#[derive(Default)]
pub struct SubscriberStats {
    pub packets_received: AtomicU64,
    pub packets_dropped: AtomicU64,
}

/// Runs the receive loop on a dedicated OS thread and invokes `callback`
/// for each well-formed packet, on that thread.
pub struct TelemetrySubscriber {
    socket: UdpSocket,
    stats: Arc<SubscriberStats>,
    running: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl TelemetrySubscriber {
    pub fn new(multicast_addr: Ipv4Addr, port: u16) -> std::io::Result<Self> {
        let socket = Socket::new(Domain::IPV4, Type::DGRAM, Some(Protocol::UDP))?;
        socket.set_reuse_address(true)?;
        socket.bind(&SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, port).into())?;
        socket.join_multicast_v4(&multicast_addr, &Ipv4Addr::UNSPECIFIED)?;
        socket.set_read_timeout(Some(Duration::from_secs(1)))?;

        Ok(Self { socket: socket.into(), stats: Arc::new(SubscriberStats::default()), running: Arc::new(AtomicBool::new(false)), handle: None })
    }

    pub fn with_defaults() -> std::io::Result<Self> {
        Self::new(DEFAULT_MULTICAST_GROUP.parse().expect("valid default multicast address"), DEFAULT_MULTICAST_PORT)
    }

    pub fn stats(&self) -> Arc<SubscriberStats> {
        self.stats.clone()
    }

    /// Spawn the background receive thread. `callback` runs once per
    /// received packet; the 1s socket read timeout keeps `stop` responsive.
    pub fn start<F>(&mut self, mut callback: F)
    where
        F: FnMut(TelemetryPacket) + Send + 'static,
    {
        if self.running.swap(true, Ordering::SeqCst) {
            return;
        }

        let socket = self.socket.try_clone().expect("udp socket clone");
        let stats = self.stats.clone();
        let running = self.running.clone();

        self.handle = Some(std::thread::spawn(move || {
            let mut buf = [0u8; TELEMETRY_PACKET_SIZE];
            let mut last_seq: Option<u32> = None;

            while running.load(Ordering::Relaxed) {
                let n = match socket.recv(&mut buf) {
                    Ok(n) => n,
                    Err(e) if e.kind() == std::io::ErrorKind::WouldBlock || e.kind() == std::io::ErrorKind::TimedOut => continue,
                    Err(e) => {
                        warn!(error = %e, "telemetry subscriber recv error");
                        continue;
                    }
                };

                if n != TELEMETRY_PACKET_SIZE {
                    continue;
                }

                let pkt = TelemetryPacket::from_bytes(&buf);
                stats.packets_received.fetch_add(1, Ordering::Relaxed);

                if let Some(prev) = last_seq {
                    let expected = prev.wrapping_add(1);
                    if pkt.sequence != expected {
                        let dropped = pkt.sequence.wrapping_sub(expected);
                        stats.packets_dropped.fetch_add(dropped as u64, Ordering::Relaxed);
                    }
                }
                last_seq = Some(pkt.sequence);

                callback(pkt);
            }
        }));
    }

    pub fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for TelemetrySubscriber {
    fn drop(&mut self) {
        self.stop();
    }
}
