use crate::Device;
use log::info;
use std::io;

/// A tun interface opened without packet info, so reads yield bare IPv4
/// datagrams.
pub struct Tun {
    iface: tun_tap::Iface,
}

impl Tun {
    /// Open `name` in non-blocking mode; `recv` reports `WouldBlock` when idle.
    pub fn new(name: &str) -> io::Result<Self> {
        let iface = tun_tap::Iface::without_packet_info(name, tun_tap::Mode::Tun)?;
        iface.set_non_blocking()?;
        info!("opened tun device {}", iface.name());
        Ok(Self { iface })
    }
}

impl Device for Tun {
    fn recv(&self, buf: &mut [u8]) -> io::Result<usize> {
        self.iface.recv(buf)
    }

    fn send(&self, buf: &[u8]) -> io::Result<usize> {
        self.iface.send(buf)
    }
}
