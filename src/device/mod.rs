mod tun;

pub use self::tun::Tun;

#[cfg(test)]
pub mod mock;
#[cfg(test)]
pub use self::mock::MockDevice;

/// Datagram I/O underneath an endpoint.
pub trait Device: Send {
    /// Read one datagram into `buf`. Fails with `WouldBlock` when none is queued.
    fn recv(&self, buf: &mut [u8]) -> std::io::Result<usize>;

    /// Write one datagram.
    fn send(&self, buf: &[u8]) -> std::io::Result<usize>;
}
