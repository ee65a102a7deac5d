use crate::tcp::{flags, segment, Connection, Key, Segment, Snapshot, Transmit};
use crate::{Clock, Config, Device, Error};
use log::{debug, info, trace, warn};
use std::io::{self, Write};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Serializes segments onto a device along one direction of a [`Key`].
///
/// [`Transmit`] cannot fail, so the first error is held until [`Wire::finish`].
struct Wire<'a> {
    id: u64,
    key: Key,
    device: &'a dyn Device,
    error: Option<Error>,
}

impl<'a> Wire<'a> {
    fn new(id: u64, key: Key, device: &'a dyn Device) -> Self {
        Wire {
            id,
            key,
            device,
            error: None,
        }
    }

    fn finish(self) -> Result<(), Error> {
        match self.error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn write(&self, segment: &Segment) -> Result<(), Error> {
        let packet = segment::serialize(&self.key, segment)?;
        trace!(
            "[#{}] {} TX: flags={} seq={} ack={} win={} len={}",
            self.id,
            self.key,
            flags::flags_to_string(flags::segment_flags(segment)),
            segment.sender.seqno,
            segment.receiver.ackno.map_or(0, |a| a.raw()),
            segment.receiver.window_size,
            segment.sender.payload.len()
        );

        match self.device.send(&packet) {
            Ok(_) => Ok(()),
            // the device queue is full; recovered like any lost datagram
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                debug!("[#{}] device busy, dropped outgoing segment", self.id);
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }
}

impl Transmit<Segment> for Wire<'_> {
    fn send(&mut self, segment: &Segment) {
        if self.error.is_some() {
            return;
        }
        if let Err(e) = self.write(segment) {
            self.error = Some(e);
        }
    }
}

/// A single TCP connection bound to a device.
///
/// Inbound datagrams are matched against the connection's four-tuple,
/// and the clock is turned into ticks by [`Endpoint::poll`].
pub struct Endpoint {
    device: Box<dyn Device>,
    clock: Arc<dyn Clock>,
    /// Local to remote
    key: Key,
    connection: Connection,
    last_tick: Instant,
}

impl Endpoint {
    /// Bind connection `id` to `key`, which names the local → remote direction.
    ///
    /// Nothing is sent until [`Endpoint::connect`] or until the peer's SYN arrives.
    pub fn new(
        id: u64,
        device: Box<dyn Device>,
        clock: Arc<dyn Clock>,
        key: Key,
        config: Config,
    ) -> Self {
        let last_tick = clock.now();
        info!("🎯 [#{}] endpoint {}", id, key);
        Endpoint {
            device,
            clock,
            key,
            connection: Connection::new(id, config),
            last_tick,
        }
    }

    /// Send the SYN.
    pub fn connect(&mut self) -> Result<(), Error> {
        info!("[#{}] connecting {}", self.connection.id, self.key);
        self.push()
    }

    fn push(&mut self) -> Result<(), Error> {
        let mut wire = Wire::new(self.connection.id, self.key, self.device.as_ref());
        self.connection.push(&mut wire);
        wire.finish()
    }

    /// Deliver one datagram read from the device.
    ///
    /// Datagrams that do not parse or that belong to another four-tuple are
    /// dropped.
    pub fn handle_datagram(&mut self, datagram: &[u8]) -> Result<(), Error> {
        let (key, segment) = match segment::parse(datagram) {
            Ok(parsed) => parsed,
            Err(e) => {
                debug!("[#{}] dropping datagram: {}", self.connection.id, e);
                return Ok(());
            }
        };
        if key != self.key.reverse() {
            trace!("[#{}] ignoring segment for {}", self.connection.id, key);
            return Ok(());
        }

        trace!(
            "[#{}] {} RX: flags={} seq={} ack={} win={} len={}",
            self.connection.id,
            key,
            flags::flags_to_string(flags::segment_flags(&segment)),
            segment.sender.seqno,
            segment.receiver.ackno.map_or(0, |a| a.raw()),
            segment.receiver.window_size,
            segment.sender.payload.len()
        );

        let mut wire = Wire::new(self.connection.id, self.key, self.device.as_ref());
        self.connection.receive(&segment, &mut wire);
        wire.finish()
    }

    /// Tick the connection by the whole milliseconds elapsed since the last poll.
    pub fn poll(&mut self) -> Result<(), Error> {
        let elapsed = self.clock.now().saturating_duration_since(self.last_tick);
        let ms = elapsed.as_millis() as u64;
        if ms == 0 {
            return Ok(());
        }
        self.last_tick += Duration::from_millis(ms);

        let mut wire = Wire::new(self.connection.id, self.key, self.device.as_ref());
        self.connection.tick(ms, &mut wire);
        wire.finish()
    }

    /// Queue as much of `data` as the outbound stream has room for and send
    /// what the window allows. Returns the number of bytes accepted.
    pub fn write(&mut self, data: &[u8]) -> Result<usize, Error> {
        let outbound = self.connection.outbound();
        let n = data.len().min(outbound.available_capacity());
        outbound.push(&data[..n]);
        self.push()?;
        Ok(n)
    }

    /// Finish the outbound stream; the FIN goes out once the data before it has.
    pub fn close(&mut self) -> Result<(), Error> {
        debug!("[#{}] closing outbound stream", self.connection.id);
        self.connection.outbound().close();
        self.push()
    }

    /// Everything buffered on the inbound stream.
    pub fn read(&mut self) -> Vec<u8> {
        let inbound = self.connection.inbound();
        let n = inbound.bytes_buffered();
        inbound.read(n)
    }

    pub fn is_active(&self) -> bool {
        self.connection.is_active()
    }

    pub fn connection(&self) -> &Connection {
        &self.connection
    }

    pub fn key(&self) -> Key {
        self.key
    }

    pub fn peek(&self) -> Snapshot {
        self.connection.peek()
    }

    /// Drive the connection until it is no longer active, copying the inbound
    /// stream into `out` as it arrives.
    pub fn run(&mut self, out: &mut impl Write) -> Result<(), Error> {
        let mut buf = [0u8; 1504];
        while self.is_active() {
            match self.device.recv(&mut buf) {
                Ok(n) => self.handle_datagram(&buf[..n])?,
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                    std::thread::sleep(Duration::from_millis(1));
                }
                Err(e) => return Err(e.into()),
            }
            self.poll()?;

            let data = self.read();
            if !data.is_empty() {
                out.write_all(&data)?;
            }
        }

        let snapshot = self.peek();
        if self.connection.has_error() {
            warn!("⚠️ [#{}] connection reset", snapshot.id);
        }
        info!(
            "🔚 [#{}] closed: {} bytes sent, {} bytes received",
            snapshot.id, snapshot.bytes_sent, snapshot.bytes_received
        );
        out.flush()?;
        Ok(())
    }
}
