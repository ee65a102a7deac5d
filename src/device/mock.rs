use crate::tcp::{flags_to_string, parse, segment_flags};
use crate::Device;
use log::{debug, trace};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::VecDeque;
use std::io;
use std::sync::{Arc, Mutex};

struct Loss {
    probability: f64,
    rng: StdRng,
}

/// An in-memory device: datagrams are injected for `recv` and captured from
/// `send`. Clones share the same queues.
#[derive(Clone)]
pub struct MockDevice {
    rx_queue: Arc<Mutex<VecDeque<Vec<u8>>>>,
    tx_log: Arc<Mutex<Vec<(String, Vec<u8>)>>>,
    loss: Arc<Mutex<Loss>>,
}

impl MockDevice {
    pub fn new() -> Self {
        Self {
            rx_queue: Arc::new(Mutex::new(VecDeque::new())),
            tx_log: Arc::new(Mutex::new(Vec::new())),
            loss: Arc::new(Mutex::new(Loss {
                probability: 0.0,
                rng: StdRng::seed_from_u64(0),
            })),
        }
    }

    pub fn inject_packet(&self, packet: Vec<u8>) {
        trace!("🧪 INJECT: {} ({} bytes)", describe(&packet), packet.len());
        self.rx_queue.lock().unwrap().push_back(packet);
    }

    /// Sent datagrams with a one-line description of each.
    pub fn get_sent_packets(&self) -> Vec<(String, Vec<u8>)> {
        self.tx_log.lock().unwrap().clone()
    }

    /// Drain the sent datagrams.
    pub fn take_sent(&self) -> Vec<Vec<u8>> {
        self.tx_log
            .lock()
            .unwrap()
            .drain(..)
            .map(|(_, p)| p)
            .collect()
    }

    pub fn last_sent_packet(&self) -> Option<Vec<u8>> {
        self.tx_log.lock().unwrap().last().map(|(_, p)| p.clone())
    }

    /// Drop outgoing datagrams with `probability`, drawn from an RNG seeded
    /// with `seed`.
    pub fn set_drop_probability(&self, probability: f64, seed: u64) {
        let mut loss = self.loss.lock().unwrap();
        loss.probability = probability.clamp(0.0, 1.0);
        loss.rng = StdRng::seed_from_u64(seed);
        debug!(
            "📉 Packet loss probability set to {:.1}%",
            loss.probability * 100.0
        );
    }
}

fn describe(packet: &[u8]) -> String {
    match parse(packet) {
        Ok((key, segment)) => format!(
            "{} [{}] seq={} ack={} len={}",
            key,
            flags_to_string(segment_flags(&segment)),
            segment.sender.seqno,
            segment.receiver.ackno.map_or(0, |a| a.raw()),
            segment.sender.payload.len()
        ),
        Err(_) => "Unknown".to_string(),
    }
}

impl Device for MockDevice {
    fn recv(&self, buf: &mut [u8]) -> io::Result<usize> {
        match self.rx_queue.lock().unwrap().pop_front() {
            Some(packet) => {
                let len = packet.len().min(buf.len());
                buf[..len].copy_from_slice(&packet[..len]);
                Ok(len)
            }
            None => Err(io::Error::from(io::ErrorKind::WouldBlock)),
        }
    }

    fn send(&self, buf: &[u8]) -> io::Result<usize> {
        let desc = describe(buf);

        let mut loss = self.loss.lock().unwrap();
        let p = loss.probability;
        if p > 0.0 && loss.rng.gen_bool(p) {
            trace!("🔥 DROP: {}", desc);
            return Ok(buf.len());
        }

        trace!("📤 SEND: {} ({} bytes)", desc, buf.len());
        self.tx_log.lock().unwrap().push((desc, buf.to_vec()));
        Ok(buf.len())
    }
}
