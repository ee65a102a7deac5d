use crate::tcp::Wrap32;

const DEFAULT_CAPACITY: usize = 64_000; // bytes per direction
const DEFAULT_INITIAL_RTO_MS: u64 = 1_000;
const DEFAULT_MAX_PAYLOAD_SIZE: usize = 1_000; // bytes
const DEFAULT_MAX_RETRANSMISSIONS: u64 = 8;

#[derive(Debug, Clone)]
pub struct Config {
    /// Size of each direction's byte stream.
    capacity: usize,

    /// Retransmission timeout before any backoff.
    initial_rto_ms: u64,

    /// Largest payload carried by one segment.
    max_payload_size: usize,

    /// Consecutive retransmissions tolerated before the connection is reset.
    max_retransmissions: u64,

    /// Fixed initial sequence number; random when unset.
    isn: Option<Wrap32>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            initial_rto_ms: DEFAULT_INITIAL_RTO_MS,
            max_payload_size: DEFAULT_MAX_PAYLOAD_SIZE,
            max_retransmissions: DEFAULT_MAX_RETRANSMISSIONS,
            isn: None,
        }
    }
}

impl Config {
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn with_capacity(mut self, value: usize) -> Self {
        self.capacity = value;

        self
    }

    pub fn initial_rto_ms(&self) -> u64 {
        self.initial_rto_ms
    }

    pub fn with_initial_rto_ms(mut self, value: u64) -> Self {
        assert!(value > 0);
        self.initial_rto_ms = value;

        self
    }

    pub fn max_payload_size(&self) -> usize {
        self.max_payload_size
    }

    pub fn with_max_payload_size(mut self, value: usize) -> Self {
        assert!(value > 0);
        self.max_payload_size = value;

        self
    }

    pub fn max_retransmissions(&self) -> u64 {
        self.max_retransmissions
    }

    pub fn with_max_retransmissions(mut self, value: u64) -> Self {
        self.max_retransmissions = value;

        self
    }

    /// The configured ISN, or a fresh random one.
    pub fn isn(&self) -> Wrap32 {
        self.isn.unwrap_or_else(|| Wrap32::new(rand::random()))
    }

    pub fn with_isn(mut self, value: Wrap32) -> Self {
        self.isn = Some(value);

        self
    }
}
