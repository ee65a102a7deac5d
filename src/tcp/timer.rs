//! Retransmission timer driven by logical milliseconds.

/// A single retransmission timer.
///
/// The timer never reads a clock. Its owner reports elapsed time through
/// [`RetransmissionTimer::tick`] and checks [`RetransmissionTimer::is_expired`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetransmissionTimer {
    initial_rto_ms: u64,
    rto_ms: u64,
    elapsed_ms: u64,
    active: bool,
}

impl RetransmissionTimer {
    pub fn new(initial_rto_ms: u64) -> Self {
        RetransmissionTimer {
            initial_rto_ms,
            rto_ms: initial_rto_ms,
            elapsed_ms: 0,
            active: false,
        }
    }

    /// Run from zero elapsed time.
    pub fn start(&mut self) {
        self.active = true;
        self.elapsed_ms = 0;
    }

    pub fn stop(&mut self) {
        self.active = false;
        self.elapsed_ms = 0;
    }

    pub fn tick(&mut self, ms: u64) {
        if self.active {
            self.elapsed_ms = self.elapsed_ms.saturating_add(ms);
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn is_expired(&self) -> bool {
        self.active && self.elapsed_ms >= self.rto_ms
    }

    /// Exponential backoff (RFC 6298 §5.5).
    pub fn back_off(&mut self) {
        self.rto_ms = self.rto_ms.saturating_mul(2);
    }

    pub fn reset_rto(&mut self) {
        self.rto_ms = self.initial_rto_ms;
    }

    pub fn rto_ms(&self) -> u64 {
        self.rto_ms
    }
}
