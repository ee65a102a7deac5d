use super::{ByteStream, ReceiverMessage, RetransmissionTimer, SenderMessage, Transmit, Wrap32};
use log::{debug, trace};
use std::collections::VecDeque;

/// A segment that has been sent but not yet fully acknowledged.
#[derive(Debug, Clone)]
struct Outstanding {
    /// Absolute sequence index of the first sequence number the segment uses
    absolute: u64,
    message: SenderMessage,
}

impl Outstanding {
    fn end(&self) -> u64 {
        self.absolute + self.message.sequence_length()
    }
}

/// The sending half of a TCP endpoint.
///
/// Reads from an outbound [`ByteStream`] and cuts it into segments that fit
/// the peer's advertised window. Sent segments stay queued until an
/// acknowledgment covers them completely; the oldest one is resent whenever
/// the retransmission timer expires.
#[derive(Debug)]
pub struct Sender {
    input: ByteStream,
    isn: Wrap32,
    max_payload_size: usize,

    next_seqno: u64,
    window_size: u16,
    syn_sent: bool,
    fin_sent: bool,

    outstanding: VecDeque<Outstanding>,
    in_flight: u64,
    timer: RetransmissionTimer,
    consecutive_retransmissions: u64,
}

impl Sender {
    pub fn new(input: ByteStream, isn: Wrap32, initial_rto_ms: u64, max_payload_size: usize) -> Self {
        Sender {
            input,
            isn,
            max_payload_size,
            next_seqno: 0,
            // assume room for the SYN until the peer says otherwise
            window_size: 1,
            syn_sent: false,
            fin_sent: false,
            outstanding: VecDeque::new(),
            in_flight: 0,
            timer: RetransmissionTimer::new(initial_rto_ms),
            consecutive_retransmissions: 0,
        }
    }

    /// Send as much of the outbound stream as the window allows.
    ///
    /// A zero window is treated as a window of one so that a single probe
    /// segment is kept in flight until the peer reopens it.
    pub fn push(&mut self, transmit: &mut impl Transmit<SenderMessage>) {
        let window = self.window_size.max(1) as u64;

        while self.in_flight < window && !self.fin_sent {
            let mut message = self.make_empty_message();
            message.syn = !self.syn_sent;

            let room = window - self.in_flight - message.syn as u64;
            let payload_len = (room as usize)
                .min(self.max_payload_size)
                .min(self.input.bytes_buffered());
            message.payload = self.input.read(payload_len);

            // FIN only when it still fits behind the payload
            if self.input.is_finished() && room > message.payload.len() as u64 {
                message.fin = true;
            }

            let len = message.sequence_length();
            if len == 0 {
                break;
            }

            trace!(
                "sender TX seq={} len={} syn={} fin={} window={} in_flight={}",
                message.seqno,
                len,
                message.syn,
                message.fin,
                self.window_size,
                self.in_flight
            );

            self.syn_sent |= message.syn;
            self.fin_sent |= message.fin;
            self.next_seqno += len;
            self.in_flight += len;

            transmit.send(&message);
            if !self.timer.is_active() {
                self.timer.start();
            }
            self.outstanding.push_back(Outstanding {
                absolute: self.next_seqno - len,
                message,
            });
        }
    }

    /// A segment that occupies no sequence space, for bare acknowledgments.
    pub fn make_empty_message(&self) -> SenderMessage {
        SenderMessage {
            seqno: Wrap32::wrap(self.next_seqno, self.isn),
            rst: self.input.has_error(),
            ..Default::default()
        }
    }

    pub fn receive(&mut self, message: &ReceiverMessage) {
        self.window_size = message.window_size;

        if message.rst {
            debug!("sender got RST, marking outbound stream as errored");
            self.input.set_error();
            return;
        }

        let Some(ackno) = message.ackno else {
            if message.window_size == 0 {
                debug!("peer reported a zero window without an ackno");
                self.input.set_error();
            }
            return;
        };

        let ack = ackno.unwrap(self.isn, self.next_seqno);
        if ack > self.next_seqno {
            trace!(
                "sender ignoring ack={} beyond next_seqno={}",
                ack,
                self.next_seqno
            );
            return;
        }

        let mut acked_any = false;
        while let Some(front) = self.outstanding.front() {
            if front.end() > ack {
                break;
            }
            self.in_flight -= front.message.sequence_length();
            self.outstanding.pop_front();
            acked_any = true;
        }

        if acked_any {
            self.timer.reset_rto();
            self.consecutive_retransmissions = 0;
            if self.outstanding.is_empty() {
                self.timer.stop();
            } else {
                self.timer.start();
            }
        }
    }

    /// Report that `ms` milliseconds have passed since the previous tick.
    pub fn tick(&mut self, ms: u64, transmit: &mut impl Transmit<SenderMessage>) {
        self.timer.tick(ms);
        if !self.timer.is_expired() {
            return;
        }

        let Some(front) = self.outstanding.front() else {
            self.timer.stop();
            return;
        };

        debug!(
            "⏱️ RTO {}ms expired, retransmitting seq={} len={} attempt={}",
            self.timer.rto_ms(),
            front.message.seqno,
            front.message.sequence_length(),
            self.consecutive_retransmissions + 1
        );
        transmit.send(&front.message);
        self.consecutive_retransmissions += 1;

        // a zero-window probe is expected to go unanswered; don't back off
        if self.window_size > 0 {
            self.timer.back_off();
        }
        self.timer.start();
    }

    pub fn sequence_numbers_in_flight(&self) -> u64 {
        self.in_flight
    }

    pub fn consecutive_retransmissions(&self) -> u64 {
        self.consecutive_retransmissions
    }

    /// FIN sent and everything acknowledged.
    pub fn is_finished(&self) -> bool {
        self.fin_sent && self.outstanding.is_empty()
    }

    pub fn fin_sent(&self) -> bool {
        self.fin_sent
    }

    pub fn next_seqno(&self) -> u64 {
        self.next_seqno
    }

    pub fn rto_ms(&self) -> u64 {
        self.timer.rto_ms()
    }

    pub fn input(&self) -> &ByteStream {
        &self.input
    }

    pub fn input_mut(&mut self) -> &mut ByteStream {
        &mut self.input
    }
}
