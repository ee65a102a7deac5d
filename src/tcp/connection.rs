use crate::tcp::{
    ByteStream, Reassembler, Receiver, ReceiverMessage, Segment, Sender, SenderMessage, Transmit,
};
use crate::Config;
use log::{debug, info, warn};
use std::fmt;

/// How long a finished connection keeps answering, in initial RTOs.
const LINGER_RTOS: u64 = 10;

/// Attaches the receiver's current ack/window to every outgoing sender message.
struct Piggyback<'a, T> {
    receiver: ReceiverMessage,
    out: &'a mut T,
    sent: bool,
}

impl<T: Transmit<Segment>> Transmit<SenderMessage> for Piggyback<'_, T> {
    fn send(&mut self, message: &SenderMessage) {
        self.out.send(&Segment {
            sender: message.clone(),
            receiver: self.receiver,
        });
        self.sent = true;
    }
}

/// One side of a full-duplex TCP connection.
///
/// Owns a [`Sender`] for the outbound stream and a [`Receiver`] for the
/// inbound one, and combines their messages into [`Segment`]s.
pub struct Connection {
    pub(crate) id: u64,
    sender: Sender,
    receiver: Receiver,
    config: Config,
    /// An acknowledgment is owed to the peer
    need_send: bool,
    /// Whether to keep answering after both streams finish (active close)
    linger_after_streams_finish: bool,
    time_ms: u64,
    last_receipt_ms: u64,
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("id", &self.id)
            .field("next_seqno", &self.sender.next_seqno())
            .field("in_flight", &self.sender.sequence_numbers_in_flight())
            .field("rto_ms", &self.sender.rto_ms())
            .field("outbound.len()", &self.sender.input().bytes_buffered())
            .field("inbound.len()", &self.receiver.reader().bytes_buffered())
            .field("pending", &self.receiver.reassembler().bytes_pending())
            .field("linger", &self.linger_after_streams_finish)
            .finish()
    }
}

impl Connection {
    pub fn new(id: u64, config: Config) -> Self {
        let isn = config.isn();
        debug!("[#{}] new connection, ISN {}", id, isn);
        Connection {
            id,
            sender: Sender::new(
                ByteStream::new(config.capacity()),
                isn,
                config.initial_rto_ms(),
                config.max_payload_size(),
            ),
            receiver: Receiver::new(Reassembler::new(ByteStream::new(config.capacity()))),
            config,
            need_send: false,
            linger_after_streams_finish: true,
            time_ms: 0,
            last_receipt_ms: 0,
        }
    }

    /// Send whatever the outbound stream and window allow, plus any owed ack.
    pub fn push(&mut self, transmit: &mut impl Transmit<Segment>) {
        if self.has_error() {
            return;
        }

        let mut out = Piggyback {
            receiver: self.receiver.send(),
            out: transmit,
            sent: false,
        };
        self.sender.push(&mut out);
        if out.sent {
            self.need_send = false;
        }

        if self.need_send {
            self.need_send = false;
            let ack = self.segment(self.sender.make_empty_message());
            transmit.send(&ack);
        }
    }

    pub fn receive(&mut self, segment: &Segment, transmit: &mut impl Transmit<Segment>) {
        if !self.is_active() {
            return;
        }
        self.last_receipt_ms = self.time_ms;

        let incoming = &segment.sender;
        if incoming.sequence_length() > 0 {
            self.need_send = true;
        } else if let Some(ackno) = self.receiver.send().ackno {
            // keep-alive: an empty segment just below the window
            if incoming.seqno + 1 == ackno {
                self.need_send = true;
            }
        }

        self.receiver.receive(incoming);
        self.sender.receive(&segment.receiver);

        if self.has_error() {
            info!("[#{}] ⚠️ connection reset by peer", self.id);
            return;
        }

        // passive close: the peer finished first, nothing left to wait for
        if self.receiver.writer().is_closed() && !self.sender.fin_sent() {
            self.linger_after_streams_finish = false;
        }

        self.push(transmit);
    }

    /// Report that `ms` milliseconds have passed since the previous tick.
    pub fn tick(&mut self, ms: u64, transmit: &mut impl Transmit<Segment>) {
        if !self.is_active() {
            return;
        }
        self.time_ms += ms;

        let mut out = Piggyback {
            receiver: self.receiver.send(),
            out: transmit,
            sent: false,
        };
        self.sender.tick(ms, &mut out);

        if self.sender.consecutive_retransmissions() > self.config.max_retransmissions() {
            warn!(
                "[#{}] ❌ giving up after {} retransmissions, sending RST",
                self.id,
                self.sender.consecutive_retransmissions()
            );
            let mut rst = self.sender.make_empty_message();
            rst.rst = true;
            let rst = self.segment(rst);
            transmit.send(&rst);
            self.sender.input_mut().set_error();
            self.receiver.reader_mut().set_error();
        }
    }

    /// False once reset, or once both streams are done and lingering is over.
    pub fn is_active(&self) -> bool {
        let sending = !self.sender.is_finished();
        let receiving = !self.receiver.writer().is_closed();
        let lingering = self.linger_after_streams_finish
            && self.time_ms < self.last_receipt_ms + LINGER_RTOS * self.config.initial_rto_ms();

        !self.has_error() && (sending || receiving || lingering)
    }

    pub fn has_error(&self) -> bool {
        self.sender.input().has_error() || self.receiver.reader().has_error()
    }

    fn segment(&self, sender: SenderMessage) -> Segment {
        Segment {
            sender,
            receiver: self.receiver.send(),
        }
    }

    /// Write end of the stream to the peer.
    pub fn outbound(&mut self) -> &mut ByteStream {
        self.sender.input_mut()
    }

    /// Read end of the stream from the peer.
    pub fn inbound(&mut self) -> &mut ByteStream {
        self.receiver.reader_mut()
    }

    pub fn sender(&self) -> &Sender {
        &self.sender
    }

    pub fn receiver(&self) -> &Receiver {
        &self.receiver
    }
}

/// Connection snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Snapshot {
    pub id: u64,
    pub next_seqno: u64,
    pub in_flight: u64,
    pub rto_ms: u64,
    pub retransmits: u64,
    pub queued_bytes: usize,
    pub bytes_received: u64,
    pub bytes_sent: u64,
    pub active: bool,
}

impl Connection {
    pub fn peek(&self) -> Snapshot {
        Snapshot {
            id: self.id,
            next_seqno: self.sender.next_seqno(),
            in_flight: self.sender.sequence_numbers_in_flight(),
            rto_ms: self.sender.rto_ms(),
            retransmits: self.sender.consecutive_retransmissions(),
            queued_bytes: self.sender.input().bytes_buffered(),
            bytes_received: self.receiver.writer().bytes_pushed(),
            bytes_sent: self.sender.input().bytes_popped(),
            active: self.is_active(),
        }
    }
}
