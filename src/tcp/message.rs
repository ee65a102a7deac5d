//! Messages exchanged between a sender, a receiver and the network.
use super::Wrap32;

/// The sequence-space half of a TCP segment: what the sender emits.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SenderMessage {
    pub seqno: Wrap32,
    pub syn: bool,
    pub payload: Vec<u8>,
    pub fin: bool,
    pub rst: bool,
}

impl SenderMessage {
    /// Sequence numbers occupied by this message, SYN and FIN included.
    pub fn sequence_length(&self) -> u64 {
        self.payload.len() as u64 + self.syn as u64 + self.fin as u64
    }
}

/// The acknowledgment half of a TCP segment: what the receiver reports back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReceiverMessage {
    pub ackno: Option<Wrap32>,
    pub window_size: u16,
    pub rst: bool,
}

/// A full segment: one direction's data plus the other direction's ack.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Segment {
    pub sender: SenderMessage,
    pub receiver: ReceiverMessage,
}

/// A synchronous sink for outgoing messages.
///
/// Implementations must not call back into whatever is transmitting.
pub trait Transmit<M> {
    fn send(&mut self, message: &M);
}

/// Records every message, in order.
impl<M: Clone> Transmit<M> for Vec<M> {
    fn send(&mut self, message: &M) {
        self.push(message.clone());
    }
}
