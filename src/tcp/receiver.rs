use super::{ByteStream, ReceiverMessage, Reassembler, SenderMessage, Wrap32};
use log::{debug, trace};

/// The receiving half of a TCP endpoint.
///
/// Until a SYN arrives the receiver has no zero point for the peer's sequence
/// space and drops everything. Afterwards it maps each segment into stream
/// indices and hands the payload to its reassembler.
#[derive(Debug)]
pub struct Receiver {
    reassembler: Reassembler,
    isn: Option<Wrap32>,
}

impl Receiver {
    pub fn new(reassembler: Reassembler) -> Self {
        Receiver {
            reassembler,
            isn: None,
        }
    }

    pub fn receive(&mut self, message: &SenderMessage) {
        if message.rst {
            debug!("receiver got RST, marking inbound stream as errored");
            self.reassembler.reader_mut().set_error();
            return;
        }

        let isn = match self.isn {
            Some(isn) => isn,
            None if message.syn => {
                debug!("receiver learned peer ISN {}", message.seqno);
                self.isn = Some(message.seqno);
                message.seqno
            }
            None => {
                trace!("receiver dropping seq={} before SYN", message.seqno);
                return;
            }
        };

        // the next byte we expect sits one past the SYN
        let checkpoint = self.reassembler.writer().bytes_pushed() + 1;
        let absolute = message.seqno.unwrap(isn, checkpoint);
        let stream_index = match (absolute + message.syn as u64).checked_sub(1) {
            Some(index) => index,
            None => {
                trace!("receiver dropping data segment on the SYN slot");
                return;
            }
        };

        self.reassembler
            .insert(stream_index, &message.payload, message.fin);
    }

    /// The acknowledgment and window to report to the peer.
    pub fn send(&self) -> ReceiverMessage {
        let writer = self.reassembler.writer();
        let window_size = writer.available_capacity().min(u16::MAX as usize) as u16;
        let ackno = self.isn.map(|isn| {
            // SYN, every byte written so far, then FIN once the stream closed
            Wrap32::wrap(1 + writer.bytes_pushed() + writer.is_closed() as u64, isn)
        });

        ReceiverMessage {
            ackno,
            window_size,
            rst: writer.has_error(),
        }
    }

    pub fn reassembler(&self) -> &Reassembler {
        &self.reassembler
    }

    pub fn reader(&self) -> &ByteStream {
        self.reassembler.reader()
    }

    pub fn reader_mut(&mut self) -> &mut ByteStream {
        self.reassembler.reader_mut()
    }

    pub fn writer(&self) -> &ByteStream {
        self.reassembler.writer()
    }
}
