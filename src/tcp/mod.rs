mod byte_stream;
mod connection;
mod endpoint;
mod flags;
mod message;
mod reassembler;
mod receiver;
mod segment;
mod sender;
mod timer;
mod wrap32;

pub use self::byte_stream::ByteStream;
pub use self::connection::{Connection, Snapshot};
pub use self::endpoint::Endpoint;
pub use self::message::{ReceiverMessage, Segment, SenderMessage, Transmit};
pub use self::reassembler::Reassembler;
pub use self::receiver::Receiver;
pub use self::segment::{parse, serialize, Key, SegmentError};
pub use self::sender::Sender;
pub use self::timer::RetransmissionTimer;
pub use self::wrap32::Wrap32;

pub use self::flags::{flags_to_string, segment_flags, tcp_header_to_flags};
pub use self::flags::{ACK, FIN, PSH, RST, SYN};
