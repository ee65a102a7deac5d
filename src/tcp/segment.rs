//! IPv4/TCP datagram encoding for [`Segment`]s.
use super::{flags, ReceiverMessage, Segment, SenderMessage, Wrap32};
use etherparse::{IpNumber, Ipv4HeaderSlice, PacketBuilder, TcpHeaderSlice};
use std::net::{Ipv4Addr, SocketAddrV4};
use thiserror::Error;

const TTL: u8 = 64;

#[derive(Error, Debug)]
pub enum SegmentError {
    #[error("malformed IPv4 header: {0}")]
    Ipv4(String),
    #[error("datagram carries IP protocol {0}, not TCP")]
    NotTcp(u8),
    #[error("malformed TCP header: {0}")]
    Tcp(String),
    #[error("failed to build datagram: {0}")]
    Build(String),
}

/// The four-tuple that names one direction of a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Key {
    pub(crate) src_ip: Ipv4Addr,
    pub(crate) src_port: u16,
    pub(crate) dst_ip: Ipv4Addr,
    pub(crate) dst_port: u16,
}

impl std::fmt::Display for Key {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}:{} → {}:{}",
            self.src_ip, self.src_port, self.dst_ip, self.dst_port
        )
    }
}

impl Key {
    pub fn new(ip: &Ipv4HeaderSlice, tcp: &TcpHeaderSlice) -> Self {
        Key {
            src_ip: ip.source_addr(),
            src_port: tcp.source_port(),
            dst_ip: ip.destination_addr(),
            dst_port: tcp.destination_port(),
        }
    }

    /// The key for datagrams travelling from `src` to `dst`.
    pub fn between(src: SocketAddrV4, dst: SocketAddrV4) -> Self {
        Key {
            src_ip: *src.ip(),
            src_port: src.port(),
            dst_ip: *dst.ip(),
            dst_port: dst.port(),
        }
    }

    pub fn reverse(&self) -> Self {
        Key {
            src_ip: self.dst_ip,
            src_port: self.dst_port,
            dst_ip: self.src_ip,
            dst_port: self.src_port,
        }
    }
}

/// Encode `segment` as an IPv4 datagram travelling along `key`.
pub fn serialize(key: &Key, segment: &Segment) -> Result<Vec<u8>, SegmentError> {
    let sender = &segment.sender;
    let receiver = &segment.receiver;

    let mut builder = PacketBuilder::ipv4(key.src_ip.octets(), key.dst_ip.octets(), TTL).tcp(
        key.src_port,
        key.dst_port,
        sender.seqno.raw(),
        receiver.window_size,
    );
    if sender.syn {
        builder = builder.syn();
    }
    if sender.fin {
        builder = builder.fin();
    }
    if sender.rst || receiver.rst {
        builder = builder.rst();
    }
    if !sender.payload.is_empty() {
        builder = builder.psh();
    }
    if let Some(ackno) = receiver.ackno {
        builder = builder.ack(ackno.raw());
    }

    let mut packet = Vec::with_capacity(builder.size(sender.payload.len()));
    builder
        .write(&mut packet, &sender.payload)
        .map_err(|e| SegmentError::Build(e.to_string()))?;
    Ok(packet)
}

/// Decode an IPv4 datagram carrying TCP into its key and segment.
pub fn parse(packet: &[u8]) -> Result<(Key, Segment), SegmentError> {
    let ip_hdr =
        Ipv4HeaderSlice::from_slice(packet).map_err(|e| SegmentError::Ipv4(e.to_string()))?;
    if ip_hdr.protocol() != IpNumber::TCP {
        return Err(SegmentError::NotTcp(ip_hdr.protocol().0));
    }
    let tcp_hdr = TcpHeaderSlice::from_slice(&packet[ip_hdr.slice().len()..])
        .map_err(|e| SegmentError::Tcp(e.to_string()))?;

    let off = ip_hdr.slice().len() + tcp_hdr.slice().len();
    // trailing link-layer padding is not payload
    let end = (ip_hdr.total_len() as usize).min(packet.len()).max(off);
    let payload = &packet[off..end];

    let fgs = flags::tcp_header_to_flags(&tcp_hdr);
    let rst = fgs & flags::RST != 0;
    let segment = Segment {
        sender: SenderMessage {
            seqno: Wrap32::new(tcp_hdr.sequence_number()),
            syn: fgs & flags::SYN != 0,
            payload: payload.to_vec(),
            fin: fgs & flags::FIN != 0,
            rst,
        },
        receiver: ReceiverMessage {
            ackno: (fgs & flags::ACK != 0).then(|| Wrap32::new(tcp_hdr.acknowledgment_number())),
            window_size: tcp_hdr.window_size(),
            rst,
        },
    };

    Ok((Key::new(&ip_hdr, &tcp_hdr), segment))
}
