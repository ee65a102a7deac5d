
use crate::tcp::{parse, ByteStream, Reassembler, Receiver, Sender, Wrap32};
use crate::Config;
use harness::Pair;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn random_bytes(len: usize, seed: u64) -> Vec<u8> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..len).map(|_| rng.gen()).collect()
}

#[test]
fn test_loopback_window_grows_from_one() {
    let isn = Wrap32::new(u32::MAX - 2);
    let mut sender = Sender::new(ByteStream::new(1_000), isn, 1_000, 7);
    let mut receiver = Receiver::new(Reassembler::new(ByteStream::new(64)));

    let data = random_bytes(200, 1);
    sender.input_mut().push(&data);
    sender.input_mut().close();

    // window of one before the peer speaks: the SYN goes alone
    let mut segments = Vec::new();
    sender.push(&mut segments);
    assert_eq!(segments.len(), 1);
    assert!(segments[0].syn);
    assert!(segments[0].payload.is_empty());
    sender.push(&mut segments);
    assert_eq!(segments.len(), 1);

    let mut received = Vec::new();
    for _ in 0..1_000 {
        for message in segments.drain(..) {
            receiver.receive(&message);
        }
        received.extend(receiver.reader_mut().read(usize::MAX));
        sender.receive(&receiver.send());
        sender.push(&mut segments);
        if segments.is_empty() {
            break;
        }
    }

    assert_eq!(received, data);
    assert!(receiver.reader().is_finished());
    assert!(sender.is_finished());
    assert_eq!(sender.sequence_numbers_in_flight(), 0);
    assert_eq!(sender.consecutive_retransmissions(), 0);
}

#[test]
fn test_handshake_over_devices() {
    let config = Config::default().with_isn(Wrap32::new(1000));
    let mut pair = Pair::new(config.clone(), config.with_isn(Wrap32::new(5000)));

    pair.client.connect().unwrap();
    let syn = pair.client_dev.last_sent_packet().unwrap();
    let (_, segment) = parse(&syn).unwrap();
    assert!(segment.sender.syn);
    assert_eq!(segment.receiver.ackno, None);

    assert_eq!(pair.deliver(), 1);
    let (desc, syn_ack) = pair.server_dev.get_sent_packets().pop().unwrap();
    assert!(desc.contains("[SA---]"), "unexpected reply {}", desc);
    let (_, segment) = parse(&syn_ack).unwrap();
    assert_eq!(segment.sender.seqno, Wrap32::new(5000));
    assert_eq!(segment.receiver.ackno, Some(Wrap32::new(1001)));

    pair.settle();
    assert_eq!(pair.client.peek().in_flight, 0);
    assert_eq!(pair.server.peek().in_flight, 0);
    assert!(pair.client.is_active());
    assert!(pair.server.is_active());
}

#[test]
fn test_request_response() {
    let mut pair = Pair::new(Config::default(), Config::default());
    pair.client.connect().unwrap();
    pair.settle();

    let request = b"GET / HTTP/1.1\r\nHost: example\r\nConnection: close\r\n\r\n";
    assert_eq!(pair.client.write(request).unwrap(), request.len());
    pair.client.close().unwrap();
    pair.settle();

    assert_eq!(pair.server.read(), request.to_vec());
    assert!(pair.server.connection().receiver().reader().is_finished());

    let response = b"HTTP/1.1 200 OK\r\nContent-Length: 2\r\n\r\nhi";
    pair.server.write(response).unwrap();
    pair.server.close().unwrap();
    pair.settle();

    assert_eq!(pair.client.read(), response.to_vec());
    // passive closer is done as soon as its FIN is acknowledged
    assert!(!pair.server.is_active());
    // active closer lingers
    assert!(pair.client.is_active());
    pair.step(10 * 1_000);
    assert!(!pair.client.is_active());
    assert!(!pair.client.connection().has_error());
}

#[test]
fn test_transfer_survives_loss() {
    let config = Config::default()
        .with_initial_rto_ms(200)
        .with_max_retransmissions(30);
    let mut pair = Pair::new(config.clone(), config);
    pair.client_dev.set_drop_probability(0.1, 7);
    pair.server_dev.set_drop_probability(0.1, 11);

    let data = random_bytes(20_000, 3);
    pair.client.connect().unwrap();
    assert_eq!(pair.client.write(&data).unwrap(), data.len());
    pair.client.close().unwrap();

    let mut received = Vec::new();
    for _ in 0..100_000 {
        pair.step(50);
        received.extend(pair.server.read());

        let finished = pair.server.connection().receiver().reader().is_finished();
        if finished && !pair.server.connection().sender().input().is_closed() {
            pair.server.close().unwrap();
        }
        if !pair.client.is_active() && !pair.server.is_active() {
            break;
        }
    }

    assert_eq!(received.len(), data.len());
    assert!(received == data);
    assert!(!pair.client.is_active());
    assert!(!pair.server.is_active());
    assert!(!pair.client.connection().has_error());
    assert!(!pair.server.connection().has_error());
}

#[test]
fn test_zero_window_probe_keeps_rto() {
    let client = Config::default().with_isn(Wrap32::new(0));
    let server = Config::default().with_capacity(10);
    let mut pair = Pair::new(client, server);

    let data = b"abcdefghijklmnopqrstuvwxyz0123".to_vec();
    pair.client.connect().unwrap();
    pair.settle();
    pair.client.write(&data).unwrap();
    pair.client.close().unwrap();
    pair.settle();

    // server buffer full: one probe byte stays in flight
    assert_eq!(pair.server.peek().bytes_received, 10);
    assert_eq!(pair.client.peek().in_flight, 1);

    for _ in 0..5 {
        pair.step(1_000);
    }
    let snapshot = pair.client.peek();
    assert_eq!(snapshot.rto_ms, 1_000);
    assert_eq!(snapshot.retransmits, 5);
    assert!(pair.client.is_active());

    let mut received = Vec::new();
    for _ in 0..100 {
        received.extend(pair.server.read());
        if pair.server.connection().receiver().reader().is_finished() {
            break;
        }
        pair.step(1_000);
    }

    assert_eq!(received, data);
    assert_eq!(pair.client.peek().retransmits, 0);
}

#[test]
fn test_unreachable_peer_is_abandoned() {
    let config = Config::default()
        .with_initial_rto_ms(100)
        .with_max_retransmissions(3);
    let mut pair = Pair::new(config.clone(), config);
    pair.client_dev.set_drop_probability(1.0, 0);

    pair.client.connect().unwrap();
    for _ in 0..100 {
        pair.step(100);
    }

    assert!(!pair.client.is_active());
    assert!(pair.client.connection().has_error());
    assert!(pair.server_dev.get_sent_packets().is_empty());
}

#[test]
fn test_rst_from_peer() {
    let mut pair = Pair::new(Config::default(), Config::default());
    pair.client.connect().unwrap();
    pair.settle();

    let mut rst = crate::tcp::Segment::default();
    rst.sender.rst = true;
    rst.sender.seqno = Wrap32::new(0);
    let packet = crate::tcp::serialize(&pair.server.key(), &rst).unwrap();
    pair.client.handle_datagram(&packet).unwrap();

    assert!(!pair.client.is_active());
    assert!(pair.client.connection().has_error());
    assert!(pair.server.is_active());
}
