//! End-to-end behaviour of configured endpoints.
//!
//! Both peers load the same configuration file, build their stream settings
//! from it and exchange data over an in-process session pair, the way two
//! tunnel endpoints would over a real multiplexed connection.

use std::io::{Read, Write};
use std::thread;

use tempfile::NamedTempFile;
use tnet::{CompressedSession, Config, MemorySession, StreamSettings};

fn configured_settings(json: &str) -> StreamSettings {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(json.as_bytes()).unwrap();
    Config::load(file.path()).unwrap().stream_settings().unwrap()
}

fn endpoints(
    settings: StreamSettings,
) -> (
    CompressedSession<MemorySession>,
    CompressedSession<MemorySession>,
) {
    let (client, server) = MemorySession::pair();
    (
        CompressedSession::new(client, settings),
        CompressedSession::new(server, settings),
    )
}

#[test]
fn client_sends_repeated_bytes_to_server() {
    let settings = configured_settings("{}");
    let (client, server) = endpoints(settings);

    let receiver = thread::spawn(move || {
        let mut stream = server.accept_stream().unwrap();
        let mut received = Vec::new();
        stream.read_to_end(&mut received).unwrap();
        (stream.id(), received, server.get_ref().bytes_received())
    });

    let mut stream = client.open_stream().unwrap();
    let sent_id = stream.id();
    let payload = "A".repeat(500);
    stream.write_all(payload.as_bytes()).unwrap();
    stream.close().unwrap();

    let (received_id, received, wire_bytes) = receiver.join().unwrap();
    assert_eq!(received_id, sent_id);
    assert_eq!(received, payload.as_bytes());
    assert!(wire_bytes < 300, "{wire_bytes} bytes on the wire");
}

#[test]
fn request_and_response_on_one_stream() {
    let settings = configured_settings(r#"{"compression": {"level": 9}}"#);
    let (client, server) = endpoints(settings);

    let responder = thread::spawn(move || {
        let mut stream = server.accept_stream().unwrap();
        let mut request = [0u8; 5];
        stream.read_exact(&mut request).unwrap();
        assert_eq!(&request, b"hello");
        stream.write_all(b"world").unwrap();
        let mut rest = Vec::new();
        stream.read_to_end(&mut rest).unwrap();
        assert!(rest.is_empty());
    });

    let mut stream = client.open_stream().unwrap();
    stream.write_all(b"hello").unwrap();
    let mut response = [0u8; 5];
    stream.read_exact(&mut response).unwrap();
    assert_eq!(&response, b"world");
    stream.close().unwrap();
    assert!(stream.get_ref().is_closed());

    responder.join().unwrap();
}

#[test]
fn many_concurrent_streams_stay_separate() {
    let (client, server) = endpoints(StreamSettings::default());
    let client = std::sync::Arc::new(client);

    let senders: Vec<_> = (0..8u8)
        .map(|index| {
            let client = std::sync::Arc::clone(&client);
            thread::spawn(move || {
                let mut stream = client.open_stream().unwrap();
                let payload = vec![index; 4096 + usize::from(index)];
                stream.write_all(&[index]).unwrap();
                stream.write_all(&payload).unwrap();
                stream.close().unwrap();
            })
        })
        .collect();

    for _ in 0..8 {
        let mut stream = server.accept_stream().unwrap();
        let mut received = Vec::new();
        stream.read_to_end(&mut received).unwrap();
        let index = received[0];
        assert_eq!(received.len(), 1 + 4096 + usize::from(index));
        assert!(received[1..].iter().all(|&byte| byte == index));
    }

    for sender in senders {
        sender.join().unwrap();
    }
}
