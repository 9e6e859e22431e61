//! Error classification: corrupt input versus source failures versus clean EOF.

use std::io::{self, Read};

use compress::{
    CompressionAlgorithm, CompressionLevel, FrameDecoder, compress_to_vec, decompress_to_vec,
    is_corruption,
};

/// Yields `data` and then fails with `kind` instead of reporting EOF.
struct FailAfter {
    data: io::Cursor<Vec<u8>>,
    kind: io::ErrorKind,
}

impl Read for FailAfter {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self.data.read(buf)? {
            0 => Err(io::Error::new(self.kind, "source failure")),
            read => Ok(read),
        }
    }
}

fn sample(algorithm: CompressionAlgorithm) -> Vec<u8> {
    compress_to_vec(
        b"sample payload for corruption tests ".repeat(8).as_slice(),
        algorithm,
        CompressionLevel::Default,
    )
    .unwrap()
}

#[test]
fn wrong_magic_is_corruption() {
    for &algorithm in CompressionAlgorithm::available() {
        let err = decompress_to_vec(&[0u8; 16], algorithm).unwrap_err();
        assert!(is_corruption(&err), "{algorithm}: {err:?}");
    }
}

#[test]
fn truncated_frame_is_corruption_not_eof() {
    for &algorithm in CompressionAlgorithm::available() {
        let wire = sample(algorithm);
        let truncated = &wire[..wire.len() / 2];
        let err = decompress_to_vec(truncated, algorithm).unwrap_err();
        assert!(is_corruption(&err), "{algorithm}: {err:?}");
    }
}

#[test]
fn missing_lz4_end_marker_is_corruption() {
    let wire = sample(CompressionAlgorithm::Lz4);
    // end marker (4 bytes) + content checksum (4 bytes)
    let err = decompress_to_vec(&wire[..wire.len() - 8], CompressionAlgorithm::Lz4).unwrap_err();
    assert!(is_corruption(&err), "{err:?}");
}

#[test]
fn lz4_checksum_mismatch_is_corruption() {
    let mut wire = sample(CompressionAlgorithm::Lz4);
    let last = wire.len() - 1;
    wire[last] ^= 0xFF;
    let err = decompress_to_vec(&wire, CompressionAlgorithm::Lz4).unwrap_err();
    assert!(is_corruption(&err), "{err:?}");
}

#[test]
fn source_errors_keep_their_kind() {
    for kind in [
        io::ErrorKind::TimedOut,
        io::ErrorKind::ConnectionReset,
        io::ErrorKind::WouldBlock,
    ] {
        let source = FailAfter {
            data: io::Cursor::new(Vec::new()),
            kind,
        };
        let mut decoder = FrameDecoder::new(source, CompressionAlgorithm::Lz4).unwrap();
        let err = decoder.read(&mut [0u8; 32]).unwrap_err();
        assert_eq!(err.kind(), kind);
        assert!(!is_corruption(&err));
    }
}

#[test]
fn source_error_after_valid_prefix_keeps_its_kind() {
    let wire = sample(CompressionAlgorithm::Lz4);
    let source = FailAfter {
        data: io::Cursor::new(wire[..wire.len() - 8].to_vec()),
        kind: io::ErrorKind::ConnectionAborted,
    };
    let mut decoder = FrameDecoder::new(source, CompressionAlgorithm::Lz4).unwrap();
    let mut output = Vec::new();
    let err = decoder.read_to_end(&mut output).unwrap_err();
    assert_eq!(err.kind(), io::ErrorKind::ConnectionAborted);
    assert!(!is_corruption(&err));
}

#[test]
fn empty_source_is_clean_eof() {
    let mut decoder = FrameDecoder::new(io::empty(), CompressionAlgorithm::Lz4).unwrap();
    assert_eq!(decoder.read(&mut [0u8; 8]).unwrap(), 0);
}
