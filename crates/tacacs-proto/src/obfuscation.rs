//! Body obfuscation (RFC 8907 Section 4.5)
//!
//! The pad is a chain of MD5 digests:
//!
//! ```text
//! MD5_1 = MD5{session_id, key, version, seq_no}
//! MD5_n = MD5{session_id, key, version, seq_no, MD5_n-1}
//! ```
//!
//! concatenated and truncated to the body length. XOR with the pad both
//! hides and reveals the body, so one function serves both directions.

use crate::packet::{Header, PacketError};
use rand::Rng;

/// Generate a random, non-zero session identifier
pub fn generate_session_id() -> u32 {
    let mut rng = rand::rng();
    rng.random_range(1..=u32::MAX)
}

/// Compute the pseudo pad for one packet body
pub fn pseudo_pad(session_id: u32, secret: &[u8], version: u8, seq_no: u8, length: usize) -> Vec<u8> {
    let mut prefix = Vec::with_capacity(4 + secret.len() + 2);
    prefix.extend_from_slice(&session_id.to_be_bytes());
    prefix.extend_from_slice(secret);
    prefix.push(version);
    prefix.push(seq_no);

    let mut pad = Vec::with_capacity(length + 16);
    let mut previous: Option<[u8; 16]> = None;

    while pad.len() < length {
        let mut context = md5::Context::new();
        context.consume(&prefix);
        if let Some(block) = previous {
            context.consume(block);
        }
        let digest = context.compute();

        pad.extend_from_slice(&digest.0);
        previous = Some(digest.0);
    }

    pad.truncate(length);
    pad
}

/// XOR `data` in place with the pad derived from the given parameters
pub fn apply_pad(data: &mut [u8], session_id: u32, secret: &[u8], version: u8, seq_no: u8) {
    let pad = pseudo_pad(session_id, secret, version, seq_no, data.len());
    for (byte, key) in data.iter_mut().zip(pad) {
        *byte ^= key;
    }
}

/// Obfuscate or reveal a packet body using the parameters of its header
pub fn obfuscate_body(body: &mut [u8], header: &Header, secret: &[u8]) -> Result<(), PacketError> {
    if secret.is_empty() {
        return Err(PacketError::EmptySecret);
    }

    apply_pad(
        body,
        header.session_id,
        secret,
        header.version.as_u8(),
        header.seq_no,
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_session_id() {
        let id1 = generate_session_id();
        let id2 = generate_session_id();
        assert_ne!(id1, 0);
        assert_ne!(id2, 0);
        // Should be random
        assert_ne!(id1, id2);
    }

    #[test]
    fn test_first_pad_block_is_md5_of_prefix() {
        let pad = pseudo_pad(0x01020304, b"key", 0xc1, 1, 16);

        let mut input = vec![1, 2, 3, 4];
        input.extend_from_slice(b"key");
        input.extend_from_slice(&[0xc1, 1]);
        assert_eq!(pad, md5::compute(&input).0.to_vec());
    }

    #[test]
    fn test_pad_blocks_are_chained() {
        let pad = pseudo_pad(7, b"key", 0xc0, 2, 40);
        assert_eq!(pad.len(), 40);

        let mut input = vec![0, 0, 0, 7];
        input.extend_from_slice(b"key");
        input.extend_from_slice(&[0xc0, 2]);
        let first = md5::compute(&input).0;
        input.extend_from_slice(&first);
        let second = md5::compute(&input).0;

        assert_eq!(&pad[..16], &first);
        assert_eq!(&pad[16..32], &second);
    }

    #[test]
    fn test_pad_depends_on_every_parameter() {
        let base = pseudo_pad(1, b"secret", 0xc1, 1, 16);
        assert_ne!(base, pseudo_pad(2, b"secret", 0xc1, 1, 16));
        assert_ne!(base, pseudo_pad(1, b"secreT", 0xc1, 1, 16));
        assert_ne!(base, pseudo_pad(1, b"secret", 0xc0, 1, 16));
        assert_ne!(base, pseudo_pad(1, b"secret", 0xc1, 3, 16));
    }

    #[test]
    fn test_apply_pad_is_an_involution() {
        let cases: [(&[u8], u32, u8, u8); 4] = [
            (b"5ecr3t", 1, 0xc1, 1),
            (b"another secret", u32::MAX, 0xc0, 2),
            (b"k", 0x8000_0000, 0xc1, 255),
            (b"a much longer shared secret used by the device", 42, 0xc0, 9),
        ];

        for (secret, session_id, version, seq_no) in cases {
            for length in [0usize, 1, 15, 16, 17, 100] {
                let original: Vec<u8> = (0..length).map(|i| i as u8).collect();
                let mut data = original.clone();

                apply_pad(&mut data, session_id, secret, version, seq_no);
                if length >= 16 {
                    assert_ne!(data, original);
                }
                apply_pad(&mut data, session_id, secret, version, seq_no);
                assert_eq!(data, original);
            }
        }
    }

    #[test]
    fn test_obfuscate_body_requires_secret() {
        let header = Header {
            version: crate::packet::Version::ONE,
            packet_type: crate::packet::PacketType::Authentication,
            seq_no: 1,
            flags: 0,
            session_id: 1,
            length: 4,
        };
        let mut body = vec![1, 2, 3, 4];
        assert!(matches!(
            obfuscate_body(&mut body, &header, b""),
            Err(PacketError::EmptySecret)
        ));
        assert_eq!(body, vec![1, 2, 3, 4]);
    }
}
