//! Text-safe wire form of media payloads.
//!
//! Outbound documents carry media as standard base64 (RFC 4648 alphabet,
//! padded, no line breaks). Inbound JSON bodies may also use the MIME
//! style that wraps lines every 76 characters; line breaks are dropped
//! before decoding. Any other whitespace makes the value undecodable.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use bytes::Bytes;

use crate::MediaResult;

/// Binary to wire text.
pub fn encode(data: &[u8]) -> String {
    STANDARD.encode(data)
}

/// Wire text to binary.
pub fn decode(text: &str) -> MediaResult<Bytes> {
    let decoded = if text.contains(['\r', '\n']) {
        let compact: String = text.chars().filter(|c| !matches!(c, '\r' | '\n')).collect();
        STANDARD.decode(compact)?
    } else {
        STANDARD.decode(text)?
    };
    Ok(Bytes::from(decoded))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MediaError;
    use proptest::prelude::*;

    #[test]
    fn encodes_known_payload() {
        assert_eq!(encode(b"my file contents"), "bXkgZmlsZSBjb250ZW50cw==");
        assert_eq!(encode(b""), "");
    }

    #[test]
    fn accepts_mime_wrapped_input() {
        let wrapped = "bXkgZmlsZSBj\nb250ZW50cw==\n";
        assert_eq!(decode(wrapped).unwrap(), Bytes::from_static(b"my file contents"));
    }

    #[test]
    fn long_payloads_stay_on_one_line() {
        let encoded = encode(&[0xABu8; 200]);
        assert_eq!(encoded.len(), 268);
        assert!(!encoded.contains('\n'));

        let wrapped: String = encoded
            .as_bytes()
            .chunks(76)
            .map(|line| format!("{}\n", std::str::from_utf8(line).unwrap()))
            .collect();
        assert_eq!(&decode(&wrapped).unwrap()[..], &[0xABu8; 200][..]);
    }

    #[test]
    fn rejects_plain_text() {
        assert!(matches!(decode("not a file"), Err(MediaError::Decode { .. })));
    }

    proptest! {
        #[test]
        fn decode_inverts_encode(data in proptest::collection::vec(any::<u8>(), 0..4096)) {
            prop_assert_eq!(decode(&encode(&data)).unwrap(), Bytes::from(data));
        }
    }
}
