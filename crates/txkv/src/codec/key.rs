use crate::{Key, KeyEncoding};
use base64::{
    Engine,
    alphabet::Alphabet,
    engine::{GeneralPurpose, general_purpose},
};
use bytes::Bytes;

/// Prefix marking a text key that carries an encoded binary key.
pub const BINARY_KEY_PREFIX: &str = "Buf:";

/// Base64 alphabet sorted by code point, so that encoded keys sort in the
/// same order as the bytes they encode.
const D64: Alphabet =
    match Alphabet::new(".0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ_abcdefghijklmnopqrstuvwxyz") {
        Ok(alphabet) => alphabet,
        Err(_) => panic!("invalid d64 alphabet"),
    };

const D64_ENGINE: GeneralPurpose = GeneralPurpose::new(&D64, general_purpose::NO_PAD);

/// Maps caller keys to engine keys and back.
///
/// The codec is fixed when a store is opened, from the store's
/// [`KeyEncoding`] and the engine's binary-key capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyCodec {
    encoding: KeyEncoding,
    binary_keys: bool,
}

impl KeyCodec {
    /// Create a codec for `encoding` on an engine that does (or does not)
    /// order byte-sequence keys.
    pub const fn new(encoding: KeyEncoding, binary_keys: bool) -> Self {
        Self { encoding, binary_keys }
    }

    /// The key encoding.
    pub const fn encoding(&self) -> KeyEncoding {
        self.encoding
    }

    /// True if the engine stores byte-sequence keys natively.
    pub const fn binary_keys(&self) -> bool {
        self.binary_keys
    }

    /// Convert a caller key to the key the engine stores.
    pub fn normalize(&self, key: Key) -> Key {
        match (self.encoding, self.binary_keys, key) {
            (KeyEncoding::Binary, false, Key::Binary(bytes)) => {
                Key::Text(format!("{BINARY_KEY_PREFIX}{}", D64_ENGINE.encode(&bytes)))
            }
            (KeyEncoding::Binary, true, Key::Text(text)) => Key::Binary(Bytes::from(text)),
            (_, _, key) => key,
        }
    }

    /// Convert a key read from the engine back to the caller's form.
    ///
    /// Keys are returned as bytes when the encoding is binary or when
    /// `as_buffer` is set. Otherwise they are returned unchanged.
    pub fn denormalize(&self, key: Key, as_buffer: bool) -> Key {
        if self.encoding != KeyEncoding::Binary && !as_buffer {
            return key;
        }
        match key {
            Key::Text(text) => {
                if !self.binary_keys {
                    if let Some(payload) = text.strip_prefix(BINARY_KEY_PREFIX) {
                        if let Ok(bytes) = D64_ENGINE.decode(payload) {
                            return Key::Binary(bytes.into());
                        }
                    }
                }
                Key::Binary(Bytes::from(text))
            }
            binary => binary,
        }
    }
}

impl Default for KeyCodec {
    fn default() -> Self {
        Self::new(KeyEncoding::Utf8, true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn binary_keys_roundtrip_through_text() {
        let codec = KeyCodec::new(KeyEncoding::Binary, false);
        for raw in [&[][..], &[0u8][..], &[0xff, 0x00, 0x7f][..], &b"hello world"[..]] {
            let stored = codec.normalize(Key::from(raw));
            let text = stored.as_text().unwrap();
            assert!(text.starts_with(BINARY_KEY_PREFIX));
            assert_eq!(codec.denormalize(stored, false), Key::from(raw));
        }
    }

    #[test]
    fn encoded_keys_preserve_order() {
        let codec = KeyCodec::new(KeyEncoding::Binary, false);
        let mut raw: Vec<Vec<u8>> = vec![
            vec![0xff],
            vec![0x00],
            vec![0x00, 0x00],
            vec![0x01, 0x02, 0x03],
            vec![0x01, 0x02],
            vec![0x7f, 0xff, 0xff, 0xff],
            vec![0x80],
        ];
        let mut encoded: Vec<Key> =
            raw.iter().map(|b| codec.normalize(Key::from(b.clone()))).collect();
        raw.sort();
        encoded.sort();
        let decoded: Vec<Key> = encoded.into_iter().map(|k| codec.denormalize(k, false)).collect();
        assert_eq!(decoded, raw.into_iter().map(Key::from).collect::<Vec<_>>());
    }

    #[test]
    fn native_binary_engine() {
        let codec = KeyCodec::new(KeyEncoding::Binary, true);
        assert_eq!(codec.normalize(Key::from(b"ab")), Key::from(b"ab"));
        assert_eq!(codec.normalize(Key::from("ab")), Key::from(b"ab"));
        assert_eq!(codec.denormalize(Key::from(b"ab"), false), Key::from(b"ab"));
    }

    #[test]
    fn utf8_keys_pass_through() {
        let codec = KeyCodec::new(KeyEncoding::Utf8, false);
        assert_eq!(codec.normalize(Key::from("a")), Key::from("a"));
        assert_eq!(codec.denormalize(Key::from("a"), false), Key::from("a"));
        assert_eq!(codec.denormalize(Key::from("a"), true), Key::from(b"a"));
        // prefixed text is only decoded on engines without binary keys
        let native = KeyCodec::new(KeyEncoding::Utf8, true);
        assert_eq!(native.denormalize(Key::from("Buf:.0"), true), Key::from(b"Buf:.0"));
    }

    #[test]
    fn undecodable_payload_falls_back_to_text_bytes() {
        let codec = KeyCodec::new(KeyEncoding::Binary, false);
        assert_eq!(codec.denormalize(Key::from("Buf:!!"), false), Key::from(b"Buf:!!"));
    }
}
