//! Key and value representations, and the codec between caller encodings
//! and the engine's native representation.
//!
//! The engine stores [`Key`]s and [`Value`]s. Callers choose how keys and
//! values are encoded on the way in ([`KeyEncoding`], [`ValueEncoding`]) and
//! how they are decoded on the way out (as bytes, or as the native value).
//!
//! - [`KeyCodec`] maps caller keys to engine keys and back. Engines that
//!   cannot order byte-sequence keys get an order-preserving text encoding
//!   of binary keys.
//! - [`encode_value`] and [`decode_value`] apply the value rules of a put or
//!   get. [`to_bytes`] is the coercion used whenever a value is requested as
//!   bytes.

mod key;
pub use key::{BINARY_KEY_PREFIX, KeyCodec};

mod value;
pub use value::{decode_value, encode_value, js_string, to_bytes};

use crate::config::ConfigError;
use bytes::Bytes;
use std::{cmp::Ordering, collections::BTreeMap, fmt, str::FromStr};

/// A key, as seen by the engine.
///
/// Engines order all text keys before all binary keys. Within a variant
/// keys are ordered byte-wise.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Key {
    /// A text key.
    Text(String),
    /// A byte-sequence key.
    Binary(Bytes),
}

impl Key {
    /// Get the raw bytes of the key. Text keys yield their UTF-8 bytes.
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Text(s) => s.as_bytes(),
            Self::Binary(b) => b.as_ref(),
        }
    }

    /// True if the key has no content.
    pub fn is_empty(&self) -> bool {
        self.as_bytes().is_empty()
    }

    /// Get the key as text, if it is a text key.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            Self::Binary(_) => None,
        }
    }

    const fn rank(&self) -> u8 {
        match self {
            Self::Text(_) => 0,
            Self::Binary(_) => 1,
        }
    }
}

impl Ord for Key {
    fn cmp(&self, other: &Self) -> Ordering {
        self.rank().cmp(&other.rank()).then_with(|| self.as_bytes().cmp(other.as_bytes()))
    }
}

impl PartialOrd for Key {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl From<&str> for Key {
    fn from(s: &str) -> Self {
        Self::Text(s.to_owned())
    }
}

impl From<String> for Key {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<&[u8]> for Key {
    fn from(b: &[u8]) -> Self {
        Self::Binary(Bytes::copy_from_slice(b))
    }
}

impl<const N: usize> From<&[u8; N]> for Key {
    fn from(b: &[u8; N]) -> Self {
        Self::Binary(Bytes::copy_from_slice(b))
    }
}

impl From<Vec<u8>> for Key {
    fn from(b: Vec<u8>) -> Self {
        Self::Binary(b.into())
    }
}

impl From<Bytes> for Key {
    fn from(b: Bytes) -> Self {
        Self::Binary(b)
    }
}

/// Element type of a non-byte typed array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypedArrayKind {
    /// `Int8Array`
    Int8,
    /// `Uint8ClampedArray`
    Uint8Clamped,
    /// `Int16Array`
    Int16,
    /// `Uint16Array`
    Uint16,
    /// `Int32Array`
    Int32,
    /// `Uint32Array`
    Uint32,
    /// `Float32Array`
    Float32,
    /// `Float64Array`
    Float64,
}

impl TypedArrayKind {
    /// The constructor name of the array type.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Int8 => "Int8Array",
            Self::Uint8Clamped => "Uint8ClampedArray",
            Self::Int16 => "Int16Array",
            Self::Uint16 => "Uint16Array",
            Self::Int32 => "Int32Array",
            Self::Uint32 => "Uint32Array",
            Self::Float32 => "Float32Array",
            Self::Float64 => "Float64Array",
        }
    }
}

/// A value in the engine's native representation.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Absent value.
    Null,
    /// A boolean.
    Bool(bool),
    /// A number.
    Number(f64),
    /// A string.
    Text(String),
    /// A byte array.
    Bytes(Bytes),
    /// An array of values.
    Array(Vec<Value>),
    /// A typed array whose elements are not bytes.
    Typed {
        /// Element type.
        kind: TypedArrayKind,
        /// Underlying buffer.
        data: Bytes,
    },
    /// A keyed object.
    Object(BTreeMap<String, Value>),
}

impl Value {
    /// Name of the value's type, as reported in coercion errors.
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "Boolean",
            Self::Number(_) => "Number",
            Self::Text(_) => "String",
            Self::Bytes(_) => "Uint8Array",
            Self::Array(_) => "Array",
            Self::Typed { kind, .. } => kind.name(),
            Self::Object(_) => "Object",
        }
    }

    /// Get the bytes of a [`Value::Bytes`].
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Bytes(b) => Some(b.as_ref()),
            _ => None,
        }
    }

    /// Get the text of a [`Value::Text`].
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// True for booleans, numbers and strings.
    pub const fn is_scalar(&self) -> bool {
        matches!(self, Self::Bool(_) | Self::Number(_) | Self::Text(_))
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Text(s.to_owned())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Self::Number(n as f64)
    }
}

impl From<&[u8]> for Value {
    fn from(b: &[u8]) -> Self {
        Self::Bytes(Bytes::copy_from_slice(b))
    }
}

impl<const N: usize> From<&[u8; N]> for Value {
    fn from(b: &[u8; N]) -> Self {
        Self::Bytes(Bytes::copy_from_slice(b))
    }
}

impl From<Vec<u8>> for Value {
    fn from(b: Vec<u8>) -> Self {
        Self::Bytes(b.into())
    }
}

impl From<Bytes> for Value {
    fn from(b: Bytes) -> Self {
        Self::Bytes(b)
    }
}

impl From<Vec<Value>> for Value {
    fn from(values: Vec<Value>) -> Self {
        Self::Array(values)
    }
}

/// How keys supplied by the caller are encoded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum KeyEncoding {
    /// Keys are text. Keys are passed to the engine unchanged.
    #[default]
    Utf8,
    /// Keys are byte sequences.
    Binary,
}

impl FromStr for KeyEncoding {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "utf8" | "utf-8" => Ok(Self::Utf8),
            "binary" => Ok(Self::Binary),
            _ => Err(ConfigError::InvalidEncoding(s.to_owned())),
        }
    }
}

impl fmt::Display for KeyEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Utf8 => write!(f, "utf8"),
            Self::Binary => write!(f, "binary"),
        }
    }
}

/// How values supplied by the caller are encoded on write.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ValueEncoding {
    /// Scalars are stored as their string form.
    #[default]
    Utf8,
    /// Scalars are stored natively.
    Binary,
}

impl FromStr for ValueEncoding {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "utf8" | "utf-8" => Ok(Self::Utf8),
            "binary" => Ok(Self::Binary),
            _ => Err(ConfigError::InvalidEncoding(s.to_owned())),
        }
    }
}

impl fmt::Display for ValueEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Utf8 => write!(f, "utf8"),
            Self::Binary => write!(f, "binary"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_keys_sort_before_binary_keys() {
        let mut keys = vec![
            Key::from(b"a"),
            Key::from("b"),
            Key::from(&[0u8][..]),
            Key::from("a"),
            Key::from("ab"),
        ];
        keys.sort();
        assert_eq!(
            keys,
            vec![
                Key::from("a"),
                Key::from("ab"),
                Key::from("b"),
                Key::from(&[0u8][..]),
                Key::from(b"a"),
            ]
        );
    }

    #[test]
    fn parse_encodings() {
        assert_eq!("utf8".parse::<KeyEncoding>().unwrap(), KeyEncoding::Utf8);
        assert_eq!("binary".parse::<KeyEncoding>().unwrap(), KeyEncoding::Binary);
        assert_eq!("binary".parse::<ValueEncoding>().unwrap(), ValueEncoding::Binary);
        assert!("hex".parse::<KeyEncoding>().is_err());
        assert!("".parse::<ValueEncoding>().is_err());
        assert_eq!(KeyEncoding::Binary.to_string(), "binary");
        assert_eq!(ValueEncoding::Utf8.to_string(), "utf8");
    }

    #[test]
    fn type_names() {
        let typed = Value::Typed { kind: TypedArrayKind::Uint16, data: Bytes::new() };
        assert_eq!(typed.type_name(), "Uint16Array");
        assert_eq!(Value::Object(BTreeMap::new()).type_name(), "Object");
    }
}
