use crate::{StoreError, StoreResult, Value, ValueEncoding};
use bytes::Bytes;

/// Render a number the way a JavaScript engine prints it.
fn number_string(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_owned()
    } else if n == f64::INFINITY {
        "Infinity".to_owned()
    } else if n == f64::NEG_INFINITY {
        "-Infinity".to_owned()
    } else if n == 0.0 {
        // covers -0
        "0".to_owned()
    } else if n.fract() == 0.0 && n.abs() < 1e21 {
        format!("{n:.0}")
    } else {
        n.to_string()
    }
}

/// The JavaScript string form of a value, or `None` if the value has no
/// meaningful string form.
///
/// Array elements are joined with `,`, and null elements render empty.
/// Objects, and arrays containing them, have no string form.
pub fn js_string(value: &Value) -> Option<String> {
    match value {
        Value::Null => Some(String::new()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(number_string(*n)),
        Value::Text(s) => Some(s.clone()),
        Value::Bytes(b) => {
            Some(b.iter().map(u8::to_string).collect::<Vec<_>>().join(","))
        }
        Value::Array(values) => {
            values.iter().map(js_string).collect::<Option<Vec<_>>>().map(|parts| parts.join(","))
        }
        Value::Typed { .. } | Value::Object(_) => None,
    }
}

/// Coerce a value to bytes.
///
/// Null becomes empty, text becomes its UTF-8 bytes, and booleans,
/// numbers and arrays become the bytes of their string form. Byte arrays
/// are returned as-is. Anything else fails with
/// [`StoreError::TypeCoercion`].
pub fn to_bytes(value: &Value) -> StoreResult<Bytes> {
    match value {
        Value::Null => Ok(Bytes::new()),
        Value::Text(s) => Ok(Bytes::copy_from_slice(s.as_bytes())),
        Value::Bytes(b) => Ok(b.clone()),
        Value::Bool(_) | Value::Number(_) | Value::Array(_) => js_string(value)
            .map(Bytes::from)
            .ok_or_else(|| StoreError::TypeCoercion(value.type_name().to_owned())),
        Value::Typed { .. } | Value::Object(_) => {
            Err(StoreError::TypeCoercion(value.type_name().to_owned()))
        }
    }
}

/// Apply the write-side value rules of a put.
///
/// Unless `raw` is set, a value whose string form is `NaN` is stored as the
/// text `"NaN"`, and with [`ValueEncoding::Utf8`] booleans and numbers are
/// stored as their string form. Everything else is stored unchanged.
pub fn encode_value(value: Value, encoding: ValueEncoding, raw: bool) -> Value {
    if raw {
        return value;
    }
    if js_string(&value).as_deref() == Some("NaN") {
        return Value::Text("NaN".to_owned());
    }
    match value {
        Value::Bool(b) if encoding == ValueEncoding::Utf8 => Value::Text(b.to_string()),
        Value::Number(n) if encoding == ValueEncoding::Utf8 => Value::Text(number_string(n)),
        other => other,
    }
}

/// Apply the read-side value rules of a get or an iterator entry.
///
/// With `as_buffer` set and `raw` unset the value is coerced to bytes.
/// Otherwise it is returned unchanged.
pub fn decode_value(value: Value, as_buffer: bool, raw: bool) -> StoreResult<Value> {
    if raw || !as_buffer {
        return Ok(value);
    }
    if let Value::Bytes(_) = value {
        return Ok(value);
    }
    to_bytes(&value).map(Value::Bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TypedArrayKind;
    use std::collections::BTreeMap;

    #[test]
    fn number_forms() {
        assert_eq!(js_string(&Value::Number(1.5)).unwrap(), "1.5");
        assert_eq!(js_string(&Value::Number(1.0)).unwrap(), "1");
        assert_eq!(js_string(&Value::Number(-42.0)).unwrap(), "-42");
        assert_eq!(js_string(&Value::Number(-0.0)).unwrap(), "0");
        assert_eq!(js_string(&Value::Number(f64::NAN)).unwrap(), "NaN");
        assert_eq!(js_string(&Value::Number(f64::INFINITY)).unwrap(), "Infinity");
        assert_eq!(js_string(&Value::Number(f64::NEG_INFINITY)).unwrap(), "-Infinity");
    }

    #[test]
    fn coerce_to_bytes() {
        assert_eq!(to_bytes(&Value::Null).unwrap(), Bytes::new());
        assert_eq!(to_bytes(&Value::from("hello")).unwrap(), Bytes::from_static(b"hello"));
        assert_eq!(to_bytes(&Value::Bool(true)).unwrap(), Bytes::from_static(b"true"));
        assert_eq!(to_bytes(&Value::Number(1.5)).unwrap(), Bytes::from_static(b"1.5"));
        assert_eq!(to_bytes(&Value::from(&[1u8, 2, 3])).unwrap(), Bytes::from_static(&[1, 2, 3]));

        let array = Value::Array(vec![Value::from("a"), Value::Null, Value::Number(2.0)]);
        assert_eq!(to_bytes(&array).unwrap(), Bytes::from_static(b"a,,2"));
    }

    #[test]
    fn coercion_errors_name_the_type() {
        let typed =
            Value::Typed { kind: TypedArrayKind::Uint16, data: Bytes::from_static(&[0, 1]) };
        let err = to_bytes(&typed).unwrap_err();
        assert_eq!(err, StoreError::TypeCoercion("Uint16Array".to_owned()));
        assert_eq!(err.to_string(), "can't coerce `Uint16Array` into a Buffer");

        let object = Value::Object(BTreeMap::new());
        assert!(matches!(to_bytes(&object), Err(StoreError::TypeCoercion(_))));

        let nested = Value::Array(vec![Value::Object(BTreeMap::new())]);
        assert_eq!(to_bytes(&nested).unwrap_err(), StoreError::TypeCoercion("Array".to_owned()));
    }

    #[test]
    fn write_encoding() {
        // utf8 stringifies scalars
        assert_eq!(
            encode_value(Value::Bool(false), ValueEncoding::Utf8, false),
            Value::from("false")
        );
        assert_eq!(encode_value(Value::Number(3.0), ValueEncoding::Utf8, false), Value::from("3"));

        // binary keeps scalars, except NaN
        assert_eq!(
            encode_value(Value::Number(3.0), ValueEncoding::Binary, false),
            Value::Number(3.0)
        );
        assert_eq!(
            encode_value(Value::Number(f64::NAN), ValueEncoding::Binary, false),
            Value::from("NaN")
        );

        // anything whose string form is NaN becomes the text NaN
        for encoding in [ValueEncoding::Utf8, ValueEncoding::Binary] {
            let nan_array = Value::Array(vec![Value::Number(f64::NAN)]);
            assert_eq!(encode_value(nan_array, encoding, false), Value::from("NaN"));
            let text_array = Value::Array(vec![Value::from("NaN")]);
            assert_eq!(encode_value(text_array, encoding, false), Value::from("NaN"));
        }
        let mixed = Value::Array(vec![Value::from("NaN"), Value::Number(1.0)]);
        assert_eq!(encode_value(mixed.clone(), ValueEncoding::Utf8, false), mixed);
        let text_array = Value::Array(vec![Value::from("NaN")]);
        assert_eq!(encode_value(text_array.clone(), ValueEncoding::Utf8, true), text_array);

        // objects are untouched
        let bytes = Value::from(&[9u8]);
        assert_eq!(encode_value(bytes.clone(), ValueEncoding::Utf8, false), bytes);
        assert_eq!(encode_value(Value::Null, ValueEncoding::Utf8, false), Value::Null);

        // raw bypasses everything
        assert_eq!(encode_value(Value::Bool(true), ValueEncoding::Utf8, true), Value::Bool(true));
    }

    #[test]
    fn read_decoding() {
        assert_eq!(decode_value(Value::from("x"), true, false).unwrap(), Value::from(b"x"));
        assert_eq!(decode_value(Value::from("x"), false, false).unwrap(), Value::from("x"));
        assert_eq!(decode_value(Value::Bool(true), true, true).unwrap(), Value::Bool(true));
        assert_eq!(decode_value(Value::Null, true, false).unwrap(), Value::Bytes(Bytes::new()));
    }
}
