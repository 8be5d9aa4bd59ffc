//! MikroDB - Binary Table Codec
//! Encodes and decodes table files and the value tree to/from bytes.
//!
//! ## Table file format
//! ```text
//! magic: 'M' 'D' 'B' (3 bytes)
//! version: 1 byte (currently 1)
//! record_count: u32 LE
//! record*:
//!   key_len:     u16 LE
//!   value_len:   u32 LE
//!   version:     u32 LE
//!   timestamp:   u64 LE
//!   expiration:  u64 LE (0 = none)
//!   key:         key_len bytes, UTF-8
//!   value:       value_len bytes, tagged value encoding
//! ```

use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::types::{Record, Value};

const MAGIC: [u8; 3] = [b'M', b'D', b'B'];
const FORMAT_VERSION: u8 = 1;

const TAG_NULL: u8 = 0x00;
const TAG_BOOL: u8 = 0x01;
const TAG_I32: u8 = 0x02;
const TAG_F64: u8 = 0x03;
const TAG_STRING: u8 = 0x04;
const TAG_ARRAY: u8 = 0x05;
const TAG_OBJECT: u8 = 0x06;
const TAG_DATE: u8 = 0x07;

/// Encode a full table image to bytes. Iteration order matches the
/// caller-supplied iterator's order, which for a `HashMap` is itself
/// unspecified.
pub fn encode_table<'a, I>(records: I) -> Vec<u8>
where
    I: IntoIterator<Item = (&'a String, &'a Record)>,
{
    let entries: Vec<_> = records.into_iter().collect();

    let mut out = Vec::with_capacity(8 + entries.len() * 32);
    out.extend_from_slice(&MAGIC);
    out.push(FORMAT_VERSION);
    out.extend_from_slice(&(entries.len() as u32).to_le_bytes());

    for (key, record) in entries {
        // Keys are always valid UTF-8 `String`s by construction.
        let mut value_buf = Vec::new();
        encode_value(&record.value, &mut value_buf);

        let key_bytes = key.as_bytes();
        out.extend_from_slice(&(key_bytes.len() as u16).to_le_bytes());
        out.extend_from_slice(&(value_buf.len() as u32).to_le_bytes());
        out.extend_from_slice(&record.version.to_le_bytes());
        out.extend_from_slice(&record.timestamp.to_le_bytes());
        out.extend_from_slice(&record.expiration.unwrap_or(0).to_le_bytes());
        out.extend_from_slice(key_bytes);
        out.extend_from_slice(&value_buf);
    }

    out
}

/// Decode a table file's bytes into `(key, record)` pairs.
///
/// Decoding guarantees:
/// - An invalid magic header is a fatal parse error.
/// - A record with an unrecognized value tag is skipped (but the cursor
///   still advances correctly, since the length prefix is known up front).
/// - Truncation silently stops decoding and returns whatever was read.
/// - Any record whose expiration is `<=` `now_ms` is dropped.
pub fn decode_table(bytes: &[u8], now_ms: u64) -> Result<Vec<(String, Record)>> {
    if bytes.len() < 4 || bytes[0..3] != MAGIC || bytes[3] != FORMAT_VERSION {
        return Err(Error::Corruption("invalid MDB magic header".to_string()));
    }

    let mut cursor = 4usize;
    let Some(record_count) = read_u32(bytes, &mut cursor) else {
        return Ok(Vec::new());
    };

    let mut out = Vec::with_capacity(record_count as usize);

    for _ in 0..record_count {
        let Some(key_len) = read_u16(bytes, &mut cursor) else {
            break;
        };
        let Some(value_len) = read_u32(bytes, &mut cursor) else {
            break;
        };
        let Some(version) = read_u32(bytes, &mut cursor) else {
            break;
        };
        let Some(timestamp) = read_u64(bytes, &mut cursor) else {
            break;
        };
        let Some(expiration_raw) = read_u64(bytes, &mut cursor) else {
            break;
        };

        let key_end = cursor + key_len as usize;
        if key_end > bytes.len() {
            break;
        }
        let key_bytes = &bytes[cursor..key_end];
        cursor = key_end;

        let value_end = cursor + value_len as usize;
        if value_end > bytes.len() {
            break;
        }
        let value_bytes = &bytes[cursor..value_end];
        cursor = value_end;

        let Ok(key) = std::str::from_utf8(key_bytes) else {
            continue;
        };

        let expiration = if expiration_raw == 0 {
            None
        } else {
            Some(expiration_raw)
        };

        if matches!(expiration, Some(deadline) if deadline <= now_ms) {
            continue;
        }

        let Some((value, _consumed)) = decode_value(value_bytes) else {
            continue;
        };

        out.push((
            key.to_string(),
            Record {
                value,
                version,
                timestamp,
                expiration,
            },
        ));
    }

    Ok(out)
}

fn encode_value(value: &Value, buf: &mut Vec<u8>) {
    match value {
        Value::Null => buf.push(TAG_NULL),
        Value::Bool(b) => {
            buf.push(TAG_BOOL);
            buf.push(*b as u8);
        }
        Value::I32(i) => {
            buf.push(TAG_I32);
            buf.extend_from_slice(&i.to_le_bytes());
        }
        Value::F64(f) => {
            buf.push(TAG_F64);
            buf.extend_from_slice(&f.to_le_bytes());
        }
        Value::Str(s) => {
            buf.push(TAG_STRING);
            let bytes = s.as_bytes();
            buf.extend_from_slice(&(bytes.len() as u32).to_le_bytes());
            buf.extend_from_slice(bytes);
        }
        Value::Arr(items) => {
            buf.push(TAG_ARRAY);
            buf.extend_from_slice(&(items.len() as u32).to_le_bytes());
            for item in items {
                encode_value(item, buf);
            }
        }
        Value::Obj(fields) => {
            buf.push(TAG_OBJECT);
            buf.extend_from_slice(&(fields.len() as u32).to_le_bytes());
            for (key, val) in fields {
                let key_bytes = key.as_bytes();
                buf.extend_from_slice(&(key_bytes.len() as u16).to_le_bytes());
                buf.extend_from_slice(key_bytes);
                encode_value(val, buf);
            }
        }
        Value::Date(ms) => {
            buf.push(TAG_DATE);
            buf.extend_from_slice(&ms.to_le_bytes());
        }
    }
}

/// Decode a single tagged value. Returns `(value, bytes_consumed)`, or
/// `None` on an unknown tag or truncated input.
fn decode_value(bytes: &[u8]) -> Option<(Value, usize)> {
    let tag = *bytes.first()?;
    let mut cursor = 1usize;

    let value = match tag {
        TAG_NULL => Value::Null,
        TAG_BOOL => {
            let b = *bytes.get(cursor)?;
            cursor += 1;
            Value::Bool(b != 0)
        }
        TAG_I32 => {
            let raw: [u8; 4] = bytes.get(cursor..cursor + 4)?.try_into().ok()?;
            cursor += 4;
            Value::I32(i32::from_le_bytes(raw))
        }
        TAG_F64 => {
            let raw: [u8; 8] = bytes.get(cursor..cursor + 8)?.try_into().ok()?;
            cursor += 8;
            Value::F64(f64::from_le_bytes(raw))
        }
        TAG_STRING => {
            let len = read_u32_at(bytes, &mut cursor)?;
            let slice = bytes.get(cursor..cursor + len as usize)?;
            cursor += len as usize;
            Value::Str(std::str::from_utf8(slice).ok()?.to_string())
        }
        TAG_ARRAY => {
            let count = read_u32_at(bytes, &mut cursor)?;
            let mut items = Vec::with_capacity(count as usize);
            for _ in 0..count {
                let (item, consumed) = decode_value(bytes.get(cursor..)?)?;
                cursor += consumed;
                items.push(item);
            }
            Value::Arr(items)
        }
        TAG_OBJECT => {
            let count = read_u32_at(bytes, &mut cursor)?;
            let mut fields = Vec::with_capacity(count as usize);
            for _ in 0..count {
                let key_len = read_u16_at(bytes, &mut cursor)?;
                let key_slice = bytes.get(cursor..cursor + key_len as usize)?;
                cursor += key_len as usize;
                let key = std::str::from_utf8(key_slice).ok()?.to_string();
                let (val, consumed) = decode_value(bytes.get(cursor..)?)?;
                cursor += consumed;
                fields.push((key, val));
            }
            Value::Obj(fields)
        }
        TAG_DATE => {
            let raw: [u8; 8] = bytes.get(cursor..cursor + 8)?.try_into().ok()?;
            cursor += 8;
            Value::Date(i64::from_le_bytes(raw))
        }
        _ => return None,
    };

    Some((value, cursor))
}

fn read_u16(bytes: &[u8], cursor: &mut usize) -> Option<u16> {
    read_u16_at(bytes, cursor)
}

fn read_u32(bytes: &[u8], cursor: &mut usize) -> Option<u32> {
    read_u32_at(bytes, cursor)
}

fn read_u64(bytes: &[u8], cursor: &mut usize) -> Option<u64> {
    let raw: [u8; 8] = bytes.get(*cursor..*cursor + 8)?.try_into().ok()?;
    *cursor += 8;
    Some(u64::from_le_bytes(raw))
}

fn read_u16_at(bytes: &[u8], cursor: &mut usize) -> Option<u16> {
    let raw: [u8; 2] = bytes.get(*cursor..*cursor + 2)?.try_into().ok()?;
    *cursor += 2;
    Some(u16::from_le_bytes(raw))
}

fn read_u32_at(bytes: &[u8], cursor: &mut usize) -> Option<u32> {
    let raw: [u8; 4] = bytes.get(*cursor..*cursor + 4)?.try_into().ok()?;
    *cursor += 4;
    Some(u32::from_le_bytes(raw))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn sample_table() -> HashMap<String, Record> {
        let mut table = HashMap::new();
        table.insert(
            "alice".to_string(),
            Record {
                value: Value::Obj(vec![
                    ("name".to_string(), Value::Str("Alice".to_string())),
                    ("age".to_string(), Value::I32(30)),
                ]),
                version: 1,
                timestamp: 1000,
                expiration: None,
            },
        );
        table.insert(
            "bob".to_string(),
            Record {
                value: Value::Arr(vec![Value::I32(1), Value::Bool(true), Value::Null]),
                version: 3,
                timestamp: 2000,
                expiration: Some(9_999_999_999_999),
            },
        );
        table
    }

    #[test]
    fn roundtrip_preserves_records() {
        let table = sample_table();
        let encoded = encode_table(table.iter());
        let decoded = decode_table(&encoded, 0).unwrap();

        assert_eq!(decoded.len(), 2);
        let as_map: HashMap<_, _> = decoded.into_iter().collect();
        assert_eq!(as_map.get("alice"), table.get("alice"));
        assert_eq!(as_map.get("bob"), table.get("bob"));
    }

    #[test]
    fn invalid_magic_is_fatal() {
        let err = decode_table(b"XXXX", 0).unwrap_err();
        assert!(matches!(err, Error::Corruption(_)));
    }

    #[test]
    fn expired_records_are_dropped_on_decode() {
        let mut table = HashMap::new();
        table.insert(
            "gone".to_string(),
            Record {
                value: Value::Str("bye".to_string()),
                version: 1,
                timestamp: 0,
                expiration: Some(500),
            },
        );
        let encoded = encode_table(table.iter());
        let decoded = decode_table(&encoded, 1_000).unwrap();
        assert!(decoded.is_empty());
    }

    #[test]
    fn truncated_buffer_stops_silently() {
        let table = sample_table();
        let encoded = encode_table(table.iter());
        let truncated = &encoded[..encoded.len() - 3];
        // Must not panic or error; returns whatever could be read.
        let decoded = decode_table(truncated, 0).unwrap();
        assert!(decoded.len() <= 2);
    }

    #[test]
    fn unknown_tag_skips_only_that_record() {
        let mut table = HashMap::new();
        table.insert(
            "good".to_string(),
            Record {
                value: Value::I32(7),
                version: 1,
                timestamp: 1,
                expiration: None,
            },
        );
        let mut encoded = encode_table(table.iter());

        // Append one more record whose value tag byte is invalid (0xFF),
        // with an honest value_len so the cursor still lands correctly.
        let bad_key = b"bad";
        let bad_value = [0xFFu8, 0, 0, 0];
        encoded[4..8].copy_from_slice(&2u32.to_le_bytes()); // record_count = 2
        encoded.extend_from_slice(&(bad_key.len() as u16).to_le_bytes());
        encoded.extend_from_slice(&(bad_value.len() as u32).to_le_bytes());
        encoded.extend_from_slice(&1u32.to_le_bytes());
        encoded.extend_from_slice(&1u64.to_le_bytes());
        encoded.extend_from_slice(&0u64.to_le_bytes());
        encoded.extend_from_slice(bad_key);
        encoded.extend_from_slice(&bad_value);

        let decoded = decode_table(&encoded, 0).unwrap();
        assert_eq!(decoded.len(), 1);
        assert_eq!(decoded[0].0, "good");
    }
}
