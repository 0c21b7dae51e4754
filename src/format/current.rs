//! Current (version 3) layout.
//!
//! ```text
//! version:i32 = 3
//! floorType:i32  backgroundType:i32  difficulty:i32  levelID:i32
//! name:string
//! columnCount:i32
//!   objectCount:i32  object*      (repeated columnCount times)
//! ```

use std::io::{Read, Write};

use crate::domain::object::ObjectKind;
use crate::error::{LevelError, LevelResult};
use crate::format::wire::{self, DecodeLimits};
use crate::format::{read_columns, CURRENT_VERSION};
use crate::level::Level;

/// Encode `level`, refusing up front anything `decode_body` would reject
/// under the same `limits`. Nothing is written on refusal.
pub fn encode_level<W: Write>(level: &Level, writer: &mut W, limits: &DecodeLimits) -> LevelResult<()> {
    check_limits(level, limits)?;

    wire::write_i32(writer, CURRENT_VERSION)?;
    wire::write_i32(writer, level.floor_type)?;
    wire::write_i32(writer, level.background_type)?;
    wire::write_i32(writer, level.difficulty)?;
    wire::write_i32(writer, level.level_id)?;
    wire::write_string(writer, &level.name)?;

    let store = level.store();
    wire::write_count(writer, store.column_count())?;
    for column in store.columns() {
        wire::write_count(writer, column.len())?;
        for obj in column {
            obj.encode(writer)?;
        }
    }
    Ok(())
}

fn check_limits(level: &Level, limits: &DecodeLimits) -> LevelResult<()> {
    let exceeds = |what: &'static str, count: usize, limit: usize| {
        if count > limit {
            Err(LevelError::LimitExceeded { what, count, limit })
        } else {
            Ok(())
        }
    };
    let store = level.store();
    exceeds("name length", level.name.len(), limits.max_name_len)?;
    exceeds("column count", store.column_count(), limits.max_columns)?;
    let fullest = store.columns().map(<[_]>::len).max().unwrap_or(0);
    exceeds("object count", fullest, limits.max_objects_per_column)
}

/// Everything after the version tag.
pub fn decode_body<R: Read>(reader: &mut R, limits: &DecodeLimits) -> LevelResult<Level> {
    let floor_type = wire::read_i32(reader, "floor type")?;
    let background_type = wire::read_i32(reader, "background type")?;
    let difficulty = wire::read_i32(reader, "difficulty")?;
    let level_id = wire::read_i32(reader, "level id")?;
    let name = wire::read_string(reader, "name", limits.max_name_len)?;
    let store = read_columns(reader, limits, &ObjectKind::ALL)?;

    Ok(Level::from_parts(
        name,
        store,
        background_type,
        floor_type,
        difficulty,
        level_id,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::object::{GridPos, LevelObject};
    use crate::error::LevelError;
    use crate::format::{decode, FormatVersion};

    fn sample_level() -> Level {
        let mut level = Level::new("Back On Track", 6, 2, 3, 4, 1).unwrap();
        level.add_object(LevelObject::solid_block(0, 0)).unwrap();
        level.add_object(LevelObject::solid_block(0, 1)).unwrap();
        level.add_object(LevelObject::Spike { pos: GridPos::new(2, 0), rotation: 2 }).unwrap();
        level
            .add_object(LevelObject::ColorTrigger {
                pos: GridPos::new(5, 9),
                channel: 1,
                color: 0x0040_80C0,
                duration: 60,
            })
            .unwrap();
        level
    }

    fn encode(level: &Level) -> Vec<u8> {
        let mut buf = Vec::new();
        encode_level(level, &mut buf, &DecodeLimits::default()).unwrap();
        buf
    }

    #[test]
    fn header_field_order() {
        let bytes = encode(&sample_level());
        let ints: Vec<i32> = bytes[..20]
            .chunks(4)
            .map(|c| i32::from_be_bytes([c[0], c[1], c[2], c[3]]))
            .collect();
        // version, floor, background, difficulty, level id
        assert_eq!(ints, vec![3, 3, 2, 4, 1]);
        assert_eq!(&bytes[20..24], &13i32.to_be_bytes());
        assert_eq!(&bytes[24..37], b"Back On Track");
        assert_eq!(&bytes[37..41], &7i32.to_be_bytes());
    }

    #[test]
    fn decode_then_encode_is_byte_exact() {
        let bytes = encode(&sample_level());
        let (level, version) = decode(&mut &bytes[..], &DecodeLimits::default()).unwrap();
        assert_eq!(version, FormatVersion::V3);
        assert_eq!(level.name, "Back On Track");
        assert_eq!(level.store().object_count(), 4);
        assert_eq!(encode(&level), bytes);
    }

    #[test]
    fn unknown_tag_aborts_decode() {
        let mut bytes = Vec::new();
        for v in [3, 1, 1, 1, 0] {
            wire::write_i32(&mut bytes, v).unwrap();
        }
        wire::write_string(&mut bytes, "broken").unwrap();
        wire::write_i32(&mut bytes, 1).unwrap(); // columns
        wire::write_i32(&mut bytes, 2).unwrap(); // objects in column 0
        LevelObject::solid_block(0, 0).encode(&mut bytes).unwrap();
        wire::write_i32(&mut bytes, 99).unwrap();

        let err = decode(&mut &bytes[..], &DecodeLimits::default()).unwrap_err();
        assert!(matches!(err, LevelError::UnsupportedVariant(99)));
    }

    #[test]
    fn truncated_payload_is_malformed() {
        let mut bytes = encode(&sample_level());
        bytes.truncate(bytes.len() - 3);
        let err = decode(&mut &bytes[..], &DecodeLimits::default()).unwrap_err();
        assert!(matches!(err, LevelError::Deserialization { .. }));
    }

    #[test]
    fn column_limit_is_enforced() {
        let bytes = encode(&sample_level());
        let limits = DecodeLimits { max_columns: 3, ..DecodeLimits::default() };
        let err = decode(&mut &bytes[..], &limits).unwrap_err();
        assert!(matches!(err, LevelError::Deserialization { context: "column count", .. }));
    }

    #[test]
    fn encoder_applies_decode_limits() {
        let level = sample_level();
        // 7 columns, at most 2 objects in one column, 13-byte name
        let at_limit = DecodeLimits { max_columns: 7, max_objects_per_column: 2, max_name_len: 13 };
        let mut buf = Vec::new();
        encode_level(&level, &mut buf, &at_limit).unwrap();
        assert!(decode(&mut &buf[..], &at_limit).is_ok());

        let cases = [
            (DecodeLimits { max_columns: 6, ..at_limit }, "column count", 7),
            (DecodeLimits { max_objects_per_column: 1, ..at_limit }, "object count", 2),
            (DecodeLimits { max_name_len: 12, ..at_limit }, "name length", 13),
        ];
        for (limits, expected, expected_count) in cases {
            let mut buf = Vec::new();
            match encode_level(&level, &mut buf, &limits) {
                Err(LevelError::LimitExceeded { what, count, .. }) => {
                    assert_eq!((what, count), (expected, expected_count));
                }
                other => panic!("expected LimitExceeded, got {other:?}"),
            }
            assert!(buf.is_empty());
        }
    }
}
