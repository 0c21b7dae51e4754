//! Wire primitives shared by every level format version.
//!
//! All integers are 32-bit signed big-endian. Strings are an `i32` byte
//! length followed by UTF-8 bytes. Counts read from a stream are checked
//! against [`DecodeLimits`] before anything is allocated for them.

use std::io::{Read, Write};

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};

use crate::error::{LevelError, LevelResult};

/// Upper bounds applied while decoding untrusted level files.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DecodeLimits {
    pub max_columns: usize,
    pub max_objects_per_column: usize,
    pub max_name_len: usize,
}

impl Default for DecodeLimits {
    fn default() -> Self {
        DecodeLimits {
            max_columns: 1_000_000,
            max_objects_per_column: 100_000,
            max_name_len: 1024,
        }
    }
}

// ══════════════════════════════════════════════════════════════
// Reading
// ══════════════════════════════════════════════════════════════

pub fn read_i32<R: Read>(reader: &mut R, context: &'static str) -> LevelResult<i32> {
    reader
        .read_i32::<BigEndian>()
        .map_err(|e| LevelError::malformed(context, e))
}

/// Read a non-negative count no larger than `max`.
pub fn read_count<R: Read>(reader: &mut R, context: &'static str, max: usize) -> LevelResult<usize> {
    let raw = read_i32(reader, context)?;
    let count = usize::try_from(raw)
        .map_err(|_| LevelError::invalid(context, format!("negative count {raw}")))?;
    if count > max {
        return Err(LevelError::invalid(
            context,
            format!("count {count} exceeds limit {max}"),
        ));
    }
    Ok(count)
}

pub fn read_string<R: Read>(reader: &mut R, context: &'static str, max_len: usize) -> LevelResult<String> {
    let len = read_count(reader, context, max_len)?;
    let mut bytes = vec![0u8; len];
    reader
        .read_exact(&mut bytes)
        .map_err(|e| LevelError::malformed(context, e))?;
    String::from_utf8(bytes)
        .map_err(|e| LevelError::invalid(context, format!("not UTF-8: {e}")))
}

// ══════════════════════════════════════════════════════════════
// Writing
// ══════════════════════════════════════════════════════════════

pub fn write_i32<W: Write>(writer: &mut W, value: i32) -> LevelResult<()> {
    writer.write_i32::<BigEndian>(value)?;
    Ok(())
}

/// Write a length or count. Values past `i32::MAX` cannot be represented.
pub fn write_count<W: Write>(writer: &mut W, count: usize) -> LevelResult<()> {
    let value = i32::try_from(count).map_err(|_| {
        std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!("count {count} does not fit in an i32"),
        )
    })?;
    write_i32(writer, value)
}

pub fn write_string<W: Write>(writer: &mut W, value: &str) -> LevelResult<()> {
    write_count(writer, value.len())?;
    writer.write_all(value.as_bytes())?;
    Ok(())
}
