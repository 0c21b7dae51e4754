//! Placeable level objects and their wire encoding.
//!
//! The variant set is fixed by the file format: every object starts with
//! its discriminant tag, followed by its own fields. Tags are part of the
//! on-disk contract and must never be renumbered.

use std::io::{Read, Write};

use crate::error::{LevelError, LevelResult};
use crate::format::wire::{read_i32, write_i32};

/// Grid position. `x` doubles as the column index in the store.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct GridPos {
    pub x: i32,
    pub y: i32,
}

impl GridPos {
    pub fn new(x: i32, y: i32) -> Self {
        GridPos { x, y }
    }
}

/// Object discriminant as written to disk.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub enum ObjectKind {
    SolidBlock,
    Spike,
    ColorTrigger,
}

impl ObjectKind {
    pub const ALL: [ObjectKind; 3] = [
        ObjectKind::SolidBlock,
        ObjectKind::Spike,
        ObjectKind::ColorTrigger,
    ];

    pub fn tag(self) -> i32 {
        match self {
            ObjectKind::SolidBlock => 0,
            ObjectKind::Spike => 1,
            ObjectKind::ColorTrigger => 2,
        }
    }

    pub fn from_tag(tag: i32) -> LevelResult<Self> {
        match tag {
            0 => Ok(ObjectKind::SolidBlock),
            1 => Ok(ObjectKind::Spike),
            2 => Ok(ObjectKind::ColorTrigger),
            other => Err(LevelError::UnsupportedVariant(other)),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ObjectKind::SolidBlock => "solid-block",
            ObjectKind::Spike => "spike",
            ObjectKind::ColorTrigger => "color-trigger",
        }
    }
}

/// A placed object. Payload fields are opaque to the store.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum LevelObject {
    /// Walkable block; `style` picks the sprite.
    SolidBlock { pos: GridPos, style: i32 },
    /// Hazard; `rotation` in quarter turns.
    Spike { pos: GridPos, rotation: i32 },
    /// Fades a colour channel (0 background, 1 floor) to packed `0xRRGGBB`
    /// over `duration` ticks.
    ColorTrigger {
        pos: GridPos,
        channel: i32,
        color: i32,
        duration: i32,
    },
}

impl LevelObject {
    pub fn solid_block(x: i32, y: i32) -> Self {
        LevelObject::SolidBlock { pos: GridPos::new(x, y), style: 0 }
    }

    pub fn spike(x: i32, y: i32) -> Self {
        LevelObject::Spike { pos: GridPos::new(x, y), rotation: 0 }
    }

    pub fn kind(&self) -> ObjectKind {
        match self {
            LevelObject::SolidBlock { .. } => ObjectKind::SolidBlock,
            LevelObject::Spike { .. } => ObjectKind::Spike,
            LevelObject::ColorTrigger { .. } => ObjectKind::ColorTrigger,
        }
    }

    pub fn pos(&self) -> GridPos {
        match self {
            LevelObject::SolidBlock { pos, .. }
            | LevelObject::Spike { pos, .. }
            | LevelObject::ColorTrigger { pos, .. } => *pos,
        }
    }

    pub fn x(&self) -> i32 {
        self.pos().x
    }

    /// Write the discriminant tag followed by this variant's fields.
    pub fn encode<W: Write>(&self, writer: &mut W) -> LevelResult<()> {
        write_i32(writer, self.kind().tag())?;
        let pos = self.pos();
        write_i32(writer, pos.x)?;
        write_i32(writer, pos.y)?;
        match *self {
            LevelObject::SolidBlock { style, .. } => write_i32(writer, style),
            LevelObject::Spike { rotation, .. } => write_i32(writer, rotation),
            LevelObject::ColorTrigger { channel, color, duration, .. } => {
                write_i32(writer, channel)?;
                write_i32(writer, color)?;
                write_i32(writer, duration)
            }
        }
    }

    /// Read a tag and the matching variant.
    pub fn decode<R: Read>(reader: &mut R) -> LevelResult<Self> {
        let kind = ObjectKind::from_tag(read_i32(reader, "object tag")?)?;
        Self::decode_body(kind, reader)
    }

    /// Read the fields of `kind` once its tag has been consumed.
    pub fn decode_body<R: Read>(kind: ObjectKind, reader: &mut R) -> LevelResult<Self> {
        let pos = GridPos {
            x: read_i32(reader, "object x")?,
            y: read_i32(reader, "object y")?,
        };
        let obj = match kind {
            ObjectKind::SolidBlock => LevelObject::SolidBlock {
                pos,
                style: read_i32(reader, "block style")?,
            },
            ObjectKind::Spike => LevelObject::Spike {
                pos,
                rotation: read_i32(reader, "spike rotation")?,
            },
            ObjectKind::ColorTrigger => LevelObject::ColorTrigger {
                pos,
                channel: read_i32(reader, "trigger channel")?,
                color: read_i32(reader, "trigger color")?,
                duration: read_i32(reader, "trigger duration")?,
            },
        };
        Ok(obj)
    }
}
