//! Fixed 320-byte stroke-log header.
//!
//! All multi-byte fields are little-endian. Unknown platform ids and reserved
//! flag bits are preserved verbatim rather than rejected, so newer files keep
//! decoding on older readers.

use crate::error::{ReplaintError, ReplaintResult};

/// Byte length of the fixed header; the command stream starts here.
pub const HEADER_LEN: usize = 320;

const AUTHOR_OFFSET: usize = 0x40;
const AUTHOR_LEN: usize = 64;
const ORIGINAL_AUTHOR_OFFSET: usize = 0x80;
const ORIGINAL_AUTHOR_LEN: usize = 64;
const TITLE_OFFSET: usize = 0xC0;
const TITLE_LEN: usize = 128;

/// Recording platform id. Known values are named; anything else is carried
/// through as [`Platform::Other`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Platform {
    Handheld,
    Desktop,
    UnreleasedA,
    MobileA,
    UnreleasedB,
    Handheld3d,
    MobileB,
    HandheldC,
    StylusDevice,
    TabletOs,
    Console,
    Other(i32),
}

impl Platform {
    pub fn from_raw(raw: i32) -> Self {
        match raw {
            0 => Self::Handheld,
            1 => Self::Desktop,
            2 => Self::UnreleasedA,
            3 => Self::MobileA,
            4 => Self::UnreleasedB,
            6 => Self::Handheld3d,
            7 => Self::MobileB,
            8 => Self::HandheldC,
            12 => Self::StylusDevice,
            13 => Self::TabletOs,
            18 => Self::Console,
            other => Self::Other(other),
        }
    }

    pub fn as_raw(self) -> i32 {
        match self {
            Self::Handheld => 0,
            Self::Desktop => 1,
            Self::UnreleasedA => 2,
            Self::MobileA => 3,
            Self::UnreleasedB => 4,
            Self::Handheld3d => 6,
            Self::MobileB => 7,
            Self::HandheldC => 8,
            Self::StylusDevice => 12,
            Self::TabletOs => 13,
            Self::Console => 18,
            Self::Other(raw) => raw,
        }
    }
}

/// Display orientation recorded at save time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Orientation {
    Normal,
    RotatedCcw,
    RotatedCw,
    Rotated180,
    Other(i32),
}

impl Orientation {
    pub fn from_raw(raw: i32) -> Self {
        match raw {
            0 => Self::Normal,
            1 => Self::RotatedCcw,
            2 => Self::RotatedCw,
            3 => Self::Rotated180,
            other => Self::Other(other),
        }
    }

    pub fn as_raw(self) -> i32 {
        match self {
            Self::Normal => 0,
            Self::RotatedCcw => 1,
            Self::RotatedCw => 2,
            Self::Rotated180 => 3,
            Self::Other(raw) => raw,
        }
    }
}

/// Header bit flags. `raw` keeps the whole word so reserved bits survive.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct HeaderFlags {
    pub downloaded: bool,
    pub is_3d: bool,
    pub reference: bool,
    pub undo_used: bool,
    pub was_flipped: bool,
    pub eyedropper_used: bool,
    pub nsfw: bool,
    pub eraser_used: bool,
    pub raw: u32,
}

impl HeaderFlags {
    pub fn from_raw(raw: u32) -> Self {
        Self {
            downloaded: raw & (1 << 0) != 0,
            is_3d: raw & (1 << 1) != 0,
            reference: raw & (1 << 4) != 0,
            undo_used: raw & (1 << 8) != 0,
            was_flipped: raw & (1 << 9) != 0,
            eyedropper_used: raw & (1 << 10) != 0,
            nsfw: raw & (1 << 19) != 0,
            eraser_used: raw & (1 << 26) != 0,
            raw,
        }
    }
}

/// Decoded stroke-log header.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Header {
    pub id: i32,
    pub format_version: i32,
    /// App version the painting was first created with.
    pub original_app_version: i32,
    /// App version the painting was last saved with.
    pub app_version: i32,
    pub orientation: Orientation,
    /// Recorded drawing duration, in seconds.
    pub duration_secs: i32,
    pub save_count: i32,
    pub platform: Platform,
    /// Width divided by height.
    pub aspect_ratio: f32,
    pub flags: HeaderFlags,
    pub gallery_id: i32,
    /// Secondary platform field; meaning unconfirmed, surfaced verbatim.
    pub sub_platform: Platform,
    pub num_commands: u32,
    pub author: String,
    pub original_author: String,
    pub title: String,
}

impl Header {
    /// Decode the fixed header from the start of `bytes`.
    ///
    /// The only failure mode is a buffer shorter than [`HEADER_LEN`].
    pub fn parse(bytes: &[u8]) -> ReplaintResult<Self> {
        if bytes.len() < HEADER_LEN {
            return Err(ReplaintError::truncated(format!(
                "header needs {HEADER_LEN} bytes, got {}",
                bytes.len()
            )));
        }

        Ok(Self {
            id: read_i32(bytes, 0x00),
            format_version: read_i32(bytes, 0x04),
            original_app_version: read_i32(bytes, 0x08),
            app_version: read_i32(bytes, 0x0C),
            orientation: Orientation::from_raw(read_i32(bytes, 0x10)),
            duration_secs: read_i32(bytes, 0x14),
            save_count: read_i32(bytes, 0x18),
            platform: Platform::from_raw(read_i32(bytes, 0x1C)),
            aspect_ratio: read_f32(bytes, 0x20),
            flags: HeaderFlags::from_raw(read_i32(bytes, 0x24) as u32),
            gallery_id: read_i32(bytes, 0x28),
            sub_platform: Platform::from_raw(read_i32(bytes, 0x2C)),
            // bytes 0x30..0x3C are reserved
            num_commands: read_i32(bytes, 0x3C).max(0) as u32,
            author: read_string(bytes, AUTHOR_OFFSET, AUTHOR_LEN),
            original_author: read_string(bytes, ORIGINAL_AUTHOR_OFFSET, ORIGINAL_AUTHOR_LEN),
            title: read_string(bytes, TITLE_OFFSET, TITLE_LEN),
        })
    }
}

fn read_i32(bytes: &[u8], offset: usize) -> i32 {
    let mut raw = [0u8; 4];
    raw.copy_from_slice(&bytes[offset..offset + 4]);
    i32::from_le_bytes(raw)
}

fn read_f32(bytes: &[u8], offset: usize) -> f32 {
    let mut raw = [0u8; 4];
    raw.copy_from_slice(&bytes[offset..offset + 4]);
    f32::from_le_bytes(raw)
}

/// Decode a fixed-width UTF-8 field: stop at the first NUL or the field
/// boundary, and recover from a bad lead byte or a sequence running past the
/// boundary by skipping exactly one byte.
fn read_string(bytes: &[u8], offset: usize, max_len: usize) -> String {
    let field = &bytes[offset..offset + max_len];
    let mut out = String::new();
    let mut o = 0;
    while o < field.len() {
        let b0 = field[o];
        if b0 == 0 {
            break;
        }
        let (code, len) = if b0 < 0x80 {
            (u32::from(b0), 1)
        } else if b0 & 0xE0 == 0xC0 && o + 1 < field.len() {
            (
                (u32::from(b0 & 0x1F) << 6) | u32::from(field[o + 1] & 0x3F),
                2,
            )
        } else if b0 & 0xF0 == 0xE0 && o + 2 < field.len() {
            (
                (u32::from(b0 & 0x0F) << 12)
                    | (u32::from(field[o + 1] & 0x3F) << 6)
                    | u32::from(field[o + 2] & 0x3F),
                3,
            )
        } else if b0 & 0xF8 == 0xF0 && b0 <= 0xF4 && o + 3 < field.len() {
            (
                (u32::from(b0 & 0x07) << 18)
                    | (u32::from(field[o + 1] & 0x3F) << 12)
                    | (u32::from(field[o + 2] & 0x3F) << 6)
                    | u32::from(field[o + 3] & 0x3F),
                4,
            )
        } else {
            o += 1;
            continue;
        };
        o += len;
        if let Some(c) = char::from_u32(code) {
            out.push(c);
        }
    }
    out
}
