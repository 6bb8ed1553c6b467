//! 32-bit command word decoding.
//!
//! Each command is one little-endian signed 32-bit word. The low 2 bits pick
//! the variant; the rest is variant-specific packed fields. Decoding is total:
//! every bit pattern maps to some command, so a corrupted stream replays into
//! wrong pixels instead of failing.

use crate::core::Rgb8;

/// Stroke-opacity/size modulation mode of the brush.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum BrushControl {
    Full,
    VariableOpacity,
    VariableSize,
    VariableSizeOpacity,
    DistanceOpacity,
    Eraser,
    /// Reserved control value, carried through untouched.
    Other(u8),
}

impl BrushControl {
    pub fn from_raw(raw: u8) -> Self {
        match raw {
            0 => Self::Full,
            1 => Self::VariableOpacity,
            2 => Self::VariableSize,
            3 => Self::VariableSizeOpacity,
            4 => Self::DistanceOpacity,
            5 => Self::Eraser,
            other => Self::Other(other),
        }
    }

    /// Pressure scales the stamp radius for this control.
    pub fn varies_size(self) -> bool {
        matches!(self, Self::VariableSize | Self::VariableSizeOpacity)
    }

    /// Pressure scales the stamp opacity for this control.
    pub fn varies_opacity(self) -> bool {
        matches!(self, Self::VariableOpacity | Self::VariableSizeOpacity)
    }

    pub fn is_eraser(self) -> bool {
        matches!(self, Self::Eraser)
    }
}

/// Brush tip shape family.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum BrushType {
    Hard,
    Soft,
    Bristle,
    /// Reserved type value, carried through untouched.
    Other(u8),
}

impl BrushType {
    pub fn from_raw(raw: u8) -> Self {
        match raw {
            0 => Self::Hard,
            1 => Self::Soft,
            2 => Self::Bristle,
            other => Self::Other(other),
        }
    }
}

/// Layer operation selected by a draw-end command that names a layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum LayerAction {
    /// Change which layer subsequent strokes target.
    Set,
    /// Move the active layer to a new stack position.
    Move,
    /// Zero the named layer's pixels.
    Clear,
    /// Composite the active layer onto the named layer.
    Copy,
}

impl LayerAction {
    fn from_raw(raw: u8) -> Self {
        match raw & 0x3 {
            0 => Self::Set,
            1 => Self::Move,
            2 => Self::Clear,
            _ => Self::Copy,
        }
    }
}

/// One decoded command word.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum Command {
    /// A pressure-tagged stroke point. `x` and `y` are canvas-width and
    /// canvas-height fractions; multiply by the render size for pixels.
    Draw { x: f64, y: f64, pressure: f64 },
    /// End of the current stroke (`layer == None`), or a layer operation.
    DrawEnd {
        layer: Option<u8>,
        action: LayerAction,
    },
    /// A brush colour change, or (when `color` is `None`) a canvas flip
    /// and/or active-user change.
    Color {
        color: Option<Rgb8>,
        flip_x: bool,
        flip_y: bool,
        user: Option<u8>,
    },
    /// Brush size / control / type / opacity change. `size` is a fraction of
    /// canvas width; the replay engine turns it into a pixel radius.
    Size {
        size: f64,
        control: BrushControl,
        kind: BrushType,
        opacity: f64,
    },
}

/// Decode one command word. Total: never fails, for any input.
pub fn decode_word(word: i32) -> Command {
    let w = word as u32;
    match w & 0x3 {
        0 => {
            let pressure = (w >> 2) & 0xFF;
            let x_raw = (w >> 10) & 0x7FF;
            let y_raw = (w >> 21) & 0x7FF;
            Command::Draw {
                pressure: f64::from(pressure) / 255.0,
                x: (f64::from(x_raw) - 512.0) / 1024.0,
                y: (f64::from(y_raw) - 512.0) / 1024.0,
            }
        }
        1 => {
            // 1 unused bit after the variant tag
            let layer = ((w >> 3) & 0xFF) as u8;
            let action = ((w >> 11) & 0x3) as u8;
            Command::DrawEnd {
                layer: layer.checked_sub(1),
                action: LayerAction::from_raw(action),
            }
        }
        2 => {
            let b = ((w >> 2) & 0xFF) as u8;
            let g = ((w >> 10) & 0xFF) as u8;
            let r = ((w >> 18) & 0xFF) as u8;
            let flip_x = (w >> 26) & 0x1 == 1;
            let flip_y = (w >> 27) & 0x1 == 1;
            let user = ((w >> 28) & 0x7) as u8;
            let is_color = !flip_x && !flip_y && user == 0;
            Command::Color {
                color: is_color.then_some(Rgb8::new(r, g, b)),
                flip_x,
                flip_y,
                user: user.checked_sub(1),
            }
        }
        _ => {
            let size = (w >> 2) & 0xFFFF;
            let control = ((w >> 18) & 0x7) as u8;
            let kind = ((w >> 21) & 0x7) as u8;
            let opacity = (w >> 24) & 0xFF;
            Command::Size {
                size: f64::from(size) / 65535.0,
                control: BrushControl::from_raw(control),
                kind: BrushType::from_raw(kind),
                opacity: f64::from(opacity) / 255.0,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn draw_word_unpacks_pressure_and_centered_coords() {
        // pressure 255, x raw 512 (center), y raw 0 (-0.5)
        let word = (255 << 2) | (512 << 10);
        match decode_word(word) {
            Command::Draw { x, y, pressure } => {
                assert_eq!(pressure, 1.0);
                assert_eq!(x, 0.0);
                assert_eq!(y, -0.5);
            }
            other => panic!("expected draw, got {other:?}"),
        }
    }

    #[test]
    fn draw_word_high_bits_set_decodes_positive_fraction() {
        // y raw 0x7FF occupies the sign bit of the i32 word
        let word = (0x7FFu32 << 21) as i32;
        assert!(word < 0);
        match decode_word(word) {
            Command::Draw { y, .. } => {
                assert!((y - (2047.0 - 512.0) / 1024.0).abs() < 1e-12);
            }
            other => panic!("expected draw, got {other:?}"),
        }
    }

    #[test]
    fn draw_end_layer_zero_means_stroke_end() {
        match decode_word(1) {
            Command::DrawEnd { layer, action } => {
                assert_eq!(layer, None);
                assert_eq!(action, LayerAction::Set);
            }
            other => panic!("expected draw end, got {other:?}"),
        }
    }

    #[test]
    fn draw_end_layer_field_is_one_based() {
        let word = 1 | (3 << 3) | (2 << 11);
        match decode_word(word) {
            Command::DrawEnd { layer, action } => {
                assert_eq!(layer, Some(2));
                assert_eq!(action, LayerAction::Clear);
            }
            other => panic!("expected draw end, got {other:?}"),
        }
    }

    #[test]
    fn color_word_with_no_flip_or_user_is_a_color_change() {
        let word = 2 | (10 << 2) | (20 << 10) | (30 << 18);
        match decode_word(word) {
            Command::Color {
                color,
                flip_x,
                flip_y,
                user,
            } => {
                assert_eq!(color, Some(Rgb8::new(30, 20, 10)));
                assert!(!flip_x && !flip_y);
                assert_eq!(user, None);
            }
            other => panic!("expected color, got {other:?}"),
        }
    }

    #[test]
    fn color_word_with_flip_drops_color() {
        let word = 2 | (200 << 2) | (1 << 26);
        match decode_word(word) {
            Command::Color {
                color,
                flip_x,
                flip_y,
                user,
            } => {
                assert_eq!(color, None);
                assert!(flip_x);
                assert!(!flip_y);
                assert_eq!(user, None);
            }
            other => panic!("expected color, got {other:?}"),
        }
    }

    #[test]
    fn color_word_user_field_is_one_based() {
        let word = (2u32 | (3 << 28)) as i32;
        match decode_word(word) {
            Command::Color { color, user, .. } => {
                assert_eq!(color, None);
                assert_eq!(user, Some(2));
            }
            other => panic!("expected color, got {other:?}"),
        }
    }

    #[test]
    fn size_word_unpacks_all_fields() {
        let word = (3u32 | (0xFFFF << 2) | (5 << 18) | (2 << 21) | (128 << 24)) as i32;
        match decode_word(word) {
            Command::Size {
                size,
                control,
                kind,
                opacity,
            } => {
                assert_eq!(size, 1.0);
                assert_eq!(control, BrushControl::Eraser);
                assert_eq!(kind, BrushType::Bristle);
                assert!((opacity - 128.0 / 255.0).abs() < 1e-12);
            }
            other => panic!("expected size, got {other:?}"),
        }
    }

    #[test]
    fn reserved_control_and_type_values_are_preserved() {
        let word = (3u32 | (6 << 18) | (7 << 21)) as i32;
        match decode_word(word) {
            Command::Size { control, kind, .. } => {
                assert_eq!(control, BrushControl::Other(6));
                assert_eq!(kind, BrushType::Other(7));
                assert!(!control.varies_size());
                assert!(!control.is_eraser());
            }
            other => panic!("expected size, got {other:?}"),
        }
    }

    #[test]
    fn every_variant_tag_decodes() {
        for tag in 0..4 {
            let _ = decode_word(tag);
        }
        // a handful of arbitrary words, including extremes
        for word in [i32::MIN, i32::MAX, -1, 0x5A5A_5A5A] {
            let _ = decode_word(word);
        }
    }
}
