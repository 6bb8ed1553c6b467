//! Replaint decodes and replays stroke-log paintings.
//!
//! A stroke log is a compact binary file: a fixed 320-byte header followed by
//! a dense stream of 32-bit command words recorded by a stroke-based painting
//! application. Replaying the stream in order against an initially blank
//! five-layer canvas reproduces the artwork, or any partial state of it for
//! scrubbing through the drawing process.
//!
//! # Pipeline overview
//!
//! 1. **Decode**: `bytes -> StrokeLog` (header + randomly seekable commands)
//! 2. **Replay**: `ReplayEngine` folds commands over tool state and the layer
//!    stack, delegating rasterization to the `BrushEngine`
//! 3. **Composite**: visible layers flatten bottom-to-top into a [`FrameSink`]
//!
//! The key design constraints:
//!
//! - **No unsafe**: `unsafe` is forbidden in this crate.
//! - **Deterministic**: replaying the same commands at the same canvas size
//!   yields bit-identical pixels, including the legacy `>>8` fixed-point
//!   blend arithmetic.
//! - **Resolution-independent**: coordinates and brush sizes are stored as
//!   canvas-width fractions, so one file re-rasterizes at any output size
//!   without re-decoding.
//! - **Total decoding**: every 32-bit pattern is a valid command; corruption
//!   shows up as wrong pixels, never as a decode error.
#![forbid(unsafe_code)]

pub mod backend;
pub mod brush;
pub mod command;
pub mod composite_cpu;
pub mod core;
pub mod engine;
pub mod error;
pub mod header;
pub mod layers_cpu;
pub mod log;
pub mod region;
pub mod state;

pub use backend::{FrameBuffer, FrameSink, LAYER_COUNT, LayerBackend};
pub use brush::BrushEngine;
pub use command::{BrushControl, BrushType, Command, LayerAction, decode_word};
pub use crate::core::{CanvasSize, CommandIndex, Rgb8};
pub use engine::{ReplayEngine, ReplayOptions, UserSwitchPolicy};
pub use error::{ReplaintError, ReplaintResult};
pub use header::{HEADER_LEN, Header, HeaderFlags, Orientation, Platform};
pub use layers_cpu::{PixelBackend, PixelLayer, to_rgba_image};
pub use log::StrokeLog;
pub use region::Region;
pub use state::{ToolState, UserState};
