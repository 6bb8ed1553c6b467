//! The replay engine: a strict fold over the command stream that mutates
//! tool state and the layer stack, plus the playback cursor and seek logic.

use kurbo::Point;

use crate::backend::{FrameSink, LAYER_COUNT, LayerBackend};
use crate::brush::BrushEngine;
use crate::command::{Command, LayerAction};
use crate::core::{CanvasSize, CommandIndex, Rgb8};
use crate::error::ReplaintResult;
use crate::header::Header;
use crate::layers_cpu::PixelBackend;
use crate::log::StrokeLog;
use crate::state::{ToolState, UserState};

/// What happens to a user's tool state when a user-change command makes them
/// active. The format does not record this, so it is configurable.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum UserSwitchPolicy {
    /// A returning user keeps whatever tool state they last had.
    Preserve,
    /// Every switch starts the named user from default tool state.
    Reset,
}

/// Replay knobs.
#[derive(Clone, Copy, Debug, serde::Serialize, serde::Deserialize)]
pub struct ReplayOptions {
    pub user_switch: UserSwitchPolicy,
    /// Background the visible layers flatten over in [`ReplayEngine::composite_to`].
    pub background: Rgb8,
}

impl Default for ReplayOptions {
    fn default() -> Self {
        Self {
            user_switch: UserSwitchPolicy::Preserve,
            background: Rgb8::WHITE,
        }
    }
}

/// Replays a [`StrokeLog`] against a layer-stack backend.
///
/// Owns one tool state per user seen in the stream (created lazily, never
/// dropped mid-session), the brush engine with its private scratch state,
/// and the playback cursor. Replay is single-threaded and strictly ordered;
/// nothing here may be shared across concurrently running engines.
pub struct ReplayEngine<B: LayerBackend> {
    log: StrokeLog,
    backend: B,
    brush: BrushEngine,
    users: Vec<UserState>,
    active_user: usize,
    cursor: u32,
    size: CanvasSize,
    options: ReplayOptions,
}

impl<B: LayerBackend> ReplayEngine<B> {
    pub fn new(log: StrokeLog, backend: B) -> Self {
        Self::with_options(log, backend, ReplayOptions::default())
    }

    pub fn with_options(log: StrokeLog, backend: B, options: ReplayOptions) -> Self {
        let size = backend.size();
        let mut engine = Self {
            log,
            backend,
            brush: BrushEngine::new(),
            users: Vec::new(),
            active_user: 0,
            cursor: 0,
            size,
            options,
        };
        engine.ensure_user(0);
        engine
    }

    pub fn header(&self) -> &Header {
        self.log.header()
    }

    pub fn log(&self) -> &StrokeLog {
        &self.log
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn canvas_size(&self) -> CanvasSize {
        self.size
    }

    /// Number of commands applied so far; also the index the next
    /// [`ReplayEngine::step`] will apply.
    pub fn cursor(&self) -> u32 {
        self.cursor
    }

    pub fn active_user(&self) -> usize {
        self.active_user
    }

    /// The active user's tool state.
    pub fn tool(&self) -> &ToolState {
        &self.users[self.active_user].tool
    }

    /// Resize the output canvas. All raster state is meaningless at a new
    /// resolution, so buffers are reallocated and playback restarts from
    /// command 0; callers re-seek to their position afterwards.
    pub fn set_canvas_size(&mut self, width: u32, height: Option<u32>) -> ReplaintResult<()> {
        let size = match height {
            Some(h) => CanvasSize::new(width, h)?,
            None => CanvasSize::from_width_and_aspect(width, self.log.header().aspect_ratio)?,
        };
        self.size = size;
        self.backend.set_size(size);
        tracing::debug!(
            width = size.width,
            height = size.height,
            "canvas resized, replay restarted"
        );
        self.restart()
    }

    /// Reset to the blank pre-replay state: all layers cleared, user arena
    /// dropped, cursor at 0.
    pub fn restart(&mut self) -> ReplaintResult<()> {
        for layer in 0..LAYER_COUNT {
            self.backend.reset_layer(layer)?;
        }
        self.users.clear();
        self.active_user = 0;
        self.ensure_user(0);
        self.brush.invalidate_stamp();
        self.cursor = 0;
        Ok(())
    }

    /// Apply the command at `index`. Returns `Ok(false)` past the end of the
    /// stream. Replay correctness depends on in-order application; this is
    /// the raw primitive under [`ReplayEngine::step`] and
    /// [`ReplayEngine::seek_to`].
    pub fn apply_command(&mut self, index: CommandIndex) -> ReplaintResult<bool> {
        let Some(cmd) = self.log.command(index) else {
            return Ok(false);
        };
        self.apply(cmd)?;
        self.cursor = index.0 + 1;
        Ok(true)
    }

    /// Apply the command at the cursor and advance.
    pub fn step(&mut self) -> ReplaintResult<bool> {
        self.apply_command(CommandIndex(self.cursor))
    }

    /// Bring the engine to the state after the first `target` commands.
    ///
    /// Forward seeks replay only the delta. Backward seeks restart and
    /// replay from 0: layer pixel state is not reversible, so this is
    /// O(target) by design. Targets past the end clamp to the stream length.
    #[tracing::instrument(skip(self))]
    pub fn seek_to(&mut self, target: u32) -> ReplaintResult<()> {
        let target = target.min(self.log.num_commands());
        if target < self.cursor {
            tracing::debug!(cursor = self.cursor, target, "backward seek, restarting");
            self.restart()?;
        }
        while self.cursor < target {
            self.step()?;
        }
        Ok(())
    }

    pub fn play_to_end(&mut self) -> ReplaintResult<()> {
        self.seek_to(self.log.num_commands())
    }

    /// Flatten visible layers over the configured background and blit the
    /// full canvas into `sink`.
    pub fn composite_to(&mut self, sink: &mut dyn FrameSink) -> ReplaintResult<()> {
        self.backend.blit_visible(self.options.background, sink)
    }

    fn ensure_user(&mut self, id: usize) {
        while self.users.len() <= id {
            self.users.push(UserState::new(self.size));
        }
    }

    fn set_user(&mut self, id: usize) {
        self.ensure_user(id);
        if self.options.user_switch == UserSwitchPolicy::Reset {
            self.users[id].tool = ToolState::default();
        }
        self.active_user = id;
    }

    fn apply(&mut self, cmd: Command) -> ReplaintResult<()> {
        match cmd {
            Command::Draw { x, y, pressure } => {
                let point = Point::new(
                    x * f64::from(self.size.width),
                    y * f64::from(self.size.height),
                );
                let size = self.size;
                let brush = &mut self.brush;
                let user = &mut self.users[self.active_user];
                if user.tool.drawing {
                    let last = user.tool.last_point;
                    let last_pressure = user.tool.last_pressure;
                    brush.stroke_segment(user, size, last, last_pressure, point, pressure);
                } else {
                    brush.stamp(user, size, point.x, point.y, pressure);
                }
                user.tool.last_point = point;
                user.tool.last_pressure = pressure;
                user.tool.pressure = pressure;
                user.tool.drawing = true;
            }

            Command::DrawEnd { layer: None, .. } => {
                let user = &mut self.users[self.active_user];
                if !user.dirty.is_empty() {
                    let layer = user.tool.layer;
                    self.backend.composite_stroke(layer, &self.brush, user)?;
                    user.clear_mask();
                }
                user.tool.drawing = false;
            }

            Command::DrawEnd {
                layer: Some(layer),
                action,
            } => {
                let layer = layer as usize;
                if layer >= LAYER_COUNT {
                    tracing::debug!(layer, ?action, "layer op outside fixed stack, skipped");
                    return Ok(());
                }
                match action {
                    LayerAction::Set => self.users[self.active_user].tool.layer = layer,
                    LayerAction::Move => {
                        let current = self.users[self.active_user].tool.layer;
                        // the active index stays `current`; after the move a
                        // different layer may sit there, and strokes follow
                        // the index, never a cached layer
                        self.backend.move_layer(current, layer)?;
                    }
                    LayerAction::Clear => self.backend.clear_layer(layer)?,
                    LayerAction::Copy => {
                        let current = self.users[self.active_user].tool.layer;
                        self.backend.copy_layer(current, layer)?;
                    }
                }
            }

            Command::Color {
                color: Some(color), ..
            } => {
                self.users[self.active_user].tool.color = color;
                self.brush.invalidate_stamp();
            }

            Command::Color {
                color: None,
                flip_x,
                flip_y,
                user,
            } => {
                if flip_x {
                    self.backend.flip(true, false);
                } else if flip_y {
                    self.backend.flip(false, true);
                }
                if flip_x || flip_y {
                    // pending stroke masks are in pre-flip coordinates; drop
                    // them rather than composite them mirrored
                    for u in &mut self.users {
                        u.clear_mask();
                    }
                }
                if let Some(id) = user {
                    self.set_user(id as usize);
                }
            }

            Command::Size {
                size,
                control,
                kind,
                opacity,
            } => {
                let min_width = (f64::from(self.size.width) / 256.0).max(1.25);
                let radius = (size * f64::from(self.size.width)).max(min_width / 2.0);
                let user = &mut self.users[self.active_user];
                user.tool.brush_radius = radius;
                user.tool.brush_control = control;
                user.tool.brush_type = kind;
                user.tool.opacity = opacity;
                self.brush.invalidate_stamp();
            }
        }
        Ok(())
    }
}

impl ReplayEngine<PixelBackend> {
    /// Build an engine over the CPU pixel backend, sized from a target width
    /// and the header's aspect ratio.
    pub fn with_pixel_backend(log: StrokeLog, width: u32) -> ReplaintResult<Self> {
        let size = CanvasSize::from_width_and_aspect(width, log.header().aspect_ratio)?;
        Ok(Self::new(log, PixelBackend::new(size)))
    }
}
