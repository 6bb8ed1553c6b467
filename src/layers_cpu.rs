//! CPU pixel-buffer implementation of the layer stack.

use rayon::prelude::*;

use crate::backend::{FrameSink, LAYER_COUNT, LayerBackend};
use crate::brush::BrushEngine;
use crate::composite_cpu::{over, over_in_place, under_in_place};
use crate::core::{CanvasSize, Rgb8};
use crate::error::{ReplaintError, ReplaintResult};
use crate::state::UserState;

/// One raster layer: premultiplied RGBA8, row-major, tightly packed.
#[derive(Clone, Debug)]
pub struct PixelLayer {
    pub pixels: Vec<u8>,
    pub visible: bool,
    /// Set whenever the layer's pixels change; incremental-redraw callers
    /// consume it with [`PixelLayer::take_changed`].
    pub changed: bool,
}

impl PixelLayer {
    fn new(size: CanvasSize) -> Self {
        Self {
            pixels: vec![0; size.rgba_len()],
            visible: true,
            changed: false,
        }
    }

    fn set_size(&mut self, size: CanvasSize) {
        self.pixels.clear();
        self.pixels.resize(size.rgba_len(), 0);
        self.changed = true;
    }

    pub fn take_changed(&mut self) -> bool {
        std::mem::replace(&mut self.changed, false)
    }
}

/// The five-layer CPU backend. Index 0 is the topmost layer in paint order.
#[derive(Clone, Debug)]
pub struct PixelBackend {
    size: CanvasSize,
    layers: Vec<PixelLayer>,
}

impl PixelBackend {
    pub fn new(size: CanvasSize) -> Self {
        Self {
            size,
            layers: (0..LAYER_COUNT).map(|_| PixelLayer::new(size)).collect(),
        }
    }

    pub fn layers(&self) -> &[PixelLayer] {
        &self.layers
    }

    pub fn layers_mut(&mut self) -> &mut [PixelLayer] {
        &mut self.layers
    }

    /// Flatten visible layers bottom-to-top over an opaque background.
    pub fn flatten(&self, background: Rgb8) -> Vec<u8> {
        let mut frame = vec![0u8; self.size.rgba_len()];
        for px in frame.chunks_exact_mut(4) {
            px.copy_from_slice(&[background.r, background.g, background.b, 255]);
        }
        for layer in self.layers.iter().rev().filter(|l| l.visible) {
            frame
                .par_chunks_exact_mut(4)
                .zip(layer.pixels.par_chunks_exact(4))
                .for_each(|(d, s)| {
                    let out = over([s[0], s[1], s[2], s[3]], [d[0], d[1], d[2], d[3]]);
                    d.copy_from_slice(&out);
                });
        }
        frame
    }

    fn check_layer(&self, layer: usize) -> ReplaintResult<()> {
        if layer >= self.layers.len() {
            return Err(ReplaintError::validation(format!(
                "layer index {layer} out of range (stack holds {LAYER_COUNT})"
            )));
        }
        Ok(())
    }
}

impl LayerBackend for PixelBackend {
    fn set_size(&mut self, size: CanvasSize) {
        self.size = size;
        for layer in &mut self.layers {
            layer.set_size(size);
        }
    }

    fn size(&self) -> CanvasSize {
        self.size
    }

    fn composite_stroke(
        &mut self,
        layer: usize,
        brush: &BrushEngine,
        user: &mut UserState,
    ) -> ReplaintResult<()> {
        self.check_layer(layer)?;
        let size = self.size;
        let target = &mut self.layers[layer];
        brush.composite_mask(user, size, &mut target.pixels)?;
        target.changed = true;
        Ok(())
    }

    fn move_layer(&mut self, src: usize, dst: usize) -> ReplaintResult<()> {
        self.check_layer(src)?;
        self.check_layer(dst)?;
        let layer = self.layers.remove(src);
        self.layers.insert(dst, layer);
        self.layers[src].changed = true;
        self.layers[dst].changed = true;
        Ok(())
    }

    fn copy_layer(&mut self, src: usize, dst: usize) -> ReplaintResult<()> {
        self.check_layer(src)?;
        self.check_layer(dst)?;
        if src == dst {
            self.layers[dst].changed = true;
            return Ok(());
        }
        let lo = src.min(dst);
        let hi = src.max(dst);
        let (head, tail) = self.layers.split_at_mut(hi);
        let first = &mut head[lo];
        let second = &mut tail[0];
        // higher index = lower in paint order
        if src > dst {
            under_in_place(&mut first.pixels, &second.pixels)?;
            first.changed = true;
        } else {
            over_in_place(&mut second.pixels, &first.pixels)?;
            second.changed = true;
        }
        Ok(())
    }

    fn clear_layer(&mut self, layer: usize) -> ReplaintResult<()> {
        self.check_layer(layer)?;
        self.layers[layer].pixels.fill(0);
        self.layers[layer].changed = true;
        Ok(())
    }

    fn reset_layer(&mut self, layer: usize) -> ReplaintResult<()> {
        self.clear_layer(layer)
    }

    fn flip(&mut self, flip_x: bool, flip_y: bool) {
        if !flip_x && !flip_y {
            return;
        }
        let size = self.size;
        self.layers.par_iter_mut().for_each(|layer| {
            flip_in_place(&mut layer.pixels, size, flip_x, flip_y);
            layer.changed = true;
        });
    }

    fn blit_visible(&mut self, background: Rgb8, sink: &mut dyn FrameSink) -> ReplaintResult<()> {
        let frame = self.flatten(background);
        sink.put_frame(self.size, &frame)
    }
}

fn flip_in_place(pixels: &mut [u8], size: CanvasSize, flip_x: bool, flip_y: bool) {
    let width = size.width as usize;
    let height = size.height as usize;
    let stride = width * 4;
    if flip_x {
        for row in pixels.chunks_exact_mut(stride) {
            let mut l = 0;
            let mut r = width - 1;
            while l < r {
                for c in 0..4 {
                    row.swap(l * 4 + c, r * 4 + c);
                }
                l += 1;
                r -= 1;
            }
        }
    }
    if flip_y {
        let mut top = 0;
        let mut bot = height - 1;
        while top < bot {
            let (upper, lower) = pixels.split_at_mut(bot * stride);
            upper[top * stride..top * stride + stride].swap_with_slice(&mut lower[..stride]);
            top += 1;
            bot -= 1;
        }
    }
}

/// Wrap a flattened frame as an [`image::RgbaImage`], for offline export.
pub fn to_rgba_image(size: CanvasSize, rgba8: &[u8]) -> ReplaintResult<image::RgbaImage> {
    if rgba8.len() != size.rgba_len() {
        return Err(ReplaintError::validation(
            "frame buffer length does not match canvas size",
        ));
    }
    image::RgbaImage::from_raw(size.width, size.height, rgba8.to_vec())
        .ok_or_else(|| ReplaintError::validation("frame buffer rejected by image container"))
}
