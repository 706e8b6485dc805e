// crates/mediacore-video/src/yuv.rs
//
// Narrow seam for colorspace conversion. Actual pixel-format math is
// outside this crate's scope; `ColorConverter` just gives the worker
// something to call into and a place for `GAMMA`/`GRAYSCALE` change
// requests to land.

use mediacore_types::{MatrixCoefficients, Picture, SubpictureUnit};

use crate::surface::{Rect, SurfaceBuffer};

pub trait ColorConverter: Send {
    /// Blit `picture`'s pixel data into `dst` at `dst_rect`, scaling if the
    /// rect doesn't match the picture's native size.
    fn convert(&mut self, picture: &Picture, dst: &mut SurfaceBuffer, dst_rect: crate::surface::Rect);

    /// Rebuild internal lookup tables after a `GAMMA`/`GRAYSCALE` change
    /// request.
    fn rebuild_tables(&mut self, gamma: f32, grayscale: bool);
}

/// Copies the picture's raw bytes into the destination rect without any
/// actual colorspace transform — a stand-in until a real converter is
/// plugged in.
pub struct PassthroughConverter {
    pub gamma: f32,
    pub grayscale: bool,
    pub matrix: MatrixCoefficients,
}

impl Default for PassthroughConverter {
    fn default() -> Self {
        Self { gamma: 1.0, grayscale: false, matrix: MatrixCoefficients::Bt601 }
    }
}

impl ColorConverter for PassthroughConverter {
    fn convert(&mut self, picture: &Picture, dst: &mut SurfaceBuffer, dst_rect: crate::surface::Rect) {
        let rows = dst_rect.h.min(picture.height) as usize;
        let row_bytes = (dst_rect.w as usize * dst.bytes_per_pixel as usize)
            .min(picture.chroma_width.max(picture.width) as usize * dst.bytes_per_pixel as usize);
        for row in 0..rows {
            let src_start = row * picture.width as usize * dst.bytes_per_pixel as usize;
            let src_end = (src_start + row_bytes).min(picture.data.len());
            if src_start >= src_end {
                continue;
            }
            let dst_row_start =
                (dst_rect.y as usize + row) * dst.stride + dst_rect.x as usize * dst.bytes_per_pixel as usize;
            let dst_row_end = (dst_row_start + (src_end - src_start)).min(dst.plane.len());
            if dst_row_start >= dst_row_end {
                continue;
            }
            dst.plane[dst_row_start..dst_row_end]
                .copy_from_slice(&picture.data[src_start..src_start + (dst_row_end - dst_row_start)]);
        }
        self.matrix = picture.matrix;
    }

    fn rebuild_tables(&mut self, gamma: f32, grayscale: bool) {
        self.gamma = gamma;
        self.grayscale = grayscale;
    }
}

/// Narrow seam for drawing an active subpicture's payload onto the back
/// buffer near the video picture's anchor rect. Payload encoding (bitmap
/// RLE, text shaping, …) is out of scope here — callers supply a renderer
/// matching whatever `SubpictureKind`s they actually produce.
pub trait SubpictureRenderer: Send {
    fn render(&mut self, unit: &SubpictureUnit, dst: &mut SurfaceBuffer, anchor: Rect);
}

/// Ships as the default: marks the area dirty (so the compositor still
/// clears it) without drawing anything. Embedding applications that want
/// visible overlays supply their own `SubpictureRenderer`.
#[derive(Debug, Default)]
pub struct NullSubpictureRenderer;

impl SubpictureRenderer for NullSubpictureRenderer {
    fn render(&mut self, _unit: &SubpictureUnit, _dst: &mut SurfaceBuffer, _anchor: Rect) {}
}
