//! Drawing surfaces for contour strokes.
//!
//! A [`RenderingSurface`] is a single-owner resource: every method takes
//! `&mut self` and the trait is `Send` but deliberately not `Sync`, so a
//! surface can be moved to the one thread that drives it but never shared
//! between threads.

use tiny_skia::{Color, LineCap, LineJoin, Paint, PathBuilder, Pixmap, Stroke, Transform};

use crate::error::SurfaceError;

/// Path-construction interface consumed by the walker.
pub trait RenderingSurface: Send {
    fn set_line_width(&mut self, width: f64);
    fn set_stroke_color(&mut self, color: [u8; 4]);
    fn begin_path(&mut self);
    fn move_to(&mut self, x: f64, y: f64);
    fn line_to(&mut self, x: f64, y: f64);
    fn close_path(&mut self);
    /// Stroke the current path with the current style.
    fn stroke(&mut self) -> Result<(), SurfaceError>;
}

impl<T: RenderingSurface + ?Sized> RenderingSurface for Box<T> {
    fn set_line_width(&mut self, width: f64) {
        (**self).set_line_width(width)
    }
    fn set_stroke_color(&mut self, color: [u8; 4]) {
        (**self).set_stroke_color(color)
    }
    fn begin_path(&mut self) {
        (**self).begin_path()
    }
    fn move_to(&mut self, x: f64, y: f64) {
        (**self).move_to(x, y)
    }
    fn line_to(&mut self, x: f64, y: f64) {
        (**self).line_to(x, y)
    }
    fn close_path(&mut self) {
        (**self).close_path()
    }
    fn stroke(&mut self) -> Result<(), SurfaceError> {
        (**self).stroke()
    }
}

/// Anti-aliased raster surface backed by a `tiny_skia::Pixmap`.
pub struct PixmapSurface {
    pixmap: Pixmap,
    path: PathBuilder,
    paint: Paint<'static>,
    stroke: Stroke,
    strokes: usize,
}

impl PixmapSurface {
    /// Create a transparent surface of the given size.
    pub fn new(width: u32, height: u32) -> Result<Self, SurfaceError> {
        let pixmap = Pixmap::new(width, height).ok_or_else(|| {
            SurfaceError::Backend(format!("cannot allocate {}x{} pixmap", width, height))
        })?;

        let mut paint = Paint::default();
        paint.set_color_rgba8(0, 0, 0, 255);
        paint.anti_alias = true;

        let mut stroke = Stroke::default();
        stroke.width = 1.0;
        stroke.line_cap = LineCap::Round;
        stroke.line_join = LineJoin::Round;

        Ok(Self {
            pixmap,
            path: PathBuilder::new(),
            paint,
            stroke,
            strokes: 0,
        })
    }

    /// Fill the whole surface with a solid color.
    pub fn fill(&mut self, color: [u8; 4]) {
        self.pixmap
            .fill(Color::from_rgba8(color[0], color[1], color[2], color[3]));
    }

    pub fn width(&self) -> u32 {
        self.pixmap.width()
    }

    pub fn height(&self) -> u32 {
        self.pixmap.height()
    }

    /// Number of strokes rendered so far.
    pub fn stroke_count(&self) -> usize {
        self.strokes
    }

    /// Premultiplied RGBA pixel bytes.
    pub fn data(&self) -> &[u8] {
        self.pixmap.data()
    }

    pub fn encode_png(&self) -> Result<Vec<u8>, SurfaceError> {
        self.pixmap
            .encode_png()
            .map_err(|e| SurfaceError::Backend(e.to_string()))
    }
}

impl RenderingSurface for PixmapSurface {
    fn set_line_width(&mut self, width: f64) {
        self.stroke.width = width as f32;
    }

    fn set_stroke_color(&mut self, color: [u8; 4]) {
        self.paint
            .set_color_rgba8(color[0], color[1], color[2], color[3]);
    }

    fn begin_path(&mut self) {
        self.path.clear();
    }

    fn move_to(&mut self, x: f64, y: f64) {
        self.path.move_to(x as f32, y as f32);
    }

    fn line_to(&mut self, x: f64, y: f64) {
        self.path.line_to(x as f32, y as f32);
    }

    fn close_path(&mut self) {
        self.path.close();
    }

    fn stroke(&mut self) -> Result<(), SurfaceError> {
        let builder = std::mem::take(&mut self.path);
        let path = builder.finish().ok_or(SurfaceError::EmptyPath)?;
        self.pixmap
            .stroke_path(&path, &self.paint, &self.stroke, Transform::identity(), None);
        self.strokes += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_sized_surface_rejected() {
        assert!(PixmapSurface::new(0, 10).is_err());
    }

    #[test]
    fn test_stroke_draws_pixels() {
        let mut s = PixmapSurface::new(20, 20).unwrap();
        s.set_stroke_color([255, 0, 0, 255]);
        s.set_line_width(2.0);
        s.begin_path();
        s.move_to(2.0, 10.0);
        s.line_to(18.0, 10.0);
        s.stroke().unwrap();
        assert_eq!(s.stroke_count(), 1);
        // Red channel set somewhere along the line
        let idx = (10 * 20 + 10) * 4;
        assert!(s.data()[idx] > 0);
    }

    #[test]
    fn test_empty_stroke_is_error() {
        let mut s = PixmapSurface::new(4, 4).unwrap();
        s.begin_path();
        assert_eq!(s.stroke(), Err(SurfaceError::EmptyPath));
    }

    #[test]
    fn test_encode_png_signature() {
        let mut s = PixmapSurface::new(8, 8).unwrap();
        s.fill([255, 255, 255, 255]);
        let png = s.encode_png().unwrap();
        assert_eq!(&png[..8], &[0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a]);
    }
}
