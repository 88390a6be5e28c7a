//! A [`Canvas`] implementation backed by a piet [`RenderContext`].
//!
//! Paths are accumulated into a [`BezPath`] in destination space and
//! filled once per drawing region, when `end_drawing` supplies the paint.

use kurbo::{BezPath, Point};
use piet::{Color, RenderContext};

use crate::canvas::Canvas;
use crate::error::Error;
use crate::format::{Paint, Palette, Rectangle};

/// Feeds decoded paths into any piet rendering backend.
pub struct PietCanvas<'a, R: RenderContext> {
    rc: &'a mut R,
    path: BezPath,
}

impl<'a, R: RenderContext> PietCanvas<'a, R> {
    /// Creates a canvas that draws on `rc`.
    pub fn new(rc: &'a mut R) -> Self {
        PietCanvas {
            rc,
            path: BezPath::new(),
        }
    }
}

impl<R: RenderContext> Canvas for PietCanvas<'_, R> {
    fn begin_decode(&mut self, _dst_rect: Rectangle) -> Result<(), Error> {
        Ok(())
    }

    fn end_decode(
        &mut self,
        result: Result<(), Error>,
        _num_bytes_consumed: usize,
        _num_bytes_remaining: usize,
    ) -> Result<(), Error> {
        result
    }

    fn begin_drawing(&mut self) -> Result<(), Error> {
        self.path = BezPath::new();
        Ok(())
    }

    fn end_drawing(&mut self, paint: &Paint) -> Result<(), Error> {
        let [r, g, b, a] = paint.as_nonpremul_color().0;
        let brush = self.rc.solid_brush(Color::rgba8(r, g, b, a));
        self.rc.fill(&self.path, &brush);
        Ok(())
    }

    fn begin_path(&mut self, x0: f32, y0: f32) -> Result<(), Error> {
        self.path
            .move_to(Point::new(f64::from(x0), f64::from(y0)));
        Ok(())
    }

    fn end_path(&mut self) -> Result<(), Error> {
        self.path.close_path();
        Ok(())
    }

    fn path_line_to(&mut self, x1: f32, y1: f32) -> Result<(), Error> {
        self.path
            .line_to(Point::new(f64::from(x1), f64::from(y1)));
        Ok(())
    }

    fn path_quad_to(&mut self, x1: f32, y1: f32, x2: f32, y2: f32) -> Result<(), Error> {
        self.path.quad_to(
            Point::new(f64::from(x1), f64::from(y1)),
            Point::new(f64::from(x2), f64::from(y2)),
        );
        Ok(())
    }

    fn path_cube_to(
        &mut self,
        x1: f32,
        y1: f32,
        x2: f32,
        y2: f32,
        x3: f32,
        y3: f32,
    ) -> Result<(), Error> {
        self.path.curve_to(
            Point::new(f64::from(x1), f64::from(y1)),
            Point::new(f64::from(x2), f64::from(y2)),
            Point::new(f64::from(x3), f64::from(y3)),
        );
        Ok(())
    }

    fn on_metadata_viewbox(&mut self, _viewbox: Rectangle) -> Result<(), Error> {
        Ok(())
    }

    fn on_metadata_suggested_palette(&mut self, _palette: &Palette) -> Result<(), Error> {
        Ok(())
    }
}
