//! The drawing callback contract that the decoder drives, plus two
//! built-in implementations: a canvas that always answers a fixed result
//! and a canvas that logs every call before forwarding it.

use std::fmt;
use std::io::Write;

use crate::error::Error;
use crate::format::{Paint, Palette, Rectangle};

/// The callbacks a decode drives.
///
/// The call sequence always begins with exactly one `begin_decode` and
/// ends with exactly one `end_decode`. If the source holds well-formed
/// IconVG and no callback fails, the result handed to `end_decode` is
/// `Ok(())`; otherwise the sequence stops at the first error, which
/// becomes `end_decode`'s argument. Whatever `end_decode` returns is the
/// caller-visible result of the decode.
///
/// The metadata callbacks fire once each, after metadata parsing and
/// before the first `begin_drawing`. Every `begin_drawing` is matched by
/// exactly one `end_drawing`, which carries the paint for the region, and
/// brackets one or more `begin_path` / `end_path` pairs.
///
/// All coordinates are in destination space: the decoder applies the
/// graphic-to-destination transform before calling out.
pub trait Canvas {
    /// Called once, before anything else.
    fn begin_decode(&mut self, dst_rect: Rectangle) -> Result<(), Error>;

    /// Called once, after everything else. Receives the overall result
    /// together with how many source bytes were consumed and how many
    /// remain. The return value becomes the result of the decode as a
    /// whole.
    fn end_decode(
        &mut self,
        result: Result<(), Error>,
        num_bytes_consumed: usize,
        num_bytes_remaining: usize,
    ) -> Result<(), Error>;

    /// Opens a styled region.
    fn begin_drawing(&mut self) -> Result<(), Error>;

    /// Closes a styled region, supplying the paint its paths are filled
    /// with.
    fn end_drawing(&mut self, paint: &Paint) -> Result<(), Error>;

    /// Starts a subpath at `(x0, y0)`.
    fn begin_path(&mut self, x0: f32, y0: f32) -> Result<(), Error>;

    /// Closes the current subpath.
    fn end_path(&mut self) -> Result<(), Error>;

    /// Extends the current subpath with a straight line.
    fn path_line_to(&mut self, x1: f32, y1: f32) -> Result<(), Error>;

    /// Extends the current subpath with a quadratic Bezier.
    fn path_quad_to(&mut self, x1: f32, y1: f32, x2: f32, y2: f32) -> Result<(), Error>;

    /// Extends the current subpath with a cubic Bezier.
    #[allow(clippy::too_many_arguments)]
    fn path_cube_to(
        &mut self,
        x1: f32,
        y1: f32,
        x2: f32,
        y2: f32,
        x3: f32,
        y3: f32,
    ) -> Result<(), Error>;

    /// Reports the graphic's ViewBox (explicit or default).
    fn on_metadata_viewbox(&mut self, viewbox: Rectangle) -> Result<(), Error>;

    /// Reports the file's suggested palette (before any caller override).
    fn on_metadata_suggested_palette(&mut self, palette: &Palette) -> Result<(), Error>;
}

/// A canvas whose callbacks all do nothing other than answer a fixed
/// result.
///
/// `BrokenCanvas::new(None)` succeeds everywhere, which makes it the
/// no-op sink the decoder routes drawing to when the level-of-detail
/// bounds exclude the current height. With `Some(err)` every callback
/// fails with `err`, except that `end_decode` passes a real decode error
/// through in preference to its own.
#[derive(Debug)]
pub struct BrokenCanvas {
    err: Option<Error>,
}

impl BrokenCanvas {
    /// Creates a canvas that always answers `err` (or success when `err`
    /// is `None`).
    pub fn new(err: Option<Error>) -> Self {
        BrokenCanvas { err }
    }

    fn answer(&self) -> Result<(), Error> {
        match self.err {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

impl Canvas for BrokenCanvas {
    fn begin_decode(&mut self, _dst_rect: Rectangle) -> Result<(), Error> {
        self.answer()
    }

    fn end_decode(
        &mut self,
        result: Result<(), Error>,
        _num_bytes_consumed: usize,
        _num_bytes_remaining: usize,
    ) -> Result<(), Error> {
        result.and_then(|_| self.answer())
    }

    fn begin_drawing(&mut self) -> Result<(), Error> {
        self.answer()
    }

    fn end_drawing(&mut self, _paint: &Paint) -> Result<(), Error> {
        self.answer()
    }

    fn begin_path(&mut self, _x0: f32, _y0: f32) -> Result<(), Error> {
        self.answer()
    }

    fn end_path(&mut self) -> Result<(), Error> {
        self.answer()
    }

    fn path_line_to(&mut self, _x1: f32, _y1: f32) -> Result<(), Error> {
        self.answer()
    }

    fn path_quad_to(&mut self, _x1: f32, _y1: f32, _x2: f32, _y2: f32) -> Result<(), Error> {
        self.answer()
    }

    fn path_cube_to(
        &mut self,
        _x1: f32,
        _y1: f32,
        _x2: f32,
        _y2: f32,
        _x3: f32,
        _y3: f32,
    ) -> Result<(), Error> {
        self.answer()
    }

    fn on_metadata_viewbox(&mut self, _viewbox: Rectangle) -> Result<(), Error> {
        self.answer()
    }

    fn on_metadata_suggested_palette(&mut self, _palette: &Palette) -> Result<(), Error> {
        self.answer()
    }
}

/// A canvas that logs every call to a writer before forwarding it to a
/// wrapped canvas.
///
/// The writer may be `None`, in which case nothing is logged. The wrapped
/// canvas may be `None`, in which case every call succeeds except
/// `end_decode`, which returns its result argument unchanged. Write
/// failures on the log writer are ignored.
pub struct DebugCanvas<'a, W: Write> {
    writer: Option<W>,
    prefix: String,
    wrapped: Option<&'a mut dyn Canvas>,
}

impl<'a, W: Write> DebugCanvas<'a, W> {
    /// Creates a logging canvas. Log lines are prefixed by
    /// `message_prefix`.
    pub fn new(
        writer: Option<W>,
        message_prefix: impl Into<String>,
        wrapped: Option<&'a mut dyn Canvas>,
    ) -> Self {
        DebugCanvas {
            writer,
            prefix: message_prefix.into(),
            wrapped,
        }
    }

    fn log(&mut self, args: fmt::Arguments<'_>) {
        if let Some(w) = &mut self.writer {
            let _ = writeln!(w, "{}{}", self.prefix, args);
        }
    }
}

impl<W: Write> Canvas for DebugCanvas<'_, W> {
    fn begin_decode(&mut self, dst_rect: Rectangle) -> Result<(), Error> {
        self.log(format_args!(
            "begin_decode({{{}, {}, {}, {}}})",
            dst_rect.min_x, dst_rect.min_y, dst_rect.max_x, dst_rect.max_y
        ));
        match &mut self.wrapped {
            Some(w) => w.begin_decode(dst_rect),
            None => Ok(()),
        }
    }

    fn end_decode(
        &mut self,
        result: Result<(), Error>,
        num_bytes_consumed: usize,
        num_bytes_remaining: usize,
    ) -> Result<(), Error> {
        match result {
            Ok(()) => self.log(format_args!(
                "end_decode(ok, {}, {})",
                num_bytes_consumed, num_bytes_remaining
            )),
            Err(err) => self.log(format_args!(
                "end_decode(\"{}\", {}, {})",
                err, num_bytes_consumed, num_bytes_remaining
            )),
        }
        match &mut self.wrapped {
            Some(w) => w.end_decode(result, num_bytes_consumed, num_bytes_remaining),
            None => result,
        }
    }

    fn begin_drawing(&mut self) -> Result<(), Error> {
        self.log(format_args!("begin_drawing()"));
        match &mut self.wrapped {
            Some(w) => w.begin_drawing(),
            None => Ok(()),
        }
    }

    fn end_drawing(&mut self, paint: &Paint) -> Result<(), Error> {
        let color = paint.as_premul_color().0;
        self.log(format_args!(
            "end_drawing(flat_color(#{:02X}{:02X}{:02X}{:02X}))",
            color[0], color[1], color[2], color[3]
        ));
        match &mut self.wrapped {
            Some(w) => w.end_drawing(paint),
            None => Ok(()),
        }
    }

    fn begin_path(&mut self, x0: f32, y0: f32) -> Result<(), Error> {
        self.log(format_args!("begin_path({}, {})", x0, y0));
        match &mut self.wrapped {
            Some(w) => w.begin_path(x0, y0),
            None => Ok(()),
        }
    }

    fn end_path(&mut self) -> Result<(), Error> {
        self.log(format_args!("end_path()"));
        match &mut self.wrapped {
            Some(w) => w.end_path(),
            None => Ok(()),
        }
    }

    fn path_line_to(&mut self, x1: f32, y1: f32) -> Result<(), Error> {
        self.log(format_args!("path_line_to({}, {})", x1, y1));
        match &mut self.wrapped {
            Some(w) => w.path_line_to(x1, y1),
            None => Ok(()),
        }
    }

    fn path_quad_to(&mut self, x1: f32, y1: f32, x2: f32, y2: f32) -> Result<(), Error> {
        self.log(format_args!(
            "path_quad_to({}, {}, {}, {})",
            x1, y1, x2, y2
        ));
        match &mut self.wrapped {
            Some(w) => w.path_quad_to(x1, y1, x2, y2),
            None => Ok(()),
        }
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
        self.log(format_args!(
            "path_cube_to({}, {}, {}, {}, {}, {})",
            x1, y1, x2, y2, x3, y3
        ));
        match &mut self.wrapped {
            Some(w) => w.path_cube_to(x1, y1, x2, y2, x3, y3),
            None => Ok(()),
        }
    }

    fn on_metadata_viewbox(&mut self, viewbox: Rectangle) -> Result<(), Error> {
        self.log(format_args!(
            "on_metadata_viewbox({{{}, {}, {}, {}}})",
            viewbox.min_x, viewbox.min_y, viewbox.max_x, viewbox.max_y
        ));
        match &mut self.wrapped {
            Some(w) => w.on_metadata_viewbox(viewbox),
            None => Ok(()),
        }
    }

    fn on_metadata_suggested_palette(&mut self, palette: &Palette) -> Result<(), Error> {
        self.log(format_args!("on_metadata_suggested_palette(...)"));
        match &mut self.wrapped {
            Some(w) => w.on_metadata_suggested_palette(palette),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::PremulColor;

    #[test]
    fn broken_canvas_answers() {
        let mut ok = BrokenCanvas::new(None);
        assert_eq!(ok.begin_drawing(), Ok(()));
        assert_eq!(ok.path_line_to(1.0, 2.0), Ok(()));
        assert_eq!(ok.end_decode(Ok(()), 5, 0), Ok(()));

        let mut broken = BrokenCanvas::new(Some(Error::Canvas("broken")));
        assert_eq!(broken.begin_drawing(), Err(Error::Canvas("broken")));
        // A real decode error wins over the canvas's own answer.
        assert_eq!(
            broken.end_decode(Err(Error::BadMetadata), 5, 0),
            Err(Error::BadMetadata)
        );
        assert_eq!(
            broken.end_decode(Ok(()), 5, 0),
            Err(Error::Canvas("broken"))
        );
    }

    #[test]
    fn debug_canvas_logs_and_forwards() {
        let mut inner = BrokenCanvas::new(None);
        let mut log = Vec::new();
        {
            let mut debug = DebugCanvas::new(Some(&mut log), "demo: ", Some(&mut inner));
            debug.begin_path(3.0, 4.5).unwrap();
            debug.path_line_to(5.0, 6.0).unwrap();
            debug
                .end_drawing(&Paint::FlatColor(PremulColor([0, 0, 0, 255])))
                .unwrap();
        }
        let text = String::from_utf8(log).unwrap();
        assert_eq!(
            text,
            "demo: begin_path(3, 4.5)\n\
             demo: path_line_to(5, 6)\n\
             demo: end_drawing(flat_color(#000000FF))\n"
        );
    }

    #[test]
    fn debug_canvas_without_wrapped_succeeds() {
        let mut debug: DebugCanvas<'_, Vec<u8>> = DebugCanvas::new(None, "", None);
        assert_eq!(debug.begin_drawing(), Ok(()));
        assert_eq!(
            debug.end_decode(Err(Error::BadNumber), 0, 0),
            Err(Error::BadNumber)
        );
    }
}
