//! Helper function that can render an IconVG graphic using only the path
//! to the input file.

#[cfg(feature = "render-png")]
mod enabled {
    use std::fs;
    use std::io::BufWriter;
    use std::path::{Path, PathBuf};

    use cairo::{Format, ImageSurface};
    use eyre::{Context, Result};
    use piet::RenderContext;
    use piet_cairo::CairoRenderContext;

    use crate::decode::{decode, decode_viewbox, DecodeOptions};
    use crate::format::Rectangle;
    use crate::render::PietCanvas;

    /// Renders an IconVG file to a PNG sized to its ViewBox, one pixel
    /// per graphic unit. If the output path is not specified, it is
    /// derived by swapping the input path's extension for `.png`.
    pub fn render(in_path: impl AsRef<Path>, out_path: Option<PathBuf>) -> Result<()> {
        let src = fs::read(&in_path).wrap_err("failed to read input file")?;

        let viewbox = decode_viewbox(&src)?;
        let width = viewbox.width().ceil().max(1.0);
        let height = viewbox.height().ceil().max(1.0);
        let dst_rect = Rectangle::new(0.0, 0.0, width as f32, height as f32);

        let surface = ImageSurface::create(Format::ARgb32, width as i32, height as i32)
            .wrap_err("failed to create cairo surface")?;
        let cr = cairo::Context::new(&surface).wrap_err("failed to create cairo context")?;

        let decode_result = {
            let mut piet_context = CairoRenderContext::new(&cr);

            let result = {
                let mut canvas = PietCanvas::new(&mut piet_context);
                decode(&mut canvas, dst_rect, &src, &DecodeOptions::default())
            };

            piet_context
                .finish()
                .map_err(|e| eyre::eyre!("{}", e))
                .wrap_err("failed to finalize piet context")?;

            result
        };

        let out_path = out_path.unwrap_or_else(|| {
            let mut out_path = in_path.as_ref().to_owned();
            out_path.set_extension("png");

            out_path
        });

        surface.flush();
        let mut file =
            BufWriter::new(fs::File::create(out_path).wrap_err("failed to create output file")?);
        surface.write_to_png(&mut file)?;

        decode_result?;

        Ok(())
    }
}

#[cfg(feature = "render-png")]
pub use enabled::render;

/// Without the `render-png` feature there is no rasterization backend to
/// render with.
#[cfg(not(feature = "render-png"))]
pub fn render(
    _in_path: impl AsRef<std::path::Path>,
    _out_path: Option<std::path::PathBuf>,
) -> eyre::Result<()> {
    Err(crate::error::Error::InvalidBackendNotEnabled.into())
}
