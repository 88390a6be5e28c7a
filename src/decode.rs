//! The IconVG decoder: metadata parsing and the two-mode bytecode
//! interpreter that drives a [`Canvas`].

use kurbo::{Arc, Point, SvgArc, Vec2};
use nom::IResult;

use crate::canvas::{BrokenCanvas, Canvas};
use crate::error::Error;
use crate::format::{
    self, Palette, Paint, PremulColor, Rectangle, DEFAULT_VIEWBOX,
};
use crate::parser;

/// Optional arguments to [`decode`].
#[derive(Clone, Debug, Default)]
pub struct DecodeOptions {
    /// Overrides the rendering height (in pixels) that level-of-detail
    /// opcodes compare against. When absent, the height is derived from
    /// the destination rectangle.
    pub height_in_pixels: Option<u32>,

    /// Overrides the file's suggested palette for drawing. The
    /// `on_metadata_suggested_palette` notification still reports the
    /// palette found in the file.
    pub palette: Option<Palette>,
}

/// Height values derived from the destination rectangle are capped so
/// that integer/float conversions stay lossless.
const MAX_DERIVED_HEIGHT: f64 = 0x10_0000 as f64;

/// How finely arcs are approximated by cubic Beziers, in graphic-space
/// units.
const ARC_TOLERANCE: f64 = 0.1;

/// The ADJ values: how the low three opcode bits perturb the selected
/// register index for the register-write styling opcodes.
const ADJUSTMENTS: [u32; 8] = [0, 1, 2, 3, 4, 5, 6, 0];

/// A position over a bounded byte slice. Sub-views share bytes with
/// their parent but carry their own remaining count.
#[derive(Clone, Copy)]
struct Cursor<'a> {
    input: &'a [u8],
}

impl<'a> Cursor<'a> {
    fn new(input: &'a [u8]) -> Self {
        Cursor { input }
    }

    fn len(&self) -> usize {
        self.input.len()
    }

    fn is_empty(&self) -> bool {
        self.input.is_empty()
    }

    fn take_u8(&mut self) -> Option<u8> {
        let (&b, rest) = self.input.split_first()?;
        self.input = rest;
        Some(b)
    }

    fn take_bytes(&mut self, n: usize) -> Option<&'a [u8]> {
        if n > self.input.len() {
            return None;
        }
        let (bytes, rest) = self.input.split_at(n);
        self.input = rest;
        Some(bytes)
    }

    /// Carves out a sub-view over the next `n` bytes without advancing.
    fn limit(&self, n: usize) -> Cursor<'a> {
        Cursor {
            input: &self.input[..n.min(self.input.len())],
        }
    }

    fn advance(&mut self, n: usize) {
        self.input = &self.input[n.min(self.input.len())..];
    }

    fn parse<T>(&mut self, p: impl Fn(&'a [u8]) -> IResult<&'a [u8], T>) -> Option<T> {
        match p(self.input) {
            Ok((rest, v)) => {
                self.input = rest;
                Some(v)
            }
            Err(_) => None,
        }
    }

    fn magic_identifier(&mut self) -> bool {
        self.parse(parser::magic_identifier).is_some()
    }

    fn natural(&mut self) -> Option<u32> {
        self.parse(parser::natural_number)
    }

    fn coordinate(&mut self) -> Option<f32> {
        self.parse(parser::coordinate_number)
    }

    fn real(&mut self) -> Option<f32> {
        self.parse(parser::real_number)
    }

    fn zero_to_one(&mut self) -> Option<f32> {
        self.parse(parser::zero_to_one_number)
    }
}

/// The state a decode threads through bytecode execution.
struct PaintState {
    viewbox: Rectangle,
    custom_palette: Palette,
    creg: Palette,
    nreg: [f32; 64],
    height_in_pixels: i64,
}

/// Decodes only the ViewBox metadata from IconVG-formatted data.
///
/// An explicit ViewBox is optional in the file format; when absent, the
/// default ViewBox `(-32, -32, +32, +32)` is returned. Unlike a full
/// [`decode`], metadata chunks other than the ViewBox are skipped without
/// being validated.
pub fn decode_viewbox(src: &[u8]) -> Result<Rectangle, Error> {
    let mut cursor = Cursor::new(src);
    if !cursor.magic_identifier() {
        return Err(Error::BadMagicIdentifier);
    }
    let num_metadata_chunks = cursor.natural().ok_or(Error::BadMetadata)?;

    let mut viewbox = None;
    let mut previous_id: i64 = -1;
    for _ in 0..num_metadata_chunks {
        let chunk_length = cursor.natural().ok_or(Error::BadMetadata)? as usize;
        if chunk_length > cursor.len() {
            return Err(Error::BadMetadata);
        }
        let mut chunk = cursor.limit(chunk_length);
        let metadata_id = chunk.natural().ok_or(Error::BadMetadata)?;
        if previous_id >= i64::from(metadata_id) {
            return Err(Error::BadMetadataIdOrder);
        }

        if metadata_id == 0 {
            match parse_metadata_viewbox(&mut chunk) {
                Some(r) if chunk.is_empty() => viewbox = Some(r),
                _ => return Err(Error::BadMetadataViewbox),
            }
        }

        cursor.advance(chunk_length);
        previous_id = i64::from(metadata_id);
    }

    Ok(viewbox.unwrap_or(DEFAULT_VIEWBOX))
}

/// Decodes IconVG-formatted data, driving `canvas`'s callbacks to paint
/// the vector graphic into `dst_rect`.
///
/// The callback sequence always begins with exactly one `begin_decode`
/// and ends with exactly one `end_decode`; see [`Canvas`] for the
/// ordering guarantees in between. The return value is whatever
/// `end_decode` returns.
pub fn decode(
    canvas: &mut dyn Canvas,
    dst_rect: Rectangle,
    src: &[u8],
    options: &DecodeOptions,
) -> Result<(), Error> {
    let mut cursor = Cursor::new(src);
    let result = match canvas.begin_decode(dst_rect) {
        Ok(()) => decode_impl(canvas, dst_rect, &mut cursor, options),
        Err(err) => Err(err),
    };
    canvas.end_decode(result, src.len() - cursor.len(), cursor.len())
}

fn parse_metadata_viewbox(chunk: &mut Cursor<'_>) -> Option<Rectangle> {
    let r = Rectangle::new(
        chunk.coordinate()?,
        chunk.coordinate()?,
        chunk.coordinate()?,
        chunk.coordinate()?,
    );
    let ordered = (f32::NEG_INFINITY < r.min_x)
        && (r.min_x <= r.max_x)
        && (r.max_x < f32::INFINITY)
        && (f32::NEG_INFINITY < r.min_y)
        && (r.min_y <= r.max_y)
        && (r.max_y < f32::INFINITY);
    if ordered {
        Some(r)
    } else {
        None
    }
}

fn parse_metadata_suggested_palette(chunk: &mut Cursor<'_>, dst: &mut Palette) -> bool {
    let spec = match chunk.take_u8() {
        Some(b) => b,
        None => return false,
    };
    let n = 1 + usize::from(spec & 0x3F);
    let bytes_per_elem = 1 + usize::from(spec >> 6);
    if chunk.len() != n * bytes_per_elem {
        return false;
    }
    let payload = match chunk.take_bytes(n * bytes_per_elem) {
        Some(p) => p,
        None => return false,
    };

    for (color, elem) in dst.colors.iter_mut().zip(payload.chunks_exact(bytes_per_elem)) {
        *color = match elem {
            [u] => {
                if *u < 0x80 {
                    format::ONE_BYTE_COLORS[usize::from(*u)]
                } else {
                    PremulColor::OPAQUE_BLACK
                }
            }
            [rg, ba] => PremulColor::from_nibbles(*rg, *ba),
            [r, g, b] => PremulColor([*r, *g, *b, 0xFF]),
            [r, g, b, a] => PremulColor([*r, *g, *b, *a]),
            _ => unreachable!(),
        };
    }
    true
}

fn decode_impl(
    canvas: &mut dyn Canvas,
    dst_rect: Rectangle,
    cursor: &mut Cursor<'_>,
    options: &DecodeOptions,
) -> Result<(), Error> {
    let height_in_pixels = match options.height_in_pixels {
        Some(h) => i64::from(h),
        None => {
            let h = dst_rect.height();
            if h <= MAX_DERIVED_HEIGHT {
                h as i64
            } else {
                MAX_DERIVED_HEIGHT as i64
            }
        }
    };
    let mut state = PaintState {
        viewbox: DEFAULT_VIEWBOX,
        custom_palette: Palette::default(),
        creg: Palette::default(),
        nreg: [0.0; 64],
        height_in_pixels,
    };

    if !cursor.magic_identifier() {
        return Err(Error::BadMagicIdentifier);
    }
    let num_metadata_chunks = cursor.natural().ok_or(Error::BadMetadata)?;

    let mut previous_id: i64 = -1;
    for _ in 0..num_metadata_chunks {
        let chunk_length = cursor.natural().ok_or(Error::BadMetadata)? as usize;
        if chunk_length > cursor.len() {
            return Err(Error::BadMetadata);
        }
        let mut chunk = cursor.limit(chunk_length);
        let metadata_id = chunk.natural().ok_or(Error::BadMetadata)?;
        if previous_id >= i64::from(metadata_id) {
            return Err(Error::BadMetadataIdOrder);
        }

        match metadata_id {
            0 => match parse_metadata_viewbox(&mut chunk) {
                Some(r) if chunk.is_empty() => state.viewbox = r,
                _ => return Err(Error::BadMetadataViewbox),
            },
            1 => {
                if !parse_metadata_suggested_palette(&mut chunk, &mut state.custom_palette)
                    || !chunk.is_empty()
                {
                    return Err(Error::BadMetadataSuggestedPalette);
                }
            }
            _ => return Err(Error::BadMetadata),
        }

        cursor.advance(chunk_length);
        previous_id = i64::from(metadata_id);
    }

    canvas.on_metadata_viewbox(state.viewbox)?;
    canvas.on_metadata_suggested_palette(&state.custom_palette)?;

    if let Some(palette) = &options.palette {
        state.custom_palette = *palette;
    }
    state.creg = state.custom_palette;

    execute_bytecode(canvas, dst_rect, cursor, &mut state)
}

fn execute_bytecode(
    canvas: &mut dyn Canvas,
    dst_rect: Rectangle,
    cursor: &mut Cursor<'_>,
    state: &mut PaintState,
) -> Result<(), Error> {
    // The graphic-to-destination transform is fixed for the whole run; it
    // is the identity unless both rectangles have positive extents.
    let mut scale_x = 1.0f64;
    let mut bias_x = 0.0f64;
    let mut scale_y = 1.0f64;
    let mut bias_y = 0.0f64;
    {
        let rw = dst_rect.width();
        let rh = dst_rect.height();
        let vw = state.viewbox.width();
        let vh = state.viewbox.height();
        if rw > 0.0 && rh > 0.0 && vw > 0.0 && vh > 0.0 {
            scale_x = rw / vw;
            scale_y = rh / vh;
            bias_x = f64::from(dst_rect.min_x) - f64::from(state.viewbox.min_x) * scale_x;
            bias_y = f64::from(dst_rect.min_y) - f64::from(state.viewbox.min_y) * scale_y;
        }
    }
    let tx = |x: f32| (f64::from(x) * scale_x + bias_x) as f32;
    let ty = |y: f32| (f64::from(y) * scale_y + bias_y) as f32;

    let mut noop = BrokenCanvas::new(None);

    // sel[0] and sel[1] are the CSEL and NSEL registers; masking to six
    // bits happens at use.
    let mut sel = [0u32; 2];
    let mut lod = [0.0f64, f64::INFINITY];

    // Drawing ops keep (curr_x, curr_y) at the pen position and (x1, y1)
    // at the reflection of the last control point, so that smooth curve
    // opcodes can pick up their implicit first control without knowing
    // what came before.
    let mut curr_x = 0.0f32;
    let mut curr_y = 0.0f32;
    let mut x1 = 0.0f32;
    let mut y1 = 0.0f32;

    'styling: loop {
        let opcode = match cursor.take_u8() {
            Some(op) => op,
            // Running out of bytes in styling mode is the natural end.
            None => return Ok(()),
        };

        match opcode {
            0x00..=0x7F => {
                sel[usize::from(opcode >> 6)] = u32::from(opcode & 0x3F);
            }

            // Set CREG[...]; 1-byte color.
            0x80..=0x87 => {
                let u = cursor.take_u8().ok_or(Error::BadColor)?;
                let color = format::resolve_one_byte_color(u, &state.custom_palette, &state.creg);
                state.creg.colors[register_index(sel[0], opcode)] = color;
                sel[0] = bump(sel[0], opcode);
            }

            // Set CREG[...]; 2-byte color.
            0x88..=0x8F => {
                let payload = cursor.take_bytes(2).ok_or(Error::BadColor)?;
                let color = PremulColor::from_nibbles(payload[0], payload[1]);
                state.creg.colors[register_index(sel[0], opcode)] = color;
                sel[0] = bump(sel[0], opcode);
            }

            // Set CREG[...]; 3-byte direct color, fully opaque.
            0x90..=0x97 => {
                let payload = cursor.take_bytes(3).ok_or(Error::BadColor)?;
                let color = PremulColor([payload[0], payload[1], payload[2], 0xFF]);
                state.creg.colors[register_index(sel[0], opcode)] = color;
                sel[0] = bump(sel[0], opcode);
            }

            // Set CREG[...]; 4-byte direct color.
            0x98..=0x9F => {
                let payload = cursor.take_bytes(4).ok_or(Error::BadColor)?;
                let color = PremulColor([payload[0], payload[1], payload[2], payload[3]]);
                state.creg.colors[register_index(sel[0], opcode)] = color;
                sel[0] = bump(sel[0], opcode);
            }

            // Set CREG[...]; 3-byte indirect color: a blend of two
            // one-byte colors.
            0xA0..=0xA7 => {
                let payload = cursor.take_bytes(3).ok_or(Error::BadColor)?;
                let p = format::resolve_one_byte_color(
                    payload[1],
                    &state.custom_palette,
                    &state.creg,
                );
                let q = format::resolve_one_byte_color(
                    payload[2],
                    &state.custom_palette,
                    &state.creg,
                );
                let q_blend = u32::from(payload[0]);
                let p_blend = 255 - q_blend;
                let mut rgba = [0u8; 4];
                for (i, channel) in rgba.iter_mut().enumerate() {
                    let blended =
                        p_blend * u32::from(p.0[i]) + q_blend * u32::from(q.0[i]) + 128;
                    *channel = (blended / 255) as u8;
                }
                state.creg.colors[register_index(sel[0], opcode)] = PremulColor(rgba);
                sel[0] = bump(sel[0], opcode);
            }

            // Set NREG[...]; real number.
            0xA8..=0xAF => {
                let v = cursor.real().ok_or(Error::BadNumber)?;
                state.nreg[register_index(sel[1], opcode)] = v;
                sel[1] = bump(sel[1], opcode);
            }

            // Set NREG[...]; coordinate number.
            0xB0..=0xB7 => {
                let v = cursor.coordinate().ok_or(Error::BadCoordinate)?;
                state.nreg[register_index(sel[1], opcode)] = v;
                sel[1] = bump(sel[1], opcode);
            }

            // Set NREG[...]; zero-to-one number.
            0xB8..=0xBF => {
                let v = cursor.zero_to_one().ok_or(Error::BadNumber)?;
                state.nreg[register_index(sel[1], opcode)] = v;
                sel[1] = bump(sel[1], opcode);
            }

            // Switch to drawing mode.
            0xC0..=0xC6 => {
                let color = state.creg.colors[register_index(sel[0], opcode)];
                let paint = Paint::from_register(color).ok_or(Error::InvalidPaintType)?;
                curr_x = cursor.coordinate().ok_or(Error::BadCoordinate)?;
                curr_y = cursor.coordinate().ok_or(Error::BadCoordinate)?;

                // The level-of-detail gate picks, per drawing region,
                // whether callbacks reach the real canvas or a no-op sink.
                let h = state.height_in_pixels as f64;
                let c: &mut dyn Canvas = if lod[0] <= h && h < lod[1] {
                    &mut *canvas
                } else {
                    &mut noop
                };

                c.begin_drawing()?;
                c.begin_path(tx(curr_x), ty(curr_y))?;
                x1 = curr_x;
                y1 = curr_y;

                loop {
                    let opcode = match cursor.take_u8() {
                        Some(op) => op,
                        None => return Err(Error::BadPathUnfinished),
                    };

                    match opcode {
                        // 'L': absolute line_to.
                        0x00..=0x1F => {
                            for _ in 0..=(opcode & 0x1F) {
                                curr_x = cursor.coordinate().ok_or(Error::BadCoordinate)?;
                                curr_y = cursor.coordinate().ok_or(Error::BadCoordinate)?;
                                c.path_line_to(tx(curr_x), ty(curr_y))?;
                                x1 = curr_x;
                                y1 = curr_y;
                            }
                        }

                        // 'l': relative line_to.
                        0x20..=0x3F => {
                            for _ in 0..=(opcode & 0x1F) {
                                let dx = cursor.coordinate().ok_or(Error::BadCoordinate)?;
                                let dy = cursor.coordinate().ok_or(Error::BadCoordinate)?;
                                curr_x += dx;
                                curr_y += dy;
                                c.path_line_to(tx(curr_x), ty(curr_y))?;
                                x1 = curr_x;
                                y1 = curr_y;
                            }
                        }

                        // 'T': absolute smooth quad_to.
                        0x40..=0x4F => {
                            for _ in 0..=(opcode & 0x0F) {
                                let x2 = cursor.coordinate().ok_or(Error::BadCoordinate)?;
                                let y2 = cursor.coordinate().ok_or(Error::BadCoordinate)?;
                                c.path_quad_to(tx(x1), ty(y1), tx(x2), ty(y2))?;
                                curr_x = x2;
                                curr_y = y2;
                                x1 = 2.0 * curr_x - x1;
                                y1 = 2.0 * curr_y - y1;
                            }
                        }

                        // 't': relative smooth quad_to.
                        0x50..=0x5F => {
                            for _ in 0..=(opcode & 0x0F) {
                                let x2 = curr_x
                                    + cursor.coordinate().ok_or(Error::BadCoordinate)?;
                                let y2 = curr_y
                                    + cursor.coordinate().ok_or(Error::BadCoordinate)?;
                                c.path_quad_to(tx(x1), ty(y1), tx(x2), ty(y2))?;
                                curr_x = x2;
                                curr_y = y2;
                                x1 = 2.0 * curr_x - x1;
                                y1 = 2.0 * curr_y - y1;
                            }
                        }

                        // 'Q': absolute quad_to.
                        0x60..=0x6F => {
                            for _ in 0..=(opcode & 0x0F) {
                                x1 = cursor.coordinate().ok_or(Error::BadCoordinate)?;
                                y1 = cursor.coordinate().ok_or(Error::BadCoordinate)?;
                                let x2 = cursor.coordinate().ok_or(Error::BadCoordinate)?;
                                let y2 = cursor.coordinate().ok_or(Error::BadCoordinate)?;
                                c.path_quad_to(tx(x1), ty(y1), tx(x2), ty(y2))?;
                                curr_x = x2;
                                curr_y = y2;
                                x1 = 2.0 * curr_x - x1;
                                y1 = 2.0 * curr_y - y1;
                            }
                        }

                        // 'q': relative quad_to.
                        0x70..=0x7F => {
                            for _ in 0..=(opcode & 0x0F) {
                                x1 = curr_x
                                    + cursor.coordinate().ok_or(Error::BadCoordinate)?;
                                y1 = curr_y
                                    + cursor.coordinate().ok_or(Error::BadCoordinate)?;
                                let x2 = curr_x
                                    + cursor.coordinate().ok_or(Error::BadCoordinate)?;
                                let y2 = curr_y
                                    + cursor.coordinate().ok_or(Error::BadCoordinate)?;
                                c.path_quad_to(tx(x1), ty(y1), tx(x2), ty(y2))?;
                                curr_x = x2;
                                curr_y = y2;
                                x1 = 2.0 * curr_x - x1;
                                y1 = 2.0 * curr_y - y1;
                            }
                        }

                        // 'S': absolute smooth cube_to.
                        0x80..=0x8F => {
                            for _ in 0..=(opcode & 0x0F) {
                                let x2 = cursor.coordinate().ok_or(Error::BadCoordinate)?;
                                let y2 = cursor.coordinate().ok_or(Error::BadCoordinate)?;
                                let x3 = cursor.coordinate().ok_or(Error::BadCoordinate)?;
                                let y3 = cursor.coordinate().ok_or(Error::BadCoordinate)?;
                                c.path_cube_to(tx(x1), ty(y1), tx(x2), ty(y2), tx(x3), ty(y3))?;
                                curr_x = x3;
                                curr_y = y3;
                                x1 = 2.0 * curr_x - x2;
                                y1 = 2.0 * curr_y - y2;
                            }
                        }

                        // 's': relative smooth cube_to.
                        0x90..=0x9F => {
                            for _ in 0..=(opcode & 0x0F) {
                                let x2 = curr_x
                                    + cursor.coordinate().ok_or(Error::BadCoordinate)?;
                                let y2 = curr_y
                                    + cursor.coordinate().ok_or(Error::BadCoordinate)?;
                                let x3 = curr_x
                                    + cursor.coordinate().ok_or(Error::BadCoordinate)?;
                                let y3 = curr_y
                                    + cursor.coordinate().ok_or(Error::BadCoordinate)?;
                                c.path_cube_to(tx(x1), ty(y1), tx(x2), ty(y2), tx(x3), ty(y3))?;
                                curr_x = x3;
                                curr_y = y3;
                                x1 = 2.0 * curr_x - x2;
                                y1 = 2.0 * curr_y - y2;
                            }
                        }

                        // 'C': absolute cube_to.
                        0xA0..=0xAF => {
                            for _ in 0..=(opcode & 0x0F) {
                                x1 = cursor.coordinate().ok_or(Error::BadCoordinate)?;
                                y1 = cursor.coordinate().ok_or(Error::BadCoordinate)?;
                                let x2 = cursor.coordinate().ok_or(Error::BadCoordinate)?;
                                let y2 = cursor.coordinate().ok_or(Error::BadCoordinate)?;
                                let x3 = cursor.coordinate().ok_or(Error::BadCoordinate)?;
                                let y3 = cursor.coordinate().ok_or(Error::BadCoordinate)?;
                                c.path_cube_to(tx(x1), ty(y1), tx(x2), ty(y2), tx(x3), ty(y3))?;
                                curr_x = x3;
                                curr_y = y3;
                                x1 = 2.0 * curr_x - x2;
                                y1 = 2.0 * curr_y - y2;
                            }
                        }

                        // 'c': relative cube_to.
                        0xB0..=0xBF => {
                            for _ in 0..=(opcode & 0x0F) {
                                x1 = curr_x
                                    + cursor.coordinate().ok_or(Error::BadCoordinate)?;
                                y1 = curr_y
                                    + cursor.coordinate().ok_or(Error::BadCoordinate)?;
                                let x2 = curr_x
                                    + cursor.coordinate().ok_or(Error::BadCoordinate)?;
                                let y2 = curr_y
                                    + cursor.coordinate().ok_or(Error::BadCoordinate)?;
                                let x3 = curr_x
                                    + cursor.coordinate().ok_or(Error::BadCoordinate)?;
                                let y3 = curr_y
                                    + cursor.coordinate().ok_or(Error::BadCoordinate)?;
                                c.path_cube_to(tx(x1), ty(y1), tx(x2), ty(y2), tx(x3), ty(y3))?;
                                curr_x = x3;
                                curr_y = y3;
                                x1 = 2.0 * curr_x - x2;
                                y1 = 2.0 * curr_y - y2;
                            }
                        }

                        // 'A': absolute arc_to.
                        0xC0..=0xCF => {
                            for _ in 0..=(opcode & 0x0F) {
                                let x0 = curr_x;
                                let y0 = curr_y;
                                let rx = cursor.coordinate().ok_or(Error::BadCoordinate)?;
                                let ry = cursor.coordinate().ok_or(Error::BadCoordinate)?;
                                let rotation =
                                    cursor.zero_to_one().ok_or(Error::BadCoordinate)?;
                                let flags = cursor.natural().ok_or(Error::BadCoordinate)?;
                                curr_x = cursor.coordinate().ok_or(Error::BadCoordinate)?;
                                curr_y = cursor.coordinate().ok_or(Error::BadCoordinate)?;
                                path_arc_to(
                                    c,
                                    (scale_x, bias_x),
                                    (scale_y, bias_y),
                                    (x0, y0),
                                    (rx, ry),
                                    rotation,
                                    flags & 0x01 != 0,
                                    flags & 0x02 != 0,
                                    (curr_x, curr_y),
                                )?;
                                x1 = curr_x;
                                y1 = curr_y;
                            }
                        }

                        // 'a': relative arc_to.
                        0xD0..=0xDF => {
                            for _ in 0..=(opcode & 0x0F) {
                                let x0 = curr_x;
                                let y0 = curr_y;
                                let rx = cursor.coordinate().ok_or(Error::BadCoordinate)?;
                                let ry = cursor.coordinate().ok_or(Error::BadCoordinate)?;
                                let rotation =
                                    cursor.zero_to_one().ok_or(Error::BadCoordinate)?;
                                let flags = cursor.natural().ok_or(Error::BadCoordinate)?;
                                let dx = cursor.coordinate().ok_or(Error::BadCoordinate)?;
                                let dy = cursor.coordinate().ok_or(Error::BadCoordinate)?;
                                curr_x += dx;
                                curr_y += dy;
                                path_arc_to(
                                    c,
                                    (scale_x, bias_x),
                                    (scale_y, bias_y),
                                    (x0, y0),
                                    (rx, ry),
                                    rotation,
                                    flags & 0x01 != 0,
                                    flags & 0x02 != 0,
                                    (curr_x, curr_y),
                                )?;
                                x1 = curr_x;
                                y1 = curr_y;
                            }
                        }

                        // 'z': close the path and return to styling mode.
                        0xE1 => {
                            c.end_path()?;
                            c.end_drawing(&paint)?;
                            continue 'styling;
                        }

                        // 'z; M': close the path, absolute move_to.
                        0xE2 => {
                            c.end_path()?;
                            curr_x = cursor.coordinate().ok_or(Error::BadCoordinate)?;
                            curr_y = cursor.coordinate().ok_or(Error::BadCoordinate)?;
                            c.begin_path(tx(curr_x), ty(curr_y))?;
                            x1 = curr_x;
                            y1 = curr_y;
                        }

                        // 'z; m': close the path, relative move_to.
                        0xE3 => {
                            c.end_path()?;
                            let dx = cursor.coordinate().ok_or(Error::BadCoordinate)?;
                            let dy = cursor.coordinate().ok_or(Error::BadCoordinate)?;
                            curr_x += dx;
                            curr_y += dy;
                            c.begin_path(tx(curr_x), ty(curr_y))?;
                            x1 = curr_x;
                            y1 = curr_y;
                        }

                        // 'H': absolute horizontal line_to.
                        0xE6 => {
                            curr_x = cursor.coordinate().ok_or(Error::BadCoordinate)?;
                            c.path_line_to(tx(curr_x), ty(curr_y))?;
                            x1 = curr_x;
                            y1 = curr_y;
                        }

                        // 'h': relative horizontal line_to.
                        0xE7 => {
                            curr_x += cursor.coordinate().ok_or(Error::BadCoordinate)?;
                            c.path_line_to(tx(curr_x), ty(curr_y))?;
                            x1 = curr_x;
                            y1 = curr_y;
                        }

                        // 'V': absolute vertical line_to.
                        0xE8 => {
                            curr_y = cursor.coordinate().ok_or(Error::BadCoordinate)?;
                            c.path_line_to(tx(curr_x), ty(curr_y))?;
                            x1 = curr_x;
                            y1 = curr_y;
                        }

                        // 'v': relative vertical line_to.
                        0xE9 => {
                            curr_y += cursor.coordinate().ok_or(Error::BadCoordinate)?;
                            c.path_line_to(tx(curr_x), ty(curr_y))?;
                            x1 = curr_x;
                            y1 = curr_y;
                        }

                        _ => return Err(Error::BadDrawingOpcode),
                    }
                }
            }

            // Set the level-of-detail bounds.
            0xC7 => {
                let lod0 = cursor.real().ok_or(Error::BadNumber)?;
                let lod1 = cursor.real().ok_or(Error::BadNumber)?;
                lod[0] = f64::from(lod0);
                lod[1] = f64::from(lod1);
            }

            _ => return Err(Error::BadStylingOpcode),
        }
    }
}

/// The register a register-write opcode targets: the selector minus the
/// opcode's ADJ value, modulo 64.
fn register_index(sel: u32, opcode: u8) -> usize {
    (sel.wrapping_sub(ADJUSTMENTS[usize::from(opcode & 0x07)]) & 0x3F) as usize
}

/// Register-write opcodes whose low three bits are all set increment the
/// selector afterwards.
fn bump(sel: u32, opcode: u8) -> u32 {
    sel.wrapping_add(u32::from(opcode & 0x07 == 0x07))
}

/// Appends an elliptical arc to the current path as one or more cubic
/// Beziers.
///
/// The arc is specified in SVG's endpoint parameterization, with the
/// x-axis rotation given as a fraction of a full turn. Degenerate radii
/// collapse to a straight line, as do arcs the endpoint conversion
/// rejects.
#[allow(clippy::too_many_arguments)]
fn path_arc_to(
    c: &mut dyn Canvas,
    (scale_x, bias_x): (f64, f64),
    (scale_y, bias_y): (f64, f64),
    (x0, y0): (f32, f32),
    (radius_x, radius_y): (f32, f32),
    x_axis_rotation: f32,
    large_arc: bool,
    sweep: bool,
    (final_x, final_y): (f32, f32),
) -> Result<(), Error> {
    let tx = |x: f64| (x * scale_x + bias_x) as f32;
    let ty = |y: f64| (y * scale_y + bias_y) as f32;

    let rx = f64::from(radius_x).abs();
    let ry = f64::from(radius_y).abs();
    if !(rx > 0.0) || !(ry > 0.0) {
        return c.path_line_to(tx(f64::from(final_x)), ty(f64::from(final_y)));
    }

    let svg_arc = SvgArc {
        from: Point::new(f64::from(x0), f64::from(y0)),
        to: Point::new(f64::from(final_x), f64::from(final_y)),
        radii: Vec2::new(rx, ry),
        x_rotation: f64::from(x_axis_rotation) * std::f64::consts::TAU,
        large_arc,
        sweep,
    };

    match Arc::from_svg_arc(&svg_arc) {
        Some(arc) => {
            let mut result = Ok(());
            arc.to_cubic_beziers(ARC_TOLERANCE, |p1, p2, p3| {
                if result.is_ok() {
                    result = c.path_cube_to(
                        tx(p1.x),
                        ty(p1.y),
                        tx(p2.x),
                        ty(p2.y),
                        tx(p3.x),
                        ty(p3.y),
                    );
                }
            });
            result
        }
        None => c.path_line_to(tx(f64::from(final_x)), ty(f64::from(final_y))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_index_adjustments() {
        // ADJ runs 0..=6 for the low bits 0..=6, and 0 again for 7.
        assert_eq!(register_index(0, 0x80), 0);
        assert_eq!(register_index(0, 0x81), 63);
        assert_eq!(register_index(0, 0x86), 58);
        assert_eq!(register_index(0, 0x87), 0);
        assert_eq!(register_index(10, 0x83), 7);
        // The selector itself is masked at use, not at store.
        assert_eq!(register_index(64, 0x80), 0);
        assert_eq!(register_index(u32::MAX, 0x80), 63);
    }

    #[test]
    fn selector_bump() {
        assert_eq!(bump(5, 0x80), 5);
        assert_eq!(bump(5, 0x86), 5);
        assert_eq!(bump(5, 0x87), 6);
        assert_eq!(bump(5, 0x8F), 6);
        assert_eq!(bump(u32::MAX, 0x87), 0);
    }

    #[test]
    fn cursor_limit_and_advance() {
        let bytes = [1u8, 2, 3, 4, 5];
        let mut outer = Cursor::new(&bytes);
        let mut chunk = outer.limit(3);
        assert_eq!(chunk.take_u8(), Some(1));
        assert_eq!(chunk.len(), 2);
        // The outer cursor has not moved; advancing past the chunk skips
        // whatever the chunk left unread.
        assert_eq!(outer.len(), 5);
        outer.advance(3);
        assert_eq!(outer.take_u8(), Some(4));
    }

    #[test]
    fn degenerate_arc_radii_fall_back_to_a_line() {
        struct LineOnly {
            lines: usize,
            cubes: usize,
        }
        impl Canvas for LineOnly {
            fn begin_decode(&mut self, _: Rectangle) -> Result<(), Error> {
                Ok(())
            }
            fn end_decode(
                &mut self,
                result: Result<(), Error>,
                _: usize,
                _: usize,
            ) -> Result<(), Error> {
                result
            }
            fn begin_drawing(&mut self) -> Result<(), Error> {
                Ok(())
            }
            fn end_drawing(&mut self, _: &Paint) -> Result<(), Error> {
                Ok(())
            }
            fn begin_path(&mut self, _: f32, _: f32) -> Result<(), Error> {
                Ok(())
            }
            fn end_path(&mut self) -> Result<(), Error> {
                Ok(())
            }
            fn path_line_to(&mut self, _: f32, _: f32) -> Result<(), Error> {
                self.lines += 1;
                Ok(())
            }
            fn path_quad_to(&mut self, _: f32, _: f32, _: f32, _: f32) -> Result<(), Error> {
                Ok(())
            }
            fn path_cube_to(
                &mut self,
                _: f32,
                _: f32,
                _: f32,
                _: f32,
                _: f32,
                _: f32,
            ) -> Result<(), Error> {
                self.cubes += 1;
                Ok(())
            }
            fn on_metadata_viewbox(&mut self, _: Rectangle) -> Result<(), Error> {
                Ok(())
            }
            fn on_metadata_suggested_palette(&mut self, _: &Palette) -> Result<(), Error> {
                Ok(())
            }
        }

        let mut canvas = LineOnly { lines: 0, cubes: 0 };
        // NaN radii must not reach the endpoint-to-center conversion.
        path_arc_to(
            &mut canvas,
            (1.0, 0.0),
            (1.0, 0.0),
            (0.0, 0.0),
            (f32::NAN, 4.0),
            0.0,
            false,
            false,
            (8.0, 0.0),
        )
        .unwrap();
        assert_eq!((canvas.lines, canvas.cubes), (1, 0));

        path_arc_to(
            &mut canvas,
            (1.0, 0.0),
            (1.0, 0.0),
            (0.0, 0.0),
            (4.0, 4.0),
            0.0,
            true,
            false,
            (8.0, 0.0),
        )
        .unwrap();
        assert_eq!(canvas.lines, 1);
        assert!(canvas.cubes > 0);
    }
}
