#![warn(missing_docs)]
//! Decoder for the IconVG compact binary vector graphics format
//!
//! IconVG files are decoded by driving a polymorphic drawing sink (a
//! [`Canvas`]) with painting commands, sized to a caller-chosen
//! destination rectangle:
//!
//! ```
//! use iconvg::{decode, decode_viewbox, BrokenCanvas, DecodeOptions, Rectangle};
//!
//! // The smallest valid file: magic bytes plus zero metadata chunks.
//! let src = [0x89, 0x49, 0x56, 0x47, 0x00];
//!
//! let viewbox = decode_viewbox(&src).unwrap();
//! assert_eq!(viewbox, Rectangle::new(-32.0, -32.0, 32.0, 32.0));
//!
//! let mut canvas = BrokenCanvas::new(None);
//! let dst = Rectangle::new(0.0, 0.0, 64.0, 64.0);
//! decode(&mut canvas, dst, &src, &DecodeOptions::default()).unwrap();
//! ```

pub mod canvas;
pub mod decode;
pub mod error;
pub mod format;
pub mod parser;
pub mod render;
pub mod render_helper;

pub use canvas::{BrokenCanvas, Canvas, DebugCanvas};
pub use decode::{decode, decode_viewbox, DecodeOptions};
pub use error::Error;
pub use format::{
    NonpremulColor, Paint, Palette, PremulColor, Rectangle, DEFAULT_VIEWBOX,
};
pub use render::PietCanvas;
