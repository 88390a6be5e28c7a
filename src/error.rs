//! Error values reported by the decoder and by canvas implementations.
//!
//! Errors are plain value-typed reason codes: cheap to copy, comparable with
//! `==`, and stable across library versions. The `Bad*` variants mean that
//! the source bytes are not IconVG. The other variants are programming
//! errors rather than file format errors.

use std::fmt;

/// A reason code describing why a decode failed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Error {
    /// A color payload was truncated or malformed.
    BadColor,
    /// A coordinate number was truncated or malformed.
    BadCoordinate,
    /// An opcode outside the drawing-mode opcode space was encountered
    /// while drawing.
    BadDrawingOpcode,
    /// The source did not begin with the IconVG magic identifier.
    BadMagicIdentifier,
    /// The metadata framing was malformed, or a metadata id was unknown.
    BadMetadata,
    /// Metadata ids were not strictly increasing.
    BadMetadataIdOrder,
    /// A Suggested Palette metadata chunk was malformed.
    BadMetadataSuggestedPalette,
    /// A ViewBox metadata chunk was malformed, non-finite or mis-ordered.
    BadMetadataViewbox,
    /// A natural, real or zero-to-one number was truncated or malformed.
    BadNumber,
    /// The source ran out of bytes while a path was still open.
    BadPathUnfinished,
    /// An opcode outside the styling-mode opcode space was encountered
    /// while styling.
    BadStylingOpcode,

    /// A rendering backend ran out of memory. The decoder itself never
    /// reports this; it is reserved for canvas implementations.
    SystemFailureOutOfMemory,

    /// A rendering backend was requested that this build does not enable.
    InvalidBackendNotEnabled,
    /// A constructor was given an argument it cannot accept.
    InvalidConstructorArgument,
    /// Drawing mode was entered with a register that does not hold a
    /// valid paint.
    InvalidPaintType,

    /// An error raised by a canvas implementation.
    Canvas(&'static str),
}

impl Error {
    /// Returns whether this error means that the source bytes are not
    /// well-formed IconVG (as opposed to a programming or backend error).
    pub fn is_file_format_error(self) -> bool {
        matches!(
            self,
            Error::BadColor
                | Error::BadCoordinate
                | Error::BadDrawingOpcode
                | Error::BadMagicIdentifier
                | Error::BadMetadata
                | Error::BadMetadataIdOrder
                | Error::BadMetadataSuggestedPalette
                | Error::BadMetadataViewbox
                | Error::BadNumber
                | Error::BadPathUnfinished
                | Error::BadStylingOpcode
        )
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            Error::BadColor => "iconvg: bad color",
            Error::BadCoordinate => "iconvg: bad coordinate",
            Error::BadDrawingOpcode => "iconvg: bad drawing opcode",
            Error::BadMagicIdentifier => "iconvg: bad magic identifier",
            Error::BadMetadata => "iconvg: bad metadata",
            Error::BadMetadataIdOrder => "iconvg: bad metadata ID order",
            Error::BadMetadataSuggestedPalette => {
                "iconvg: bad metadata (suggested palette)"
            }
            Error::BadMetadataViewbox => "iconvg: bad metadata (viewbox)",
            Error::BadNumber => "iconvg: bad number",
            Error::BadPathUnfinished => "iconvg: bad path unfinished",
            Error::BadStylingOpcode => "iconvg: bad styling opcode",
            Error::SystemFailureOutOfMemory => {
                "iconvg: system failure: out of memory"
            }
            Error::InvalidBackendNotEnabled => {
                "iconvg: invalid backend (not enabled)"
            }
            Error::InvalidConstructorArgument => {
                "iconvg: invalid constructor argument"
            }
            Error::InvalidPaintType => "iconvg: invalid paint type",
            Error::Canvas(msg) => return write!(f, "iconvg: canvas: {}", msg),
        };
        f.write_str(msg)
    }
}

impl std::error::Error for Error {}
