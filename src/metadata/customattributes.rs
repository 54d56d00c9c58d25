//! Custom attribute value blobs.
//!
//! A value blob starts with the prolog `0x0001`, followed by the fixed constructor arguments and
//! the named arguments (ECMA-335 II.23.3). Decoding arbitrary fixed arguments requires the
//! constructor signature and, for enums, the resolved enum type. The queries in this crate only
//! need attributes whose constructor takes a single `string`, such as
//! `InternalsVisibleToAttribute` or `ConditionalAttribute`, so that is the shape decoded here.
//!
//! # Examples
//!
//! ```rust
//! use cilmeta::metadata::customattributes::string_argument;
//!
//! let blob = [0x01, 0x00, 0x05, b'H', b'e', b'l', b'l', b'o', 0x00, 0x00];
//! assert_eq!(string_argument(&blob)?, Some("Hello"));
//! # Ok::<(), cilmeta::Error>(())
//! ```

use crate::{file::parser::Parser, Result};

/// The prolog every custom attribute value blob starts with
pub const CUSTOM_ATTRIBUTE_PROLOG: u16 = 0x0001;

/// True if `blob` is long enough to hold a string argument and starts with the prolog
#[must_use]
pub fn has_prolog(blob: &[u8]) -> bool {
    blob.len() > 4 && u16::from_le_bytes([blob[0], blob[1]]) == CUSTOM_ATTRIBUTE_PROLOG
}

/// Decode the first fixed argument of `blob` as a `SerString`.
///
/// Returns `Ok(None)` for the null string (`0xFF`). Trailing NUL characters are trimmed.
///
/// # Errors
/// Returns [`crate::Error::BadImageFormat`] if the prolog is missing or the string is not
/// valid UTF-8, and [`crate::Error::OutOfRange`] if it is truncated
pub fn string_argument(blob: &[u8]) -> Result<Option<&str>> {
    if !has_prolog(blob) {
        return Err(bad_image_error!(
            "Custom attribute blob of {} bytes has no valid prolog",
            blob.len()
        ));
    }

    let mut parser = Parser::new(blob);
    parser.advance_by(2)?;
    parser.read_ser_string()
}
