//! Type-directed conversion between raw tag strings and native [`Value`]s.
//!
//! Each family has its own module with a `to_native` / `to_raw` pair:
//!
//! - [`exif`]: one rule per [`TypeClass`], refined per key by a [`Semantic`]
//! - [`iptc`]: one rule per [`IptcType`], applied to each repeated dataset
//! - [`xmp`]: dispatch on [`XmpKind`] (simple / array / lang-alt), then on [`XmpType`]
//!
//! Every failure is an [`Error::Conversion`](crate::Error::Conversion). The only
//! soft fallback is the EXIF date-like Ascii rule, which hands back the raw
//! string when it does not parse as a date.
//!
//! [`Value`]: crate::Value

pub mod exif;
pub mod iptc;
mod numeric;
pub mod xmp;

pub use exif::{Semantic, TypeClass};
pub use iptc::IptcType;
pub use xmp::{XmpKind, XmpRawValue, XmpType};
