//! # pixmeta
//!
//! Typed EXIF, IPTC and XMP tags over an image accessor, with a lazy,
//! write-through metadata cache.
//!
//! ## Quick Start
//!
//! Open an image through [`ImageMetadata`], read tags as native values and
//! write them back through the cache:
//!
//! ```rust,no_run
//! use pixmeta::{ImageMetadata, Rational, Value};
//!
//! fn main() -> pixmeta::Result<()> {
//!     let mut metadata = ImageMetadata::new("photo.jpg.meta.json");
//!     metadata.load()?;
//!
//!     for key in metadata.exif_keys()?.to_vec() {
//!         let tag = metadata.get_exif_tag(&key)?;
//!         println!("{key} = {}", tag.value()?);
//!     }
//!
//!     metadata.set("Exif.Photo.ExposureTime", Rational::new(1, 250)?)?;
//!     metadata.set("Xmp.dc.subject", Value::array(["sea", "sky"]))?;
//!     metadata.save()?;
//!     Ok(())
//! }
//! ```
//!
//! ## Standalone Tags
//!
//! Tags can be built on their own, typed by the builtin registry, and
//! assigned to a container later:
//!
//! ```rust
//! use pixmeta::{ExifTag, IptcTag, Rational, Value, XmpTag};
//!
//! let exposure = ExifTag::new("Exif.Photo.ExposureTime", Rational::new(1, 100).unwrap()).unwrap();
//! assert_eq!(exposure.raw_value(), "1/100");
//!
//! let keywords = IptcTag::new("Iptc.Application2.Keywords", ["sea", "sky"]).unwrap();
//! assert_eq!(keywords.raw_values().len(), 2);
//!
//! let title = XmpTag::new("Xmp.dc.title", Value::lang_alt([("x-default", "Sunset")])).unwrap();
//! assert!(title.value().unwrap().as_lang_alt().is_some());
//! ```
//!
//! ## Modules
//!
//! - [`rational`]: exact fractions
//! - [`value`]: native tag values
//! - [`convert`]: raw string and native value conversions per family
//! - [`registry`]: key to type catalogue
//! - [`tag`]: EXIF, IPTC and XMP tags
//! - [`image`]: the image accessor trait and its implementations
//! - [`metadata`]: the caching container
//! - [`config`]: configuration loading and saving

pub mod config;
pub mod convert;
pub mod error;
pub mod family;
pub mod image;
pub mod metadata;
pub mod rational;
pub mod registry;
pub mod tag;
pub mod value;

pub use error::{Error, Result};
pub use family::{Families, Family};
pub use metadata::ImageMetadata;
pub use rational::Rational;
pub use tag::{Assignment, Entry, ExifTag, IptcTag, Tag, TagRef, XmpTag};
pub use value::{Value, X_DEFAULT};
