use std::fmt;
use std::sync::{OnceLock, Weak};

use crate::convert::{Semantic, TypeClass, exif};
use crate::error::{Error, Result};
use crate::image::{ImageRef, lock};
use crate::metadata::ImageMetadata;
use crate::registry::TagRegistry;
use crate::value::Value;

/// One EXIF entry: a key, its type class and a raw/native value pair.
///
/// The native value is converted from the raw string on first access and
/// cached. A tag obtained from an [`ImageMetadata`] writes every
/// [`set_value`](Self::set_value) through to the image.
///
/// ```rust
/// use pixmeta::{ExifTag, Rational};
///
/// let mut tag = ExifTag::new("Exif.Photo.ExposureTime", Rational::new(1, 250).unwrap()).unwrap();
/// assert_eq!(tag.raw_value(), "1/250");
///
/// tag.set_value(Rational::new(1, 60).unwrap()).unwrap();
/// assert_eq!(tag.raw_value(), "1/60");
/// ```
#[derive(Debug, Clone)]
pub struct ExifTag {
    key: String,
    class: TypeClass,
    semantic: Semantic,
    raw: String,
    value: OnceLock<Value>,
    image: Option<ImageRef>,
}

impl ExifTag {
    /// Build a tag from a native value, typed by the builtin registry.
    pub fn new(key: &str, value: impl Into<Value>) -> Result<Self> {
        let (class, semantic) = TagRegistry::builtin()
            .exif(key)
            .ok_or_else(|| Error::key_not_found(key))?;
        Self::with_type(key, class, semantic, value)
    }

    /// Build a tag from a native value with an explicit type.
    pub fn with_type(
        key: &str,
        class: TypeClass,
        semantic: Semantic,
        value: impl Into<Value>,
    ) -> Result<Self> {
        let value = value.into();
        let raw = exif::to_raw(class, semantic, &value)?;
        let value = settle(class, semantic, &raw, value)?;
        Ok(Self {
            key: key.to_string(),
            class,
            semantic,
            raw,
            value: OnceLock::from(value),
            image: None,
        })
    }

    /// Build a tag from its raw string. Conversion is deferred to
    /// [`value`](Self::value).
    pub fn from_raw(key: &str, class: TypeClass, semantic: Semantic, raw: impl Into<String>) -> Self {
        Self {
            key: key.to_string(),
            class,
            semantic,
            raw: raw.into(),
            value: OnceLock::new(),
            image: None,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn type_class(&self) -> TypeClass {
        self.class
    }

    pub fn semantic(&self) -> Semantic {
        self.semantic
    }

    pub fn raw_value(&self) -> &str {
        &self.raw
    }

    /// The native value, converted from the raw string on first access.
    pub fn value(&self) -> Result<&Value> {
        if let Some(value) = self.value.get() {
            return Ok(value);
        }
        let value = exif::to_native(self.class, self.semantic, &self.raw)?;
        Ok(self.value.get_or_init(|| value))
    }

    /// Replace the value. The raw string is recomputed, and a bound tag
    /// writes it to its image before either cache changes.
    pub fn set_value(&mut self, value: impl Into<Value>) -> Result<()> {
        let value = value.into();
        let raw = exif::to_raw(self.class, self.semantic, &value)?;
        let value = settle(self.class, self.semantic, &raw, value)?;
        if let Some(image) = self.image.as_ref().and_then(Weak::upgrade) {
            lock(&image).set_exif_raw(&self.key, raw.clone())?;
            log::debug!("Wrote {} through to image", self.key);
        }
        self.raw = raw;
        self.value = OnceLock::from(value);
        Ok(())
    }

    /// True if this tag writes through to `metadata`.
    pub fn is_bound_to(&self, metadata: &ImageMetadata) -> bool {
        metadata.owns(self.image.as_ref())
    }

    pub fn is_bound(&self) -> bool {
        self.image.as_ref().is_some_and(|image| image.strong_count() > 0)
    }

    pub(crate) fn bind(&mut self, image: ImageRef) {
        self.image = Some(image);
    }

    /// A copy that no longer writes through to any image.
    pub(crate) fn detached(&self) -> Self {
        Self {
            image: None,
            ..self.clone()
        }
    }
}

/// The native value to cache next to `raw`. Version strings accept either
/// `M.mm` or the encoded byte codes, so their native form is re-read from raw.
fn settle(class: TypeClass, semantic: Semantic, raw: &str, value: Value) -> Result<Value> {
    match semantic {
        Semantic::Version => exif::to_native(class, semantic, raw),
        _ => Ok(value),
    }
}

impl PartialEq for ExifTag {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
            && self.class == other.class
            && self.semantic == other.semantic
            && self.raw == other.raw
    }
}

impl fmt::Display for ExifTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{} [{}] = {}>", self.key, self.class, self.raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Rational;
    use chrono::NaiveDate;

    #[test]
    fn from_value_is_eager() {
        let dt = NaiveDate::from_ymd_opt(2009, 3, 20)
            .unwrap()
            .and_hms_opt(20, 32, 0)
            .unwrap();
        let tag = ExifTag::new("Exif.Image.DateTime", dt).unwrap();
        assert_eq!(tag.raw_value(), "2009:03:20 20:32:00");
        assert_eq!(tag.value().unwrap(), &Value::DateTime(dt));
        assert_eq!(tag.type_class(), TypeClass::Ascii);
        assert_eq!(tag.semantic(), Semantic::DateTime);
        assert!(!tag.is_bound());
    }

    #[test]
    fn from_raw_is_lazy() {
        let tag = ExifTag::from_raw("Exif.Image.Orientation", TypeClass::Short, Semantic::Plain, "1E3");
        assert_eq!(tag.raw_value(), "1E3");
        assert!(tag.value().unwrap_err().is_conversion_error());

        let tag = ExifTag::from_raw("Exif.Image.Orientation", TypeClass::Short, Semantic::Plain, "6");
        assert_eq!(tag.value().unwrap(), &Value::Integer(6));
    }

    #[test]
    fn unknown_key_or_bad_value() {
        assert!(ExifTag::new("Exif.Image.Nonsense", "x").unwrap_err().is_key_error());
        assert!(ExifTag::new("Exif.Image.Orientation", -1).unwrap_err().is_conversion_error());
        assert!(
            ExifTag::new("Exif.Image.XResolution", Rational::new(-72, 1).unwrap())
                .unwrap_err()
                .is_conversion_error()
        );
    }

    #[test]
    fn set_value_updates_both_caches() {
        let mut tag = ExifTag::from_raw("Exif.Image.Make", TypeClass::Ascii, Semantic::Plain, "Canon");
        assert_eq!(tag.value().unwrap(), &Value::from("Canon"));
        tag.set_value("World Company").unwrap();
        assert_eq!(tag.raw_value(), "World Company");
        assert_eq!(tag.value().unwrap(), &Value::from("World Company"));

        // A rejected value leaves the tag untouched.
        assert!(tag.set_value(12).is_err());
        assert_eq!(tag.raw_value(), "World Company");
    }

    #[test]
    fn version_value_follows_raw() {
        let encoded = ExifTag::new("Exif.Photo.ExifVersion", "48 50 50 48 ").unwrap();
        assert_eq!(encoded.raw_value(), "48 50 50 48 ");
        assert_eq!(encoded.value().unwrap(), &Value::from("2.20"));

        let mut tag = ExifTag::new("Exif.Photo.ExifVersion", "2.21").unwrap();
        assert_eq!(tag.raw_value(), "48 50 50 49 ");
        tag.set_value("48 50 51 48 ").unwrap();
        assert_eq!(tag.value().unwrap(), &Value::from("2.30"));

        assert!(ExifTag::new("Exif.Photo.ExifVersion", "two").is_err());
    }

    #[test]
    fn equality_ignores_cache_state() {
        let eager = ExifTag::new("Exif.Image.Make", "Canon").unwrap();
        let lazy = ExifTag::from_raw("Exif.Image.Make", TypeClass::Ascii, Semantic::Plain, "Canon");
        assert_eq!(eager, lazy);
        assert_ne!(eager, ExifTag::new("Exif.Image.Model", "Canon").unwrap());
    }

    #[test]
    fn display() {
        let tag = ExifTag::new("Exif.Image.Orientation", 1).unwrap();
        assert_eq!(tag.to_string(), "<Exif.Image.Orientation [Short] = 1>");
    }
}
