use std::fmt;
use std::sync::{OnceLock, Weak};

use crate::convert::{XmpKind, XmpRawValue, xmp};
use crate::error::{Error, Result};
use crate::image::{ImageRef, lock};
use crate::metadata::ImageMetadata;
use crate::registry::TagRegistry;
use crate::value::Value;

/// One XMP property: a simple value, an array or a language alternative.
///
/// ```rust
/// use pixmeta::{Value, XmpTag};
///
/// let title = XmpTag::new("Xmp.dc.title", Value::lang_alt([("x-default", "Sunset")])).unwrap();
/// assert_eq!(title.kind().to_string(), "Lang Alt");
///
/// let subject = XmpTag::new("Xmp.dc.subject", Value::array(["sea", "sky"])).unwrap();
/// assert_eq!(subject.value().unwrap().as_array().unwrap().len(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct XmpTag {
    key: String,
    kind: XmpKind,
    raw: XmpRawValue,
    value: OnceLock<Value>,
    image: Option<ImageRef>,
}

impl XmpTag {
    /// Build a tag from a native value, typed by the builtin registry.
    pub fn new(key: &str, value: impl Into<Value>) -> Result<Self> {
        let kind = TagRegistry::builtin()
            .xmp(key)
            .ok_or_else(|| Error::key_not_found(key))?;
        Self::with_kind(key, kind, value)
    }

    pub fn with_kind(key: &str, kind: XmpKind, value: impl Into<Value>) -> Result<Self> {
        let value = value.into();
        let raw = xmp::to_raw(kind, &value)?;
        Ok(Self {
            key: key.to_string(),
            kind,
            raw,
            value: OnceLock::from(value),
            image: None,
        })
    }

    pub fn from_raw(key: &str, kind: XmpKind, raw: XmpRawValue) -> Self {
        Self {
            key: key.to_string(),
            kind,
            raw,
            value: OnceLock::new(),
            image: None,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn kind(&self) -> XmpKind {
        self.kind
    }

    pub fn raw_value(&self) -> &XmpRawValue {
        &self.raw
    }

    pub fn value(&self) -> Result<&Value> {
        if let Some(value) = self.value.get() {
            return Ok(value);
        }
        let value = xmp::to_native(self.kind, &self.raw)?;
        Ok(self.value.get_or_init(|| value))
    }

    pub fn set_value(&mut self, value: impl Into<Value>) -> Result<()> {
        let value = value.into();
        let raw = xmp::to_raw(self.kind, &value)?;
        if let Some(image) = self.image.as_ref().and_then(Weak::upgrade) {
            lock(&image).set_xmp_raw(&self.key, raw.clone())?;
            log::debug!("Wrote {} through to image", self.key);
        }
        self.refresh(raw, value);
        Ok(())
    }

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

    /// Replace both caches without touching the image.
    pub(crate) fn refresh(&mut self, raw: XmpRawValue, value: Value) {
        self.raw = raw;
        self.value = OnceLock::from(value);
    }
}

impl PartialEq for XmpTag {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key && self.kind == other.kind && self.raw == other.raw
    }
}

impl fmt::Display for XmpTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{} [{}] = {:?}>", self.key, self.kind, self.raw)
    }
}
