use std::fmt;
use std::sync::{OnceLock, Weak};

use crate::convert::{IptcType, iptc};
use crate::error::{Error, Result};
use crate::image::{ImageRef, lock};
use crate::metadata::ImageMetadata;
use crate::registry::TagRegistry;
use crate::value::Value;

/// One IPTC entry. IPTC datasets repeat, so a tag holds a sequence of raw
/// strings and a matching sequence of native values.
///
/// ```rust
/// use pixmeta::{IptcTag, Value};
///
/// let tag = IptcTag::new("Iptc.Application2.Keywords", ["sea", "sky"]).unwrap();
/// assert_eq!(tag.raw_values(), ["sea", "sky"]);
/// assert_eq!(tag.values().unwrap()[1], Value::from("sky"));
/// ```
#[derive(Debug, Clone)]
pub struct IptcTag {
    key: String,
    class: IptcType,
    repeatable: bool,
    raw: Vec<String>,
    values: OnceLock<Vec<Value>>,
    image: Option<ImageRef>,
}

impl IptcTag {
    /// Build a tag from native values, typed by the builtin registry.
    pub fn new<I, V>(key: &str, values: I) -> Result<Self>
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let (class, repeatable) = TagRegistry::builtin()
            .iptc(key)
            .ok_or_else(|| Error::key_not_found(key))?;
        Self::with_type(key, class, repeatable, values)
    }

    /// Build a tag from native values with an explicit type.
    pub fn with_type<I, V>(key: &str, class: IptcType, repeatable: bool, values: I) -> Result<Self>
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let values: Vec<Value> = values.into_iter().map(Into::into).collect();
        let raw = encode(key, class, repeatable, &values)?;
        Ok(Self {
            key: key.to_string(),
            class,
            repeatable,
            raw,
            values: OnceLock::from(values),
            image: None,
        })
    }

    /// Build a tag from its raw datasets.
    pub fn from_raw(key: &str, class: IptcType, repeatable: bool, raw: Vec<String>) -> Self {
        Self {
            key: key.to_string(),
            class,
            repeatable,
            raw,
            values: OnceLock::new(),
            image: None,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn type_class(&self) -> IptcType {
        self.class
    }

    pub fn is_repeatable(&self) -> bool {
        self.repeatable
    }

    pub fn raw_values(&self) -> &[String] {
        &self.raw
    }

    /// The native values, converted on first access.
    pub fn values(&self) -> Result<&[Value]> {
        if let Some(values) = self.values.get() {
            return Ok(values);
        }
        let values = self
            .raw
            .iter()
            .map(|raw| iptc::to_native(self.class, raw))
            .collect::<Result<Vec<_>>>()?;
        Ok(self.values.get_or_init(|| values))
    }

    /// Replace the whole sequence of values.
    pub fn set_values<I, V>(&mut self, values: I) -> Result<()>
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let values: Vec<Value> = values.into_iter().map(Into::into).collect();
        let raw = encode(&self.key, self.class, self.repeatable, &values)?;
        if let Some(image) = self.image.as_ref().and_then(Weak::upgrade) {
            lock(&image).set_iptc_raw(&self.key, raw.clone())?;
            log::debug!("Wrote {} through to image", self.key);
        }
        self.raw = raw;
        self.values = OnceLock::from(values);
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
}

fn encode(key: &str, class: IptcType, repeatable: bool, values: &[Value]) -> Result<Vec<String>> {
    if values.is_empty() || (!repeatable && values.len() > 1) {
        return Err(Error::conversion(
            key,
            format!("{} value(s) for a {} tag", values.len(), if repeatable { "repeatable" } else { "single" }),
        ));
    }
    values.iter().map(|v| iptc::to_raw(class, v)).collect()
}

impl PartialEq for IptcTag {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
            && self.class == other.class
            && self.repeatable == other.repeatable
            && self.raw == other.raw
    }
}

impl fmt::Display for IptcTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{} [{}] = {:?}>", self.key, self.class, self.raw)
    }
}
