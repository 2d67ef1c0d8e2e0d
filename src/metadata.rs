//! The metadata container: a lazy, write-through cache over an image.
//!
//! [`ImageMetadata`] keeps two caches per family:
//!
//! - a **key index**, filled on the first call to `exif_keys` / `iptc_keys` /
//!   `xmp_keys` and kept as-is afterwards
//! - a **tag cache**, filled one key at a time as tags are read
//!
//! Every mutation goes straight to the image accessor and the tag cache. The
//! key index is *not* updated by `set_*` or `delete_*`: once enumerated, it
//! reflects the image as it was at enumeration time. Call
//! [`refresh_keys`](ImageMetadata::refresh_keys) to re-enumerate.
//!
//! # Example
//!
//! ```rust
//! use pixmeta::{ImageMetadata, Value};
//!
//! let mut metadata = ImageMetadata::from_buffer(Vec::new());
//! metadata.load().unwrap();
//!
//! metadata.set("Exif.Image.Make", "EASTMAN KODAK COMPANY").unwrap();
//! metadata.set("Iptc.Application2.Keywords", Value::array(["sea", "sky"])).unwrap();
//! metadata.set("Xmp.dc.subject", Value::array(["image", "test"])).unwrap();
//!
//! let make = metadata.get_exif_tag("Exif.Image.Make").unwrap();
//! assert_eq!(make.raw_value(), "EASTMAN KODAK COMPANY");
//! assert!(metadata.contains("Xmp.dc.subject").unwrap());
//! ```

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, MutexGuard};

use crate::convert::{IptcType, Semantic, TypeClass, XmpKind, XmpRawValue, xmp};
use crate::error::{Error, Result};
use crate::family::{Families, Family};
use crate::image::{ImageAccessor, ImageRef, SharedImage, SnapshotImage, lock, share};
use crate::registry::TagRegistry;
use crate::tag::{
    Assignment, Entry, ExifEntry, ExifTag, IptcEntry, IptcTag, Tag, TagRef, XmpEntry, XmpTag,
};
use crate::value::Value;

/// Key index: `None` until a family is first enumerated.
#[derive(Debug, Default)]
struct KeyIndex {
    exif: Option<Vec<String>>,
    iptc: Option<Vec<String>>,
    xmp: Option<Vec<String>>,
}

impl KeyIndex {
    fn slot(&mut self, family: Family) -> &mut Option<Vec<String>> {
        match family {
            Family::Exif => &mut self.exif,
            Family::Iptc => &mut self.iptc,
            Family::Xmp => &mut self.xmp,
        }
    }

    fn get(&self, family: Family) -> Option<&[String]> {
        match family {
            Family::Exif => self.exif.as_deref(),
            Family::Iptc => self.iptc.as_deref(),
            Family::Xmp => self.xmp.as_deref(),
        }
    }
}

/// Typed, cached access to the EXIF, IPTC and XMP metadata of one image.
pub struct ImageMetadata {
    image: SharedImage,
    registry: Arc<TagRegistry>,
    loaded: bool,
    keys: KeyIndex,
    exif_tags: HashMap<String, ExifTag>,
    iptc_tags: HashMap<String, IptcTag>,
    xmp_tags: HashMap<String, XmpTag>,
}

impl ImageMetadata {
    /// Metadata of the snapshot at `path`. Nothing is read until [`load`](Self::load).
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self::with_accessor(SnapshotImage::open(path))
    }

    /// Metadata held in an in-memory snapshot buffer.
    pub fn from_buffer(bytes: Vec<u8>) -> Self {
        Self::with_accessor(SnapshotImage::from_buffer(bytes))
    }

    /// Metadata over any accessor.
    pub fn with_accessor<A: ImageAccessor + 'static>(accessor: A) -> Self {
        Self {
            image: share(accessor),
            registry: TagRegistry::shared_builtin(),
            loaded: false,
            keys: KeyIndex::default(),
            exif_tags: HashMap::new(),
            iptc_tags: HashMap::new(),
            xmp_tags: HashMap::new(),
        }
    }

    /// Use `registry` instead of the builtin catalogue to type tags.
    pub fn with_registry(mut self, registry: Arc<TagRegistry>) -> Self {
        self.registry = registry;
        self
    }

    pub fn registry(&self) -> &TagRegistry {
        &self.registry
    }

    // ── Lifecycle ────────────────────────────────────────────────────

    /// Read the image's metadata and reset every cache.
    pub fn load(&mut self) -> Result<()> {
        self.loaded = false;
        lock(&self.image).load()?;
        self.loaded = true;
        for family in Family::ALL {
            self.reset(family);
        }
        log::info!("Metadata loaded");
        Ok(())
    }

    /// Flush the accessor. Tags are already written through, so the caches
    /// have nothing to flush.
    pub fn save(&mut self) -> Result<()> {
        self.ensure_loaded()?;
        lock(&self.image).save()?;
        log::info!("Metadata saved");
        Ok(())
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    fn ensure_loaded(&self) -> Result<()> {
        if self.loaded { Ok(()) } else { Err(Error::NotLoaded) }
    }

    /// Direct access to the underlying accessor.
    pub fn accessor(&self) -> MutexGuard<'_, dyn ImageAccessor + 'static> {
        lock(&self.image)
    }

    // ── Key index ────────────────────────────────────────────────────

    /// Keys of one family, enumerated once and cached.
    pub fn keys(&mut self, family: Family) -> Result<&[String]> {
        self.ensure_loaded()?;
        let image = &self.image;
        let keys = self.keys.slot(family).get_or_insert_with(|| {
            let keys = lock(image).keys(family);
            log::debug!("Enumerated {} {family} key(s)", keys.len());
            keys
        });
        Ok(keys.as_slice())
    }

    pub fn exif_keys(&mut self) -> Result<&[String]> {
        self.keys(Family::Exif)
    }

    pub fn iptc_keys(&mut self) -> Result<&[String]> {
        self.keys(Family::Iptc)
    }

    pub fn xmp_keys(&mut self) -> Result<&[String]> {
        self.keys(Family::Xmp)
    }

    /// The key index as it stands, without enumerating.
    pub fn cached_keys(&self, family: Family) -> Option<&[String]> {
        self.keys.get(family)
    }

    /// Drop a family's key index so the next enumeration re-reads the image.
    pub fn refresh_keys(&mut self, family: Family) {
        *self.keys.slot(family) = None;
    }

    // ── Tag cache ────────────────────────────────────────────────────

    pub fn is_cached(&self, family: Family, key: &str) -> bool {
        match family {
            Family::Exif => self.exif_tags.contains_key(key),
            Family::Iptc => self.iptc_tags.contains_key(key),
            Family::Xmp => self.xmp_tags.contains_key(key),
        }
    }

    pub fn cached_count(&self, family: Family) -> usize {
        match family {
            Family::Exif => self.exif_tags.len(),
            Family::Iptc => self.iptc_tags.len(),
            Family::Xmp => self.xmp_tags.len(),
        }
    }

    fn reset(&mut self, family: Family) {
        self.refresh_keys(family);
        match family {
            Family::Exif => self.exif_tags.clear(),
            Family::Iptc => self.iptc_tags.clear(),
            Family::Xmp => self.xmp_tags.clear(),
        }
    }

    fn handle(&self) -> ImageRef {
        Arc::downgrade(&self.image)
    }

    /// True if `image` points at this container's accessor.
    pub(crate) fn owns(&self, image: Option<&ImageRef>) -> bool {
        image.is_some_and(|image| image.ptr_eq(&self.handle()))
    }

    /// Fail with KeyNotFound unless the accessor currently holds `key`.
    fn require_live(&self, family: Family, key: &str) -> Result<()> {
        if lock(&self.image).contains(family, key) {
            Ok(())
        } else {
            Err(Error::key_not_found(key))
        }
    }

    // ── EXIF ─────────────────────────────────────────────────────────

    pub fn get_exif_tag(&mut self, key: &str) -> Result<&mut ExifTag> {
        self.ensure_loaded()?;
        if !self.exif_tags.contains_key(key) {
            self.require_live(Family::Exif, key)?;
            let raw = lock(&self.image).exif_raw(key)?;
            let (class, semantic) = self.registry.exif(key).unwrap_or_else(|| {
                log::debug!("{key} is not registered, reading it as Undefined");
                (TypeClass::Undefined, Semantic::Plain)
            });
            let mut tag = ExifTag::from_raw(key, class, semantic, raw);
            tag.bind(self.handle());
            log::debug!("Cached {key}");
            self.exif_tags.insert(key.to_string(), tag);
        }
        self.exif_tags
            .get_mut(key)
            .ok_or_else(|| Error::key_not_found(key))
    }

    /// Write a tag, or a bare value wrapped into a tag of the key's
    /// registered type, and cache it.
    pub fn set_exif_tag(&mut self, key: &str, entry: impl Into<ExifEntry>) -> Result<()> {
        self.ensure_loaded()?;
        let mut tag = match entry.into() {
            Entry::Tag(tag) => {
                check_key(key, tag.key())?;
                tag
            }
            Entry::Value(value) => {
                let (class, semantic) = self
                    .registry
                    .exif(key)
                    .ok_or_else(|| Error::key_not_found(key))?;
                ExifTag::with_type(key, class, semantic, value)?
            }
        };
        lock(&self.image).set_exif_raw(key, tag.raw_value().to_string())?;
        tag.bind(self.handle());
        self.exif_tags.insert(key.to_string(), tag);
        Ok(())
    }

    pub fn delete_exif_tag(&mut self, key: &str) -> Result<()> {
        self.ensure_loaded()?;
        self.require_live(Family::Exif, key)?;
        lock(&self.image).delete(Family::Exif, key)?;
        self.exif_tags.remove(key);
        Ok(())
    }

    // ── IPTC ─────────────────────────────────────────────────────────

    pub fn get_iptc_tag(&mut self, key: &str) -> Result<&mut IptcTag> {
        self.ensure_loaded()?;
        if !self.iptc_tags.contains_key(key) {
            self.require_live(Family::Iptc, key)?;
            let raw = lock(&self.image).iptc_raw(key)?;
            let (class, repeatable) = self.registry.iptc(key).unwrap_or_else(|| {
                log::debug!("{key} is not registered, reading it as Undefined");
                (IptcType::Undefined, true)
            });
            let mut tag = IptcTag::from_raw(key, class, repeatable, raw);
            tag.bind(self.handle());
            log::debug!("Cached {key}");
            self.iptc_tags.insert(key.to_string(), tag);
        }
        self.iptc_tags
            .get_mut(key)
            .ok_or_else(|| Error::key_not_found(key))
    }

    pub fn set_iptc_tag(&mut self, key: &str, entry: impl Into<IptcEntry>) -> Result<()> {
        self.ensure_loaded()?;
        let mut tag = match entry.into() {
            Entry::Tag(tag) => {
                check_key(key, tag.key())?;
                tag
            }
            Entry::Value(values) => {
                let (class, repeatable) = self
                    .registry
                    .iptc(key)
                    .ok_or_else(|| Error::key_not_found(key))?;
                IptcTag::with_type(key, class, repeatable, values)?
            }
        };
        lock(&self.image).set_iptc_raw(key, tag.raw_values().to_vec())?;
        tag.bind(self.handle());
        self.iptc_tags.insert(key.to_string(), tag);
        Ok(())
    }

    pub fn delete_iptc_tag(&mut self, key: &str) -> Result<()> {
        self.ensure_loaded()?;
        self.require_live(Family::Iptc, key)?;
        lock(&self.image).delete(Family::Iptc, key)?;
        self.iptc_tags.remove(key);
        Ok(())
    }

    // ── XMP ──────────────────────────────────────────────────────────

    pub fn get_xmp_tag(&mut self, key: &str) -> Result<&mut XmpTag> {
        self.ensure_loaded()?;
        if !self.xmp_tags.contains_key(key) {
            self.require_live(Family::Xmp, key)?;
            let raw = lock(&self.image).xmp_raw(key)?;
            let kind = self.registry.xmp(key).unwrap_or_else(|| {
                let kind = XmpKind::infer(&raw);
                log::debug!("{key} is not registered, reading it as {kind}");
                kind
            });
            let mut tag = XmpTag::from_raw(key, kind, raw);
            tag.bind(self.handle());
            log::debug!("Cached {key}");
            self.xmp_tags.insert(key.to_string(), tag);
        }
        self.xmp_tags
            .get_mut(key)
            .ok_or_else(|| Error::key_not_found(key))
    }

    pub fn set_xmp_tag(&mut self, key: &str, entry: impl Into<XmpEntry>) -> Result<()> {
        self.ensure_loaded()?;
        let mut tag = match entry.into() {
            Entry::Tag(tag) => {
                check_key(key, tag.key())?;
                tag
            }
            Entry::Value(value) => {
                let kind = self
                    .registry
                    .xmp(key)
                    .ok_or_else(|| Error::key_not_found(key))?;
                XmpTag::with_kind(key, kind, value)?
            }
        };
        lock(&self.image).set_xmp_raw(key, tag.raw_value().clone())?;
        tag.bind(self.handle());
        self.xmp_tags.insert(key.to_string(), tag);
        Ok(())
    }

    /// Write a value through the accessor's structured XMP setters without
    /// building a tag.
    ///
    /// Fails with KeyNotFound for keys outside the registry, whether or not
    /// the image holds them, and with TypeMismatch when the value's shape
    /// does not fit the key's kind. A cached tag for the key is kept in step.
    pub fn set_xmp_tag_value(&mut self, key: &str, value: impl Into<Value>) -> Result<()> {
        self.ensure_loaded()?;
        let value = value.into();
        let kind = self
            .registry
            .xmp(key)
            .ok_or_else(|| Error::key_not_found(key))?;
        if !kind.accepts_shape(&value) {
            return Err(Error::type_mismatch(format!(
                "{key} expects {kind}, got {}",
                value.kind_name()
            )));
        }
        let raw = xmp::to_raw(kind, &value)?;
        {
            let mut image = lock(&self.image);
            match raw.clone() {
                XmpRawValue::Text(text) => image.set_text(key, text)?,
                XmpRawValue::Array(items) => image.set_array(key, items)?,
                XmpRawValue::LangAlt(map) => image.set_lang_alt(key, map)?,
            }
        }
        if let Some(tag) = self.xmp_tags.get_mut(key) {
            tag.refresh(raw, value);
        }
        Ok(())
    }

    pub fn delete_xmp_tag(&mut self, key: &str) -> Result<()> {
        self.ensure_loaded()?;
        self.require_live(Family::Xmp, key)?;
        lock(&self.image).delete(Family::Xmp, key)?;
        self.xmp_tags.remove(key);
        Ok(())
    }

    // ── Key-dispatched access ────────────────────────────────────────

    /// Get the tag for any key, dispatching on its family prefix.
    pub fn get(&mut self, key: &str) -> Result<TagRef<'_>> {
        Ok(match Family::of_key(key)? {
            Family::Exif => TagRef::Exif(self.get_exif_tag(key)?),
            Family::Iptc => TagRef::Iptc(self.get_iptc_tag(key)?),
            Family::Xmp => TagRef::Xmp(self.get_xmp_tag(key)?),
        })
    }

    /// Set a tag or value for any key, dispatching on its family prefix.
    ///
    /// A tag of another family fails with TypeMismatch.
    pub fn set(&mut self, key: &str, assignment: impl Into<Assignment>) -> Result<()> {
        let family = Family::of_key(key)?;
        match (family, assignment.into()) {
            (Family::Exif, Assignment::Tag(Tag::Exif(tag))) => self.set_exif_tag(key, tag),
            (Family::Exif, Assignment::Value(value)) => self.set_exif_tag(key, value),
            (Family::Iptc, Assignment::Tag(Tag::Iptc(tag))) => self.set_iptc_tag(key, tag),
            (Family::Iptc, Assignment::Value(Value::Array(values))) => self.set_iptc_tag(key, values),
            (Family::Iptc, Assignment::Value(value)) => self.set_iptc_tag(key, vec![value]),
            (Family::Xmp, Assignment::Tag(Tag::Xmp(tag))) => self.set_xmp_tag(key, tag),
            (Family::Xmp, Assignment::Value(value)) => self.set_xmp_tag(key, value),
            (family, Assignment::Tag(tag)) => Err(Error::type_mismatch(format!(
                "cannot store {} tag {} under {family} key {key}",
                tag.family(),
                tag.key()
            ))),
        }
    }

    pub fn delete(&mut self, key: &str) -> Result<()> {
        match Family::of_key(key)? {
            Family::Exif => self.delete_exif_tag(key),
            Family::Iptc => self.delete_iptc_tag(key),
            Family::Xmp => self.delete_xmp_tag(key),
        }
    }

    /// True if the image currently holds `key`.
    pub fn contains(&self, key: &str) -> Result<bool> {
        let family = Family::of_key(key)?;
        self.ensure_loaded()?;
        Ok(lock(&self.image).contains(family, key))
    }

    // ── Copy ─────────────────────────────────────────────────────────

    /// Copy the raw metadata of the selected families into `other`.
    ///
    /// Values are copied as raw representations into `other`'s accessor.
    /// `other`'s key index and tag cache for those families are reset, so it
    /// observes the copied tags on its next enumeration or read.
    pub fn copy(&mut self, other: &mut ImageMetadata, families: Families) -> Result<()> {
        self.ensure_loaded()?;
        other.ensure_loaded()?;
        if Arc::ptr_eq(&self.image, &other.image) {
            log::debug!("Copy into the same image, nothing to do");
            return Ok(());
        }

        for family in families.iter() {
            self.keys(family)?;
            let source = lock(&self.image);
            let mut target = lock(&other.image);
            let keys = source.keys(family);
            for key in &keys {
                match family {
                    Family::Exif => target.set_exif_raw(key, source.exif_raw(key)?)?,
                    Family::Iptc => target.set_iptc_raw(key, source.iptc_raw(key)?)?,
                    Family::Xmp => target.set_xmp_raw(key, source.xmp_raw(key)?)?,
                }
            }
            drop(target);
            drop(source);
            other.reset(family);
            log::info!("Copied {} {family} tag(s)", keys.len());
        }
        Ok(())
    }
}

fn check_key(expected: &str, found: &str) -> Result<()> {
    if expected == found {
        Ok(())
    } else {
        Err(Error::KeyMismatch {
            expected: expected.to_string(),
            found: found.to_string(),
        })
    }
}

impl std::fmt::Debug for ImageMetadata {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageMetadata")
            .field("loaded", &self.loaded)
            .field("keys", &self.keys)
            .field("exif_tags", &self.exif_tags.len())
            .field("iptc_tags", &self.iptc_tags.len())
            .field("xmp_tags", &self.xmp_tags.len())
            .finish()
    }
}
