//! Raw access to an image's metadata store.
//!
//! The container never parses file formats itself. It talks to an
//! [`ImageAccessor`], which exposes each family's entries as raw strings:
//! one string per EXIF key, a sequence of datasets per IPTC key, and a
//! text / array / lang-alt value per XMP key.
//!
//! Two accessors ship with the crate:
//!
//! - [`MemoryStore`] keeps everything in memory and never touches disk
//! - [`SnapshotImage`] persists a `MemoryStore` as a JSON snapshot, backed by
//!   a file or by an in-memory buffer
//!
//! [`import::import_exif`] fills a `MemoryStore` from the EXIF block of a
//! real image file.

pub mod import;
mod memory;
mod snapshot;

pub use memory::MemoryStore;
pub use snapshot::SnapshotImage;

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use crate::convert::XmpRawValue;
use crate::error::{Error, Result};
use crate::family::Family;

/// Raw read/write access to one image's metadata.
///
/// Getters fail with [`Error::KeyNotFound`] when the key is absent. Setters
/// create the key or overwrite it in place.
///
/// # Example
///
/// ```rust
/// use pixmeta::Family;
/// use pixmeta::image::{ImageAccessor, MemoryStore};
///
/// let mut store = MemoryStore::new();
/// store.set_exif_raw("Exif.Image.Make", "Canon".into()).unwrap();
/// store.set_iptc_raw("Iptc.Application2.Keywords", vec!["sea".into(), "sky".into()]).unwrap();
///
/// assert!(store.contains(Family::Exif, "Exif.Image.Make"));
/// assert_eq!(store.iptc_raw("Iptc.Application2.Keywords").unwrap().len(), 2);
/// ```
pub trait ImageAccessor: Send {
    /// Read the metadata from the underlying resource.
    fn load(&mut self) -> Result<()>;

    /// Flush buffered changes to the underlying resource.
    fn save(&mut self) -> Result<()>;

    /// Keys of one family, in store order.
    fn keys(&self, family: Family) -> Vec<String>;

    fn contains(&self, family: Family, key: &str) -> bool;

    /// Remove a key. Fails if it is absent.
    fn delete(&mut self, family: Family, key: &str) -> Result<()>;

    fn exif_raw(&self, key: &str) -> Result<String>;

    fn set_exif_raw(&mut self, key: &str, raw: String) -> Result<()>;

    /// All datasets stored under an IPTC key, in order.
    fn iptc_raw(&self, key: &str) -> Result<Vec<String>>;

    /// Replace every dataset stored under an IPTC key.
    fn set_iptc_raw(&mut self, key: &str, raw: Vec<String>) -> Result<()>;

    fn xmp_raw(&self, key: &str) -> Result<XmpRawValue>;

    fn set_xmp_raw(&mut self, key: &str, raw: XmpRawValue) -> Result<()>;

    /// XMP simple value as text.
    fn text(&self, key: &str) -> Result<String> {
        match self.xmp_raw(key)? {
            XmpRawValue::Text(text) => Ok(text),
            other => Err(shape_error(key, "text", &other)),
        }
    }

    fn set_text(&mut self, key: &str, text: String) -> Result<()> {
        self.set_xmp_raw(key, XmpRawValue::Text(text))
    }

    /// XMP array items.
    fn array(&self, key: &str) -> Result<Vec<String>> {
        match self.xmp_raw(key)? {
            XmpRawValue::Array(items) => Ok(items),
            other => Err(shape_error(key, "array", &other)),
        }
    }

    fn set_array(&mut self, key: &str, items: Vec<String>) -> Result<()> {
        self.set_xmp_raw(key, XmpRawValue::Array(items))
    }

    /// XMP language alternatives, keyed by language tag.
    fn lang_alt(&self, key: &str) -> Result<BTreeMap<String, String>> {
        match self.xmp_raw(key)? {
            XmpRawValue::LangAlt(map) => Ok(map),
            other => Err(shape_error(key, "lang alt", &other)),
        }
    }

    fn set_lang_alt(&mut self, key: &str, map: BTreeMap<String, String>) -> Result<()> {
        self.set_xmp_raw(key, XmpRawValue::LangAlt(map))
    }
}

fn shape_error(key: &str, expected: &str, found: &XmpRawValue) -> Error {
    Error::type_mismatch(format!("{key} holds {found:?}, not {expected}"))
}

/// An accessor shared between a container and the tags it hands out.
pub type SharedImage = Arc<Mutex<dyn ImageAccessor>>;

/// Non-owning handle a tag keeps on the accessor it writes through to.
pub(crate) type ImageRef = Weak<Mutex<dyn ImageAccessor>>;

pub(crate) fn share<A: ImageAccessor + 'static>(accessor: A) -> SharedImage {
    Arc::new(Mutex::new(accessor))
}

/// Lock an accessor, taking over a poisoned lock.
pub(crate) fn lock(image: &Mutex<dyn ImageAccessor>) -> MutexGuard<'_, dyn ImageAccessor + 'static> {
    image.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn structured_xmp_helpers() {
        let mut store = MemoryStore::new();
        store.set_text("Xmp.dc.format", "image/jpeg".into()).unwrap();
        store
            .set_array("Xmp.dc.subject", vec!["image".into(), "test".into()])
            .unwrap();
        let mut title = BTreeMap::new();
        title.insert("x-default".to_string(), "A title".to_string());
        store.set_lang_alt("Xmp.dc.title", title.clone()).unwrap();

        assert_eq!(store.text("Xmp.dc.format").unwrap(), "image/jpeg");
        assert_eq!(store.array("Xmp.dc.subject").unwrap(), ["image", "test"]);
        assert_eq!(store.lang_alt("Xmp.dc.title").unwrap(), title);
    }

    #[test]
    fn structured_xmp_helpers_check_shape() {
        let mut store = MemoryStore::new();
        store.set_text("Xmp.dc.format", "image/jpeg".into()).unwrap();
        assert!(store.array("Xmp.dc.format").unwrap_err().is_type_error());
        assert!(store.lang_alt("Xmp.dc.format").unwrap_err().is_type_error());
        assert!(store.text("Xmp.dc.title").unwrap_err().is_key_error());
    }

    #[test]
    fn shared_accessor_lock() {
        let image = share(MemoryStore::new());
        lock(&image).set_exif_raw("Exif.Image.Make", "Canon".into()).unwrap();
        assert_eq!(lock(&image).keys(Family::Exif), ["Exif.Image.Make"]);
    }
}
