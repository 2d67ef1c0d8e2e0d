use std::path::{Path, PathBuf};

use super::{ImageAccessor, MemoryStore};
use crate::convert::XmpRawValue;
use crate::error::Result;
use crate::family::Family;

#[derive(Debug, Clone)]
enum Source {
    File(PathBuf),
    Buffer(Vec<u8>),
}

/// An image whose metadata lives in a JSON snapshot of a [`MemoryStore`].
///
/// The snapshot is read on [`load`](ImageAccessor::load) and written on
/// [`save`](ImageAccessor::save); in between, every change stays in memory.
///
/// # Example
///
/// ```rust
/// use pixmeta::image::{ImageAccessor, SnapshotImage};
///
/// let mut image = SnapshotImage::from_buffer(Vec::new());
/// image.load().unwrap();
/// image.set_exif_raw("Exif.Image.Make", "Canon".into()).unwrap();
/// image.save().unwrap();
/// assert!(!image.buffer().unwrap().is_empty());
/// ```
#[derive(Debug, Clone)]
pub struct SnapshotImage {
    source: Source,
    store: MemoryStore,
}

impl SnapshotImage {
    /// A snapshot backed by a file. Nothing is read until `load`.
    pub fn open<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            source: Source::File(path.into()),
            store: MemoryStore::default(),
        }
    }

    /// A snapshot backed by an in-memory buffer. An empty buffer loads as an
    /// empty store.
    pub fn from_buffer(bytes: Vec<u8>) -> Self {
        Self {
            source: Source::Buffer(bytes),
            store: MemoryStore::default(),
        }
    }

    /// A file-backed snapshot pre-filled with `store`, ready to be saved.
    pub fn create<P: Into<PathBuf>>(path: P, store: MemoryStore) -> Self {
        Self {
            source: Source::File(path.into()),
            store,
        }
    }

    pub fn path(&self) -> Option<&Path> {
        match &self.source {
            Source::File(path) => Some(path),
            Source::Buffer(_) => None,
        }
    }

    pub fn buffer(&self) -> Option<&[u8]> {
        match &self.source {
            Source::File(_) => None,
            Source::Buffer(bytes) => Some(bytes),
        }
    }

    pub fn store(&self) -> &MemoryStore {
        &self.store
    }
}

fn parse(bytes: &[u8]) -> Result<MemoryStore> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(MemoryStore::default());
    }
    Ok(serde_json::from_slice(bytes)?)
}

impl ImageAccessor for SnapshotImage {
    fn load(&mut self) -> Result<()> {
        self.store = match &self.source {
            Source::File(path) => {
                let bytes = std::fs::read(path)?;
                log::debug!("Read snapshot {} ({} bytes)", path.display(), bytes.len());
                parse(&bytes)?
            }
            Source::Buffer(bytes) => parse(bytes)?,
        };
        Ok(())
    }

    fn save(&mut self) -> Result<()> {
        let json = self.store.to_json()?;
        match &mut self.source {
            Source::File(path) => {
                std::fs::write(&*path, json)?;
                log::debug!("Wrote snapshot {}", path.display());
            }
            Source::Buffer(bytes) => *bytes = json.into_bytes(),
        }
        Ok(())
    }

    fn keys(&self, family: Family) -> Vec<String> {
        self.store.keys(family)
    }

    fn contains(&self, family: Family, key: &str) -> bool {
        self.store.contains(family, key)
    }

    fn delete(&mut self, family: Family, key: &str) -> Result<()> {
        self.store.delete(family, key)
    }

    fn exif_raw(&self, key: &str) -> Result<String> {
        self.store.exif_raw(key)
    }

    fn set_exif_raw(&mut self, key: &str, raw: String) -> Result<()> {
        self.store.set_exif_raw(key, raw)
    }

    fn iptc_raw(&self, key: &str) -> Result<Vec<String>> {
        self.store.iptc_raw(key)
    }

    fn set_iptc_raw(&mut self, key: &str, raw: Vec<String>) -> Result<()> {
        self.store.set_iptc_raw(key, raw)
    }

    fn xmp_raw(&self, key: &str) -> Result<XmpRawValue> {
        self.store.xmp_raw(key)
    }

    fn set_xmp_raw(&mut self, key: &str, raw: XmpRawValue) -> Result<()> {
        self.store.set_xmp_raw(key, raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn missing_file_is_an_io_error() {
        let dir = TempDir::new().unwrap();
        let mut image = SnapshotImage::open(dir.path().join("absent.json"));
        assert!(matches!(image.load(), Err(Error::Io(_))));
    }

    #[test]
    fn file_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("photo.meta.json");
        fs::write(&path, "").unwrap();

        let mut image = SnapshotImage::open(&path);
        image.load().unwrap();
        assert!(image.store().is_empty());
        image.set_exif_raw("Exif.Image.Make", "Canon".into()).unwrap();
        image
            .set_iptc_raw("Iptc.Application2.Caption", vec!["blabla".into()])
            .unwrap();
        image.save().unwrap();

        let mut reopened = SnapshotImage::open(&path);
        reopened.load().unwrap();
        assert_eq!(reopened.exif_raw("Exif.Image.Make").unwrap(), "Canon");
        assert_eq!(reopened.iptc_raw("Iptc.Application2.Caption").unwrap(), ["blabla"]);
        assert_eq!(reopened.path(), Some(path.as_path()));
        assert!(reopened.buffer().is_none());
    }

    #[test]
    fn load_discards_unsaved_changes() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("photo.meta.json");
        let mut store = MemoryStore::new();
        store.set_exif_raw("Exif.Image.Make", "Canon".into()).unwrap();
        SnapshotImage::create(&path, store).save().unwrap();

        let mut image = SnapshotImage::open(&path);
        image.load().unwrap();
        image.delete(Family::Exif, "Exif.Image.Make").unwrap();
        image.load().unwrap();
        assert!(image.contains(Family::Exif, "Exif.Image.Make"));
    }

    #[test]
    fn buffer_backed() {
        let mut image = SnapshotImage::from_buffer(Vec::new());
        image.load().unwrap();
        assert!(image.keys(Family::Xmp).is_empty());

        image
            .set_xmp_raw("Xmp.dc.format", XmpRawValue::Text("image/png".into()))
            .unwrap();
        image.save().unwrap();
        let saved = image.buffer().unwrap().to_vec();

        let mut copy = SnapshotImage::from_buffer(saved);
        copy.load().unwrap();
        assert_eq!(copy.text("Xmp.dc.format").unwrap(), "image/png");
    }

    #[test]
    fn corrupt_snapshot() {
        let mut image = SnapshotImage::from_buffer(b"\x89PNG".to_vec());
        assert!(matches!(image.load(), Err(Error::Snapshot(_))));
    }
}
