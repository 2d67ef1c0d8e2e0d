//! EXIF import from real image files.

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDateTime};
use nom_exif::*;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use super::{ImageAccessor, MemoryStore, SnapshotImage};
use crate::convert::{Semantic, TypeClass, exif};
use crate::registry::TagRegistry;

const EXIF_DATETIME: &str = "%Y:%m:%d %H:%M:%S";

/// Containers nom-exif reads an EXIF block from.
const EXIF_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "tif", "tiff", "heic", "heif", "png", "webp", "dng", "nef", "arw", "cr2",
];

// (key, IFD index, tag code). Exif sub-IFD entries are reported under IFD0.
const EXIF_ENTRIES: &[(&str, usize, u16)] = &[
    ("Exif.Image.ImageWidth", 0, 0x0100),
    ("Exif.Image.ImageLength", 0, 0x0101),
    ("Exif.Image.ImageDescription", 0, 0x010E),
    ("Exif.Image.Make", 0, 0x010F),
    ("Exif.Image.Model", 0, 0x0110),
    ("Exif.Image.Orientation", 0, 0x0112),
    ("Exif.Image.XResolution", 0, 0x011A),
    ("Exif.Image.YResolution", 0, 0x011B),
    ("Exif.Image.ResolutionUnit", 0, 0x0128),
    ("Exif.Image.Software", 0, 0x0131),
    ("Exif.Image.DateTime", 0, 0x0132),
    ("Exif.Image.Artist", 0, 0x013B),
    ("Exif.Image.Copyright", 0, 0x8298),
    ("Exif.Photo.ExposureTime", 0, 0x829A),
    ("Exif.Photo.FNumber", 0, 0x829D),
    ("Exif.Photo.ExposureProgram", 0, 0x8822),
    ("Exif.Photo.ISOSpeedRatings", 0, 0x8827),
    ("Exif.Photo.DateTimeOriginal", 0, 0x9003),
    ("Exif.Photo.DateTimeDigitized", 0, 0x9004),
    ("Exif.Photo.ShutterSpeedValue", 0, 0x9201),
    ("Exif.Photo.ApertureValue", 0, 0x9202),
    ("Exif.Photo.BrightnessValue", 0, 0x9203),
    ("Exif.Photo.ExposureBiasValue", 0, 0x9204),
    ("Exif.Photo.MaxApertureValue", 0, 0x9205),
    ("Exif.Photo.MeteringMode", 0, 0x9207),
    ("Exif.Photo.Flash", 0, 0x9209),
    ("Exif.Photo.FocalLength", 0, 0x920A),
    ("Exif.Photo.ColorSpace", 0, 0xA001),
    ("Exif.Photo.PixelXDimension", 0, 0xA002),
    ("Exif.Photo.PixelYDimension", 0, 0xA003),
    ("Exif.Photo.ExposureMode", 0, 0xA402),
    ("Exif.Photo.WhiteBalance", 0, 0xA403),
    ("Exif.Photo.FocalLengthIn35mmFilm", 0, 0xA405),
    ("Exif.Photo.Sharpness", 0, 0xA40A),
    ("Exif.Photo.LensModel", 0, 0xA434),
    ("Exif.Thumbnail.Compression", 1, 0x0103),
    ("Exif.Thumbnail.Orientation", 1, 0x0112),
    ("Exif.Thumbnail.XResolution", 1, 0x011A),
    ("Exif.Thumbnail.YResolution", 1, 0x011B),
    ("Exif.Thumbnail.ResolutionUnit", 1, 0x0128),
];

/// Read the EXIF block of an image file into a [`MemoryStore`].
///
/// Only entries whose rendering is valid for the key's type class are kept;
/// the rest are skipped with a debug log. An image without EXIF data yields
/// an empty store.
///
/// ```rust,no_run
/// use pixmeta::image::import::import_exif;
/// use pixmeta::registry::TagRegistry;
/// use std::path::Path;
///
/// let store = import_exif(Path::new("photo.jpg"), TagRegistry::builtin()).unwrap();
/// println!("{:?}", store);
/// ```
pub fn import_exif(path: &Path, registry: &TagRegistry) -> Result<MemoryStore> {
    let mut parser = MediaParser::new();
    let ms = MediaSource::file_path(path).context("Failed to open image file")?;
    let mut store = MemoryStore::new();

    let iter: ExifIter = match parser.parse(ms) {
        Ok(iter) => iter,
        Err(_) => {
            log::debug!("No EXIF data found in {}", path.display());
            return Ok(store);
        }
    };
    let parsed: Exif = iter.into();

    for &(key, ifd, code) in EXIF_ENTRIES {
        let Some(val) = parsed.get_by_ifd_tag_code(ifd, code) else {
            continue;
        };
        let (class, semantic) = registry
            .exif(key)
            .unwrap_or((TypeClass::Undefined, Semantic::Plain));
        let Some(raw) = normalize(&val.to_string(), semantic) else {
            continue;
        };
        if let Err(e) = exif::to_native(class, semantic, &raw) {
            log::debug!("Skipping {key} in {}: {e}", path.display());
            continue;
        }
        store
            .set_exif_raw(key, raw)
            .with_context(|| format!("Failed to store {key}"))?;
    }

    log::info!(
        "Imported {} EXIF tag(s) from {}",
        store.len(crate::Family::Exif),
        path.display()
    );
    Ok(store)
}

/// One image to import and the snapshot it lands in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportJob {
    pub image: PathBuf,
    pub snapshot: PathBuf,
}

impl ImportJob {
    fn for_image(image: PathBuf) -> Self {
        let snapshot = snapshot_path(&image);
        Self { image, snapshot }
    }

    /// Import the image and write its snapshot.
    pub fn run(&self, registry: &TagRegistry) -> Result<()> {
        let store = import_exif(&self.image, registry)?;
        let mut snapshot = SnapshotImage::create(&self.snapshot, store);
        snapshot
            .save()
            .with_context(|| format!("Failed to write {}", self.snapshot.display()))
    }
}

/// Plan imports for a list of image files and directories, walked
/// recursively. Images that already have a snapshot are left out unless
/// `overwrite` is set. Jobs come back sorted by image path.
pub fn plan_imports(paths: &[PathBuf], overwrite: bool) -> Vec<ImportJob> {
    let mut candidates = Vec::new();
    for path in paths {
        if path.is_dir() {
            candidates.extend(
                WalkDir::new(path)
                    .follow_links(true)
                    .into_iter()
                    .filter_map(|e| e.ok())
                    .map(walkdir::DirEntry::into_path)
                    .filter(|p| p.is_file() && is_importable(p)),
            );
        } else if !path.exists() {
            log::warn!("Path does not exist: {}", path.display());
        } else if is_importable(path) {
            candidates.push(path.clone());
        } else {
            log::warn!("Skipping unsupported file: {}", path.display());
        }
    }
    candidates.sort();
    candidates.dedup();

    candidates
        .into_iter()
        .map(ImportJob::for_image)
        .filter(|job| {
            let fresh = overwrite || !job.snapshot.exists();
            if !fresh {
                log::info!("Already imported: {}", job.image.display());
            }
            fresh
        })
        .collect()
}

fn is_importable(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| EXIF_EXTENSIONS.iter().any(|known| known.eq_ignore_ascii_case(ext)))
}

/// Where the snapshot of an imported image goes: `photo.jpg` becomes
/// `photo.jpg.meta.json`.
pub fn snapshot_path(image: &Path) -> PathBuf {
    let mut name = image.as_os_str().to_os_string();
    name.push(".meta.json");
    PathBuf::from(name)
}

/// Turn a nom-exif rendering into an EXIF raw string.
fn normalize(rendered: &str, semantic: Semantic) -> Option<String> {
    let s = rendered.trim().trim_matches('"');
    // Rationals render as "n/d (decimal)".
    let s = s.split(" (").next().unwrap_or(s).trim();
    if s.is_empty() {
        return None;
    }
    if semantic == Semantic::DateTime {
        if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
            return Some(dt.format(EXIF_DATETIME).to_string());
        }
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S") {
            return Some(dt.format(EXIF_DATETIME).to_string());
        }
    }
    Some(s.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Family;
    use std::collections::HashSet;
    use std::fs;
    use tempfile::TempDir;

    // ── normalize ────────────────────────────────────────────────────

    #[test]
    fn normalize_text_and_rationals() {
        assert_eq!(normalize("\"Canon\"", Semantic::Plain).unwrap(), "Canon");
        assert_eq!(normalize("1/100 (0.0100)", Semantic::Plain).unwrap(), "1/100");
        assert_eq!(normalize("-1/3 (-0.3333)", Semantic::Plain).unwrap(), "-1/3");
        assert!(normalize("  ", Semantic::Plain).is_none());
        assert!(normalize("\"\"", Semantic::Plain).is_none());
    }

    #[test]
    fn normalize_datetimes() {
        assert_eq!(
            normalize("2009-02-09T13:33:20+01:00", Semantic::DateTime).unwrap(),
            "2009:02:09 13:33:20"
        );
        assert_eq!(
            normalize("2009-02-09T13:33:20", Semantic::DateTime).unwrap(),
            "2009:02:09 13:33:20"
        );
        // Already in EXIF form, or not a date at all.
        assert_eq!(
            normalize("2009:02:09 13:33:20", Semantic::DateTime).unwrap(),
            "2009:02:09 13:33:20"
        );
        assert_eq!(normalize("2009-02-09T13:33:20", Semantic::Plain).unwrap(), "2009-02-09T13:33:20");
    }

    #[test]
    fn entry_table_is_consistent() {
        let registry = TagRegistry::builtin();
        let mut seen = HashSet::new();
        for &(key, ifd, code) in EXIF_ENTRIES {
            assert!(registry.exif(key).is_some(), "{key} not in registry");
            assert!(seen.insert((ifd, code)), "{key} duplicates {ifd}/{code:#06x}");
            assert_eq!(ifd == 1, key.starts_with("Exif.Thumbnail."), "{key}");
        }
    }

    // ── plan_imports ─────────────────────────────────────────────────

    #[test]
    fn plan_pairs_images_with_snapshots() {
        let dir = TempDir::new().unwrap();
        let jpg = dir.path().join("shot.JPG");
        let notes = dir.path().join("notes.txt");
        fs::write(&jpg, b"fake").unwrap();
        fs::write(&notes, b"hello").unwrap();

        let jobs = plan_imports(&[jpg.clone(), notes], false);
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].image, jpg);
        assert_eq!(jobs[0].snapshot, dir.path().join("shot.JPG.meta.json"));
        assert!(plan_imports(&[PathBuf::from("/nonexistent/path")], false).is_empty());
    }

    #[test]
    fn plan_skips_imported_unless_overwrite() {
        let dir = TempDir::new().unwrap();
        let raw = dir.path().join("raw");
        fs::create_dir(&raw).unwrap();
        fs::write(dir.path().join("a.jpg"), b"fake").unwrap();
        fs::write(raw.join("b.dng"), b"fake").unwrap();
        fs::write(raw.join("b.dng.meta.json"), b"{}").unwrap();

        let roots = [dir.path().to_path_buf(), raw.join("b.dng")];
        let fresh = plan_imports(&roots, false);
        assert_eq!(fresh.len(), 1);
        assert!(fresh[0].image.ends_with("a.jpg"));

        // A file reached twice is planned once.
        assert_eq!(plan_imports(&roots, true).len(), 2);
    }

    #[test]
    fn job_writes_empty_snapshot_for_non_image() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("fake.jpg");
        fs::write(&path, b"not an image").unwrap();
        let jobs = plan_imports(&[path], false);
        if jobs[0].run(TagRegistry::builtin()).is_ok() {
            let mut snapshot = SnapshotImage::open(&jobs[0].snapshot);
            snapshot.load().unwrap();
            assert_eq!(snapshot.store().len(Family::Exif), 0);
        }
    }

    #[test]
    fn snapshot_path_appends_suffix() {
        assert_eq!(
            snapshot_path(Path::new("/photos/a.jpg")),
            PathBuf::from("/photos/a.jpg.meta.json")
        );
    }

    // ── import_exif ──────────────────────────────────────────────────

    #[test]
    fn import_missing_file_fails() {
        let dir = TempDir::new().unwrap();
        let result = import_exif(&dir.path().join("absent.jpg"), TagRegistry::builtin());
        assert!(result.is_err());
    }

    #[test]
    fn import_non_image_fails_or_is_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("fake.jpg");
        fs::write(&path, b"not an image").unwrap();
        if let Ok(store) = import_exif(&path, TagRegistry::builtin()) {
            assert_eq!(store.len(Family::Exif), 0);
        }
    }
}
