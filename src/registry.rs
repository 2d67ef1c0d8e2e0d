//! Static reference data: the type of every known tag key.
//!
//! The builtin catalogue covers the commonly used keys of each family. It is
//! not exhaustive; a [`TagRegistry`] can be extended with extra descriptors
//! (see [`Config`](crate::config::Config)).

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, LazyLock};

use crate::convert::{IptcType, Semantic, TypeClass, XmpKind, XmpType};
use crate::error::{Error, Result};
use crate::family::{Family, validate_key};

/// How a key's values are typed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "family", rename_all = "lowercase")]
pub enum TagKind {
    Exif {
        class: TypeClass,
        #[serde(default)]
        semantic: Semantic,
    },
    Iptc {
        class: IptcType,
        #[serde(default)]
        repeatable: bool,
    },
    Xmp {
        kind: XmpKind,
    },
}

impl TagKind {
    pub fn family(&self) -> Family {
        match self {
            TagKind::Exif { .. } => Family::Exif,
            TagKind::Iptc { .. } => Family::Iptc,
            TagKind::Xmp { .. } => Family::Xmp,
        }
    }
}

/// One known key and its type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagDescriptor {
    pub key: String,
    pub kind: TagKind,
}

impl TagDescriptor {
    pub fn exif(key: &str, class: TypeClass, semantic: Semantic) -> Self {
        Self {
            key: key.to_string(),
            kind: TagKind::Exif { class, semantic },
        }
    }

    pub fn iptc(key: &str, class: IptcType, repeatable: bool) -> Self {
        Self {
            key: key.to_string(),
            kind: TagKind::Iptc { class, repeatable },
        }
    }

    pub fn xmp(key: &str, kind: XmpKind) -> Self {
        Self {
            key: key.to_string(),
            kind: TagKind::Xmp { kind },
        }
    }
}

use IptcType as I;
use Semantic as S;
use TypeClass as T;
use XmpKind as K;
use XmpType as X;

const EXIF_TAGS: &[(&str, TypeClass, Semantic)] = &[
    ("Exif.Image.ImageWidth", T::Long, S::Plain),
    ("Exif.Image.ImageLength", T::Long, S::Plain),
    ("Exif.Image.BitsPerSample", T::Short, S::Plain),
    ("Exif.Image.Compression", T::Short, S::Plain),
    ("Exif.Image.ImageDescription", T::Ascii, S::Plain),
    ("Exif.Image.Make", T::Ascii, S::Plain),
    ("Exif.Image.Model", T::Ascii, S::Plain),
    ("Exif.Image.Orientation", T::Short, S::Plain),
    ("Exif.Image.SamplesPerPixel", T::Short, S::Plain),
    ("Exif.Image.XResolution", T::Rational, S::Plain),
    ("Exif.Image.YResolution", T::Rational, S::Plain),
    ("Exif.Image.ResolutionUnit", T::Short, S::Plain),
    ("Exif.Image.Software", T::Ascii, S::Plain),
    ("Exif.Image.DateTime", T::Ascii, S::DateTime),
    ("Exif.Image.Artist", T::Ascii, S::Plain),
    ("Exif.Image.Rating", T::Short, S::Plain),
    ("Exif.Image.Copyright", T::Ascii, S::Plain),
    ("Exif.Image.ExifTag", T::Long, S::Plain),
    ("Exif.Image.GPSTag", T::Long, S::Plain),
    ("Exif.Image.BaselineExposure", T::SRational, S::Plain),
    ("Exif.Photo.ExposureTime", T::Rational, S::Plain),
    ("Exif.Photo.FNumber", T::Rational, S::Plain),
    ("Exif.Photo.ExposureProgram", T::Short, S::Plain),
    ("Exif.Photo.ISOSpeedRatings", T::Short, S::Plain),
    ("Exif.Photo.ExifVersion", T::Undefined, S::Version),
    ("Exif.Photo.DateTimeOriginal", T::Ascii, S::DateTime),
    ("Exif.Photo.DateTimeDigitized", T::Ascii, S::DateTime),
    ("Exif.Photo.ShutterSpeedValue", T::SRational, S::Plain),
    ("Exif.Photo.ApertureValue", T::Rational, S::Plain),
    ("Exif.Photo.BrightnessValue", T::SRational, S::Plain),
    ("Exif.Photo.ExposureBiasValue", T::SRational, S::Plain),
    ("Exif.Photo.MaxApertureValue", T::Rational, S::Plain),
    ("Exif.Photo.MeteringMode", T::Short, S::Plain),
    ("Exif.Photo.Flash", T::Short, S::Plain),
    ("Exif.Photo.FocalLength", T::Rational, S::Plain),
    ("Exif.Photo.MakerNote", T::Undefined, S::Plain),
    ("Exif.Photo.UserComment", T::Undefined, S::Plain),
    ("Exif.Photo.FlashpixVersion", T::Undefined, S::Version),
    ("Exif.Photo.ColorSpace", T::Short, S::Plain),
    ("Exif.Photo.PixelXDimension", T::Long, S::Plain),
    ("Exif.Photo.PixelYDimension", T::Long, S::Plain),
    ("Exif.Photo.ExposureMode", T::Short, S::Plain),
    ("Exif.Photo.WhiteBalance", T::Short, S::Plain),
    ("Exif.Photo.FocalLengthIn35mmFilm", T::Short, S::Plain),
    ("Exif.Photo.Sharpness", T::Short, S::Plain),
    ("Exif.Photo.LensModel", T::Ascii, S::Plain),
    ("Exif.GPSInfo.GPSVersionID", T::Byte, S::Plain),
    ("Exif.GPSInfo.GPSLatitudeRef", T::Ascii, S::Plain),
    ("Exif.GPSInfo.GPSLongitudeRef", T::Ascii, S::Plain),
    ("Exif.GPSInfo.GPSAltitudeRef", T::Byte, S::Plain),
    ("Exif.GPSInfo.GPSAltitude", T::Rational, S::Plain),
    ("Exif.GPSInfo.GPSDateStamp", T::Ascii, S::Date),
    ("Exif.Thumbnail.Compression", T::Short, S::Plain),
    ("Exif.Thumbnail.Orientation", T::Short, S::Plain),
    ("Exif.Thumbnail.XResolution", T::Rational, S::Plain),
    ("Exif.Thumbnail.YResolution", T::Rational, S::Plain),
    ("Exif.Thumbnail.ResolutionUnit", T::Short, S::Plain),
    ("Exif.Thumbnail.JPEGInterchangeFormat", T::Long, S::Plain),
    ("Exif.Thumbnail.JPEGInterchangeFormatLength", T::Long, S::Plain),
    ("Exif.Pentax.Temperature", T::SByte, S::Plain),
    ("Exif.OlympusCs.ManometerReading", T::SLong, S::Plain),
];

const IPTC_TAGS: &[(&str, IptcType, bool)] = &[
    ("Iptc.Envelope.ModelVersion", I::Short, false),
    ("Iptc.Envelope.DateSent", I::Date, false),
    ("Iptc.Envelope.TimeSent", I::Time, false),
    ("Iptc.Envelope.CharacterSet", I::Undefined, false),
    ("Iptc.Application2.RecordVersion", I::Short, false),
    ("Iptc.Application2.ObjectName", I::String, false),
    ("Iptc.Application2.Urgency", I::String, false),
    ("Iptc.Application2.Category", I::String, false),
    ("Iptc.Application2.SuppCategory", I::String, true),
    ("Iptc.Application2.FixtureId", I::String, false),
    ("Iptc.Application2.Keywords", I::String, true),
    ("Iptc.Application2.LocationCode", I::String, true),
    ("Iptc.Application2.LocationName", I::String, true),
    ("Iptc.Application2.SpecialInstructions", I::String, false),
    ("Iptc.Application2.DateCreated", I::Date, false),
    ("Iptc.Application2.TimeCreated", I::Time, false),
    ("Iptc.Application2.DigitizationDate", I::Date, false),
    ("Iptc.Application2.DigitizationTime", I::Time, false),
    ("Iptc.Application2.Program", I::String, false),
    ("Iptc.Application2.ProgramVersion", I::String, false),
    ("Iptc.Application2.Byline", I::String, true),
    ("Iptc.Application2.BylineTitle", I::String, true),
    ("Iptc.Application2.City", I::String, false),
    ("Iptc.Application2.SubLocation", I::String, false),
    ("Iptc.Application2.ProvinceState", I::String, false),
    ("Iptc.Application2.CountryCode", I::String, false),
    ("Iptc.Application2.CountryName", I::String, false),
    ("Iptc.Application2.TransmissionReference", I::String, false),
    ("Iptc.Application2.Headline", I::String, false),
    ("Iptc.Application2.Credit", I::String, false),
    ("Iptc.Application2.Source", I::String, false),
    ("Iptc.Application2.Copyright", I::String, false),
    ("Iptc.Application2.Contact", I::String, true),
    ("Iptc.Application2.Caption", I::String, false),
    ("Iptc.Application2.Writer", I::String, true),
    ("Iptc.Application2.Preview", I::Undefined, false),
];

const XMP_TAGS: &[(&str, XmpKind)] = &[
    ("Xmp.dc.contributor", K::Bag(X::Text)),
    ("Xmp.dc.coverage", K::Simple(X::Text)),
    ("Xmp.dc.creator", K::Seq(X::Text)),
    ("Xmp.dc.date", K::Seq(X::Date)),
    ("Xmp.dc.description", K::LangAlt),
    ("Xmp.dc.format", K::Simple(X::MimeType)),
    ("Xmp.dc.identifier", K::Simple(X::Text)),
    ("Xmp.dc.language", K::Bag(X::Text)),
    ("Xmp.dc.publisher", K::Bag(X::Text)),
    ("Xmp.dc.relation", K::Bag(X::Text)),
    ("Xmp.dc.rights", K::LangAlt),
    ("Xmp.dc.source", K::Simple(X::Text)),
    ("Xmp.dc.subject", K::Bag(X::Text)),
    ("Xmp.dc.title", K::LangAlt),
    ("Xmp.dc.type", K::Bag(X::Text)),
    ("Xmp.xmp.Advisory", K::Bag(X::Text)),
    ("Xmp.xmp.BaseURL", K::Simple(X::Text)),
    ("Xmp.xmp.CreateDate", K::Simple(X::Date)),
    ("Xmp.xmp.CreatorTool", K::Simple(X::Text)),
    ("Xmp.xmp.Identifier", K::Bag(X::Text)),
    ("Xmp.xmp.Label", K::Simple(X::Text)),
    ("Xmp.xmp.MetadataDate", K::Simple(X::Date)),
    ("Xmp.xmp.ModifyDate", K::Simple(X::Date)),
    ("Xmp.xmp.Rating", K::Simple(X::Integer)),
    ("Xmp.xmpRights.Certificate", K::Simple(X::Text)),
    ("Xmp.xmpRights.Marked", K::Simple(X::Boolean)),
    ("Xmp.xmpRights.Owner", K::Bag(X::Text)),
    ("Xmp.xmpRights.UsageTerms", K::LangAlt),
    ("Xmp.xmpRights.WebStatement", K::Simple(X::Text)),
    ("Xmp.xmpMM.DocumentID", K::Simple(X::Text)),
    ("Xmp.xmpMM.InstanceID", K::Simple(X::Text)),
    ("Xmp.photoshop.City", K::Simple(X::Text)),
    ("Xmp.photoshop.Country", K::Simple(X::Text)),
    ("Xmp.photoshop.Credit", K::Simple(X::Text)),
    ("Xmp.photoshop.DateCreated", K::Simple(X::Date)),
    ("Xmp.photoshop.Headline", K::Simple(X::Text)),
    ("Xmp.photoshop.CaptionWriter", K::Simple(X::Text)),
    ("Xmp.photoshop.Urgency", K::Simple(X::Integer)),
    ("Xmp.tiff.Orientation", K::Simple(X::Integer)),
    ("Xmp.tiff.Make", K::Simple(X::Text)),
    ("Xmp.tiff.Model", K::Simple(X::Text)),
    ("Xmp.tiff.XResolution", K::Simple(X::Rational)),
    ("Xmp.exif.ExposureTime", K::Simple(X::Rational)),
    ("Xmp.exif.FNumber", K::Simple(X::Rational)),
    ("Xmp.exif.DateTimeOriginal", K::Simple(X::Date)),
];

static BUILTIN: LazyLock<Arc<TagRegistry>> = LazyLock::new(|| {
    let descriptors = EXIF_TAGS
        .iter()
        .map(|&(key, class, semantic)| TagDescriptor::exif(key, class, semantic))
        .chain(
            IPTC_TAGS
                .iter()
                .map(|&(key, class, repeatable)| TagDescriptor::iptc(key, class, repeatable)),
        )
        .chain(XMP_TAGS.iter().map(|&(key, kind)| TagDescriptor::xmp(key, kind)));

    Arc::new(TagRegistry {
        tags: descriptors.map(|d| (d.key.clone(), d)).collect(),
    })
});

/// Lookup table from tag key to [`TagDescriptor`].
#[derive(Debug, Clone, Default)]
pub struct TagRegistry {
    tags: HashMap<String, TagDescriptor>,
}

impl TagRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// The shared builtin catalogue.
    pub fn builtin() -> &'static TagRegistry {
        &BUILTIN
    }

    pub(crate) fn shared_builtin() -> Arc<TagRegistry> {
        Arc::clone(&*BUILTIN)
    }

    /// The builtin catalogue extended with (and overridden by) `descriptors`.
    pub fn with_builtin<I: IntoIterator<Item = TagDescriptor>>(descriptors: I) -> Result<Self> {
        let mut registry = TagRegistry::builtin().clone();
        registry.extend(descriptors)?;
        Ok(registry)
    }

    /// Add or replace a descriptor.
    ///
    /// Fails if the key is malformed or its prefix disagrees with the
    /// descriptor's family.
    pub fn insert(&mut self, descriptor: TagDescriptor) -> Result<()> {
        let family = validate_key(&descriptor.key)?;
        if family != descriptor.kind.family() {
            return Err(Error::type_mismatch(format!(
                "{} is not a {} key",
                descriptor.key,
                descriptor.kind.family()
            )));
        }
        self.tags.insert(descriptor.key.clone(), descriptor);
        Ok(())
    }

    /// Add every descriptor in turn, stopping at the first invalid one.
    pub fn extend<I: IntoIterator<Item = TagDescriptor>>(&mut self, descriptors: I) -> Result<()> {
        descriptors.into_iter().try_for_each(|d| self.insert(d))
    }

    pub fn get(&self, key: &str) -> Option<&TagDescriptor> {
        self.tags.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.tags.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TagDescriptor> {
        self.tags.values()
    }

    /// Type class and semantic of an EXIF key.
    pub fn exif(&self, key: &str) -> Option<(TypeClass, Semantic)> {
        match self.get(key)?.kind {
            TagKind::Exif { class, semantic } => Some((class, semantic)),
            _ => None,
        }
    }

    /// Type and repeatability of an IPTC key.
    pub fn iptc(&self, key: &str) -> Option<(IptcType, bool)> {
        match self.get(key)?.kind {
            TagKind::Iptc { class, repeatable } => Some((class, repeatable)),
            _ => None,
        }
    }

    /// Structural kind of an XMP key.
    pub fn xmp(&self, key: &str) -> Option<XmpKind> {
        match self.get(key)?.kind {
            TagKind::Xmp { kind } => Some(kind),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_lookups() {
        let registry = TagRegistry::builtin();
        assert_eq!(
            registry.exif("Exif.Image.DateTime"),
            Some((TypeClass::Ascii, Semantic::DateTime))
        );
        assert_eq!(
            registry.exif("Exif.GPSInfo.GPSDateStamp"),
            Some((TypeClass::Ascii, Semantic::Date))
        );
        assert_eq!(registry.iptc("Iptc.Application2.Writer"), Some((IptcType::String, true)));
        assert_eq!(registry.xmp("Xmp.dc.title"), Some(XmpKind::LangAlt));
        assert_eq!(registry.xmp("Xmp.dc.subject"), Some(XmpKind::Bag(XmpType::Text)));
        assert!(registry.get("Xmp.xmp.Nickname").is_none());
        // Family-specific lookups don't cross families.
        assert!(registry.iptc("Exif.Image.Make").is_none());
    }

    #[test]
    fn builtin_keys_are_well_formed() {
        for descriptor in TagRegistry::builtin().iter() {
            let family = validate_key(&descriptor.key).unwrap();
            assert_eq!(family, descriptor.kind.family(), "{}", descriptor.key);
        }
        let total = EXIF_TAGS.len() + IPTC_TAGS.len() + XMP_TAGS.len();
        assert_eq!(TagRegistry::builtin().len(), total, "duplicate key in builtin tables");
    }

    #[test]
    fn insert_validates_family() {
        let mut registry = TagRegistry::new();
        assert!(registry.is_empty());
        registry
            .insert(TagDescriptor::xmp("Xmp.xmp.Nickname", XmpKind::Simple(XmpType::Text)))
            .unwrap();
        assert!(registry.contains("Xmp.xmp.Nickname"));

        let err = registry
            .insert(TagDescriptor::iptc("Exif.Image.Make", IptcType::String, false))
            .unwrap_err();
        assert!(err.is_type_error());
        assert!(registry.insert(TagDescriptor::xmp("Xmp.bad", XmpKind::LangAlt)).is_err());
    }

    #[test]
    fn descriptor_json() {
        let json = r#"{"key": "Exif.Image.Rating", "kind": {"family": "exif", "class": "Short"}}"#;
        let descriptor: TagDescriptor = serde_json::from_str(json).unwrap();
        assert_eq!(
            descriptor,
            TagDescriptor::exif("Exif.Image.Rating", TypeClass::Short, Semantic::Plain)
        );

        let json = r#"{"key": "Xmp.dc.subject", "kind": {"family": "xmp", "kind": {"Bag": "Text"}}}"#;
        let descriptor: TagDescriptor = serde_json::from_str(json).unwrap();
        assert_eq!(descriptor.kind, TagKind::Xmp { kind: XmpKind::Bag(XmpType::Text) });
    }
}
