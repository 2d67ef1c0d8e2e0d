//! Typed tags for each metadata family.
//!
//! - [`ExifTag`]: one raw string and its native value
//! - [`IptcTag`]: a sequence of raw datasets and native values
//! - [`XmpTag`]: a simple, array or lang-alt raw value and its native form
//!
//! [`Tag`] owns a tag of any family; [`TagRef`] borrows one from an
//! [`ImageMetadata`](crate::ImageMetadata) cache.

mod exif;
mod iptc;
mod xmp;

pub use exif::ExifTag;
pub use iptc::IptcTag;
pub use xmp::XmpTag;

use crate::error::Result;
use crate::family::Family;
use crate::value::Value;

/// A tag of any family.
#[derive(Debug, Clone, PartialEq)]
pub enum Tag {
    Exif(ExifTag),
    Iptc(IptcTag),
    Xmp(XmpTag),
}

impl Tag {
    pub fn key(&self) -> &str {
        match self {
            Tag::Exif(tag) => tag.key(),
            Tag::Iptc(tag) => tag.key(),
            Tag::Xmp(tag) => tag.key(),
        }
    }

    pub fn family(&self) -> Family {
        match self {
            Tag::Exif(_) => Family::Exif,
            Tag::Iptc(_) => Family::Iptc,
            Tag::Xmp(_) => Family::Xmp,
        }
    }
}

impl From<ExifTag> for Tag {
    fn from(tag: ExifTag) -> Self {
        Tag::Exif(tag)
    }
}

impl From<IptcTag> for Tag {
    fn from(tag: IptcTag) -> Self {
        Tag::Iptc(tag)
    }
}

impl From<XmpTag> for Tag {
    fn from(tag: XmpTag) -> Self {
        Tag::Xmp(tag)
    }
}

/// A cached tag borrowed from a metadata container.
#[derive(Debug)]
pub enum TagRef<'a> {
    Exif(&'a mut ExifTag),
    Iptc(&'a mut IptcTag),
    Xmp(&'a mut XmpTag),
}

impl<'a> TagRef<'a> {
    pub fn key(&self) -> &str {
        match self {
            TagRef::Exif(tag) => tag.key(),
            TagRef::Iptc(tag) => tag.key(),
            TagRef::Xmp(tag) => tag.key(),
        }
    }

    pub fn family(&self) -> Family {
        match self {
            TagRef::Exif(_) => Family::Exif,
            TagRef::Iptc(_) => Family::Iptc,
            TagRef::Xmp(_) => Family::Xmp,
        }
    }

    /// The native value. IPTC values come back as a [`Value::Array`].
    pub fn value(&self) -> Result<Value> {
        match self {
            TagRef::Exif(tag) => tag.value().cloned(),
            TagRef::Iptc(tag) => tag.values().map(|values| Value::Array(values.to_vec())),
            TagRef::Xmp(tag) => tag.value().cloned(),
        }
    }

    /// Raw representation for display.
    pub fn raw_display(&self) -> String {
        match self {
            TagRef::Exif(tag) => tag.raw_value().to_string(),
            TagRef::Iptc(tag) => tag.raw_values().join(", "),
            TagRef::Xmp(tag) => format!("{:?}", tag.raw_value()),
        }
    }

    pub fn into_exif(self) -> Option<&'a mut ExifTag> {
        match self {
            TagRef::Exif(tag) => Some(tag),
            _ => None,
        }
    }

    pub fn into_iptc(self) -> Option<&'a mut IptcTag> {
        match self {
            TagRef::Iptc(tag) => Some(tag),
            _ => None,
        }
    }

    pub fn into_xmp(self) -> Option<&'a mut XmpTag> {
        match self {
            TagRef::Xmp(tag) => Some(tag),
            _ => None,
        }
    }

    /// An owned, unbound copy of the tag. Changing it leaves the image
    /// alone; assign it back through the container to write it.
    pub fn to_tag(&self) -> Tag {
        match self {
            TagRef::Exif(tag) => Tag::Exif(tag.detached()),
            TagRef::Iptc(tag) => Tag::Iptc(tag.detached()),
            TagRef::Xmp(tag) => Tag::Xmp(tag.detached()),
        }
    }
}

/// Input to a family setter: a fully formed tag, or a bare value to wrap
/// into a tag of the key's registered type.
#[derive(Debug, Clone, PartialEq)]
pub enum Entry<T, V> {
    Tag(T),
    Value(V),
}

pub type ExifEntry = Entry<ExifTag, Value>;
pub type IptcEntry = Entry<IptcTag, Vec<Value>>;
pub type XmpEntry = Entry<XmpTag, Value>;

impl From<ExifTag> for ExifEntry {
    fn from(tag: ExifTag) -> Self {
        Entry::Tag(tag)
    }
}

impl<V: Into<Value>> From<V> for ExifEntry {
    fn from(value: V) -> Self {
        Entry::Value(value.into())
    }
}

impl From<IptcTag> for IptcEntry {
    fn from(tag: IptcTag) -> Self {
        Entry::Tag(tag)
    }
}

impl<V: Into<Value>> From<Vec<V>> for IptcEntry {
    fn from(values: Vec<V>) -> Self {
        Entry::Value(values.into_iter().map(Into::into).collect())
    }
}

impl<V: Into<Value>, const N: usize> From<[V; N]> for IptcEntry {
    fn from(values: [V; N]) -> Self {
        Entry::Value(values.into_iter().map(Into::into).collect())
    }
}

impl From<XmpTag> for XmpEntry {
    fn from(tag: XmpTag) -> Self {
        Entry::Tag(tag)
    }
}

impl<V: Into<Value>> From<V> for XmpEntry {
    fn from(value: V) -> Self {
        Entry::Value(value.into())
    }
}

/// Input to the key-dispatched [`ImageMetadata::set`](crate::ImageMetadata::set).
///
/// For IPTC keys a [`Value::Array`] is taken as the sequence of values and
/// any other value as a single-element sequence.
#[derive(Debug, Clone, PartialEq)]
pub enum Assignment {
    Tag(Tag),
    Value(Value),
}

impl From<Tag> for Assignment {
    fn from(tag: Tag) -> Self {
        Assignment::Tag(tag)
    }
}

impl From<ExifTag> for Assignment {
    fn from(tag: ExifTag) -> Self {
        Assignment::Tag(Tag::Exif(tag))
    }
}

impl From<IptcTag> for Assignment {
    fn from(tag: IptcTag) -> Self {
        Assignment::Tag(Tag::Iptc(tag))
    }
}

impl From<XmpTag> for Assignment {
    fn from(tag: XmpTag) -> Self {
        Assignment::Tag(Tag::Xmp(tag))
    }
}

impl<V: Into<Value>> From<V> for Assignment {
    fn from(value: V) -> Self {
        Assignment::Value(value.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tag_family_and_key() {
        let tag = Tag::from(ExifTag::new("Exif.Image.Make", "Canon").unwrap());
        assert_eq!(tag.family(), Family::Exif);
        assert_eq!(tag.key(), "Exif.Image.Make");
        let tag = Tag::from(IptcTag::new("Iptc.Application2.City", ["Paris"]).unwrap());
        assert_eq!(tag.family(), Family::Iptc);
    }

    #[test]
    fn entries_from_values_and_tags() {
        assert_eq!(ExifEntry::from(1), Entry::Value(Value::Integer(1)));
        let tag = ExifTag::new("Exif.Image.Make", "Canon").unwrap();
        assert!(matches!(ExifEntry::from(tag), Entry::Tag(_)));

        assert_eq!(
            IptcEntry::from(["a", "b"]),
            Entry::Value(vec![Value::from("a"), Value::from("b")])
        );
        assert_eq!(IptcEntry::from(vec![3]), Entry::Value(vec![Value::Integer(3)]));
        assert!(matches!(XmpEntry::from(Value::array(["x"])), Entry::Value(Value::Array(_))));
    }

    #[test]
    fn assignment_from() {
        assert_eq!(Assignment::from("text"), Assignment::Value(Value::from("text")));
        let tag = XmpTag::new("Xmp.xmp.Label", "red").unwrap();
        assert!(matches!(Assignment::from(tag), Assignment::Tag(Tag::Xmp(_))));
    }

    #[test]
    fn tag_ref_accessors() {
        let mut exif = ExifTag::new("Exif.Image.Orientation", 1).unwrap();
        let tag_ref = TagRef::Exif(&mut exif);
        assert_eq!(tag_ref.value().unwrap(), Value::Integer(1));
        assert_eq!(tag_ref.raw_display(), "1");
        assert!(tag_ref.into_iptc().is_none());

        let mut iptc = IptcTag::new("Iptc.Application2.Keywords", ["a", "b"]).unwrap();
        let tag_ref = TagRef::Iptc(&mut iptc);
        assert_eq!(tag_ref.value().unwrap(), Value::array(["a", "b"]));
        assert_eq!(tag_ref.raw_display(), "a, b");
        assert!(matches!(tag_ref.to_tag(), Tag::Iptc(_)));
        assert!(tag_ref.into_iptc().is_some());
    }
}
