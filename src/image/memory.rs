use serde::{Deserialize, Serialize};

use super::ImageAccessor;
use crate::convert::XmpRawValue;
use crate::error::{Error, Result};
use crate::family::Family;

/// An in-memory metadata store.
///
/// Each family is an ordered list of `(key, raw)` entries: new keys are
/// appended, existing keys are overwritten in place. The store is what a
/// [`SnapshotImage`](super::SnapshotImage) serializes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryStore {
    #[serde(default)]
    exif: Vec<(String, String)>,
    #[serde(default)]
    iptc: Vec<(String, Vec<String>)>,
    #[serde(default)]
    xmp: Vec<(String, XmpRawValue)>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys in one family.
    pub fn len(&self, family: Family) -> usize {
        match family {
            Family::Exif => self.exif.len(),
            Family::Iptc => self.iptc.len(),
            Family::Xmp => self.xmp.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.exif.is_empty() && self.iptc.is_empty() && self.xmp.is_empty()
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

fn find<'a, T>(entries: &'a [(String, T)], key: &str) -> Option<&'a T> {
    entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
}

fn upsert<T>(entries: &mut Vec<(String, T)>, key: &str, value: T) {
    match entries.iter_mut().find(|(k, _)| k == key) {
        Some((_, slot)) => *slot = value,
        None => entries.push((key.to_string(), value)),
    }
}

fn remove<T>(entries: &mut Vec<(String, T)>, key: &str) -> Result<()> {
    let pos = entries
        .iter()
        .position(|(k, _)| k == key)
        .ok_or_else(|| Error::key_not_found(key))?;
    entries.remove(pos);
    Ok(())
}

fn keys_of<T>(entries: &[(String, T)]) -> Vec<String> {
    entries.iter().map(|(k, _)| k.clone()).collect()
}

impl ImageAccessor for MemoryStore {
    fn load(&mut self) -> Result<()> {
        Ok(())
    }

    fn save(&mut self) -> Result<()> {
        Ok(())
    }

    fn keys(&self, family: Family) -> Vec<String> {
        match family {
            Family::Exif => keys_of(&self.exif),
            Family::Iptc => keys_of(&self.iptc),
            Family::Xmp => keys_of(&self.xmp),
        }
    }

    fn contains(&self, family: Family, key: &str) -> bool {
        match family {
            Family::Exif => find(&self.exif, key).is_some(),
            Family::Iptc => find(&self.iptc, key).is_some(),
            Family::Xmp => find(&self.xmp, key).is_some(),
        }
    }

    fn delete(&mut self, family: Family, key: &str) -> Result<()> {
        match family {
            Family::Exif => remove(&mut self.exif, key),
            Family::Iptc => remove(&mut self.iptc, key),
            Family::Xmp => remove(&mut self.xmp, key),
        }
    }

    fn exif_raw(&self, key: &str) -> Result<String> {
        find(&self.exif, key)
            .cloned()
            .ok_or_else(|| Error::key_not_found(key))
    }

    fn set_exif_raw(&mut self, key: &str, raw: String) -> Result<()> {
        upsert(&mut self.exif, key, raw);
        Ok(())
    }

    fn iptc_raw(&self, key: &str) -> Result<Vec<String>> {
        find(&self.iptc, key)
            .cloned()
            .ok_or_else(|| Error::key_not_found(key))
    }

    fn set_iptc_raw(&mut self, key: &str, raw: Vec<String>) -> Result<()> {
        upsert(&mut self.iptc, key, raw);
        Ok(())
    }

    fn xmp_raw(&self, key: &str) -> Result<XmpRawValue> {
        find(&self.xmp, key)
            .cloned()
            .ok_or_else(|| Error::key_not_found(key))
    }

    fn set_xmp_raw(&mut self, key: &str, raw: XmpRawValue) -> Result<()> {
        upsert(&mut self.xmp, key, raw);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_insertion_order_and_overwrites_in_place() {
        let mut store = MemoryStore::new();
        store.set_exif_raw("Exif.Image.Make", "Canon".into()).unwrap();
        store.set_exif_raw("Exif.Image.Model", "EOS".into()).unwrap();
        store.set_exif_raw("Exif.Image.Make", "Nikon".into()).unwrap();

        assert_eq!(store.keys(Family::Exif), ["Exif.Image.Make", "Exif.Image.Model"]);
        assert_eq!(store.exif_raw("Exif.Image.Make").unwrap(), "Nikon");
        assert_eq!(store.len(Family::Exif), 2);
        assert_eq!(store.len(Family::Iptc), 0);
    }

    #[test]
    fn missing_keys() {
        let mut store = MemoryStore::new();
        assert!(store.is_empty());
        assert!(store.exif_raw("Exif.Image.Make").unwrap_err().is_key_error());
        assert!(store.iptc_raw("Iptc.Application2.Caption").unwrap_err().is_key_error());
        assert!(store.delete(Family::Xmp, "Xmp.dc.subject").unwrap_err().is_key_error());
    }

    #[test]
    fn delete_removes_only_that_key() {
        let mut store = MemoryStore::new();
        store.set_iptc_raw("Iptc.Application2.Caption", vec!["blabla".into()]).unwrap();
        store
            .set_iptc_raw("Iptc.Application2.Keywords", vec!["a".into(), "b".into()])
            .unwrap();
        store.delete(Family::Iptc, "Iptc.Application2.Caption").unwrap();

        assert!(!store.contains(Family::Iptc, "Iptc.Application2.Caption"));
        assert_eq!(store.keys(Family::Iptc), ["Iptc.Application2.Keywords"]);
    }

    #[test]
    fn json_snapshot() {
        let mut store = MemoryStore::new();
        store.set_exif_raw("Exif.Image.Make", "Canon".into()).unwrap();
        store
            .set_xmp_raw("Xmp.dc.subject", XmpRawValue::Array(vec!["sea".into()]))
            .unwrap();

        let json = store.to_json().unwrap();
        assert!(json.contains("\"array\""));
        assert_eq!(MemoryStore::from_json(&json).unwrap(), store);

        // Families may be omitted.
        let partial = MemoryStore::from_json(r#"{"exif": [["Exif.Image.Make", "Canon"]]}"#).unwrap();
        assert_eq!(partial.exif_raw("Exif.Image.Make").unwrap(), "Canon");
        assert!(MemoryStore::from_json("not json").is_err());
    }
}
