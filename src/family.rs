use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// One of the three metadata namespaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Family {
    Exif,
    Iptc,
    Xmp,
}

impl Family {
    pub const ALL: [Family; 3] = [Family::Exif, Family::Iptc, Family::Xmp];

    /// Determine the family of a dotted key from its leading component.
    ///
    /// ```rust
    /// use pixmeta::Family;
    ///
    /// assert_eq!(Family::of_key("Exif.Image.Make").unwrap(), Family::Exif);
    /// assert!(Family::of_key("Wrong.Noluck.Raise").is_err());
    /// ```
    pub fn of_key(key: &str) -> Result<Self> {
        let prefix = key.split('.').next().unwrap_or_default();
        match prefix {
            "Exif" => Ok(Family::Exif),
            "Iptc" => Ok(Family::Iptc),
            "Xmp" => Ok(Family::Xmp),
            _ => Err(Error::InvalidKey(key.to_string())),
        }
    }

    /// The key prefix for this family.
    pub fn prefix(&self) -> &'static str {
        match self {
            Family::Exif => "Exif",
            Family::Iptc => "Iptc",
            Family::Xmp => "Xmp",
        }
    }
}

impl fmt::Display for Family {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Family::Exif => "exif",
            Family::Iptc => "iptc",
            Family::Xmp => "xmp",
        })
    }
}

impl FromStr for Family {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "exif" => Ok(Family::Exif),
            "iptc" => Ok(Family::Iptc),
            "xmp" => Ok(Family::Xmp),
            _ => Err(Error::InvalidKey(s.to_string())),
        }
    }
}

/// Check that `key` has the `Family.Group.Name` shape and return its family.
pub(crate) fn validate_key(key: &str) -> Result<Family> {
    let family = Family::of_key(key)?;
    let well_formed = key.splitn(3, '.').filter(|p| !p.is_empty()).count() == 3;
    if !well_formed {
        return Err(Error::InvalidKey(key.to_string()));
    }
    Ok(family)
}

/// A selection of families, used by metadata copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Families {
    pub exif: bool,
    pub iptc: bool,
    pub xmp: bool,
}

impl Families {
    pub fn all() -> Self {
        Self {
            exif: true,
            iptc: true,
            xmp: true,
        }
    }

    pub fn none() -> Self {
        Self {
            exif: false,
            iptc: false,
            xmp: false,
        }
    }

    pub fn contains(&self, family: Family) -> bool {
        match family {
            Family::Exif => self.exif,
            Family::Iptc => self.iptc,
            Family::Xmp => self.xmp,
        }
    }

    /// The selected families, in `Exif`, `Iptc`, `Xmp` order.
    pub fn iter(self) -> impl Iterator<Item = Family> {
        Family::ALL.into_iter().filter(move |f| self.contains(*f))
    }
}

impl Default for Families {
    fn default() -> Self {
        Self::all()
    }
}

impl From<Family> for Families {
    fn from(family: Family) -> Self {
        let mut families = Families::none();
        match family {
            Family::Exif => families.exif = true,
            Family::Iptc => families.iptc = true,
            Family::Xmp => families.xmp = true,
        }
        families
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn family_of_key() {
        assert_eq!(Family::of_key("Exif.Image.Make").unwrap(), Family::Exif);
        assert_eq!(Family::of_key("Iptc.Application2.Caption").unwrap(), Family::Iptc);
        assert_eq!(Family::of_key("Xmp.dc.subject").unwrap(), Family::Xmp);
        assert!(Family::of_key("Wrong.Noluck.Raise").unwrap_err().is_key_error());
        assert!(Family::of_key("").is_err());
        assert!(Family::of_key("exif.Image.Make").is_err());
    }

    #[test]
    fn key_shape() {
        assert_eq!(validate_key("Xmp.xmpMM.History[1]/stEvt:action").unwrap(), Family::Xmp);
        assert!(validate_key("Exif.Image").is_err());
        assert!(validate_key("Exif..Make").is_err());
        assert!(validate_key("Exif.Image.").is_err());
    }

    #[test]
    fn family_parse_and_display() {
        assert_eq!("IPTC".parse::<Family>().unwrap(), Family::Iptc);
        assert!("jpeg".parse::<Family>().is_err());
        assert_eq!(Family::Xmp.to_string(), "xmp");
        assert_eq!(Family::Xmp.prefix(), "Xmp");
    }

    #[test]
    fn families_selection() {
        let all: Vec<_> = Families::all().iter().collect();
        assert_eq!(all, Family::ALL.to_vec());
        let only_iptc = Families::from(Family::Iptc);
        assert!(only_iptc.contains(Family::Iptc));
        assert!(!only_iptc.contains(Family::Exif));
        assert_eq!(Families::none().iter().count(), 0);
    }
}
