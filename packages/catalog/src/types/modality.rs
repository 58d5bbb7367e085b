//! Modalities and the per-offering modality collection.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::error::CatalogError;

/// A content type an offering accepts or produces.
///
/// Variant order is the canonical order used when a single
/// "primary" modality has to be reported.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Modality {
    Text,
    Image,
    Audio,
    Video,
}

impl Modality {
    pub const ALL: [Modality; 4] = [
        Modality::Text,
        Modality::Image,
        Modality::Audio,
        Modality::Video,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Modality::Text => "text",
            Modality::Image => "image",
            Modality::Audio => "audio",
            Modality::Video => "video",
        }
    }
}

impl std::fmt::Display for Modality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Modality {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" => Ok(Modality::Text),
            "image" => Ok(Modality::Image),
            "audio" => Ok(Modality::Audio),
            "video" => Ok(Modality::Video),
            other => Err(CatalogError::InvalidSpec {
                reason: format!("unknown modality: {other}"),
            }),
        }
    }
}

/// The modality collection owned by one offering.
///
/// Order-irrelevant and duplicate-free. Updates go through
/// [`ModalitySet::replace`], which clears and rebuilds the set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModalitySet(BTreeSet<Modality>);

impl ModalitySet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, modality: Modality) -> bool {
        self.0.insert(modality)
    }

    /// Discard every current entry and rebuild from `modalities`.
    pub fn replace(&mut self, modalities: impl IntoIterator<Item = Modality>) {
        self.0.clear();
        self.0.extend(modalities);
    }

    pub fn contains(&self, modality: Modality) -> bool {
        self.0.contains(&modality)
    }

    /// True when every modality in `required` is present.
    pub fn contains_all(&self, required: &[Modality]) -> bool {
        required.iter().all(|m| self.0.contains(m))
    }

    /// First modality in canonical order, `text` when empty.
    pub fn primary(&self) -> Modality {
        self.0.iter().next().copied().unwrap_or(Modality::Text)
    }

    pub fn iter(&self) -> impl Iterator<Item = Modality> + '_ {
        self.0.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Parse the comma-joined form stored by the SQL backends.
    pub fn parse_joined(joined: Option<&str>) -> Result<Self, CatalogError> {
        let mut set = Self::new();
        if let Some(joined) = joined {
            for part in joined.split(',').filter(|p| !p.trim().is_empty()) {
                set.insert(part.parse()?);
            }
        }
        Ok(set)
    }
}

impl FromIterator<Modality> for ModalitySet {
    fn from_iter<I: IntoIterator<Item = Modality>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a ModalitySet {
    type Item = &'a Modality;
    type IntoIter = std::collections::btree_set::Iter<'a, Modality>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_replace_discards_previous_entries() {
        let mut set: ModalitySet = [Modality::Text, Modality::Audio].into_iter().collect();
        set.replace([Modality::Image]);
        assert_eq!(set.len(), 1);
        assert!(set.contains(Modality::Image));
        assert!(!set.contains(Modality::Audio));
    }

    #[test]
    fn test_primary_uses_canonical_order() {
        let set: ModalitySet = [Modality::Video, Modality::Image].into_iter().collect();
        assert_eq!(set.primary(), Modality::Image);
        assert_eq!(ModalitySet::new().primary(), Modality::Text);
    }

    #[test]
    fn test_parse_joined() {
        let set = ModalitySet::parse_joined(Some("image,text")).unwrap();
        assert!(set.contains_all(&[Modality::Text, Modality::Image]));
        assert!(ModalitySet::parse_joined(None).unwrap().is_empty());
        assert!(ModalitySet::parse_joined(Some("smell")).is_err());
    }

    #[test]
    fn test_serializes_as_list() {
        let set: ModalitySet = [Modality::Image, Modality::Text].into_iter().collect();
        assert_eq!(serde_json::to_string(&set).unwrap(), r#"["text","image"]"#);
    }
}
