//! Entity references: a non-owning pointer to another entity by name and id.
//!
//! Text form: `#REF=<EntityName>/#ID=<Id>`, with an optional
//! `/#TXT=<Text>` segment before the id.

use serde::{Deserialize, Serialize};

/// Default upper bound on the length of an encoded reference
pub const MAX_REFERENCE_LENGTH: usize = 1024;

const REF_TAG: &str = "#REF=";
const TXT_TAG: &str = "/#TXT=";
const ID_TAG: &str = "/#ID=";

#[derive(Debug, Clone, Default, Eq, Serialize, Deserialize)]
pub struct EntityReference {
    pub entity_name: String,
    pub id: String,
    /// Display text of the referenced entity
    #[serde(default)]
    pub text: String,
}

impl EntityReference {
    pub fn new(entity_name: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            entity_name: entity_name.into(),
            id: id.into(),
            text: String::new(),
        }
    }

    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    /// Parse the `#REF=` form with the default length limit
    pub fn parse(text: &str) -> Option<Self> {
        Self::parse_with_limit(text, MAX_REFERENCE_LENGTH)
    }

    /// Parse the `#REF=` form; texts longer than `max_len` bytes are rejected
    pub fn parse_with_limit(text: &str, max_len: usize) -> Option<Self> {
        if text.is_empty() || text.len() > max_len || !text.starts_with('#') {
            return None;
        }
        let upper = text.to_ascii_uppercase();
        if !upper.starts_with(REF_TAG) {
            return None;
        }
        let id_idx = upper.find(ID_TAG)?;
        let txt_idx = upper.find(TXT_TAG).filter(|&i| i < id_idx);
        let name_end = txt_idx.unwrap_or(id_idx);
        let entity_name = text.get(REF_TAG.len()..name_end)?.trim().to_string();
        let label = match txt_idx {
            Some(i) => text.get(i + TXT_TAG.len()..id_idx)?.trim().to_string(),
            None => String::new(),
        };
        let id = text.get(id_idx + ID_TAG.len()..)?.trim().to_string();
        Some(Self {
            entity_name,
            id,
            text: label,
        })
    }
}

/// References compare by entity name and id; the display text is ignored
impl PartialEq for EntityReference {
    fn eq(&self, other: &Self) -> bool {
        self.entity_name == other.entity_name && self.id == other.id
    }
}

impl std::fmt::Display for EntityReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.text.is_empty() {
            write!(f, "{}{}{}{}", REF_TAG, self.entity_name, ID_TAG, self.id)
        } else {
            write!(
                f,
                "{}{}{}{}{}{}",
                REF_TAG, self.entity_name, TXT_TAG, self.text, ID_TAG, self.id
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_form() {
        let r = EntityReference::parse("#REF=Customer/#TXT= Acme Ltd /#ID=42").unwrap();
        assert_eq!(r.entity_name, "Customer");
        assert_eq!(r.text, "Acme Ltd");
        assert_eq!(r.id, "42");
    }

    #[test]
    fn test_parse_without_text() {
        let r = EntityReference::parse("#ref=Customer/#id=7").unwrap();
        assert_eq!(r.entity_name, "Customer");
        assert!(r.text.is_empty());
        assert_eq!(r.id, "7");
    }

    #[test]
    fn test_parse_requires_id_and_limit() {
        assert!(EntityReference::parse("#REF=Customer/#TXT=x").is_none());
        assert!(EntityReference::parse("REF=Customer/#ID=1").is_none());
        let long = format!("#REF=Customer/#ID={}", "9".repeat(MAX_REFERENCE_LENGTH));
        assert!(EntityReference::parse(&long).is_none());
        assert!(EntityReference::parse_with_limit(&long, usize::MAX).is_some());
    }

    #[test]
    fn test_display_and_equality() {
        let r = EntityReference::new("Customer", "42").with_text("Acme");
        assert_eq!(r.to_string(), "#REF=Customer/#TXT=Acme/#ID=42");
        assert_eq!(EntityReference::new("Customer", "42").to_string(), "#REF=Customer/#ID=42");
        assert_eq!(r, EntityReference::new("Customer", "42"));
        assert_ne!(r, EntityReference::new("Order", "42"));
    }
}
