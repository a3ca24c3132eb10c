//! Option-set values: an enumerated integer with a display label.
//!
//! Text form: `#SET=<value>` or `#SET=<value>/#TXT=<text>`. Tags are matched
//! without regard to ASCII case.

use serde::{Deserialize, Serialize};

const SET_TAG: &str = "#SET=";
const TXT_TAG: &str = "/#TXT=";

#[derive(Debug, Clone, Default, Eq, Serialize, Deserialize)]
pub struct OptionSetValue {
    pub value: i32,
    #[serde(default)]
    pub text: String,
}

impl OptionSetValue {
    pub fn new(value: i32) -> Self {
        Self {
            value,
            text: String::new(),
        }
    }

    pub fn with_text(value: i32, text: impl Into<String>) -> Self {
        Self {
            value,
            text: text.into(),
        }
    }

    /// Parse the `#SET=` form; `None` when the text does not match
    pub fn parse(text: &str) -> Option<Self> {
        if !text.starts_with('#') {
            return None;
        }
        let upper = text.to_ascii_uppercase();
        if !upper.starts_with(SET_TAG) {
            return None;
        }
        let txt_idx = upper.find(TXT_TAG).unwrap_or(text.len());
        let value = text.get(SET_TAG.len()..txt_idx)?.trim().parse::<i32>().ok()?;
        let label = if txt_idx < text.len() {
            text.get(txt_idx + TXT_TAG.len()..)?.trim().to_string()
        } else {
            String::new()
        };
        Some(Self { value, text: label })
    }
}

/// Option-set values compare by value only
impl PartialEq for OptionSetValue {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl std::fmt::Display for OptionSetValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.text.is_empty() {
            write!(f, "{}{}", SET_TAG, self.value)
        } else {
            write!(f, "{}{}{}{}", SET_TAG, self.value, TXT_TAG, self.text)
        }
    }
}

impl std::str::FromStr for OptionSetValue {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OptionSetValue::parse(s).ok_or_else(|| format!("not an option-set value: {}", s))
    }
}
