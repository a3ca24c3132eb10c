//! Column metadata.
//!
//! [`ColumnSchema`] describes one column of a table: its type, requirement
//! flags, optional foreign table, validation pattern and option-set catalog.
//! It can also produce a `SeaQuery` `ColumnDef` for DDL generation.

use once_cell::sync::Lazy;
use regex::Regex;
use sea_query::{ColumnDef, DynIden};
use serde::{Deserialize, Serialize};

use super::type_mapping;
use super::{DataType, Requirement};

static LENGTH_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^/\{(\d*),(\d*)\}/g$").expect("length pattern regex is valid"));

/// Predefined validation patterns for text columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternPreset {
    Phone,
    Email,
    Url,
    PostalCode,
    CreditCard,
}

impl PatternPreset {
    /// Regular expression for this preset
    #[must_use]
    pub fn pattern(self) -> &'static str {
        match self {
            PatternPreset::Phone => r"^((8|\+7)[\- ]?)?(\(?\d{3}\)?[\- ]?)?[\d\- ]{7,10}$",
            PatternPreset::Email => r"^([a-z0-9_\.-]+)@([a-z0-9_\.-]+)\.([a-z\.]{2,6})$",
            PatternPreset::Url => {
                r"^(https?://)?([\da-z\.-]+)\.([a-z\.]{2,6})([/\w \.-]*)*/?$"
            }
            PatternPreset::PostalCode => r"^\d{5}(?:[-\s]\d{4})?$",
            PatternPreset::CreditCard => {
                r"^(?:4\d{12}(?:\d{3})?|5[1-5]\d{14}|3[47]\d{13}|3(?:0[0-5]|[68]\d)\d{11}|6(?:011|5\d{2})\d{12}|(?:2131|1800|35\d{3})\d{11})$"
            }
        }
    }
}

/// Length constraint pattern in the `/{min,max}/g` form; either bound may be empty.
#[must_use]
pub fn length_pattern(min: Option<usize>, max: Option<usize>) -> String {
    let min = min.map(|v| v.to_string()).unwrap_or_default();
    let max = max.map(|v| v.to_string()).unwrap_or_default();
    format!("/{{{},{}}}/g", min, max)
}

/// One entry of an option-set catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionSchema {
    pub value: i32,
    pub title: String,
    #[serde(default)]
    pub description: String,
}

impl OptionSchema {
    pub fn new(value: i32, title: impl Into<String>) -> Self {
        Self {
            value,
            title: title.into(),
            description: String::new(),
        }
    }
}

impl std::fmt::Display for OptionSchema {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}|{}", self.value, self.title)
    }
}

/// Column metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnSchema {
    /// Column name, unique within its table
    pub name: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub data_type: DataType,
    #[serde(default)]
    pub requirement: Requirement,
    /// Referenced table for foreign-key columns
    #[serde(default)]
    pub foreign_table: Option<String>,
    #[serde(default)]
    pub default_value: Option<String>,
    /// Validation regex, or a `/{min,max}/g` length constraint
    #[serde(default)]
    pub pattern: Option<String>,
    /// Maximum length, `-1` when unbounded
    #[serde(default = "unset")]
    pub length: i32,
    /// Display order, `-1` when unset
    #[serde(default = "unset")]
    pub order: i32,
    #[serde(default)]
    pub option_set: Vec<OptionSchema>,
    /// Owning table name
    #[serde(default)]
    pub table_name: String,
}

fn unset() -> i32 {
    -1
}

impl Default for ColumnSchema {
    fn default() -> Self {
        Self {
            name: String::new(),
            title: String::new(),
            description: String::new(),
            data_type: DataType::String,
            requirement: Requirement::NONE,
            foreign_table: None,
            default_value: None,
            pattern: None,
            length: -1,
            order: -1,
            option_set: Vec::new(),
            table_name: String::new(),
        }
    }
}

impl ColumnSchema {
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        let name = name.into();
        Self {
            title: name.clone(),
            name,
            data_type,
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_requirement(mut self, requirement: Requirement) -> Self {
        self.requirement = requirement;
        self
    }

    #[must_use]
    pub fn with_foreign_table(mut self, table: impl Into<String>) -> Self {
        self.foreign_table = Some(table.into());
        self.requirement |= Requirement::FOREIGN_KEY;
        self
    }

    #[must_use]
    pub fn with_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = Some(pattern.into());
        self
    }

    #[must_use]
    pub fn with_options(mut self, options: Vec<OptionSchema>) -> Self {
        self.option_set = options;
        self
    }

    #[must_use]
    pub fn is_required(&self) -> bool {
        self.requirement.is_required()
    }

    /// Title of an option-set entry
    pub fn option_title(&self, value: i32) -> Option<&str> {
        self.option_set
            .iter()
            .find(|o| o.value == value)
            .map(|o| o.title.as_str())
    }

    /// Check a text value against the column's pattern and length.
    ///
    /// Columns without a pattern accept any text. An invalid regex rejects
    /// everything.
    pub fn validate_text(&self, text: &str) -> bool {
        let count = text.chars().count();
        if self.length > 0 && count > self.length as usize {
            return false;
        }
        let pattern = match &self.pattern {
            Some(p) if !p.is_empty() => p,
            _ => return true,
        };
        if let Some(caps) = LENGTH_PATTERN.captures(pattern) {
            let min = caps[1].parse::<usize>().ok();
            let max = caps[2].parse::<usize>().ok();
            return min.map_or(true, |m| count >= m) && max.map_or(true, |m| count <= m);
        }
        match Regex::new(pattern) {
            Ok(re) => re.is_match(text),
            Err(e) => {
                log::warn!("invalid pattern for column {}: {}", self.name, e);
                false
            }
        }
    }

    /// Convert to `SeaQuery`'s `ColumnDef` for DDL generation
    pub fn to_column_def(&self) -> ColumnDef {
        let mut def = ColumnDef::new(DynIden::from(self.name.clone()));
        type_mapping::apply_column_type(self.data_type, self.length, &mut def);
        if self.requirement.is_primary_key() {
            def.not_null().primary_key();
        } else if self.requirement.contains(Requirement::NOT_NULL)
            || self.requirement.is_required()
        {
            def.not_null();
        } else {
            def.null();
        }
        if self.requirement.contains(Requirement::UNIQUE_KEY) && !self.requirement.is_primary_key() {
            def.unique_key();
        }
        def
    }
}

impl std::fmt::Display for ColumnSchema {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "COLUMN [{}:{:?}]", self.name, self.data_type)
    }
}
