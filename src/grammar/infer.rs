//! Value inference for bare and quoted grammar tokens.
//!
//! [`ValueParser::infer`] classifies a token by trying, in order:
//!
//! 1. option set (`#SET=...`)
//! 2. entity reference (`#REF=...`)
//! 3. `i32`, then `i64`; multi-digit tokens with a leading `0` stay text
//! 4. GUID
//! 5. boolean, only the canonical `true` / `false`
//! 6. number, in each configured culture, when the token looks numeric and
//!    is the canonical or two-decimal rendering of the parsed value
//! 7. `YYYY-MM-DDThh:mm:ss` with an optional `+offset`
//! 8. the configured generic date/time formats
//!
//! Anything else is kept as text.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use once_cell::sync::Lazy;
use regex::Regex;
use uuid::Uuid;

use crate::config::CoreConfig;
use crate::value::{EntityReference, OptionSetValue, Value};

static NUMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^-*[0-9,\.]+$").expect("number regex is valid"));

static UTC_DATE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[0-9]{4}-[0-9]{2}-[0-9]{2}T[0-9]{2}:[0-9]{2}:[0-9]{2}$")
        .expect("utc date regex is valid")
});

/// Whether the token looks like a number, 1 to 32 characters long
pub fn is_number(text: &str) -> bool {
    (1..=32).contains(&text.len()) && NUMBER.is_match(text)
}

/// Whether the token is a `YYYY-MM-DDThh:mm:ss` date, ignoring any `+offset`
pub fn is_utc_date(text: &str) -> bool {
    if text.len() <= 4 || text.len() > 32 {
        return false;
    }
    let head = text.split('+').next().unwrap_or(text);
    UTC_DATE.is_match(head)
}

/// Decimal separator convention used to read numeric text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumberCulture {
    /// `1234.5`
    Invariant,
    /// `1234,5`
    Comma,
}

impl NumberCulture {
    /// Culture by configuration name; unknown names yield `None`
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "invariant" | "en" | "dot" => Some(NumberCulture::Invariant),
            "comma" | "ru" | "de" => Some(NumberCulture::Comma),
            _ => None,
        }
    }

    fn separator(self) -> char {
        match self {
            NumberCulture::Invariant => '.',
            NumberCulture::Comma => ',',
        }
    }

    /// Parse `text` in this culture
    pub fn parse(self, text: &str) -> Option<f64> {
        let text = text.trim();
        match self {
            NumberCulture::Invariant => text.parse().ok(),
            NumberCulture::Comma => {
                if text.contains('.') {
                    return None;
                }
                text.replace(',', ".").parse().ok()
            }
        }
    }

    /// Canonical and two-decimal renderings of `value` in this culture
    fn renderings(self, value: f64) -> [String; 2] {
        let sep = self.separator().to_string();
        [
            value.to_string().replace('.', &sep),
            format!("{:.2}", value).replace('.', &sep),
        ]
    }
}

/// Token classifier configured with numeric cultures and date formats
#[derive(Debug, Clone)]
pub struct ValueParser {
    cultures: Vec<NumberCulture>,
    date_formats: Vec<String>,
    max_reference_length: usize,
}

impl Default for ValueParser {
    fn default() -> Self {
        Self::from_config(&CoreConfig::default())
    }
}

impl ValueParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &CoreConfig) -> Self {
        let mut cultures: Vec<NumberCulture> = config
            .number_cultures
            .iter()
            .filter_map(|name| {
                let culture = NumberCulture::from_name(name);
                if culture.is_none() {
                    log::warn!("ignoring unknown number culture {}", name);
                }
                culture
            })
            .collect();
        if cultures.is_empty() {
            cultures.push(NumberCulture::Invariant);
        }
        Self {
            cultures,
            date_formats: config.date_formats.clone(),
            max_reference_length: config.max_reference_length,
        }
    }

    pub fn cultures(&self) -> &[NumberCulture] {
        &self.cultures
    }

    /// Classify a token
    pub fn infer(&self, text: &str) -> Value {
        if let Some(option) = OptionSetValue::parse(text) {
            return Value::OptionSet(option);
        }
        if let Some(reference) = EntityReference::parse_with_limit(text, self.max_reference_length) {
            return Value::Reference(reference);
        }
        if let Ok(n) = text.parse::<i32>() {
            return if has_leading_zero(text) {
                Value::String(text.to_string())
            } else {
                Value::Int32(n)
            };
        }
        if let Ok(n) = text.parse::<i64>() {
            return if has_leading_zero(text) {
                Value::String(text.to_string())
            } else {
                Value::Int64(n)
            };
        }
        if let Ok(guid) = Uuid::parse_str(text) {
            return Value::Guid(guid);
        }
        match text {
            "true" => return Value::Bool(true),
            "false" => return Value::Bool(false),
            _ => {}
        }
        if let Some(number) = self.parse_canonical_number(text) {
            return Value::Double(number);
        }
        if let Some(dt) = parse_utc_date(text) {
            return Value::DateTime(dt);
        }
        if let Some(dt) = self.parse_date_time(text) {
            return Value::DateTime(dt);
        }
        log::debug!("unclassified token kept as text: {}", text);
        Value::String(text.to_string())
    }

    fn parse_canonical_number(&self, text: &str) -> Option<f64> {
        if !is_number(text) {
            return None;
        }
        self.cultures.iter().find_map(|culture| {
            let value = culture.parse(text)?;
            culture
                .renderings(value)
                .iter()
                .any(|r| r == text)
                .then_some(value)
        })
    }

    /// Parse numeric text in the first culture that accepts it
    pub fn parse_number(&self, text: &str) -> Option<f64> {
        self.cultures.iter().find_map(|culture| culture.parse(text))
    }

    /// Parse date/time text: the UTC form, then each configured format.
    ///
    /// Formats without a time part yield midnight.
    pub fn parse_date_time(&self, text: &str) -> Option<NaiveDateTime> {
        let text = text.trim();
        if let Some(dt) = parse_utc_date(text) {
            return Some(dt);
        }
        self.date_formats.iter().find_map(|format| {
            NaiveDateTime::parse_from_str(text, format).ok().or_else(|| {
                NaiveDate::parse_from_str(text, format)
                    .ok()
                    .and_then(|d| d.and_hms_opt(0, 0, 0))
            })
        })
    }
}

/// `0123` is a code, not a number; a lone `0` is zero
fn has_leading_zero(text: &str) -> bool {
    text.len() > 1 && text.starts_with('0')
}

fn parse_utc_date(text: &str) -> Option<NaiveDateTime> {
    if !is_utc_date(text) {
        return None;
    }
    let mut parts = text.splitn(2, 'T');
    let date = parts.next()?;
    let mut ymd = date.split('-').map(|s| s.parse::<u32>().ok());
    let year = ymd.next()??;
    let month = ymd.next()??;
    let day = ymd.next()??;
    let (mut hour, mut minute, mut second) = (0, 0, 0);
    if let Some(time) = parts.next() {
        let mut hms = time.split([':', '+']).map(|s| s.trim_matches([' ', '$']).parse::<u32>().ok());
        hour = hms.next().flatten().unwrap_or(0);
        minute = hms.next().flatten().unwrap_or(0);
        second = hms.next().flatten().unwrap_or(0);
    }
    let date = NaiveDate::from_ymd_opt(i32::try_from(year).ok()?, month, day)?;
    let time = NaiveTime::from_hms_opt(hour, minute, second)?;
    Some(NaiveDateTime::new(date, time))
}
