//! Field-level reconciliation between two entities.
//!
//! Each `set_*_item` helper copies one attribute from a source entity into a
//! destination entity when they differ, applies a default when the source is
//! empty, and reports whether the destination changed. Running a helper a
//! second time with the same inputs changes nothing.

use chrono::{Duration, Local, NaiveDateTime, NaiveTime};

use super::Entity;
use crate::config::CoreConfig;
use crate::error::EntityError;
use crate::grammar::ValueParser;

/// Merge helpers configured with a date tolerance and numeric cultures
#[derive(Debug, Clone)]
pub struct MergeRules {
    /// Date/times closer than this are considered equal
    pub date_tolerance: Duration,
    parser: ValueParser,
}

impl Default for MergeRules {
    fn default() -> Self {
        Self::from_config(&CoreConfig::default())
    }
}

fn within(a: NaiveDateTime, b: NaiveDateTime, tolerance: Duration) -> bool {
    (a - b).num_seconds().abs() < tolerance.num_seconds()
}

impl MergeRules {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &CoreConfig) -> Self {
        Self {
            date_tolerance: Duration::hours(config.date_tolerance_hours),
            parser: ValueParser::from_config(config),
        }
    }

    /// Copy text. An empty source leaves a destination holding `default`
    /// untouched and resets an empty one to `default`.
    pub fn set_text_item(
        &self,
        from: &Entity,
        from_item: &str,
        to: &Entity,
        to_item: &str,
        default: &str,
    ) -> Result<bool, EntityError> {
        let data = from.get_item_text(from_item).trim().to_string();
        let text = to.get_item_text(to_item).trim().to_string();
        if data.is_empty() && text == default {
            return Ok(false);
        }
        if data != text {
            to.set(to_item, data)?;
            return Ok(true);
        }
        if text.is_empty() && text != default {
            to.set(to_item, default)?;
            return Ok(true);
        }
        Ok(false)
    }

    /// Copy an `i32` when the source parses and differs numerically; an
    /// empty destination gets a non-zero `default`
    pub fn set_integer_item(
        &self,
        from: &Entity,
        from_item: &str,
        to: &Entity,
        to_item: &str,
        default: i32,
    ) -> Result<bool, EntityError> {
        let data = from.get_item_text(from_item).trim().to_string();
        let text = to.get_item_text(to_item).trim().to_string();
        if !data.is_empty() && data != text {
            if let Ok(result) = data.parse::<i32>() {
                if !text.is_empty() && text.parse::<i32>().ok() == Some(result) {
                    return Ok(false);
                }
                to.set(to_item, result)?;
                return Ok(true);
            }
        }
        if text.is_empty() && default != 0 {
            to.set(to_item, default)?;
            return Ok(true);
        }
        Ok(false)
    }

    /// Copy an `f64` read in any configured culture; values equal in some
    /// culture are left alone
    pub fn set_double_item(
        &self,
        from: &Entity,
        from_item: &str,
        to: &Entity,
        to_item: &str,
        default: f64,
    ) -> Result<bool, EntityError> {
        let data = from.get_item_text(from_item).trim().to_string();
        let text = to.get_item_text(to_item).trim().to_string();
        if !data.is_empty() && data != text {
            if let Some(result) = self.parser.parse_number(&data) {
                let same = !text.is_empty()
                    && self
                        .parser
                        .cultures()
                        .iter()
                        .any(|c| c.parse(&text) == Some(result));
                if same {
                    return Ok(false);
                }
                to.set(to_item, result)?;
                return Ok(true);
            }
        }
        if text.is_empty() && default != 0.0 {
            to.set(to_item, default)?;
            return Ok(true);
        }
        Ok(false)
    }

    /// Copy a date/time unless both lie within the tolerance window.
    ///
    /// With `today`, a destination that is not within the window around
    /// today's local midnight is set to it.
    pub fn set_date_time_item(
        &self,
        from: &Entity,
        from_item: &str,
        to: &Entity,
        to_item: &str,
        today: bool,
    ) -> Result<bool, EntityError> {
        if let Some(dt) = self.parser.parse_date_time(&from.get_item_text(from_item)) {
            if to.get_item_text(to_item).is_empty() {
                to.set(to_item, dt)?;
                return Ok(true);
            }
            let differs = match to.get::<NaiveDateTime>(to_item) {
                Some(exist) => dt != exist && !within(dt, exist, self.date_tolerance),
                None => true,
            };
            if differs {
                to.set(to_item, dt)?;
                return Ok(true);
            }
        }
        if today {
            let midnight = Local::now().date_naive().and_time(NaiveTime::MIN);
            let stale = to
                .get::<NaiveDateTime>(to_item)
                .map_or(true, |exist| !within(midnight, exist, self.date_tolerance));
            if stale {
                to.set(to_item, midnight)?;
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Copy a boolean, reading `0/1`, `yes/no` and their Russian forms
    pub fn set_boolean_item(
        &self,
        from: &Entity,
        from_item: &str,
        to: &Entity,
        to_item: &str,
        default: bool,
    ) -> Result<bool, EntityError> {
        let token = from.get_item_text(from_item).trim().to_lowercase();
        let (data, use_default) = match token.as_str() {
            "" => (false, true),
            "0" | "no" | "нет" | "ложь" => (false, false),
            "1" | "yes" | "да" | "истина" => (true, false),
            _ => (from.get::<bool>(from_item).unwrap_or(false), false),
        };
        if to.get_item_text(to_item).is_empty() {
            to.set(to_item, if use_default { default } else { data })?;
            return Ok(true);
        }
        if to.get::<bool>(to_item).unwrap_or(false) != data {
            to.set(to_item, data)?;
            return Ok(true);
        }
        Ok(false)
    }
}

/// Index of the first candidate made of the same words as `text`.
///
/// Words are split on spaces and commas and compared without regard to
/// case; a candidate must have as many words as `text`.
pub fn best_match(text: &str, candidates: &[&str]) -> Option<usize> {
    fn words(s: &str) -> Vec<String> {
        s.to_lowercase()
            .split([' ', ','])
            .filter(|w| !w.is_empty())
            .map(str::to_string)
            .collect()
    }
    let parts = words(text);
    if parts.is_empty() {
        return None;
    }
    candidates.iter().position(|candidate| {
        let keys = words(candidate);
        keys.len() == parts.len() && parts.iter().all(|p| keys.contains(p))
    })
}
