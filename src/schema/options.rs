//! Parser for the `@key` / `@key(value)` option tags embedded in property
//! descriptions.

use std::collections::BTreeMap;
use std::fmt;

use convert_case::{Case, Casing};
use regex::Regex;

lazy_static::lazy_static! {
    static ref OPTION_TAG: Regex =
        Regex::new(r"(?i)@([a-z_]+)(\(([a-z0-9]+)\))?").expect("option tag pattern is valid");
}

/// Option keys recognised on a property.
///
/// `signed` is accepted while parsing but always stored as [`OptionKey::Unsigned`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum OptionKey {
    Default,
    GeneratedValue,
    Id,
    Length,
    OnUpdate,
    Required,
    Nullable,
    Unsigned,
}

impl OptionKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::GeneratedValue => "generated_value",
            Self::Id => "id",
            Self::Length => "length",
            Self::OnUpdate => "on_update",
            Self::Required => "required",
            Self::Nullable => "nullable",
            Self::Unsigned => "unsigned",
        }
    }

    fn is_flag(&self) -> bool {
        matches!(
            self,
            Self::GeneratedValue | Self::Id | Self::Required | Self::Unsigned | Self::Nullable
        )
    }
}

impl fmt::Display for OptionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptionValue {
    Bool(bool),
    Int(i64),
    Text(String),
}

/// Parsed options of a single property.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Options {
    values: BTreeMap<OptionKey, OptionValue>,
}

impl Options {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: OptionKey) -> Option<&OptionValue> {
        self.values.get(&key)
    }

    pub fn contains(&self, key: OptionKey) -> bool {
        self.values.contains_key(&key)
    }

    pub fn insert(&mut self, key: OptionKey, value: OptionValue) {
        self.values.insert(key, value);
    }

    /// Boolean option, `None` when absent or not a flag.
    pub fn flag(&self, key: OptionKey) -> Option<bool> {
        match self.values.get(&key) {
            Some(OptionValue::Bool(b)) => Some(*b),
            _ => None,
        }
    }

    pub fn is_set(&self, key: OptionKey) -> bool {
        self.flag(key).unwrap_or(false)
    }

    pub fn length(&self) -> Option<i64> {
        match self.values.get(&OptionKey::Length) {
            Some(OptionValue::Int(n)) => Some(*n),
            _ => None,
        }
    }

    pub fn text(&self, key: OptionKey) -> Option<&str> {
        match self.values.get(&key) {
            Some(OptionValue::Text(s)) => Some(s),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (OptionKey, &OptionValue)> {
        self.values.iter().map(|(k, v)| (*k, v))
    }
}

/// Extracts every recognised option tag from `description`.
///
/// Later tags overwrite earlier ones with the same key.
pub fn parse_options(description: &str) -> Options {
    let mut options = Options::new();

    for caps in OPTION_TAG.captures_iter(description) {
        let key = (&caps[1]).to_case(Case::Snake);
        let raw = caps.get(3).map_or("", |m| m.as_str());

        let Some(key) = lookup_key(&key) else {
            continue;
        };

        let value = if key.is_flag() {
            OptionValue::Bool(!raw.eq_ignore_ascii_case("false"))
        } else if key == OptionKey::Length {
            OptionValue::Int(leading_int(raw))
        } else {
            OptionValue::Text(raw.to_string())
        };

        options.insert(key, value);
    }

    options
}

/// Maps a snake_case tag name onto its key; `signed` is an alias of `unsigned`.
fn lookup_key(name: &str) -> Option<OptionKey> {
    Some(match name {
        "default" => OptionKey::Default,
        "generated_value" => OptionKey::GeneratedValue,
        "id" => OptionKey::Id,
        "length" => OptionKey::Length,
        "on_update" => OptionKey::OnUpdate,
        "required" => OptionKey::Required,
        "nullable" => OptionKey::Nullable,
        "signed" | "unsigned" => OptionKey::Unsigned,
        _ => return None,
    })
}

/// Leading decimal digits of `raw`, `0` when there are none.
fn leading_int(raw: &str) -> i64 {
    let digits: String = raw.chars().take_while(|c| c.is_ascii_digit()).collect();
    digits.parse().unwrap_or(0)
}
