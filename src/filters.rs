// Parsing of the small text tokens given on the command line:
// `key=value` search filters, `key:value` command arguments and
// MangaDex ids or urls.

use crate::error::{Error, Result};
use regex::Regex;
use std::collections::BTreeMap;

/// Query parameters MangaDex only accepts in `key[]=value` form.
const ARRAY_PARAMS: &[&str] = &[
    "ids",
    "authors",
    "artists",
    "includedTags",
    "excludedTags",
    "status",
    "originalLanguage",
    "excludedOriginalLanguage",
    "availableTranslatedLanguage",
    "publicationDemographic",
    "contentRating",
    "includes",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterValue {
    Single(String),
    Many(Vec<String>),
}

impl FilterValue {
    pub fn values(&self) -> Vec<String> {
        match self {
            FilterValue::Single(v) => vec![v.clone()],
            FilterValue::Many(vs) => vs.clone(),
        }
    }

    fn push(self, more: Vec<String>) -> FilterValue {
        let mut values = self.values();
        values.extend(more);
        FilterValue::Many(values)
    }
}

/// Split `text` on the first `sep`. The value is empty when `sep` is missing.
pub fn get_key_value<'a>(text: &'a str, sep: char) -> (&'a str, &'a str) {
    match text.split_once(sep) {
        Some((key, value)) => (key, value),
        None => (text, ""),
    }
}

/// Comma separated values become a list; a lone value stays scalar unless
/// `single_value_to_list` is set.
pub fn split_comma_separated(text: &str, single_value_to_list: bool) -> FilterValue {
    if !text.contains(',') {
        return if single_value_to_list {
            FilterValue::Many(vec![text.to_string()])
        } else {
            FilterValue::Single(text.to_string())
        };
    }
    FilterValue::Many(text.split(',').map(|v| v.trim().to_string()).collect())
}

/// Filters for a manga search: the flat mapping plus the ordering mapping
/// that becomes `order[field]=direction`.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SearchFilters {
    pub filters: BTreeMap<String, FilterValue>,
    pub order: BTreeMap<String, FilterValue>,
}

impl SearchFilters {
    /// Parse repeated `key=value` (or `key:value`) tokens. Repeated keys
    /// accumulate; keys containing `order` move to the ordering mapping.
    pub fn parse<S: AsRef<str>>(tokens: &[S]) -> Result<Self> {
        let mut filters: BTreeMap<String, FilterValue> = BTreeMap::new();
        for token in tokens {
            let token = token.as_ref().trim();
            let (key, value) = split_filter_token(token);
            if key.is_empty() || value.is_empty() {
                return Err(Error::InvalidArgument(format!(
                    "\"{}\" is not a valid filter, expected key=value",
                    token
                )));
            }
            let merged = match filters.remove(key) {
                None => split_comma_separated(value, false),
                Some(existing) => match split_comma_separated(value, true) {
                    FilterValue::Many(more) => existing.push(more),
                    FilterValue::Single(v) => existing.push(vec![v]),
                },
            };
            filters.insert(key.to_string(), merged);
        }

        let order_keys: Vec<String> = filters
            .keys()
            .filter(|key| key.contains("order"))
            .cloned()
            .collect();
        let mut order = BTreeMap::new();
        for key in order_keys {
            if let Some(value) = filters.remove(&key) {
                order.insert(order_field(&key).to_string(), value);
            }
        }
        Ok(SearchFilters { filters, order })
    }

    /// Render as MangaDex query parameters.
    pub fn to_query(&self) -> Vec<(String, String)> {
        let mut query = Vec::new();
        for (key, value) in &self.filters {
            let key = key.trim_end_matches("[]");
            let as_array =
                ARRAY_PARAMS.contains(&key) || matches!(value, FilterValue::Many(_));
            for v in value.values() {
                let name = if as_array { format!("{}[]", key) } else { key.to_string() };
                query.push((name, v));
            }
        }
        for (field, value) in &self.order {
            for v in value.values() {
                query.push((format!("order[{}]", field), v));
            }
        }
        query
    }
}

fn split_filter_token(token: &str) -> (&str, &str) {
    let sep = token
        .char_indices()
        .find(|(_, c)| *c == '=' || *c == ':')
        .map(|(_, c)| c)
        .unwrap_or('=');
    let (key, value) = get_key_value(token, sep);
    (key.trim(), value.trim())
}

// `order[createdAt]` -> `createdAt`; anything else is kept as is.
fn order_field(key: &str) -> &str {
    key.strip_prefix("order[")
        .and_then(|rest| rest.strip_suffix(']'))
        .filter(|field| !field.is_empty())
        .unwrap_or(key)
}

/// Extract a MangaDex id from a raw id or any url containing one.
pub fn validate_identifier(text: &str) -> Result<String> {
    let re = Regex::new(
        r"(?i)\b([0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12})\b",
    )
    .map_err(|e| Error::InvalidArgument(e.to_string()))?;
    re.captures(text.trim())
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_lowercase())
        .ok_or_else(|| Error::InvalidIdentifier(text.to_string()))
}
