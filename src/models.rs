// Domain objects returned by the MangaDex API, plus the small `Item`
// interface the selector relies on.

use crate::error::{Error, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt;
use std::hash::Hash;
use std::str::FromStr;

/// What the selector needs to know about a choice.
pub trait Item {
    type Id: Clone + Eq + Hash + fmt::Display;

    fn identity(&self) -> Self::Id;

    /// Text shown next to the label in the prompt.
    fn display_string(&self) -> String;
}

/// `{"result": "ok", "data": [...], "limit": 10, "offset": 0, "total": 42}`
#[derive(Deserialize, Debug)]
pub struct Collection<T> {
    pub data: Vec<T>,
    #[serde(default)]
    pub total: usize,
}

/// `{"result": "ok", "data": {...}}`
#[derive(Deserialize, Debug)]
pub struct Entity<T> {
    pub data: T,
}

#[derive(Deserialize, Debug, Clone)]
pub struct Relationship {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub attributes: Option<serde_json::Value>,
}

/// Pick a readable string out of a `{"en": "...", "ja": "..."}` map.
fn localized(map: &BTreeMap<String, String>) -> Option<&str> {
    map.get("en")
        .or_else(|| map.get("ja-ro"))
        .or_else(|| map.values().next())
        .map(String::as_str)
}

#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct MangaAttributes {
    #[serde(default)]
    pub title: BTreeMap<String, String>,
    #[serde(default)]
    pub alt_titles: Vec<BTreeMap<String, String>>,
    #[serde(default)]
    pub year: Option<u32>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct Manga {
    pub id: String,
    pub attributes: MangaAttributes,
    #[serde(default)]
    pub relationships: Vec<Relationship>,
}

impl Manga {
    pub fn title(&self) -> String {
        localized(&self.attributes.title)
            .or_else(|| self.attributes.alt_titles.iter().find_map(localized))
            .unwrap_or("Untitled")
            .to_string()
    }

    /// Cover art embedded with `includes[]=cover_art`, if any.
    pub fn cover_art(&self) -> Option<CoverArt> {
        self.relationships
            .iter()
            .find(|rel| rel.kind == "cover_art")
            .and_then(|rel| CoverArt::from_relationship(rel).ok())
    }
}

impl Item for Manga {
    type Id = String;

    fn identity(&self) -> String {
        self.id.clone()
    }

    fn display_string(&self) -> String {
        match self.attributes.year {
            Some(year) => format!("{} ({})", self.title(), year),
            None => self.title(),
        }
    }
}

#[derive(Deserialize, Debug, Clone)]
pub struct MdListAttributes {
    pub name: String,
}

/// A MangaDex custom list ("MDList").
#[derive(Deserialize, Debug, Clone)]
pub struct MdList {
    pub id: String,
    pub attributes: MdListAttributes,
    #[serde(default)]
    pub relationships: Vec<Relationship>,
}

impl MdList {
    pub fn name(&self) -> &str {
        &self.attributes.name
    }

    pub fn manga_ids(&self) -> Vec<String> {
        self.relationships
            .iter()
            .filter(|rel| rel.kind == "manga")
            .map(|rel| rel.id.clone())
            .collect()
    }
}

impl Item for MdList {
    type Id = String;

    fn identity(&self) -> String {
        self.id.clone()
    }

    fn display_string(&self) -> String {
        let count = self.manga_ids().len();
        format!("{} ({} manga)", self.name(), count)
    }
}

#[derive(Deserialize, Debug, Clone)]
pub struct NamedAttributes {
    pub name: String,
}

#[derive(Deserialize, Debug, Clone)]
pub struct Group {
    pub id: String,
    pub attributes: NamedAttributes,
}

impl Group {
    pub fn name(&self) -> &str {
        &self.attributes.name
    }
}

#[derive(Deserialize, Debug, Clone)]
pub struct UserAttributes {
    pub username: String,
}

#[derive(Deserialize, Debug, Clone)]
pub struct User {
    pub id: String,
    pub attributes: UserAttributes,
}

impl User {
    pub fn name(&self) -> &str {
        &self.attributes.username
    }
}

#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
struct CoverArtAttributes {
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    volume: Option<String>,
    file_name: String,
    #[serde(default)]
    locale: Option<String>,
}

#[derive(Deserialize, Debug, Clone)]
struct CoverArtData {
    id: String,
    attributes: CoverArtAttributes,
}

/// Cover art resource, flattened from the API's `id` + `attributes` shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoverArt {
    pub id: String,
    pub description: String,
    pub volume: Option<String>,
    pub file_name: String,
    pub locale: Option<String>,
}

impl CoverArt {
    /// Build from the `data` object of `GET /cover/{id}`.
    pub fn from_data(data: serde_json::Value) -> Result<Self> {
        let data: CoverArtData = serde_json::from_value(data)?;
        Ok(data.into())
    }

    /// Build from a `cover_art` relationship that carries attributes.
    pub fn from_relationship(rel: &Relationship) -> Result<Self> {
        let attributes = rel.attributes.clone().ok_or_else(|| {
            Error::InvalidArgument(format!("cover art {} has no attributes", rel.id))
        })?;
        let attributes: CoverArtAttributes = serde_json::from_value(attributes)?;
        Ok(CoverArtData { id: rel.id.clone(), attributes }.into())
    }

    /// Download url for this cover of `manga_id`, or `None` for `CoverType::None`.
    pub fn url(&self, uploads_url: &str, manga_id: &str, kind: CoverType) -> Option<String> {
        let suffix = kind.suffix()?;
        Some(format!(
            "{}/covers/{}/{}{}",
            uploads_url.trim_end_matches('/'),
            manga_id,
            self.file_name,
            suffix
        ))
    }
}

impl From<CoverArtData> for CoverArt {
    fn from(data: CoverArtData) -> Self {
        let attr = data.attributes;
        CoverArt {
            id: data.id,
            description: attr.description.unwrap_or_default(),
            volume: attr.volume,
            file_name: attr.file_name,
            locale: attr.locale,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CoverType {
    #[default]
    Original,
    Px512,
    Px256,
    None,
}

impl CoverType {
    pub const VALID: [&'static str; 4] = ["original", "512px", "256px", "none"];

    fn suffix(self) -> Option<&'static str> {
        match self {
            CoverType::Original => Some(""),
            CoverType::Px512 => Some(".512.jpg"),
            CoverType::Px256 => Some(".256.jpg"),
            CoverType::None => None,
        }
    }
}

impl FromStr for CoverType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "original" => Ok(CoverType::Original),
            "512px" => Ok(CoverType::Px512),
            "256px" => Ok(CoverType::Px256),
            "none" => Ok(CoverType::None),
            other => Err(Error::InvalidArgument(format!(
                "\"{}\" is not a valid cover type, must be one of {}",
                other,
                Self::VALID.join(", ")
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentRating {
    Safe,
    Suggestive,
    Erotica,
    Pornographic,
}

impl ContentRating {
    pub const ALL: [ContentRating; 4] = [
        ContentRating::Safe,
        ContentRating::Suggestive,
        ContentRating::Erotica,
        ContentRating::Pornographic,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ContentRating::Safe => "safe",
            ContentRating::Suggestive => "suggestive",
            ContentRating::Erotica => "erotica",
            ContentRating::Pornographic => "pornographic",
        }
    }
}

impl FromStr for ContentRating {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        ContentRating::ALL
            .into_iter()
            .find(|rating| rating.as_str() == s.trim())
            .ok_or_else(|| {
                Error::InvalidArgument(format!("'{}' is not a valid ContentRating", s.trim()))
            })
    }
}
