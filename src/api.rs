// API client module: a small blocking HTTP client for the MangaDex API.
// Every call is synchronous; the prompt waits on each page fetch.

use crate::config::Config;
use crate::error::{Error, Result};
use crate::models::{Collection, ContentRating, CoverArt, Entity, Group, Manga, MdList, User};
use log::debug;
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

/// MangaDex refuses `limit` above this for most collections.
pub const MAX_LIMIT: usize = 100;

type Query = Vec<(String, String)>;

/// Blocking client holding the reqwest client, the API urls and an
/// optional bearer token for the user endpoints.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    uploads_url: String,
    token: Option<String>,
}

impl ApiClient {
    pub fn new(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("mangadex-cli/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(ApiClient {
            client,
            base_url: config.api_url.trim_end_matches('/').to_string(),
            uploads_url: config.uploads_url.trim_end_matches('/').to_string(),
            token: config.token.clone(),
        })
    }

    /// Store a token for subsequent authenticated requests.
    pub fn set_token(&mut self, token: &str) {
        self.token = Some(token.to_string());
    }

    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }

    pub fn uploads_url(&self) -> &str {
        &self.uploads_url
    }

    fn auth_headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        let token = self.token.as_ref().ok_or(Error::NotLoggedIn)?;
        let val = HeaderValue::from_str(&format!("Bearer {}", token))
            .map_err(|_| Error::InvalidArgument("token contains invalid characters".into()))?;
        headers.insert(AUTHORIZATION, val);
        Ok(headers)
    }

    fn get<T: DeserializeOwned>(&self, path: &str, query: &[(String, String)], auth: bool) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);
        debug!("GET {} {:?}", url, query);
        let mut req = self.client.get(&url).query(query);
        if auth {
            req = req.headers(self.auth_headers()?);
        }
        let res = req.send()?;
        let status = res.status();
        if !status.is_success() {
            let message = res.text().unwrap_or_default();
            return Err(Error::Api { status: status.as_u16(), message });
        }
        let body = res.text()?;
        Ok(serde_json::from_str(&body)?)
    }

    fn paged(mut query: Query, offset: usize, limit: usize) -> Query {
        query.push(("limit".into(), limit.min(MAX_LIMIT).to_string()));
        query.push(("offset".into(), offset.to_string()));
        query
    }

    /// The logged in user.
    pub fn me(&self) -> Result<User> {
        Ok(self.get::<Entity<User>>("/user/me", &[], true)?.data)
    }

    pub fn user(&self, id: &str) -> Result<User> {
        Ok(self.get::<Entity<User>>(&format!("/user/{}", id), &[], false)?.data)
    }

    pub fn group(&self, id: &str) -> Result<Group> {
        Ok(self.get::<Entity<Group>>(&format!("/group/{}", id), &[], false)?.data)
    }

    pub fn cover_art(&self, id: &str) -> Result<CoverArt> {
        let entity: Entity<serde_json::Value> = self.get(&format!("/cover/{}", id), &[], false)?;
        CoverArt::from_data(entity.data)
    }

    /// `GET /manga` with the given filters; cover art is always included.
    pub fn search_manga(&self, query: &[(String, String)], offset: usize, limit: usize) -> Result<Collection<Manga>> {
        let mut query = query.to_vec();
        query.push(("includes[]".into(), "cover_art".into()));
        self.get("/manga", &Self::paged(query, offset, limit), false)
    }

    pub fn followed_manga(&self, offset: usize, limit: usize) -> Result<Collection<Manga>> {
        let query = vec![("includes[]".to_string(), "cover_art".to_string())];
        self.get("/user/follows/manga", &Self::paged(query, offset, limit), true)
    }

    /// Ids of the library manga with reading status `status`.
    pub fn manga_with_status(&self, status: &str) -> Result<Vec<String>> {
        #[derive(serde::Deserialize)]
        struct Statuses {
            statuses: BTreeMap<String, String>,
        }
        let query = vec![("status".to_string(), status.to_string())];
        let res: Statuses = self.get("/manga/status", &query, true)?;
        Ok(res.statuses.into_keys().collect())
    }

    /// Lists of `user_id`, or of the logged in user when `None`.
    pub fn user_lists(&self, user_id: Option<&str>, offset: usize, limit: usize) -> Result<Collection<MdList>> {
        let query = Self::paged(Vec::new(), offset, limit);
        match user_id {
            Some(id) => self.get(&format!("/user/{}/list", id), &query, self.has_token()),
            None => self.get("/user/list", &query, true),
        }
    }

    pub fn followed_lists(&self, offset: usize, limit: usize) -> Result<Collection<MdList>> {
        self.get("/user/follows/list", &Self::paged(Vec::new(), offset, limit), true)
    }

    pub fn random_manga(&self, ratings: &[ContentRating]) -> Result<Manga> {
        let mut query: Query = ratings
            .iter()
            .map(|r| ("contentRating[]".to_string(), r.as_str().to_string()))
            .collect();
        query.push(("includes[]".into(), "cover_art".into()));
        Ok(self.get::<Entity<Manga>>("/manga/random", &query, false)?.data)
    }

    /// Stream `url` into `dest`. `dest` only appears once the whole body
    /// has been received.
    pub fn download(&self, url: &str, dest: &Path) -> Result<()> {
        debug!("download {} -> {}", url, dest.display());
        let mut res = self.client.get(url).send()?;
        let status = res.status();
        if !status.is_success() {
            let message = res.text().unwrap_or_default();
            return Err(Error::Api { status: status.as_u16(), message });
        }
        let dir = dest.parent().unwrap_or_else(|| Path::new("."));
        let mut file = NamedTempFile::new_in(dir)?;
        res.copy_to(&mut file)?;
        file.flush()?;
        file.persist(dest).map_err(|e| e.error)?;
        Ok(())
    }
}
