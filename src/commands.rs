// The concrete prompts. Each command only decides where its items come
// from, how they are previewed and what to say when there are none; the
// selector does the rest.

use crate::api::ApiClient;
use crate::error::{Error, Result};
use crate::filters::{get_key_value, split_comma_separated, validate_identifier, SearchFilters};
use crate::models::{ContentRating, CoverType, Manga, MdList, User};
use crate::paginator::Paginator;
use crate::selector::{PromptHooks, Selector};
use crate::source::{self, OffsetPages, RandomManga};
use crate::ui::{self, dynamic_bars, Console};
use log::{debug, info};
use std::path::PathBuf;

pub const DEFAULT_PAGE_SIZE: usize = 10;
const RANDOM_PAGE_SIZE: usize = 5;

/// Reading statuses accepted by `/manga/status`.
pub const LIBRARY_STATUSES: [&str; 6] = [
    "reading",
    "on_hold",
    "plan_to_read",
    "dropped",
    "re_reading",
    "completed",
];

/// Settings shared by every command.
#[derive(Debug, Clone)]
pub struct CommandOptions {
    pub page_size: usize,
    pub cover: CoverType,
    pub image_viewer: Option<String>,
}

impl Default for CommandOptions {
    fn default() -> Self {
        CommandOptions {
            page_size: DEFAULT_PAGE_SIZE,
            cover: CoverType::default(),
            image_viewer: None,
        }
    }
}

pub type MangaSelector = Selector<Manga, MangaHooks>;
pub type ListSelector = Selector<MdList, ListHooks>;

/// Manga prompts preview the cover art.
pub struct MangaHooks {
    client: ApiClient,
    cover: CoverType,
    viewer: Option<String>,
    empty_message: String,
}

impl MangaHooks {
    fn new(client: &ApiClient, opts: &CommandOptions, empty_message: String) -> Self {
        MangaHooks {
            client: client.clone(),
            cover: opts.cover,
            viewer: opts.image_viewer.clone(),
            empty_message,
        }
    }
}

impl PromptHooks<Manga> for MangaHooks {
    fn supports_preview(&self) -> bool {
        self.cover != CoverType::None
    }

    fn preview(&self, item: &Manga, console: &mut dyn Console) -> Result<()> {
        preview_cover(&self.client, item, self.cover, self.viewer.as_deref(), console)
    }

    fn on_empty(&self) -> Result<()> {
        Err(Error::EmptySource(self.empty_message.clone()))
    }
}

/// List prompts preview the titles inside the list.
pub struct ListHooks {
    client: ApiClient,
    empty_message: String,
}

impl PromptHooks<MdList> for ListHooks {
    fn supports_preview(&self) -> bool {
        true
    }

    fn preview(&self, item: &MdList, console: &mut dyn Console) -> Result<()> {
        preview_list(&self.client, item, console)
    }

    fn on_empty(&self) -> Result<()> {
        Err(Error::EmptySource(self.empty_message.clone()))
    }
}

fn with_spinner<T>(message: &str, f: impl FnOnce() -> Result<T>) -> Result<T> {
    let spinner = ui::spinner(message);
    let res = f();
    spinner.finish_and_clear();
    res
}

fn logged_in_user(client: &ApiClient) -> Result<User> {
    if !client.has_token() {
        return Err(Error::NotLoggedIn);
    }
    with_spinner("Fetching user...", || client.me())
}

// Value after the first `:` of an argument such as `status:reading`.
fn argument_value(input_text: Option<&str>) -> Option<String> {
    let (_, value) = get_key_value(input_text?, ':');
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

/// Manga search results for `text`, narrowed by `key=value` filters.
pub fn search(client: &ApiClient, opts: &CommandOptions, text: &str, filters: &[String]) -> Result<MangaSelector> {
    let filters = SearchFilters::parse(filters)?;
    debug!("search: {:?}", filters);
    let iterator = source::search_manga(client.clone(), Some(text.to_string()), filters.to_query(), opts.page_size);
    Ok(Selector::new(
        format!("Manga search results for \"{}\"", text),
        Paginator::new(iterator, opts.page_size),
        MangaHooks::new(client, opts, format!("Manga search results for \"{}\" are empty", text)),
    ))
}

/// Manga in the logged in user's library, optionally `status:<reading status>`.
pub fn library_manga(client: &ApiClient, opts: &CommandOptions, input_text: Option<&str>) -> Result<MangaSelector> {
    let status = argument_value(input_text);
    if let Some(status) = &status {
        if !LIBRARY_STATUSES.contains(&status.as_str()) {
            return Err(Error::InvalidArgument(format!(
                "\"{}\" is not a valid reading status, must be one of {}",
                status,
                LIBRARY_STATUSES.join(", ")
            )));
        }
    }
    let user = logged_in_user(client)?;
    let hooks = MangaHooks::new(client, opts, format!("User \"{}\" has no manga in library", user.name()));
    let title = format!("List of manga from user library \"{}\"", user.name());

    let paginator = match status {
        Some(status) => {
            let ids = with_spinner("Fetching library...", || client.manga_with_status(&status))?;
            info!("library: {} manga with status {}", ids.len(), status);
            Paginator::new(source::manga_by_ids(client.clone(), ids, opts.page_size), opts.page_size)
        }
        None => {
            let api = client.clone();
            let iterator = OffsetPages::new(opts.page_size, move |offset, limit| api.followed_manga(offset, limit));
            Paginator::new(iterator, opts.page_size)
        }
    };
    Ok(Selector::new(title, paginator, hooks))
}

/// Lists saved by `user:<id or url>`, or by the logged in user.
pub fn library_lists(client: &ApiClient, opts: &CommandOptions, input_text: Option<&str>) -> Result<ListSelector> {
    let (user, user_id) = match argument_value(input_text) {
        Some(raw) => {
            let id = validate_identifier(&raw)?;
            let user = with_spinner("Fetching user...", || client.user(&id))?;
            (user, Some(id))
        }
        None => (logged_in_user(client)?, None),
    };

    let api = client.clone();
    let iterator = OffsetPages::new(opts.page_size, move |offset, limit| {
        api.user_lists(user_id.as_deref(), offset, limit)
    });
    Ok(Selector::new(
        format!("List of saved MDList from user \"{}\"", user.name()),
        Paginator::new(iterator, opts.page_size),
        ListHooks {
            client: client.clone(),
            empty_message: format!("User \"{}\" has no saved lists", user.name()),
        },
    ))
}

/// Lists the logged in user follows.
pub fn followed_lists(client: &ApiClient, opts: &CommandOptions) -> Result<ListSelector> {
    let user = logged_in_user(client)?;
    let api = client.clone();
    let iterator = OffsetPages::new(opts.page_size, move |offset, limit| api.followed_lists(offset, limit));
    Ok(Selector::new(
        format!("List of followed MDlist from user \"{}\"", user.name()),
        Paginator::new(iterator, opts.page_size),
        ListHooks {
            client: client.clone(),
            empty_message: format!("User \"{}\" has no followed lists", user.name()),
        },
    ))
}

/// Manga uploaded by the scanlator group `group:<id or url>`.
pub fn group_manga(client: &ApiClient, opts: &CommandOptions, input_text: Option<&str>) -> Result<MangaSelector> {
    let raw = argument_value(input_text)
        .ok_or_else(|| Error::InvalidArgument("group id or url are required".into()))?;
    let group_id = validate_identifier(&raw)?;
    let group = with_spinner("Fetching group...", || client.group(&group_id))?;

    let query = vec![("group".to_string(), group.id.clone())];
    let iterator = source::search_manga(client.clone(), None, query, opts.page_size);
    Ok(Selector::new(
        format!("List of manga from group \"{}\"", group.name()),
        Paginator::new(iterator, opts.page_size),
        MangaHooks::new(client, opts, format!("Group \"{}\" has no uploaded mangas", group.name())),
    ))
}

/// Parse `content_rating:<a,b>`; every rating when none is given.
pub fn parse_content_ratings(input_text: Option<&str>) -> Result<Vec<ContentRating>> {
    match argument_value(input_text) {
        None => Ok(ContentRating::ALL.to_vec()),
        Some(raw) => split_comma_separated(&raw, true)
            .values()
            .iter()
            .map(|v| v.parse())
            .collect(),
    }
}

/// Random manga, five per page.
pub fn random_manga(client: &ApiClient, opts: &CommandOptions, input_text: Option<&str>) -> Result<MangaSelector> {
    let ratings = parse_content_ratings(input_text)?;
    debug!("random: content ratings {:?}", ratings);
    Ok(Selector::new(
        "Found random manga",
        Paginator::new(RandomManga::new(client.clone(), ratings), RANDOM_PAGE_SIZE),
        MangaHooks::new(client, opts, "Unknown error when fetching random manga".into()),
    ))
}

fn cover_cache_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("mangadex-cli")
        .join("covers")
}

/// Download the manga's cover and show it in an image viewer.
pub fn preview_cover(
    client: &ApiClient,
    manga: &Manga,
    cover_type: CoverType,
    viewer: Option<&str>,
    console: &mut dyn Console,
) -> Result<()> {
    let cover = match manga.cover_art() {
        Some(cover) => cover,
        None => {
            let rel = match manga.relationships.iter().find(|rel| rel.kind == "cover_art") {
                Some(rel) => rel,
                None => {
                    console.show(&format!("\n\"{}\" has no cover art\n", manga.title()));
                    return Ok(());
                }
            };
            with_spinner("Fetching cover...", || client.cover_art(&rel.id))?
        }
    };
    let url = match cover.url(client.uploads_url(), &manga.id, cover_type) {
        Some(url) => url,
        None => return Ok(()),
    };

    let dir = cover_cache_dir();
    std::fs::create_dir_all(&dir)?;
    let file_name = url.rsplit('/').next().unwrap_or(&cover.file_name);
    let path = dir.join(file_name);
    if !path.exists() {
        with_spinner("Downloading cover...", || client.download(&url, &path))?;
    }

    console.show("\nOpening the cover in an image viewer\n");
    ui::open_image(&path, viewer)
}

/// Print the titles of the manga saved in `list`.
pub fn preview_list(client: &ApiClient, list: &MdList, console: &mut dyn Console) -> Result<()> {
    let ids = list.manga_ids();
    let titles = with_spinner("Fetching list...", || {
        source::manga_by_ids(client.clone(), ids, crate::api::MAX_LIMIT)
            .map(|manga| manga.map(|m| m.title()))
            .collect::<Result<Vec<_>>>()
    })?;
    console.show(&render_list_preview(list.name(), &titles));
    Ok(())
}

fn render_list_preview(name: &str, titles: &[String]) -> String {
    let header = format!("List of mangas from MangaDex list \"{}\"", name);
    let mut text = format!("\n\n{}\n{}\n", header, dynamic_bars(&header));
    for title in titles {
        text.push_str(title);
        text.push('\n');
    }
    text.push_str("\n\n");
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    fn offline_client() -> ApiClient {
        let config = Config {
            api_url: "http://127.0.0.1:9".into(),
            ..Config::default()
        };
        ApiClient::new(&config).unwrap()
    }

    #[test]
    fn content_ratings_default_to_all() {
        assert_eq!(parse_content_ratings(None).unwrap(), ContentRating::ALL.to_vec());
        assert_eq!(parse_content_ratings(Some("content_rating:")).unwrap().len(), 4);
    }

    #[test]
    fn content_ratings_are_validated() {
        assert_eq!(
            parse_content_ratings(Some("content_rating:safe, suggestive")).unwrap(),
            vec![ContentRating::Safe, ContentRating::Suggestive]
        );
        assert!(matches!(
            parse_content_ratings(Some("content_rating:safe,spicy")),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn argument_value_after_colon() {
        assert_eq!(argument_value(Some("status:reading")).as_deref(), Some("reading"));
        assert_eq!(argument_value(Some("status:")), None);
        assert_eq!(argument_value(Some("status")), None);
        assert_eq!(argument_value(None), None);
    }

    #[test]
    fn library_requires_login() {
        let client = offline_client();
        let opts = CommandOptions::default();
        assert!(matches!(library_manga(&client, &opts, None), Err(Error::NotLoggedIn)));
        assert!(matches!(followed_lists(&client, &opts), Err(Error::NotLoggedIn)));
        assert!(matches!(library_lists(&client, &opts, Some("user:")), Err(Error::NotLoggedIn)));
    }

    #[test]
    fn library_rejects_unknown_status() {
        let client = offline_client();
        let res = library_manga(&client, &CommandOptions::default(), Some("status:binging"));
        assert!(matches!(res, Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn group_needs_a_valid_id() {
        let client = offline_client();
        let opts = CommandOptions::default();
        assert!(matches!(group_manga(&client, &opts, Some("group:")), Err(Error::InvalidArgument(_))));
        assert!(matches!(
            group_manga(&client, &opts, Some("group:not-an-id")),
            Err(Error::InvalidIdentifier(_))
        ));
    }

    #[test]
    fn search_builds_titled_selector() {
        let client = offline_client();
        let filters = vec!["order[createdAt]=asc".to_string()];
        let selector = search(&client, &CommandOptions::default(), "komi", &filters).unwrap();
        assert_eq!(selector.title(), "Manga search results for \"komi\"");
        assert!(search(&client, &CommandOptions::default(), "komi", &["bad".to_string()]).is_err());
    }

    #[test]
    fn manga_hooks_report_empty_results() {
        let client = offline_client();
        let opts = CommandOptions { cover: CoverType::None, ..Default::default() };
        let hooks = MangaHooks::new(&client, &opts, "nothing".into());
        assert!(!hooks.supports_preview());
        assert!(matches!(hooks.on_empty(), Err(Error::EmptySource(msg)) if msg == "nothing"));
    }

    #[test]
    fn list_preview_text() {
        let text = render_list_preview("Favs", &["A".to_string(), "B".to_string()]);
        let header = "List of mangas from MangaDex list \"Favs\"";
        assert!(text.contains(&format!("{}\n{}\n", header, "=".repeat(header.len()))));
        assert!(text.contains("A\nB\n"));
    }
}
