// Library root
// -----------
// This crate exposes the pieces used by the `mangadex-cli` binary to
// browse MangaDex results page by page and resolve the user's choice to
// manga or list ids.
//
// Module responsibilities:
// - `api`: blocking HTTP calls against the MangaDex API.
// - `config`: environment configuration and token persistence.
// - `models` / `source`: domain objects and the lazy iterators that page
//   through API collections.
// - `filters`: parsing of `key=value` tokens given on the command line.
// - `paginator` / `selector`: the paginated choose-one-or-many prompt.
// - `commands`: the concrete prompts (search, library, lists, group,
//   random) built on top of the selector.
// - `ui`: terminal input/output, spinners and previews.
pub mod api;
pub mod commands;
pub mod config;
pub mod error;
pub mod filters;
pub mod models;
pub mod paginator;
pub mod selector;
pub mod source;
pub mod ui;

pub use error::{Error, Result};
