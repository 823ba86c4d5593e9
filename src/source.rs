// Lazy sources for the paginator. Each one requests the next chunk of a
// MangaDex collection only when the items buffered so far are used up.

use crate::api::{ApiClient, MAX_LIMIT};
use crate::error::Result;
use crate::models::{Collection, ContentRating, Manga};
use log::debug;
use std::collections::VecDeque;

/// Fetches one chunk of a collection: `(offset, limit) -> Collection<T>`.
pub type FetchFn<T> = Box<dyn FnMut(usize, usize) -> Result<Collection<T>>>;

/// Walks an offset/limit collection endpoint until `total` is reached.
pub struct OffsetPages<T> {
    fetch: FetchFn<T>,
    buffer: VecDeque<T>,
    offset: usize,
    chunk: usize,
    done: bool,
}

impl<T> OffsetPages<T> {
    pub fn new(chunk: usize, fetch: impl FnMut(usize, usize) -> Result<Collection<T>> + 'static) -> Self {
        OffsetPages {
            fetch: Box::new(fetch),
            buffer: VecDeque::new(),
            offset: 0,
            chunk: chunk.clamp(1, MAX_LIMIT),
            done: false,
        }
    }

    fn refill(&mut self) -> Result<()> {
        let collection = (self.fetch)(self.offset, self.chunk)?;
        let received = collection.data.len();
        debug!(
            "source: offset {} received {} of {}",
            self.offset, received, collection.total
        );
        self.offset += received;
        if received == 0 || self.offset >= collection.total {
            self.done = true;
        }
        self.buffer.extend(collection.data);
        Ok(())
    }
}

impl<T> Iterator for OffsetPages<T> {
    type Item = Result<T>;

    fn next(&mut self) -> Option<Result<T>> {
        if self.buffer.is_empty() && !self.done {
            if let Err(e) = self.refill() {
                return Some(Err(e));
            }
        }
        self.buffer.pop_front().map(Ok)
    }
}

/// Manga matching a title and filter query.
pub fn search_manga(client: ApiClient, title: Option<String>, mut query: Vec<(String, String)>, chunk: usize) -> OffsetPages<Manga> {
    if let Some(title) = title.filter(|t| !t.trim().is_empty()) {
        query.push(("title".into(), title));
    }
    OffsetPages::new(chunk, move |offset, limit| client.search_manga(&query, offset, limit))
}

/// Manga with the given ids, requested in chunks through `ids[]`.
pub fn manga_by_ids(client: ApiClient, ids: Vec<String>, chunk: usize) -> impl Iterator<Item = Result<Manga>> {
    let chunks: Vec<Vec<String>> = ids
        .chunks(chunk.clamp(1, MAX_LIMIT))
        .map(<[String]>::to_vec)
        .collect();
    chunks.into_iter().flat_map(move |ids| {
        match client.search_manga(&ids_query(&ids), 0, ids.len()) {
            Ok(found) => found.data.into_iter().map(Ok).collect::<Vec<_>>(),
            Err(e) => vec![Err(e)],
        }
    })
}

// `/manga` hides pornographic titles unless every rating is asked for.
fn ids_query(ids: &[String]) -> Vec<(String, String)> {
    let ids = ids.iter().map(|id| ("ids[]".to_string(), id.clone()));
    let ratings = ContentRating::ALL
        .iter()
        .map(|r| ("contentRating[]".to_string(), r.as_str().to_string()));
    ids.chain(ratings).collect()
}

/// An endless stream of random manga.
pub struct RandomManga {
    client: ApiClient,
    ratings: Vec<ContentRating>,
}

impl RandomManga {
    pub fn new(client: ApiClient, ratings: Vec<ContentRating>) -> Self {
        RandomManga { client, ratings }
    }
}

impl Iterator for RandomManga {
    type Item = Result<Manga>;

    fn next(&mut self) -> Option<Result<Manga>> {
        Some(self.client.random_manga(&self.ratings))
    }
}
