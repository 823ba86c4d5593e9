// Paginator: slices a lazy (possibly infinite) source into fixed-size
// pages. Pages are cached once pulled so walking back and forth never
// hits the source twice, and labels stay stable for a whole session.

use crate::error::{Error, Result};
use log::debug;

/// One page of `(label, item)` pairs.
pub type Page<T> = Vec<(usize, T)>;

pub struct Paginator<T> {
    source: Box<dyn Iterator<Item = Result<T>>>,
    pages: Vec<Vec<T>>,
    // Items pulled for a page that failed half way; the next fill resumes here.
    pending: Vec<T>,
    drained: bool,
    pos: usize,
    limit: usize,
}

impl<T: Clone> Paginator<T> {
    /// Wrap a fallible source. A `limit` of zero is treated as one.
    pub fn new<I>(source: I, limit: usize) -> Self
    where
        I: IntoIterator<Item = Result<T>>,
        I::IntoIter: 'static,
    {
        Paginator {
            source: Box::new(source.into_iter()),
            pages: Vec::new(),
            pending: Vec::new(),
            drained: false,
            pos: 0,
            limit: limit.max(1),
        }
    }

    /// Wrap a source that cannot fail.
    pub fn from_items<I>(items: I, limit: usize) -> Self
    where
        I: IntoIterator<Item = T>,
        I::IntoIter: 'static,
        T: 'static,
    {
        Self::new(items.into_iter().map(Ok), limit)
    }

    /// Index of the page the next call to `next()` returns.
    pub fn pos(&self) -> usize {
        self.pos
    }

    /// Return the page after the last one returned.
    pub fn next(&mut self) -> Result<Page<T>> {
        let pos = self.pos;
        if !self.ensure_loaded(pos)? {
            return Err(Error::Exhausted);
        }
        self.pos += 1;
        Ok(self.labelled(pos))
    }

    /// Return the page before the last one returned.
    pub fn previous(&mut self) -> Result<Page<T>> {
        if self.pos < 2 {
            return Err(Error::OutOfRange);
        }
        let pos = self.pos - 2;
        self.pos -= 1;
        Ok(self.labelled(pos))
    }

    /// Return the last page handed out again, without moving.
    pub fn current(&self) -> Result<Page<T>> {
        match self.pos.checked_sub(1) {
            Some(pos) => Ok(self.labelled(pos)),
            None => Err(Error::OutOfRange),
        }
    }

    fn labelled(&self, pos: usize) -> Page<T> {
        let start = pos * self.limit;
        self.pages[pos]
            .iter()
            .cloned()
            .enumerate()
            .map(|(i, item)| (start + i, item))
            .collect()
    }

    fn ensure_loaded(&mut self, pos: usize) -> Result<bool> {
        while self.pages.len() <= pos {
            if !self.fill()? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    // Pull one page from the source. Returns false once nothing is left.
    fn fill(&mut self) -> Result<bool> {
        while !self.drained && self.pending.len() < self.limit {
            match self.source.next() {
                Some(item) => self.pending.push(item?),
                None => self.drained = true,
            }
        }
        if self.pending.is_empty() {
            return Ok(false);
        }
        let page = std::mem::take(&mut self.pending);
        debug!("paginator: loaded page {} ({} items)", self.pages.len(), page.len());
        self.pages.push(page);
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels<T>(page: &Page<T>) -> Vec<usize> {
        page.iter().map(|(label, _)| *label).collect()
    }

    #[test]
    fn pages_cover_the_source_in_order() {
        for limit in 1..=4 {
            for len in 0..=9usize {
                let source: Vec<usize> = (0..len).collect();
                let mut paginator = Paginator::from_items(source.clone(), limit);
                let mut seen = Vec::new();
                let mut pages = 0;
                while let Ok(page) = paginator.next() {
                    assert!(page.len() <= limit);
                    seen.extend(page.into_iter().map(|(_, item)| item));
                    pages += 1;
                }
                assert_eq!(pages, (len + limit - 1) / limit);
                assert_eq!(seen, source);
            }
        }
    }

    #[test]
    fn labels_continue_across_pages() {
        let mut paginator = Paginator::from_items(vec!['A', 'B', 'C', 'D', 'E'], 2);
        let first = paginator.next().unwrap();
        assert_eq!(first, vec![(0, 'A'), (1, 'B')]);
        let second = paginator.next().unwrap();
        assert_eq!(labels(&second), vec![2, 3]);
        let third = paginator.next().unwrap();
        assert_eq!(third, vec![(4, 'E')]);
        assert!(matches!(paginator.next(), Err(Error::Exhausted)));
        // retrying after exhaustion stays exhausted and does not move
        assert!(matches!(paginator.next(), Err(Error::Exhausted)));
        assert_eq!(paginator.pos(), 3);
    }

    #[test]
    fn previous_needs_an_earlier_page() {
        let mut paginator = Paginator::from_items(vec![1, 2, 3], 2);
        assert!(matches!(paginator.previous(), Err(Error::OutOfRange)));
        paginator.next().unwrap();
        assert!(matches!(paginator.previous(), Err(Error::OutOfRange)));
    }

    #[test]
    fn previous_then_next_returns_cached_pages() {
        let mut paginator = Paginator::from_items(vec![1, 2, 3, 4, 5], 2);
        paginator.next().unwrap();
        paginator.next().unwrap();
        assert_eq!(paginator.previous().unwrap(), vec![(0, 1), (1, 2)]);
        assert_eq!(paginator.next().unwrap(), vec![(2, 3), (3, 4)]);
        assert_eq!(paginator.current().unwrap(), vec![(2, 3), (3, 4)]);
    }

    #[test]
    fn source_error_keeps_partial_page_for_retry() {
        let source = vec![
            Ok(1),
            Err(Error::Api { status: 503, message: "busy".into() }),
            Ok(2),
            Ok(3),
        ];
        let mut paginator = Paginator::new(source, 2);
        assert!(matches!(paginator.next(), Err(Error::Api { status: 503, .. })));
        assert_eq!(paginator.next().unwrap(), vec![(0, 1), (1, 2)]);
        assert_eq!(paginator.next().unwrap(), vec![(2, 3)]);
    }

    #[test]
    fn infinite_source_is_read_lazily() {
        let mut paginator = Paginator::from_items(0u64.., 3);
        assert_eq!(labels(&paginator.next().unwrap()), vec![0, 1, 2]);
        assert_eq!(paginator.next().unwrap()[0], (3, 3));
    }
}
