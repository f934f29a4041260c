//! Limit/offset pagination of list endpoints.

use serde::{Deserialize, Serialize};

#[derive(Copy, Clone, Eq, PartialEq, Debug, Default, Hash, Deserialize)]
pub struct LimitOffset {
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

#[derive(Clone, Eq, PartialEq, Debug, Serialize)]
pub struct Page<T> {
    pub count: usize,
    pub next: Option<String>,
    pub previous: Option<String>,
    pub results: Vec<T>,
}

/// A list response: a page when a limit was requested, everything otherwise.
#[derive(Clone, Eq, PartialEq, Debug, Serialize)]
#[serde(untagged)]
pub enum Listing<T> {
    Page(Page<T>),
    All(Vec<T>),
}

impl LimitOffset {
    /// Cuts `items` down to the requested window. `path` is the request path
    /// the `next`/`previous` links are built on.
    pub fn paginate<T>(self, items: Vec<T>, path: &str) -> Listing<T> {
        let Some(limit) = self.limit.filter(|&limit| limit > 0) else {
            return Listing::All(items);
        };
        let offset = self.offset.unwrap_or(0);
        let count = items.len();

        let next_offset = offset.saturating_add(limit);
        let next = (next_offset < count).then(|| link(path, limit, next_offset));
        let previous = (offset > 0).then(|| link(path, limit, offset.saturating_sub(limit)));
        let results = items.into_iter().skip(offset).take(limit).collect();

        Listing::Page(Page {
            count,
            next,
            previous,
            results,
        })
    }
}

fn link(path: &str, limit: usize, offset: usize) -> String {
    if offset == 0 {
        format!("{path}?limit={limit}")
    } else {
        format!("{path}?limit={limit}&offset={offset}")
    }
}
