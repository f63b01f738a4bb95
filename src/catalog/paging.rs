//! Page-walking over a catalog result set.
//!
//! The loop is independent of transport: callers hand in a closure that
//! fetches `rows` documents starting at `start`.

use anyhow::Result;
use std::collections::HashSet;

use super::CatalogDoc;

/// One page of catalog results.
#[derive(Debug, Clone, Default)]
pub struct Page {
    /// Total matches the catalog reported when serving this page
    pub num_found: usize,
    pub docs: Vec<CatalogDoc>,
}

/// Fetch pages until the result set is exhausted.
///
/// Stops on an empty page, on a page that adds nothing new, or once the rows
/// consumed reach the most recently reported total. The total may shrink
/// between pages (deletions) and the loop still terminates. Documents whose id
/// was already returned are dropped.
pub fn collect_pages<F>(page_size: usize, mut fetch: F) -> Result<Vec<CatalogDoc>>
where
    F: FnMut(usize, usize) -> Result<Page>,
{
    let rows = page_size.max(1);
    let mut results = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();
    let mut consumed = 0usize;

    loop {
        let page = fetch(consumed, rows)?;
        if page.docs.is_empty() {
            break;
        }
        consumed += page.docs.len();

        let before = results.len();
        for doc in page.docs {
            if let Some(id) = doc.id() {
                if !seen.insert(id.to_string()) {
                    continue;
                }
            }
            results.push(doc);
        }
        tracing::trace!(
            "Fetched {} catalog rows ({} total reported)",
            consumed,
            page.num_found
        );

        if results.len() == before || consumed >= page.num_found {
            break;
        }
    }

    Ok(results)
}
