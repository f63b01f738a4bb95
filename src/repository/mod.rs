//! Metadata repository access.
//!
//! "Do X": Fetch an object's bytes and test whether an object still exists.
//!
//! `exists` answers `Ok(false)` only when the repository positively reports the
//! object as gone. Timeouts, auth failures and server errors come back as `Err`
//! so callers never mistake an outage for a deletion.

mod fedora;

pub use fedora::FedoraRepository;

use anyhow::Result;

/// Read-only access to the repository of record.
pub trait Repository: Send + Sync {
    /// Content stored at the object's path.
    fn get(&self, id: &str) -> Result<Vec<u8>>;

    /// Content of one named datastream of an object, e.g. `descMetadata`.
    fn datastream(&self, id: &str, name: &str) -> Result<Vec<u8>>;

    /// `Ok(true)` when present, `Ok(false)` when confirmed absent.
    fn exists(&self, id: &str) -> Result<bool>;
}

/// Number of two-character segments used to shard object paths.
const PAIRTREE_DEPTH: usize = 4;

/// Sharded path for an identifier: `abcd1234xy` -> `ab/cd/12/34/abcd1234xy`.
///
/// Short identifiers get as many whole pairs as they have. `:` is percent
/// encoded so legacy identifiers stay a single path segment.
pub fn object_path(id: &str) -> String {
    let encoded = id.replace('%', "%25").replace(':', "%3A").replace('/', "%2F");
    let chars: Vec<char> = id.chars().filter(|c| c.is_ascii_alphanumeric()).collect();

    let mut segments: Vec<String> = chars
        .chunks(2)
        .take(PAIRTREE_DEPTH)
        .filter(|pair| pair.len() == 2)
        .map(|pair| pair.iter().collect())
        .collect();
    segments.push(encoded);
    segments.join("/")
}
