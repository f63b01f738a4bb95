//! Search index publishing.
//!
//! "Do X": Submit staged add documents to the discovery index, then make them
//! visible (commit) or compact the index (optimize).
//!
//! A rejected submission is an error for that document only; nothing here
//! retries. Commit and optimize failures never undo documents already accepted.

mod solr;

pub use solr::SolrPublisher;

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

use crate::cancel::CancelFlag;

/// Write access to the search index.
pub trait IndexPublisher: Send + Sync {
    /// Submit one add document.
    fn publish(&self, add_xml: &str) -> Result<()>;

    /// Make submitted documents searchable.
    fn commit(&self) -> Result<()>;

    /// Compact the index.
    fn optimize(&self) -> Result<()>;
}

/// Submit a staged artifact as-is.
pub fn publish_file(publisher: &dyn IndexPublisher, path: &Path) -> Result<()> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read staged document {}", path.display()))?;
    publisher
        .publish(&content)
        .with_context(|| format!("Failed to publish {}", path.display()))
}

/// Outcome of publishing a batch of staged artifacts.
#[derive(Debug, Default)]
pub struct PublishStats {
    pub published: usize,
    pub errors: usize,
    pub committed: bool,
    /// Stopped before every file was sent
    pub cancelled: bool,
}

/// Publish each file, then commit once if anything was accepted.
///
/// Per-file failures are logged and counted; a commit failure is logged and
/// reported through `committed`. Cancellation stops sending but still commits
/// what was accepted.
pub fn publish_batch<P: AsRef<Path>>(
    publisher: &dyn IndexPublisher,
    paths: &[P],
    cancel: &CancelFlag,
) -> PublishStats {
    let mut stats = PublishStats::default();
    for path in paths {
        if cancel.is_cancelled() {
            stats.cancelled = true;
            tracing::warn!("Publishing cancelled after {} documents", stats.published);
            break;
        }
        let path = path.as_ref();
        match publish_file(publisher, path) {
            Ok(()) => {
                stats.published += 1;
                tracing::debug!("Published {}", path.display());
            }
            Err(e) => {
                stats.errors += 1;
                tracing::error!("{:#}", e);
            }
        }
    }

    if stats.published > 0 {
        match publisher.commit() {
            Ok(()) => stats.committed = true,
            Err(e) => tracing::error!("Commit failed: {:#}", e),
        }
    }
    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use tempfile::TempDir;

    #[derive(Default)]
    struct RecordingPublisher {
        submitted: Mutex<Vec<String>>,
        commits: Mutex<usize>,
    }

    impl IndexPublisher for RecordingPublisher {
        fn publish(&self, add_xml: &str) -> Result<()> {
            if add_xml.contains("reject-me") {
                anyhow::bail!("index rejected document");
            }
            self.submitted.lock().push(add_xml.to_string());
            Ok(())
        }

        fn commit(&self) -> Result<()> {
            *self.commits.lock() += 1;
            Ok(())
        }

        fn optimize(&self) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_batch_counts_failures_and_commits_once() {
        let tmp = TempDir::new().unwrap();
        let good = tmp.path().join("a.xml");
        let bad = tmp.path().join("b.xml");
        let missing = tmp.path().join("c.xml");
        fs::write(&good, "<add><doc/></add>").unwrap();
        fs::write(&bad, "<add><doc>reject-me</doc></add>").unwrap();

        let publisher = RecordingPublisher::default();
        let stats = publish_batch(&publisher, &[good, bad, missing], &CancelFlag::new());

        assert_eq!(stats.published, 1);
        assert_eq!(stats.errors, 2);
        assert!(stats.committed);
        assert_eq!(*publisher.commits.lock(), 1);
    }

    #[test]
    fn test_nothing_published_skips_commit() {
        let publisher = RecordingPublisher::default();
        let stats = publish_batch::<&Path>(&publisher, &[], &CancelFlag::new());
        assert!(!stats.committed);
        assert_eq!(*publisher.commits.lock(), 0);
    }

    #[test]
    fn test_cancelled_batch_sends_nothing() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("a.xml");
        fs::write(&path, "<add><doc/></add>").unwrap();
        let cancel = CancelFlag::new();
        cancel.cancel();

        let publisher = RecordingPublisher::default();
        let stats = publish_batch(&publisher, &[path], &cancel);

        assert!(stats.cancelled);
        assert_eq!(stats.published, 0);
        assert!(publisher.submitted.lock().is_empty());
        assert_eq!(*publisher.commits.lock(), 0);
    }
}
