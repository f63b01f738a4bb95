pub mod cancel;
pub mod catalog;
pub mod config;
pub mod document;
pub mod error;
pub mod lock;
pub mod publish;
pub mod repository;
pub mod resolver;
pub mod shadow;
pub mod staging;
pub mod stats;
pub mod sync;

// Re-export commonly used types
pub use cancel::CancelFlag;
pub use config::IndexerConfig;
pub use document::IndexDocument;
pub use error::IndexerError;
