//! Docgen: document generation client
//!
//! Client for a remote document generation service. Besides requesting,
//! converting and downloading documents, it keeps a local tree of template
//! storage directories for each configuration and synchronizes it with the
//! server: `load` replaces local state with the server's and `save` pushes
//! local changes back as a minimal set of entry creates, updates and deletes.

pub mod client;
pub mod config;
pub mod configuration;
pub mod directory;
pub mod error;
pub mod hierarchy;
pub mod logging;
pub mod messages;
pub mod storage;
pub mod tooling;
pub mod transport;
pub mod types;

pub use client::{DocumentGenerationClient, PollOptions};
pub use config::{DocGenConfig, DocumentGenerationOptions};
pub use configuration::DocumentGenerationConfiguration;
pub use directory::{DirectoryId, DirectoryOutline, DirectoryTree, SyncStats, TemplateStorageDirectory};
pub use error::DocGenError;
pub use hierarchy::HierarchyPath;
pub use messages::{
    ConfigurationListItem, DocumentConversionRequestDetails, DocumentFormat,
    DocumentGenerationProgress, DocumentGenerationRequestDetails, DocumentGenerationState,
    DocumentGenerationTemplate, DocumentGenerationUri, PdfFormat,
};
pub use storage::{TemplateStorage, TemplateStorageType};
pub use transport::{ConfigurationRequest, HttpTransport, StaticTokenProvider, TokenProvider};
pub use types::{ConfigurationId, ConfigurationScope, EntryId, RequestId, SubscriptionId};
