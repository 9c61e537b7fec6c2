//! Service transport: contracts, wire models, token providers and the HTTP
//! implementation.

pub mod contract;
pub mod http;
pub mod token;
pub mod wire;

pub use contract::{ConfigurationTransport, EntryLocator, GenerationTransport};
pub use http::{HttpTransport, DEFAULT_SERVICE_URI};
pub use token::{StaticTokenProvider, TokenProvider};
pub use wire::{ConfigurationRequest, ConfigurationSummary, EntryDetail, EntryRequest, StoragePayload};
