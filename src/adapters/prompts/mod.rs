//! Prompt store adapters.
//!
//! - `HttpPromptStore` - Remote prompt management service over HTTP
//! - `CachedPromptStore` - TTL cache wrapping any other store
//! - `InMemoryPromptStore` - Static prompts for tests and unconfigured servers

mod cached;
mod http;
mod in_memory;

pub use cached::CachedPromptStore;
pub use http::{HttpPromptStore, HttpPromptStoreConfig};
pub use in_memory::InMemoryPromptStore;
