mod backend;
mod hash;
mod memory;
mod store;

pub use backend::{CacheBackend, UpstashBackend};
pub use hash::{BACKGROUND_NAMESPACE, background_fingerprint, fingerprint};
pub use memory::MemoryBackend;
pub use store::CacheStore;
pub(crate) use store::short_key;
