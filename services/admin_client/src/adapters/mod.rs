pub mod file_store;
pub mod http_backend;
pub mod memory_store;
pub mod notifier;

pub use file_store::FileSessionStore;
pub use http_backend::HttpAuthBackend;
pub use memory_store::InMemorySessionStore;
pub use notifier::TracingNotifier;
