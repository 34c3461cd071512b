//! Import pipeline services.

pub mod coercion;
pub mod event_broadcaster;
pub mod mapper;
pub mod references;
pub mod schema;
pub mod session;
pub mod store;
pub mod tabular;

pub use event_broadcaster::EventBroadcaster;
pub use references::{KnownSchools, ReferencePolicy, ReferenceResolver};
pub use session::UploadSession;
pub use store::{MemoryStore, RecordStore};
