//! Entity instances and their identity.

mod access;
mod handle;
mod reference;

pub use access::Entity;
pub(crate) use access::TrackedInstance;
pub use handle::EntityHandle;
pub use reference::EntityRef;
