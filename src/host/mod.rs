//! Host boundary: collaborator traits and an in-memory implementation.

mod memory;
mod traits;

pub use memory::InMemoryHost;
pub use traits::{HostError, SectionHost, SignalSource, WiringSource};
