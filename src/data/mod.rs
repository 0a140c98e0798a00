// Data structures for mediabridge

pub mod command;
pub mod playback_state;
pub mod snapshot;

// Re-export types from child modules
pub use command::*;
pub use playback_state::*;
pub use snapshot::*;
