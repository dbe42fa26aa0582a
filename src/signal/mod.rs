//! Trade sides and the cross-process signal artifact channel

mod channel;
mod file;
mod types;

pub use channel::{ChannelError, MemoryChannel, SignalChannel};
pub use file::FileChannel;
pub use types::{ArtifactKind, Side, SignalAction, SignalArtifact};
