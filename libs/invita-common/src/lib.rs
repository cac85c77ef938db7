pub mod feed;
pub mod id;
pub mod reaction;
pub mod wire;

pub use reaction::ReactionKind;
pub use wire::{ClientFrame, ServerFrame};
