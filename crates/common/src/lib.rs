//! Shared value types used across the renderer crates.

mod types;

pub use types::{Colour, Extent, FrameTime, Transform};
