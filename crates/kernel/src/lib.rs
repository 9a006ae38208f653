//! Service layer: game lifecycle and the per-frame update loop.
//!
//! # Invariants
//! - Every registered updatable runs exactly once per frame, in registration order.
//! - Services are stopped exactly once, in reverse start order, on every exit path.
//! - Scheduling is single-threaded and cooperative.

mod clock;
mod error;
mod game;
mod update_loop;

pub use clock::FrameClock;
pub use error::KernelError;
pub use game::{ActionService, Game, GameService, GameState};
pub use update_loop::{LoopControl, Updatable, UpdatableId, UpdateLoop};

pub fn crate_info() -> &'static str {
    "fieldwarning-kernel v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("kernel"));
    }
}
