//! Client-side game systems
//!
//! Organized into submodules for maintainability.

mod animation;
mod hud;
mod physics;
mod player;
mod world;

// Re-export everything for easy access from main.rs
pub use animation::*;
pub use hud::*;
pub use physics::*;
pub use player::*;
pub use world::*;
