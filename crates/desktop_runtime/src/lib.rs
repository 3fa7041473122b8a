//! Spatial interaction engine for the simulated desktop.
//!
//! The engine is a synchronous, single-threaded state machine: pointer and
//! keyboard input becomes [`reducer::DesktopAction`]s, [`reducer::reduce`]
//! mutates [`model::DesktopState`] immediately for local responsiveness, and
//! the returned [`reducer::RuntimeEffect`]s tell the host what to persist,
//! publish, or open. Nothing in this crate touches a network or a clock; time
//! arrives as `now_ms` arguments.

pub mod drag;
pub mod grid;
pub mod model;
pub mod persistence;
pub mod reducer;
pub mod registry;
pub mod selection;
pub mod window_manager;
