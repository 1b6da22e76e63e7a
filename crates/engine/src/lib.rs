#![allow(clippy::collapsible_if)]
//! Series clustering and episode inference over a flat catalog snapshot.
//!
//! Everything except [`reclassify::apply`] is pure: no I/O, no logging, no
//! mutation of the input. Diagnostics come back as a [`trace::GroupingTrace`].

pub mod assemble;
pub mod cluster;
pub mod display;
pub mod extract;
pub mod normalize;
pub mod reclassify;
pub mod representative;
pub mod trace;

pub use cluster::{Strictness, build_clusters};
pub use display::group_for_display;
pub use reclassify::detect;
