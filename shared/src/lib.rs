//! Shared types for the JSON model format 3.1.
//!
//! Format constants, decimal precisions, frame-rate presets and the numeric
//! helpers that give every exported value its canonical rounded form. Used by
//! `jsmodel-export` and by anything that needs to walk its output.

pub mod format;
pub mod frame_rate;
pub mod math;

pub use format::*;
pub use frame_rate::{FrameRate, UnknownFrameRate};
pub use math::{f64_to_unorm8, pack_color_rgb8, round_array, round_to, unpack_color_rgb8};
