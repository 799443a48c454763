//! Foundation module - math types and frame timing shared by the renderer

pub mod math;
pub mod time;
