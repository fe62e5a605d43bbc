//! Small helpers shared by the resource modules.

pub mod duration;
