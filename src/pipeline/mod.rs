//! End-to-end processing of an input image.
//!
//! Reads a map or plain image, optionally projects it to cube faces, and
//! builds pyramids, packed archives or a single rectilinear view from it.

mod options;
mod process;

pub use options::{Preset, ProcessOptions, Transform};
pub use process::{process, process_image, ProcessError, ProcessOutcome};
