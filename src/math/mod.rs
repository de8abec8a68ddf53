//! Numeric helpers for the projector inner loop.

mod fast_trig;

pub use fast_trig::{FastAcos, FastAtan, FastInverseTrig};
