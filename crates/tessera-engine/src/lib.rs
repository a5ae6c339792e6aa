//! Tessera engine crate.
//!
//! Replays recorded scene graphs: orders projected and Z-elevated children,
//! interleaves shadows, and walks each node once per frame in either
//! deferred (batched) or immediate (replay) mode.

pub mod context;
pub mod coords;
pub mod diagnostics;
pub mod frame;
pub mod logging;
pub mod paint;
pub mod playback;
pub mod render;
pub mod resource;
pub mod scene;

#[cfg(test)]
mod scenarios;
#[cfg(test)]
mod test_support;
