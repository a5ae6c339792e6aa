//! Renderer capability consumed by traversal, plus a headless
//! implementation.

mod canvas;
mod renderer;

pub use canvas::{CanvasRenderer, RenderCall};
pub use renderer::{DisplayState, Renderer};
