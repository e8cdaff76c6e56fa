mod draw;
mod frame;
mod renderer;
mod surface;

pub use frame::Frame;
pub use renderer::{RenderLoop, RenderOptions};
pub use surface::{DisplayError, DisplaySurface, TraceSurface};

#[cfg(test)]
#[path = "tests/renderer_tests.rs"]
mod tests;
