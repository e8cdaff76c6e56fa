use thiserror::Error;
use tracing::trace;

use crate::Frame;

/// A failed display write. Fatal: the core has no recovery path, the
/// process exits non-zero and the supervisor restarts it.
#[derive(Debug, Error)]
pub enum DisplayError {
    #[error("display write failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("display rejected frame: {0}")]
    Device(String),
}

/// The display hardware seam. Drivers for concrete panels live outside
/// this core and bind here; the surface is exclusively owned and mutated
/// by the render loop.
pub trait DisplaySurface: Send + Sync {
    fn clear(&mut self) -> Result<(), DisplayError>;
    fn present(&mut self, frame: &Frame) -> Result<(), DisplayError>;
}

/// Development backend: logs frame pushes instead of driving hardware,
/// so the daemon runs end-to-end on any machine.
pub struct TraceSurface;

impl DisplaySurface for TraceSurface {
    fn clear(&mut self) -> Result<(), DisplayError> {
        trace!("display cleared");
        Ok(())
    }

    fn present(&mut self, frame: &Frame) -> Result<(), DisplayError> {
        trace!(
            width = frame.width(),
            height = frame.height(),
            lit = frame.lit_pixels(),
            "frame pushed"
        );
        Ok(())
    }
}
