use crate::error::RenderError;

use super::request::RenderRequest;

/// A renderer the host's render loop drives once per frame:
/// `start`, any number of `render`, `stop`.
pub trait ObjectRenderer {
    /// Prepares the graphics context for this renderer's draws.
    fn start(&mut self);

    /// Buffers one object, flushing first if the batch is full.
    fn render(&mut self, request: &RenderRequest<'_>);

    /// Draws everything buffered so far.
    fn flush(&mut self);

    /// Flushes and hands the graphics context back to the host.
    fn stop(&mut self);

    /// Releases GPU resources. Nothing may be called afterwards.
    fn destroy(&mut self);

    /// Recreates GPU resources after the context was created or lost.
    fn on_context_change(&mut self) -> Result<(), RenderError>;
}
