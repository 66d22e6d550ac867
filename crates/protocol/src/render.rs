use thiserror::Error;

use crate::command::RenderCommand;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("renderer backend failure: {0}")]
    Backend(String),
    #[error("unbalanced clip or transform stack")]
    UnbalancedStack,
}

/// Sink for one frame's worth of render commands.
///
/// Contract: `submit` receives commands in paint order. Clip commands nest
/// (LIFO); a renderer must honor the innermost clip for everything drawn
/// under it. Transform commands nest the same way and compose
/// translate-then-scale. Implementations that cannot express grouping
/// ignore `BeginGroup`/`EndGroup`.
pub trait Renderer {
    fn submit(&mut self, commands: &[RenderCommand]) -> Result<(), RenderError>;
}
