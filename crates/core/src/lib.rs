//! traceviz core: profile ingestion, the visual model, view transforms, and
//! the interactive viewer.
//!
//! Data flows one way:
//!
//! ```text
//! bytes ──▶ parsers ──▶ Profile ──▶ Session ──▶ views(Viewport, Lane) ──▶ Vec<RenderCommand>
//!                                      ▲
//!                              Viewer (viewport, lanes, selection,
//!                                      search, history, hit testing)
//! ```
//!
//! Profiles are immutable once parsed; all mutable state lives in the
//! [`viewer::Viewer`], which is driven by commands and re-runs the pure
//! view transforms each frame.

pub mod color;
pub mod export;
pub mod intern;
pub mod model;
pub mod parsers;
pub mod viewer;
pub mod views;

pub use model::{Profile, Session};
pub use parsers::ParseError;
pub use viewer::Viewer;
