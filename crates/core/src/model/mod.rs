pub mod arena;
pub mod lane;
pub mod profile;
pub mod session;
pub mod span;

pub use arena::SpanArena;
pub use lane::{Lane, LaneKind, ViewType};
pub use profile::{
    AsyncSpan, Counter, CounterSample, FlowEdge, FrameClass, FrameInterval, Marker, ModelViolation,
    Profile, SourceFormat, Thread,
};
pub use session::{ProfileHandle, Session, SessionEntry, SessionError, SessionInfo};
pub use span::{Span, SpanFlags};
