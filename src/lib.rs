//! Strata is a scroll-linked parallax and animation engine.
//!
//! As the user scrolls, independently configured visual layers (background
//! strata, stroke reveals, video scrubbing, fade-ins) have their properties
//! interpolated from the scroll position's normalized progress within
//! declared trigger regions. The host reaches the engine through three
//! seams:
//!
//! - Build an [`Engine`], register [`TriggerRegion`]s and [`LayerBinding`]s
//!   (or [`install`] a declarative [`ShowcaseDef`])
//! - Wire scroll/resize events to [`Engine::on_scroll`] / [`Engine::on_resize`]
//! - Drive [`Engine::tick`] from the frame-scheduling primitive, reading
//!   document state through a [`Stage`] and receiving one batched write pass
//!   per frame through a [`PropertySink`]
#![forbid(unsafe_code)]

pub mod binding;
pub mod color;
pub mod diag;
pub mod ease;
pub mod error;
pub mod media;
pub mod nav;
pub mod policy;
pub mod progress;
pub mod region;
pub mod scheduler;
pub mod showcase;
pub mod stage;

pub use binding::{LayerBinding, PropWrite, TargetWrite};
pub use color::{GlowFilter, Rgb};
pub use ease::Ease;
pub use error::{StrataError, StrataResult};
pub use policy::{AmbientRule, NumericProp, PolicyDef, PropertyRule, Rule};
pub use progress::{ProgressSample, ScrollState, compute_progress};
pub use region::{AnchorEdge, BoundarySpec, Rect, TriggerRegion};
pub use scheduler::{Engine, TickStats};
pub use showcase::{InstallReport, ShowcaseDef, install};
pub use stage::{MemorySink, PropertySink, ResolvedStroke, Stage};
