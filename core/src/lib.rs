// galley/src/lib.rs

//! Galley: an async, type-safe step-pipeline engine.
//!
//! A request-level workflow (a webhook delivery, a checkout) is described as a
//! `Pipeline<TData, Err>`: an ordered list of named steps, each with `before`,
//! `on` and `after` handlers that share one `ContextData<TData>`.
//!
//!  - Handlers are async and return `PipelineControl::Continue` or `Stop`.
//!  - Steps can be optional or skipped through a condition on the context.
//!  - A step can route to one of several scoped sub-pipelines, each running on
//!    its own context extracted from the parent (`conditional_scopes_for_step`).
//!  - `Galley<E>` keeps one pipeline per context type and runs it on demand.
//!
//! Typical flow:
//!  1. Define a context struct for the workflow.
//!  2. Build a `Pipeline<MyCtx, MyError>` and register handlers with `on_root` etc.
//!  3. Register it with a `Galley<MyError>` at startup.
//!  4. Per request, wrap a fresh context in `ContextData::new` and call `galley.run(ctx)`.

pub mod conditional;
pub mod core;
pub mod error;
pub mod pipeline;
pub mod registry;

pub use crate::core::context_data::ContextData;
pub use crate::core::control::{PipelineControl, PipelineResult};
pub use crate::core::handler::Handler;
pub use crate::core::step::{SkipCondition, StepDef};

pub use crate::pipeline::definition::Pipeline;

pub use crate::conditional::builder::{ConditionalScopeBuilder, ConditionalScopeConfigurator};

pub use crate::error::{GalleyError, GalleyResult};

pub use crate::registry::Galley;
