//! MÜRA Environment Abstraction Layer
//!
//! This crate provides the "Sans-IO" seams that let the viewer core run
//! against **real time** (tokio) or a **virtual clock** (simulation):
//! - Time (`now()`, `system_time()`, `sleep()`)
//! - Event delivery (`EventSource::recv()`)
//! - Session identity (`SessionId`, parsed from the share link)
//!
//! # Example
//!
//! ```ignore
//! use mura_env::{EventSource, ViewerContext};
//!
//! async fn pump<Ctx: ViewerContext, Src: EventSource<Event>>(ctx: &Ctx, src: &mut Src) {
//!     while let Ok(Some(event)) = src.recv().await {
//!         handle(event, ctx.system_time());
//!     }
//! }
//! ```

mod context;
mod source;
mod types;
mod error;
mod tokio_impl;

pub use context::ViewerContext;
pub use source::{EventSource, ChannelSource};
pub use types::{SessionId, SessionLink};
pub use error::{EnvError, SessionError};
pub use tokio_impl::TokioContext;
