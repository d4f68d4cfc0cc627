//! Composable, pull-driven data pipelines.
//!
//! Items flow from a [`Source`] through a chain of [`Mapper`]s into a
//! [`Sink`] (or a chain of [`Loader`]s), driven by a [`Runnable`]. Separate
//! runnables talk to each other only through a [`Queue`].
//!
//! # Architecture
//!
//! ```text
//! [Source] ──► [Mapper] ──► [Mapper] ──► [Sink]         (one Pipeline)
//!                               │
//!                          PutToQueue ──► [Queue] ──► QueueSource ──► ...
//! ```
//!
//! # Design
//!
//! - **Lazy** - building a chain performs no work; every item is pulled on demand.
//! - **Back-pressure** - a pipeline requests item *i + 1* only after item *i* was delivered.
//! - **Bounded iteration** - `MaxIterations` fails with `MaxIterationsReached`,
//!   distinct from a source simply running out.
//! - **Queues as the only shared state** - see [`concurrent`].
//!
//! # Example
//!
//! ```
//! use modupipe::pipeline::prelude::*;
//! use modupipe::pipeline::{mapper, sink::Collect, source::Items};
//!
//! let record = Collect::new();
//! let source = Items::new(1..=6)
//!     .mapped_with(mapper::Filter::new(|x: &i32| x % 2 == 0))
//!     .mapped_with(mapper::Buffer::new(2));
//! Pipeline::new(source, record.clone()).run().unwrap();
//! assert_eq!(record.items(), vec![vec![2, 4]]);
//! ```

pub mod concurrent;
pub mod condition;
pub mod loader;
pub mod mapper;
pub mod queue;
pub mod runnable;
pub mod sink;
pub mod source;
pub mod stream;

pub use concurrent::{MultiProcess, MultiThread};
pub use condition::Condition;
pub use loader::{Loader, LoaderExt};
pub use mapper::{Mapper, MapperExt};
pub use queue::{GetStrategy, PutStrategy, Queue};
pub use runnable::{
    FullPipeline, Named, Pipeline, Repeat, Retry, Runnable, StepPipeline, StopAtBound,
};
pub use sink::Sink;
pub use source::{Source, SourceExt};
pub use stream::Stream;

/// Traits and drivers needed to assemble most pipelines.
pub mod prelude {
    pub use super::concurrent::{MultiProcess, MultiThread};
    pub use super::condition::Condition;
    pub use super::loader::{Loader, LoaderExt};
    pub use super::mapper::{Mapper, MapperExt};
    pub use super::queue::{
        GetBlocking, GetNonBlocking, GetStrategy, PutBlocking, PutNonBlocking, PutStrategy, Queue,
    };
    pub use super::runnable::{
        Named, Pipeline, Repeat, Retry, Runnable, StepPipeline, StopAtBound,
    };
    pub use super::sink::Sink;
    pub use super::source::{Source, SourceExt};
}
