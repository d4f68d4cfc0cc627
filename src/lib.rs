//! # modupipe: composable data pipelines
//!
//! Small building blocks for moving items from producers to consumers:
//! lazy sources, sequence mappers, chainable loaders and terminal sinks,
//! glued together by runnables and connected across threads by queues.
//!
//! ## Architecture
//!
//! - **Sources**: produce lazy, possibly infinite, streams of items
//! - **Mappers**: turn one stream into another, pulling only on demand
//! - **Loaders / Sinks**: consume one item at a time
//! - **Runnables**: drive a topology (`Pipeline`, `Retry`, `MultiThread`, ...)
//! - **Queues**: crossbeam channels, the only link between concurrent runnables
//!
//! ## Configuration
//!
//! Runtime settings (queue capacity and strategies, retry counts, logging) are
//! read from TOML or JSON, by default from the platform config directory:
//!
//! - **Linux**: `~/.config/modupipe/modupipe.toml`
//! - **macOS**: `~/Library/Application Support/modupipe/modupipe.toml`
//! - **Windows**: `%APPDATA%\modupipe\modupipe.toml`
//!
//! ## Example
//!
//! ```no_run
//! use modupipe::pipeline::prelude::*;
//! use modupipe::pipeline::{mapper, sink::QueueSink, sink::Printer, source};
//!
//! fn main() -> modupipe::Result<()> {
//!     let queue = Queue::bounded(16).with_name("samples");
//!
//!     let producer = Pipeline::new(
//!         source::Random::new().max_iterations(100),
//!         QueueSink::new(queue.clone(), PutBlocking::new()),
//!     );
//!     let mut consumer_source =
//!         source::QueueSource::new(queue, GetBlocking::new()).mapped_with(mapper::ToString);
//!     let consumer = Repeat::new(StepPipeline::new(&mut consumer_source, Printer::stdout()), 100);
//!
//!     // The producer stops by hitting its iteration bound.
//!     let producer = StopAtBound::new(producer);
//!     let result = MultiThread::new(vec![Box::new(producer), Box::new(consumer)]).run();
//!     result
//! }
//! ```

pub mod config;
pub mod error;
pub mod logging;
pub mod pipeline;

// Re-export commonly used types
pub use config::Settings;
pub use error::{PipelineError, Result, ResultExt};
pub use pipeline::{Loader, Mapper, Queue, Runnable, Sink, Source};
