//! modupipe demo - Main Entry Point
//!
//! Runs a producer and a consumer pipeline on two threads, connected by a
//! queue: random samples go in, batch averages come out on stdout.
//!
//! Usage: `modupipe [settings.toml|settings.json]`. Without an argument the
//! settings are read from the default config location, if present.

use anyhow::Context;
use modupipe::{
    config::Settings,
    logging,
    pipeline::{
        loader::{self, LoaderExt},
        sink::QueueSink,
        source::{QueueSource, Random},
        MultiThread, Named, Pipeline, Queue, Repeat, Retry, Runnable, SourceExt, StepPipeline,
        StopAtBound,
    },
};

/// Samples produced per round when the settings leave `max_iterations` unset
const DEMO_SAMPLES: usize = 100;

fn main() -> anyhow::Result<()> {
    let settings = match std::env::args_os().nth(1) {
        Some(path) => Settings::load(&path)
            .with_context(|| format!("Failed to load settings from {:?}", path))?,
        None => Settings::load_or_default(),
    };

    // Initialize logging
    let _log_guard = logging::init(&settings.logging)?;

    tracing::info!("Starting modupipe demo");
    tracing::debug!("{:?}", settings);

    for round in 1..=settings.runner.repeat {
        tracing::info!(round, "Starting round");
        run_round(&settings)?;
    }

    tracing::info!("Done");
    Ok(())
}

fn run_round(settings: &Settings) -> modupipe::Result<()> {
    let samples = settings.runner.max_iterations.unwrap_or(DEMO_SAMPLES);
    let queue = settings.queue.build::<f64>("samples");
    let producer = producer(settings, queue.clone(), samples);

    let mut consumer_source = QueueSource::new(queue, settings.queue.get);
    let averages = loader::Buffer::new(settings.runner.buffer_size)
        .then(loader::IfPresent::new(loader::Map::new(mean)))
        .then(loader::IfPresent::new(loader::Print))
        .into_sink();
    let consumer = Named::new(
        "consumer",
        Repeat::new(
            Retry::new(
                StepPipeline::new(&mut consumer_source, averages),
                settings.runner.max_retries,
            ),
            samples,
        ),
    );

    let result = MultiThread::new(vec![Box::new(producer), Box::new(consumer)]).run();
    result
}

/// Random samples into `queue`; running out of samples is a normal finish.
fn producer(settings: &Settings, queue: Queue<f64>, samples: usize) -> impl Runnable + 'static {
    Named::new(
        "producer",
        StopAtBound::new(Pipeline::new(
            Random::new().max_iterations(samples),
            QueueSink::new(queue, settings.queue.put),
        )),
    )
}

fn mean(batch: Vec<f64>) -> f64 {
    batch.iter().sum::<f64>() / batch.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use modupipe::pipeline::runnable;
    use modupipe::PipelineError;

    fn settings(samples: usize) -> Settings {
        let mut settings = Settings::default();
        settings.runner.max_iterations = Some(samples);
        settings
    }

    #[test]
    fn test_round_completes_when_producer_hits_its_bound() {
        run_round(&settings(10)).unwrap();
    }

    #[test]
    fn test_producer_finishes_cleanly_at_bound() {
        let settings = settings(3);
        let queue = settings.queue.build::<f64>("samples");
        producer(&settings, queue.clone(), 3).run().unwrap();
        assert_eq!(queue.len(), 3);
    }

    #[test]
    fn test_consumer_failure_is_not_masked_by_producer() {
        let settings = settings(3);
        let queue = settings.queue.build::<f64>("samples");
        let consumer = runnable::FromFn::new(|| {
            Err(PipelineError::QueueEmpty {
                queue: "samples".to_string(),
            })
        });

        let err = MultiThread::new(vec![
            Box::new(producer(&settings, queue, 3)),
            Box::new(consumer),
        ])
        .run()
        .unwrap_err();

        assert!(matches!(err, PipelineError::QueueEmpty { .. }));
    }
}
