//! Minimal pipeline: silence source → gain → null sink
//!
//! Builds a chain, plays it to EOF, and prints the lifecycle events as they
//! arrive. Run with `RUST_LOG=debug` to watch the worker.

use std::time::Duration;

use anyhow::Result;
use freshet::{
    EventKind, GainFilter, NullSink, Pipeline, PipelineConfig, QueueError, SilenceSource, Timeout,
};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let mut pipeline = Pipeline::new(PipelineConfig::default())?;
    pipeline.set_nodes(
        Box::new(SilenceSource::new(100)),
        vec![Box::new(GainFilter::new(16384))],
        Box::new(NullSink::new()),
    )?;

    pipeline.start()?;
    pipeline.play()?;

    loop {
        match pipeline.get_event(Timeout::After(Duration::from_secs(5))) {
            Ok(event) => match event.kind {
                EventKind::Eof => {
                    println!("pipeline: EOF");
                    break;
                }
                EventKind::Error => {
                    println!("pipeline: error {:?}", event.error);
                    break;
                }
                EventKind::Reconfig => println!("pipeline: reconfig"),
            },
            Err(QueueError::TimedOut) => {
                println!("pipeline: no event within 5s, giving up");
                break;
            }
            Err(e) => return Err(e.into()),
        }
    }

    pipeline.join()?;
    Ok(())
}
