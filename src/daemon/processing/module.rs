use std::future::Future;

use anyhow::Result;

use crate::daemon::collection::sampler::SampleEvent;

/// Consumer of the samples produced by the sampling loop.
pub trait SampleProcessor {
    fn process_next(&mut self, event: SampleEvent) -> impl Future<Output = Result<()>>;

    /// Called once after the channel closes.
    fn finalize(&mut self) -> impl Future<Output = Result<()>>;
}
