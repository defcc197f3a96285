use anyhow::Result;
use module::SampleProcessor;
use tokio::sync::mpsc::Receiver;
use tracing::{debug, error};

use super::collection::sampler::SampleEvent;

pub mod module;
pub mod store_writer;

/// Receives samples and hands them to a [SampleProcessor] one at a time.
pub struct ProcessingModule<Processor> {
    receiver: Receiver<SampleEvent>,
    processor: Processor,
}

impl<P: SampleProcessor> ProcessingModule<P> {
    pub fn new(receiver: Receiver<SampleEvent>, processor: P) -> Self {
        Self {
            receiver,
            processor,
        }
    }

    pub async fn run(mut self) -> Result<()> {
        while let Some(event) = self.receiver.recv().await {
            match self.processor.process_next(event).await {
                Ok(_) => {
                    debug!("Processed sample {:?}", event)
                }
                Err(e) => {
                    error!("Error processing sample {:?}: {e:?}", event)
                }
            }
        }

        let result = self.processor.finalize().await;
        self.receiver.close();
        result
    }
}
