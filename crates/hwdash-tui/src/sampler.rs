// Background metrics sampling.
//
// Hardware probes block (nvidia-smi, TCP connect), so the sampler runs them on
// tokio's blocking pool and sends the results to the TUI over an mpsc channel.
// The TUI publishes the set of metrics its cards need through a watch channel.

use std::collections::BTreeSet;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::time::MissedTickBehavior;
use tracing::{debug, error};

use hwdash_core::metrics::{MetricKind, MetricSource, Sample};

/// One poll result and the metrics it was taken for.
#[derive(Debug, Clone, Default)]
pub struct SampleBatch {
    pub requested: BTreeSet<MetricKind>,
    pub sample: Sample,
}

/// Poll `source` every `period` until the receiving side goes away.
pub async fn run(
    mut source: Box<dyn MetricSource + Send>,
    period: Duration,
    enabled_rx: watch::Receiver<BTreeSet<MetricKind>>,
    batch_tx: mpsc::Sender<SampleBatch>,
) {
    let mut tick = tokio::time::interval(period);
    tick.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tick.tick().await;
        let requested = enabled_rx.borrow().clone();

        let sample = if requested.is_empty() {
            Sample::default()
        } else {
            let metrics = requested.clone();
            let polled = tokio::task::spawn_blocking(move || {
                let sample = source.poll(&metrics);
                (source, sample)
            })
            .await;
            match polled {
                Ok((returned, sample)) => {
                    source = returned;
                    sample
                }
                Err(e) => {
                    error!("metrics source failed: {e}");
                    return;
                }
            }
        };

        if batch_tx.send(SampleBatch { requested, sample }).await.is_err() {
            debug!("sample receiver closed, sampler stopping");
            return;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Reports the same value for every requested metric.
    struct FixedSource(f64);

    impl MetricSource for FixedSource {
        fn poll(&mut self, enabled: &BTreeSet<MetricKind>) -> Sample {
            Sample {
                values: enabled.iter().map(|kind| (*kind, self.0)).collect(),
                ..Sample::default()
            }
        }
    }

    #[tokio::test]
    async fn batches_follow_the_enabled_set() {
        let (enabled_tx, enabled_rx) = watch::channel(BTreeSet::from([MetricKind::Cpu]));
        let (batch_tx, mut batch_rx) = mpsc::channel(4);
        let handle = tokio::spawn(run(
            Box::new(FixedSource(42.0)),
            Duration::from_millis(5),
            enabled_rx,
            batch_tx,
        ));

        let batch = batch_rx.recv().await.unwrap();
        assert_eq!(batch.requested, BTreeSet::from([MetricKind::Cpu]));
        assert_eq!(batch.sample.values.get(&MetricKind::Cpu), Some(&42.0));

        enabled_tx.send(BTreeSet::new()).unwrap();
        loop {
            let batch = batch_rx.recv().await.unwrap();
            if batch.requested.is_empty() {
                assert!(batch.sample.values.is_empty());
                break;
            }
        }

        drop(batch_rx);
        handle.await.unwrap();
    }
}
