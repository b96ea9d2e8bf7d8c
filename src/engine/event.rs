//! Per-generation notifications.

use super::metrics::MetricSet;
use crate::genome::Score;
use std::sync::mpsc::{self, Receiver, Sender};
use std::time::Duration;

/// Sent to every subscriber once per completed generation.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationEvent {
    /// Completed generations, starting at 1.
    pub index: usize,
    pub best: Option<Score>,
    /// Wall time of this generation.
    pub duration: Duration,
    pub metrics: MetricSet,
}

/// Subscriber channels. A channel whose receiver was dropped is removed on
/// the next publish.
#[derive(Debug, Default)]
pub(crate) struct Subscribers {
    senders: Vec<Sender<GenerationEvent>>,
}

impl Subscribers {
    pub(crate) fn subscribe(&mut self) -> Receiver<GenerationEvent> {
        let (tx, rx) = mpsc::channel();
        self.senders.push(tx);
        rx
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.senders.is_empty()
    }

    pub(crate) fn publish(&mut self, event: &GenerationEvent) {
        self.senders.retain(|tx| tx.send(event.clone()).is_ok());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(index: usize) -> GenerationEvent {
        GenerationEvent {
            index,
            best: Some(Score::from(1.0)),
            duration: Duration::ZERO,
            metrics: MetricSet::new(),
        }
    }

    #[test]
    fn test_dropped_receiver_unsubscribes() {
        let mut subs = Subscribers::default();
        let kept = subs.subscribe();
        let dropped = subs.subscribe();
        drop(dropped);

        subs.publish(&event(1));
        assert_eq!(subs.senders.len(), 1);
        assert_eq!(kept.try_recv().unwrap().index, 1);

        drop(kept);
        subs.publish(&event(2));
        assert!(subs.is_empty());
    }
}
