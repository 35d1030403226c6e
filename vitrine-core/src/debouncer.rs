//! Rate-limited sampling of the classifier.
//!
//! Every request is tagged with a sequence number when dispatched. A
//! completion is committed only if its sequence number is newer than the one
//! already stored, so a slow request can never overwrite a newer answer.

use log::{debug, info, warn};
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::classifier::{top_ranked, Classification, Classifier};
use crate::clock::{elapsed_since, Timestamp};
use crate::frame::FrameSource;
use crate::label::DetectionLabel;

/// Most recently committed classification.
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    /// Sequence number of the request that produced it, 0 before any commit.
    pub seq: u64,
    pub label: DetectionLabel,
    pub confidence: f32,
}

pub struct DetectionDebouncer {
    classifier: Arc<dyn Classifier>,
    frames: Box<dyn FrameSource>,
    runtime: Handle,
    poll_interval: u64,
    last_poll: Timestamp,
    next_seq: u64,
    latest: Arc<watch::Sender<Detection>>,
    in_flight: Vec<JoinHandle<()>>,
}

impl DetectionDebouncer {
    /// `started_at` seeds the poll timer, so the first request goes out one
    /// interval after start-up.
    pub fn new(
        classifier: Arc<dyn Classifier>,
        frames: Box<dyn FrameSource>,
        runtime: Handle,
        poll_interval_ms: u64,
        idle_label: DetectionLabel,
        started_at: Timestamp,
    ) -> Self {
        let (latest, _) = watch::channel(Detection {
            seq: 0,
            label: idle_label,
            confidence: 0.0,
        });

        Self {
            classifier,
            frames,
            runtime,
            poll_interval: poll_interval_ms,
            last_poll: started_at,
            next_seq: 0,
            latest: Arc::new(latest),
            in_flight: Vec::new(),
        }
    }

    /// Dispatch a classification request if the interval has elapsed and a
    /// frame is available. Returns the label current at dispatch time, or
    /// `None` when nothing was dispatched.
    pub fn poll(&mut self, now: Timestamp) -> Option<DetectionLabel> {
        self.in_flight.retain(|handle| !handle.is_finished());

        if elapsed_since(self.last_poll, now) < self.poll_interval {
            return None;
        }

        if !self.frames.is_ready() {
            debug!("Frame source not ready, skipping classification");
            return None;
        }

        let frame = self.frames.current_frame();
        self.next_seq += 1;
        let seq = self.next_seq;
        self.last_poll = now;

        let request = self.classifier.classify(frame);
        let latest = Arc::clone(&self.latest);
        let handle = self.runtime.spawn(async move {
            match request.await.and_then(top_ranked) {
                Ok(top) => {
                    commit(&latest, seq, top);
                }
                Err(e) => warn!("Classification #{} failed: {}", seq, e),
            }
        });
        self.in_flight.push(handle);

        Some(self.latest())
    }

    /// Latest committed label, or the idle label if nothing has completed.
    pub fn latest(&self) -> DetectionLabel {
        self.latest.borrow().label.clone()
    }

    pub fn latest_detection(&self) -> Detection {
        self.latest.borrow().clone()
    }

    /// Receiver notified on every committed detection.
    pub fn subscribe(&self) -> watch::Receiver<Detection> {
        self.latest.subscribe()
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.iter().filter(|handle| !handle.is_finished()).count()
    }

    pub fn last_poll(&self) -> Timestamp {
        self.last_poll
    }

    /// Wait for every dispatched request to finish. Hung requests block this
    /// forever; callers bound it with a timeout.
    pub async fn settle(&mut self) {
        for handle in self.in_flight.drain(..) {
            if let Err(e) = handle.await {
                warn!("Classification task aborted: {}", e);
            }
        }
    }
}

fn commit(slot: &watch::Sender<Detection>, seq: u64, top: Classification) -> bool {
    let label = top.label.clone();
    let confidence = top.confidence;

    let committed = slot.send_if_modified(|current| {
        if seq <= current.seq {
            return false;
        }
        *current = Detection {
            seq,
            label: top.label,
            confidence: top.confidence,
        };
        true
    });

    if committed {
        info!("Detected: {}, Confidence: {:.3}", label, confidence);
    } else {
        debug!("Discarding stale classification #{} ({})", seq, label);
    }
    committed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::ClassifyResult;
    use crate::error::ClassificationError;
    use crate::frame::Frame;
    use futures::future::BoxFuture;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex;
    use tokio::sync::oneshot;

    /// Each request waits for the next gate to be opened by the test.
    struct GatedClassifier {
        gates: Mutex<VecDeque<oneshot::Receiver<ClassifyResult>>>,
    }

    impl GatedClassifier {
        fn new(gates: impl IntoIterator<Item = oneshot::Receiver<ClassifyResult>>) -> Arc<Self> {
            Arc::new(Self {
                gates: Mutex::new(gates.into_iter().collect()),
            })
        }
    }

    impl Classifier for GatedClassifier {
        fn classify(&self, _frame: Frame) -> BoxFuture<'static, ClassifyResult> {
            let gate = self.gates.lock().unwrap().pop_front();
            Box::pin(async move {
                match gate {
                    Some(rx) => rx
                        .await
                        .unwrap_or_else(|_| Err(ClassificationError::Transport("gate dropped".into()))),
                    None => Err(ClassificationError::Transport("no gate".into())),
                }
            })
        }
    }

    struct SwitchFrames {
        ready: Arc<AtomicBool>,
    }

    impl FrameSource for SwitchFrames {
        fn is_ready(&mut self) -> bool {
            self.ready.load(Ordering::SeqCst)
        }

        fn current_frame(&mut self) -> Frame {
            Frame::rgb(vec![0; 12], 2, 2)
        }
    }

    fn debouncer(classifier: Arc<GatedClassifier>, ready: Arc<AtomicBool>) -> DetectionDebouncer {
        DetectionDebouncer::new(
            classifier,
            Box::new(SwitchFrames { ready }),
            Handle::current(),
            2000,
            DetectionLabel::idle(),
            0,
        )
    }

    fn ranked(label: &str) -> ClassifyResult {
        Ok(vec![Classification::new(label, 0.9), Classification::new("runner-up", 0.1)])
    }

    #[tokio::test]
    async fn polls_at_most_once_per_interval() {
        let (_tx1, rx1) = oneshot::channel();
        let (_tx2, rx2) = oneshot::channel();
        let mut debouncer = debouncer(GatedClassifier::new([rx1, rx2]), Arc::new(AtomicBool::new(true)));

        assert!(debouncer.poll(0).is_none());
        assert!(debouncer.poll(1999).is_none());
        assert_eq!(debouncer.poll(2000), Some(DetectionLabel::idle()));
        assert!(debouncer.poll(3999).is_none());
        assert!(debouncer.poll(4000).is_some());
        assert_eq!(debouncer.last_poll(), 4000);
        assert_eq!(debouncer.in_flight(), 2);
    }

    #[tokio::test]
    async fn latest_is_idle_until_first_completion() {
        let (tx, rx) = oneshot::channel();
        let mut debouncer = debouncer(GatedClassifier::new([rx]), Arc::new(AtomicBool::new(true)));

        debouncer.poll(2000);
        assert_eq!(debouncer.latest(), DetectionLabel::idle());

        tx.send(ranked("COSRX")).unwrap();
        debouncer.settle().await;
        assert_eq!(debouncer.latest().as_str(), "COSRX");
        assert_eq!(debouncer.latest_detection().seq, 1);
    }

    #[tokio::test]
    async fn stale_completion_is_discarded() {
        let (tx1, rx1) = oneshot::channel();
        let (tx2, rx2) = oneshot::channel();
        let mut debouncer = debouncer(GatedClassifier::new([rx1, rx2]), Arc::new(AtomicBool::new(true)));

        assert!(debouncer.poll(2000).is_some());
        assert!(debouncer.poll(4000).is_some());

        let mut updates = debouncer.subscribe();
        tx2.send(ranked("Plum")).unwrap();
        updates.changed().await.unwrap();
        assert_eq!(debouncer.latest().as_str(), "Plum");

        tx1.send(ranked("Cetaphil")).unwrap();
        debouncer.settle().await;
        assert_eq!(debouncer.latest().as_str(), "Plum");
        assert_eq!(debouncer.latest_detection().seq, 2);
    }

    #[tokio::test]
    async fn frame_not_ready_keeps_interval_open() {
        let ready = Arc::new(AtomicBool::new(false));
        let (_tx, rx) = oneshot::channel();
        let mut debouncer = debouncer(GatedClassifier::new([rx]), Arc::clone(&ready));

        assert!(debouncer.poll(2000).is_none());
        assert_eq!(debouncer.last_poll(), 0);

        ready.store(true, Ordering::SeqCst);
        assert!(debouncer.poll(2016).is_some());
        assert_eq!(debouncer.last_poll(), 2016);
    }

    #[tokio::test]
    async fn failed_classification_keeps_latest() {
        let (tx1, rx1) = oneshot::channel();
        let (tx2, rx2) = oneshot::channel();
        let (tx3, rx3) = oneshot::channel();
        let mut debouncer =
            debouncer(GatedClassifier::new([rx1, rx2, rx3]), Arc::new(AtomicBool::new(true)));

        debouncer.poll(2000);
        tx1.send(ranked("Brinton")).unwrap();
        debouncer.settle().await;

        debouncer.poll(4000);
        tx2.send(Err(ClassificationError::Transport("model offline".into()))).unwrap();
        debouncer.settle().await;
        assert_eq!(debouncer.latest().as_str(), "Brinton");

        debouncer.poll(6000);
        tx3.send(Ok(Vec::new())).unwrap();
        debouncer.settle().await;
        assert_eq!(debouncer.latest().as_str(), "Brinton");
        assert_eq!(debouncer.in_flight(), 0);
    }
}
