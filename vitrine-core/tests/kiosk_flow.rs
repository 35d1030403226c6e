use futures::future::{self, BoxFuture};
use std::collections::VecDeque;
use std::io::Write;
use std::sync::{Arc, Mutex};
use tokio::runtime::Handle;

use vitrine_core::{
    CatalogEntry, CatalogError, Classification, Classifier, ClassifyResult, Frame, FrameSource,
    Kiosk, ManualClock, Phase, ProductCatalog, RecordingSink, SinkCommand, TickReport,
    VitrineConfig, IDLE_LABEL,
};

/// Answers immediately with the next scripted label, repeating the last one.
struct ScriptedClassifier {
    script: Mutex<VecDeque<&'static str>>,
    last: Mutex<&'static str>,
}

impl ScriptedClassifier {
    fn new(script: impl IntoIterator<Item = &'static str>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into_iter().collect()),
            last: Mutex::new(IDLE_LABEL),
        })
    }
}

impl Classifier for ScriptedClassifier {
    fn classify(&self, _frame: Frame) -> BoxFuture<'static, ClassifyResult> {
        let mut last = self.last.lock().unwrap();
        if let Some(next) = self.script.lock().unwrap().pop_front() {
            *last = next;
        }
        let label = *last;
        Box::pin(future::ready(Ok(vec![
            Classification::new(label, 0.97),
            Classification::new(IDLE_LABEL, 0.03),
        ])))
    }
}

struct StillFrames;

impl FrameSource for StillFrames {
    fn is_ready(&mut self) -> bool {
        true
    }

    fn current_frame(&mut self) -> Frame {
        Frame::rgb(vec![128; 4 * 4 * 3], 4, 4)
    }
}

fn kiosk(clock: &ManualClock, script: &[&'static str]) -> Kiosk {
    let catalog = ProductCatalog::from_json(
        IDLE_LABEL,
        r#"{ "dermaCo": 0, "COSRX": 4, "Welcome!": "reset" }"#,
    )
    .unwrap();
    Kiosk::from_config(
        &VitrineConfig::default(),
        catalog,
        ScriptedClassifier::new(script.iter().copied()),
        Box::new(StillFrames),
        Arc::new(clock.clone()),
        Handle::current(),
    )
}

async fn tick_at(kiosk: &mut Kiosk, clock: &ManualClock, sink: &mut RecordingSink, now: u64) -> TickReport {
    clock.set(now);
    let report = kiosk.tick(sink);
    if report.dispatched {
        kiosk.settle().await;
    }
    report
}

#[tokio::test]
async fn detection_slideshow_and_reset() {
    let clock = ManualClock::new(0);
    let mut kiosk = kiosk(&clock, &["COSRX", "COSRX", "COSRX", "COSRX", "COSRX", IDLE_LABEL]);
    let mut sink = RecordingSink::new();

    let report = tick_at(&mut kiosk, &clock, &mut sink, 0).await;
    assert!(!report.dispatched);
    assert_eq!(report.entry, CatalogEntry::Idle);

    let report = tick_at(&mut kiosk, &clock, &mut sink, 2000).await;
    assert!(report.dispatched);
    assert_eq!(report.entry, CatalogEntry::Idle);

    let report = tick_at(&mut kiosk, &clock, &mut sink, 2016).await;
    assert_eq!(report.entry, CatalogEntry::Product(4));
    assert_eq!(kiosk.state().phase(), Phase::Announcing);

    tick_at(&mut kiosk, &clock, &mut sink, 3016).await;
    assert_eq!(kiosk.state().phase(), Phase::Slideshow);

    for now in [4000, 6000, 8000, 10000, 11016, 12000] {
        tick_at(&mut kiosk, &clock, &mut sink, now).await;
    }
    assert_eq!(kiosk.state().current_product(), Some(4));

    let report = tick_at(&mut kiosk, &clock, &mut sink, 12016).await;
    assert_eq!(report.label.as_str(), IDLE_LABEL);
    assert_eq!(kiosk.state().phase(), Phase::Idle);
    assert_eq!(kiosk.state().page_index(), 0);

    assert_eq!(sink.revealed_pages(), vec![0, 1]);
    assert_eq!(sink.count(&SinkCommand::PlayLoadingCue), 1);
    assert_eq!(sink.count(&SinkCommand::PlayConfirmedCue), 1);
    assert_eq!(sink.count(&SinkCommand::StartIdleAudioLoop), 2);
    assert_eq!(sink.count(&SinkCommand::StopIdleAudioLoop), 1);
    assert_eq!(kiosk.debouncer().latest_detection().seq, 6);
}

#[tokio::test]
async fn unknown_label_from_classifier_keeps_welcome_view() {
    let clock = ManualClock::new(0);
    let mut kiosk = kiosk(&clock, &["Loreal_serum"]);
    let mut sink = RecordingSink::new();

    tick_at(&mut kiosk, &clock, &mut sink, 2000).await;
    let report = tick_at(&mut kiosk, &clock, &mut sink, 2016).await;

    assert_eq!(report.label.as_str(), "Loreal_serum");
    assert_eq!(report.entry, CatalogEntry::Idle);
    assert_eq!(kiosk.state().phase(), Phase::Idle);
    assert_eq!(sink.count(&SinkCommand::PlayLoadingCue), 0);
}

#[test]
fn catalog_load_failures_are_reported() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("catalog.json");
    let err = ProductCatalog::load(IDLE_LABEL, &missing).unwrap_err();
    assert!(matches!(err, CatalogError::Read { .. }));

    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, r#"{{ "dermaCo": "zero" }}"#).unwrap();
    let err = ProductCatalog::load(IDLE_LABEL, file.path()).unwrap_err();
    assert!(matches!(err, CatalogError::InvalidEntry { .. }));

    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, r#"{{ "dermaCo": 0, "Plum": 15, "Welcome!": "reset" }}"#).unwrap();
    let catalog = ProductCatalog::load(IDLE_LABEL, file.path()).unwrap();
    assert_eq!(catalog.len(), 2);
}
