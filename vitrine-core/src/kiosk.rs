use std::sync::Arc;
use tokio::runtime::Handle;

use crate::catalog::{CatalogEntry, ProductCatalog};
use crate::classifier::Classifier;
use crate::clock::{Clock, Timestamp};
use crate::config::VitrineConfig;
use crate::debouncer::DetectionDebouncer;
use crate::frame::FrameSource;
use crate::label::DetectionLabel;
use crate::presentation::{PresentationMachine, PresentationSettings, PresentationState};
use crate::sink::PresentationSink;

/// What one tick saw.
#[derive(Debug, Clone, PartialEq)]
pub struct TickReport {
    pub now: Timestamp,
    pub label: DetectionLabel,
    pub entry: CatalogEntry,
    /// A classification request went out during this tick.
    pub dispatched: bool,
}

/// Clock, debouncer, catalog and state machine wired into one tick.
pub struct Kiosk {
    clock: Arc<dyn Clock>,
    catalog: ProductCatalog,
    debouncer: DetectionDebouncer,
    machine: PresentationMachine,
}

impl Kiosk {
    pub fn new(
        clock: Arc<dyn Clock>,
        catalog: ProductCatalog,
        debouncer: DetectionDebouncer,
        machine: PresentationMachine,
    ) -> Self {
        Self {
            clock,
            catalog,
            debouncer,
            machine,
        }
    }

    pub fn from_config(
        config: &VitrineConfig,
        catalog: ProductCatalog,
        classifier: Arc<dyn Classifier>,
        frames: Box<dyn FrameSource>,
        clock: Arc<dyn Clock>,
        runtime: Handle,
    ) -> Self {
        let debouncer = DetectionDebouncer::new(
            classifier,
            frames,
            runtime,
            config.timing.poll_interval_ms,
            catalog.idle_label().clone(),
            clock.now(),
        );
        let machine = PresentationMachine::new(PresentationSettings::from_config(config));
        Self::new(clock, catalog, debouncer, machine)
    }

    pub fn tick(&mut self, sink: &mut dyn PresentationSink) -> TickReport {
        let now = self.clock.now();
        let dispatched = self.debouncer.poll(now).is_some();
        let label = self.debouncer.latest();
        let entry = self.catalog.resolve(&label);
        self.machine.evaluate(entry, now, sink);

        TickReport {
            now,
            label,
            entry,
            dispatched,
        }
    }

    pub fn state(&self) -> &PresentationState {
        self.machine.state()
    }

    pub fn catalog(&self) -> &ProductCatalog {
        &self.catalog
    }

    pub fn debouncer(&self) -> &DetectionDebouncer {
        &self.debouncer
    }

    /// Wait for in-flight classifications to land.
    pub async fn settle(&mut self) {
        self.debouncer.settle().await;
    }
}
