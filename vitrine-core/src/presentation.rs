//! Presentation state machine.
//!
//! Evaluated once per animation tick with the resolved detection. It turns
//! the debounced label into welcome/slideshow commands:
//!
//! - a change to a product label plays the loading cue and restarts pacing;
//! - the first page of a newly detected product is committed after the short
//!   `initial_page_delay`, together with the confirmed cue;
//! - later pages rotate every `page_display_delay`, wrapping at `page_count`;
//! - the idle label resets the slideshow and shows the welcome view.

use log::{debug, info};

use crate::catalog::{CatalogEntry, ProductIndex};
use crate::clock::{elapsed_since, Timestamp};
use crate::config::VitrineConfig;
use crate::sink::PresentationSink;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Welcome view, no product recognised.
    Idle,
    /// Product recognised, first page not committed yet.
    Announcing,
    /// Product pages rotating.
    Slideshow,
}

#[derive(Debug, Clone)]
pub struct PresentationState {
    phase: Phase,
    current_product: Option<ProductIndex>,
    last_seen: CatalogEntry,
    page_index: usize,
    first_page_pending: bool,
    last_page_transition: Timestamp,
}

impl PresentationState {
    fn new() -> Self {
        Self {
            phase: Phase::Idle,
            current_product: None,
            last_seen: CatalogEntry::Idle,
            page_index: 0,
            first_page_pending: false,
            last_page_transition: 0,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn current_product(&self) -> Option<ProductIndex> {
        self.current_product
    }

    pub fn last_seen(&self) -> CatalogEntry {
        self.last_seen
    }

    /// Page revealed by the next committed transition.
    pub fn page_index(&self) -> usize {
        self.page_index
    }

    pub fn is_first_page_pending(&self) -> bool {
        self.first_page_pending
    }

    pub fn last_page_transition(&self) -> Timestamp {
        self.last_page_transition
    }
}

#[derive(Debug, Clone)]
pub struct PresentationSettings {
    pub initial_page_delay_ms: u64,
    pub page_display_delay_ms: u64,
    pub page_count: usize,
    pub default_brand_color: String,
}

impl PresentationSettings {
    pub fn from_config(config: &VitrineConfig) -> Self {
        Self {
            initial_page_delay_ms: config.timing.initial_page_delay_ms,
            page_display_delay_ms: config.timing.page_display_delay_ms,
            page_count: config.timing.page_count,
            default_brand_color: config.presentation.default_brand_color.clone(),
        }
    }
}

impl Default for PresentationSettings {
    fn default() -> Self {
        Self::from_config(&VitrineConfig::default())
    }
}

#[derive(Debug, Clone)]
pub struct PresentationMachine {
    state: PresentationState,
    settings: PresentationSettings,
}

impl PresentationMachine {
    pub fn new(mut settings: PresentationSettings) -> Self {
        settings.page_count = settings.page_count.max(1);
        Self {
            state: PresentationState::new(),
            settings,
        }
    }

    pub fn state(&self) -> &PresentationState {
        &self.state
    }

    pub fn settings(&self) -> &PresentationSettings {
        &self.settings
    }

    /// Run one tick.
    pub fn evaluate(&mut self, entry: CatalogEntry, now: Timestamp, sink: &mut dyn PresentationSink) {
        if entry != self.state.last_seen {
            match entry {
                CatalogEntry::Product(index) => {
                    debug!("Product {} recognised at {}ms", index, now);
                    self.state.first_page_pending = true;
                    self.state.last_page_transition = now;
                    sink.play_loading_cue();
                }
                CatalogEntry::Idle => {
                    self.state.first_page_pending = false;
                }
            }
        }

        match entry {
            CatalogEntry::Idle => self.show_welcome(sink),
            CatalogEntry::Product(index) => self.show_product(index, now, sink),
        }

        self.state.last_seen = entry;
    }

    fn show_welcome(&mut self, sink: &mut dyn PresentationSink) {
        self.set_phase(Phase::Idle);
        self.state.page_index = 0;
        self.state.current_product = None;

        sink.show_welcome();
        sink.hide_progress_bar();
        sink.hide_all_product_pages();
        sink.set_brand_color(&self.settings.default_brand_color);

        if !sink.is_idle_audio_playing() {
            sink.start_idle_audio_loop();
        }
    }

    fn show_product(&mut self, index: ProductIndex, now: Timestamp, sink: &mut dyn PresentationSink) {
        self.state.current_product = Some(index);
        sink.populate_content(index);
        sink.hide_welcome();

        if sink.is_idle_audio_playing() {
            sink.stop_idle_audio_loop();
        }

        let required = if self.state.first_page_pending {
            self.settings.initial_page_delay_ms
        } else {
            self.settings.page_display_delay_ms
        };

        if elapsed_since(self.state.last_page_transition, now) < required {
            let waiting = if self.state.first_page_pending {
                Phase::Announcing
            } else {
                Phase::Slideshow
            };
            self.set_phase(waiting);
            return;
        }

        let page = self.state.page_index;
        sink.hide_all_product_pages();
        sink.show_progress_bar();
        sink.reveal_product_page(page);
        // Paced to the dwell time even on the first page.
        sink.animate_progress_bar(self.settings.page_display_delay_ms);

        if self.state.first_page_pending {
            sink.play_confirmed_cue();
            self.state.first_page_pending = false;
        }

        debug!("Product {} page {} shown at {}ms", index, page, now);
        self.state.page_index = (page + 1) % self.settings.page_count;
        self.state.last_page_transition = now;
        self.set_phase(Phase::Slideshow);
    }

    fn set_phase(&mut self, phase: Phase) {
        if self.state.phase != phase {
            info!(
                "Presentation {:?} -> {:?} (product {:?})",
                self.state.phase, phase, self.state.current_product
            );
            self.state.phase = phase;
        }
    }
}
