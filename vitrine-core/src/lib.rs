//! Vitrine core
//!
//! Turns a noisy, repeatedly arriving classification signal into a stable,
//! paced product presentation.
//!
//! - `debouncer`: samples the classifier at a fixed cadence, newest answer wins
//! - `catalog`: label → product lookup, unknown labels mean idle
//! - `presentation`: welcome/slideshow state machine and its pacing gates
//! - `kiosk`: one evaluation tick over all of the above
//!
//! Rendering, audio, camera and the classifier itself are collaborators
//! behind the traits in `sink`, `frame` and `classifier`.

pub mod catalog;
pub mod classifier;
pub mod clock;
pub mod config;
pub mod debouncer;
pub mod error;
pub mod frame;
pub mod kiosk;
pub mod label;
pub mod presentation;
pub mod sink;

pub use catalog::{CatalogEntry, ProductCatalog, ProductIndex};
pub use classifier::{Classification, Classifier, ClassifyResult};
pub use clock::{Clock, ManualClock, MonotonicClock, Timestamp};
pub use config::VitrineConfig;
pub use debouncer::{Detection, DetectionDebouncer};
pub use error::{CatalogError, ClassificationError};
pub use frame::{Frame, FrameFormat, FrameSource};
pub use kiosk::{Kiosk, TickReport};
pub use label::{DetectionLabel, IDLE_LABEL};
pub use presentation::{Phase, PresentationMachine, PresentationSettings, PresentationState};
pub use sink::{PresentationSink, RecordingSink, SinkCommand};
