use log::warn;
use serde_json::Value;
use std::io::Write;

use vitrine_core::{PresentationSink, ProductIndex, SinkCommand};

/// Streams presentation commands as JSON lines for an external renderer.
///
/// The renderer is expected to follow every command, so the idle audio state
/// is tracked here rather than queried.
pub struct JsonLinesSink<W: Write> {
    out: W,
    idle_audio_playing: bool,
    write_failed: bool,
}

impl<W: Write> JsonLinesSink<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            idle_audio_playing: false,
            write_failed: false,
        }
    }

    pub fn flush(&mut self) {
        if let Err(e) = self.out.flush() {
            warn!("Failed to flush presentation commands: {}", e);
        }
    }

    #[cfg(test)]
    fn into_inner(self) -> W {
        self.out
    }

    fn emit(&mut self, command: SinkCommand) {
        let mut line = match serde_json::to_value(&command) {
            Ok(value) => value,
            Err(e) => {
                warn!("Failed to encode {:?}: {}", command, e);
                return;
            }
        };
        if let Some(fields) = line.as_object_mut() {
            fields.insert("at".to_string(), Value::String(chrono::Utc::now().to_rfc3339()));
        }

        match writeln!(self.out, "{}", line) {
            Ok(()) => self.write_failed = false,
            Err(e) => {
                // Warn once per outage.
                if !self.write_failed {
                    warn!("Presentation output unavailable: {}", e);
                }
                self.write_failed = true;
            }
        }
    }
}

impl<W: Write> PresentationSink for JsonLinesSink<W> {
    fn show_welcome(&mut self) {
        self.emit(SinkCommand::ShowWelcome);
    }

    fn hide_welcome(&mut self) {
        self.emit(SinkCommand::HideWelcome);
    }

    fn show_progress_bar(&mut self) {
        self.emit(SinkCommand::ShowProgressBar);
    }

    fn hide_progress_bar(&mut self) {
        self.emit(SinkCommand::HideProgressBar);
    }

    fn hide_all_product_pages(&mut self) {
        self.emit(SinkCommand::HideAllProductPages);
    }

    fn reveal_product_page(&mut self, page_index: usize) {
        self.emit(SinkCommand::RevealProductPage { page_index });
    }

    fn animate_progress_bar(&mut self, duration_ms: u64) {
        self.emit(SinkCommand::AnimateProgressBar { duration_ms });
    }

    fn populate_content(&mut self, product: ProductIndex) {
        self.emit(SinkCommand::PopulateContent { product });
    }

    fn play_loading_cue(&mut self) {
        self.emit(SinkCommand::PlayLoadingCue);
    }

    fn play_confirmed_cue(&mut self) {
        self.emit(SinkCommand::PlayConfirmedCue);
    }

    fn start_idle_audio_loop(&mut self) {
        self.idle_audio_playing = true;
        self.emit(SinkCommand::StartIdleAudioLoop);
    }

    fn stop_idle_audio_loop(&mut self) {
        self.idle_audio_playing = false;
        self.emit(SinkCommand::StopIdleAudioLoop);
    }

    fn is_idle_audio_playing(&self) -> bool {
        self.idle_audio_playing
    }

    fn set_brand_color(&mut self, color: &str) {
        self.emit(SinkCommand::SetBrandColor {
            color: color.to_string(),
        });
    }
}
