use serde::{Deserialize, Serialize};

use crate::catalog::ProductIndex;

/// Rendering and audio surface driven by the presentation state machine.
///
/// Commands are fire-and-forget. Implementations must tolerate commands that
/// refer to elements they do not have, e.g. a page index past the last page.
pub trait PresentationSink {
    fn show_welcome(&mut self);
    fn hide_welcome(&mut self);
    fn show_progress_bar(&mut self);
    fn hide_progress_bar(&mut self);
    fn hide_all_product_pages(&mut self);
    fn reveal_product_page(&mut self, page_index: usize);
    fn animate_progress_bar(&mut self, duration_ms: u64);
    fn populate_content(&mut self, product: ProductIndex);
    fn play_loading_cue(&mut self);
    fn play_confirmed_cue(&mut self);
    fn start_idle_audio_loop(&mut self);
    fn stop_idle_audio_loop(&mut self);
    fn is_idle_audio_playing(&self) -> bool;
    fn set_brand_color(&mut self, color: &str);
}

/// One sink command as data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum SinkCommand {
    ShowWelcome,
    HideWelcome,
    ShowProgressBar,
    HideProgressBar,
    HideAllProductPages,
    RevealProductPage { page_index: usize },
    AnimateProgressBar { duration_ms: u64 },
    PopulateContent { product: ProductIndex },
    PlayLoadingCue,
    PlayConfirmedCue,
    StartIdleAudioLoop,
    StopIdleAudioLoop,
    SetBrandColor { color: String },
}

impl SinkCommand {
    /// Replay this command against a sink.
    pub fn apply(&self, sink: &mut dyn PresentationSink) {
        match self {
            SinkCommand::ShowWelcome => sink.show_welcome(),
            SinkCommand::HideWelcome => sink.hide_welcome(),
            SinkCommand::ShowProgressBar => sink.show_progress_bar(),
            SinkCommand::HideProgressBar => sink.hide_progress_bar(),
            SinkCommand::HideAllProductPages => sink.hide_all_product_pages(),
            SinkCommand::RevealProductPage { page_index } => sink.reveal_product_page(*page_index),
            SinkCommand::AnimateProgressBar { duration_ms } => sink.animate_progress_bar(*duration_ms),
            SinkCommand::PopulateContent { product } => sink.populate_content(*product),
            SinkCommand::PlayLoadingCue => sink.play_loading_cue(),
            SinkCommand::PlayConfirmedCue => sink.play_confirmed_cue(),
            SinkCommand::StartIdleAudioLoop => sink.start_idle_audio_loop(),
            SinkCommand::StopIdleAudioLoop => sink.stop_idle_audio_loop(),
            SinkCommand::SetBrandColor { color } => sink.set_brand_color(color),
        }
    }
}

/// Sink that keeps every command it receives and tracks the idle audio loop.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    commands: Vec<SinkCommand>,
    idle_audio_playing: bool,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn commands(&self) -> &[SinkCommand] {
        &self.commands
    }

    /// Hand over the commands recorded so far.
    pub fn take(&mut self) -> Vec<SinkCommand> {
        std::mem::take(&mut self.commands)
    }

    pub fn count(&self, command: &SinkCommand) -> usize {
        self.commands.iter().filter(|c| *c == command).count()
    }

    /// Pages revealed, in order.
    pub fn revealed_pages(&self) -> Vec<usize> {
        self.commands
            .iter()
            .filter_map(|c| match c {
                SinkCommand::RevealProductPage { page_index } => Some(*page_index),
                _ => None,
            })
            .collect()
    }

    fn push(&mut self, command: SinkCommand) {
        self.commands.push(command);
    }
}

impl PresentationSink for RecordingSink {
    fn show_welcome(&mut self) {
        self.push(SinkCommand::ShowWelcome);
    }

    fn hide_welcome(&mut self) {
        self.push(SinkCommand::HideWelcome);
    }

    fn show_progress_bar(&mut self) {
        self.push(SinkCommand::ShowProgressBar);
    }

    fn hide_progress_bar(&mut self) {
        self.push(SinkCommand::HideProgressBar);
    }

    fn hide_all_product_pages(&mut self) {
        self.push(SinkCommand::HideAllProductPages);
    }

    fn reveal_product_page(&mut self, page_index: usize) {
        self.push(SinkCommand::RevealProductPage { page_index });
    }

    fn animate_progress_bar(&mut self, duration_ms: u64) {
        self.push(SinkCommand::AnimateProgressBar { duration_ms });
    }

    fn populate_content(&mut self, product: ProductIndex) {
        self.push(SinkCommand::PopulateContent { product });
    }

    fn play_loading_cue(&mut self) {
        self.push(SinkCommand::PlayLoadingCue);
    }

    fn play_confirmed_cue(&mut self) {
        self.push(SinkCommand::PlayConfirmedCue);
    }

    fn start_idle_audio_loop(&mut self) {
        self.idle_audio_playing = true;
        self.push(SinkCommand::StartIdleAudioLoop);
    }

    fn stop_idle_audio_loop(&mut self) {
        self.idle_audio_playing = false;
        self.push(SinkCommand::StopIdleAudioLoop);
    }

    fn is_idle_audio_playing(&self) -> bool {
        self.idle_audio_playing
    }

    fn set_brand_color(&mut self, color: &str) {
        self.push(SinkCommand::SetBrandColor {
            color: color.to_string(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commands_serialize_with_tag() {
        let json = serde_json::to_string(&SinkCommand::RevealProductPage { page_index: 2 }).unwrap();
        assert_eq!(json, r#"{"command":"reveal_product_page","page_index":2}"#);

        let json = serde_json::to_string(&SinkCommand::PlayLoadingCue).unwrap();
        assert_eq!(json, r#"{"command":"play_loading_cue"}"#);
    }

    #[test]
    fn replaying_commands_reproduces_them() {
        let script = vec![
            SinkCommand::StartIdleAudioLoop,
            SinkCommand::SetBrandColor { color: "#96349B".into() },
            SinkCommand::AnimateProgressBar { duration_ms: 8000 },
            SinkCommand::StopIdleAudioLoop,
        ];
        let mut sink = RecordingSink::new();
        for command in &script {
            command.apply(&mut sink);
        }
        assert_eq!(sink.commands(), script.as_slice());
        assert!(!sink.is_idle_audio_playing());
    }
}
