use anyhow::Result;

/// Locale requested from speech-to-text backends.
pub const DICTATION_LOCALE: &str = "vi-VN";

/// Shown when the host has no speech-to-text backend.
pub const DICTATION_UNSUPPORTED_NOTICE: &str =
    "Thiết bị của bạn không hỗ trợ nhận diện giọng nói.";

/// Receives each finalized transcript segment.
pub type SegmentSink = Box<dyn FnMut(String) + Send>;

/// Continuous speech-to-text capability.
pub trait Dictation: Send {
    fn is_supported(&self) -> bool;
    fn is_listening(&self) -> bool;
    fn start(&mut self, on_segment: SegmentSink) -> Result<()>;
    fn stop(&mut self);
}

/// Stand-in for hosts without speech input.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopDictation;

impl Dictation for NoopDictation {
    fn is_supported(&self) -> bool {
        false
    }

    fn is_listening(&self) -> bool {
        false
    }

    fn start(&mut self, _on_segment: SegmentSink) -> Result<()> {
        anyhow::bail!(DICTATION_UNSUPPORTED_NOTICE)
    }

    fn stop(&mut self) {}
}

/// Appends a finalized segment to the free-text field, space separated.
pub fn append_segment(current: &str, segment: &str) -> String {
    let segment = segment.trim();
    if segment.is_empty() {
        return current.to_string();
    }
    if current.is_empty() {
        return segment.to_string();
    }
    format!("{current} {segment}")
}
