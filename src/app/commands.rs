//! Inbound commands to the presence controller.
//!
//! These represent actions requested by the host (mirror software, voice
//! assistant integration) that the
//! [`PresenceController`](super::service::PresenceController) interprets.

/// Commands that the host bridge can send into the application core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppCommand {
    /// Wake the display (e.g. another module asked for the screen).
    ExternalWake,

    /// Voice assistant "mirror on": releases the voice lock.
    VoiceOn,

    /// Voice assistant "mirror off": turns the display off and latches
    /// the voice lock.
    VoiceOff,
}
