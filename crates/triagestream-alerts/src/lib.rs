//! triagestream alerts
//!
//! Spoken incident alerts for the triage pipeline.
//!
//! - [`AlertPolicy`] maps triage severities onto the alert threshold scale
//!   and decides what is worth speaking
//! - [`NotificationQueue`] serializes speech through one playback slot,
//!   with priority requests preempting the pending queue
//! - [`SpeechSynthesizer`] / [`AudioSink`] are the text-to-speech and
//!   audio output collaborators, implemented by [`ElevenLabsSynthesizer`]
//!   and [`ProcessAudioSink`]

pub mod audio;
pub mod policy;
pub mod queue;
pub mod speech;

pub use audio::{AudioSink, AudioStream, ProcessAudioSink};
pub use policy::{AlertLevel, AlertPolicy};
pub use queue::{NotificationQueue, NotificationRequest, Voice};
pub use speech::{ElevenLabsConfig, ElevenLabsSynthesizer, SpeechSynthesizer, VoiceSettings};
