//! Audio subsystem module

pub mod pcm;
pub mod playback;

pub use pcm::to_f32_samples;
pub use playback::PlaybackSink;

#[cfg(feature = "playback")]
pub use playback::DeviceSink;
