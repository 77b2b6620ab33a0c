//! Playback of fully received containers
//!
//! The client hands a validated container to a [`PlaybackSink`]. With the
//! `playback` feature, [`DeviceSink`] plays it on an output device through
//! cpal and blocks until the payload has been consumed.

use crate::error::Result;
use crate::wav::WavContainer;

/// Something that can play a whole container
pub trait PlaybackSink: Send {
    /// Play `container` to completion
    fn play(&mut self, container: &WavContainer) -> Result<()>;
}

#[cfg(feature = "playback")]
pub use device::DeviceSink;

#[cfg(feature = "playback")]
mod device {
    use std::time::Duration;

    use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
    use crossbeam_channel::Receiver;

    use super::PlaybackSink;
    use crate::audio::pcm::to_f32_samples;
    use crate::error::{Error, Result};
    use crate::wav::WavContainer;

    /// Output device sink
    pub struct DeviceSink {
        /// Output device name, or the host default
        device_name: Option<String>,
    }

    impl DeviceSink {
        pub fn new(device_name: Option<String>) -> Self {
            Self { device_name }
        }

        fn device(&self) -> Result<cpal::Device> {
            let host = cpal::default_host();
            match &self.device_name {
                None => host
                    .default_output_device()
                    .ok_or_else(|| Error::Playback("No default output device".to_string())),
                Some(wanted) => {
                    let devices = host
                        .output_devices()
                        .map_err(|e| Error::Playback(e.to_string()))?;
                    for device in devices {
                        if device.name().ok().as_deref() == Some(wanted.as_str()) {
                            return Ok(device);
                        }
                    }
                    Err(Error::Playback(format!("Device not found: {}", wanted)))
                }
            }
        }
    }

    impl Default for DeviceSink {
        fn default() -> Self {
            Self::new(None)
        }
    }

    impl PlaybackSink for DeviceSink {
        fn play(&mut self, container: &WavContainer) -> Result<()> {
            let format = &container.format;
            let samples = to_f32_samples(format, container.payload())?;
            let device = self.device()?;

            let config = cpal::StreamConfig {
                channels: format.channels,
                sample_rate: cpal::SampleRate(format.sample_rate),
                buffer_size: cpal::BufferSize::Default,
            };

            let (done_tx, done_rx) = crossbeam_channel::bounded::<PlaybackOutcome>(1);
            let error_tx = done_tx.clone();
            let mut position = 0usize;

            let stream = device
                .build_output_stream(
                    &config,
                    move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                        let end = (position + data.len()).min(samples.len());
                        let n = end - position;
                        data[..n].copy_from_slice(&samples[position..end]);
                        data[n..].fill(0.0);
                        position = end;
                        if position == samples.len() {
                            let _ = done_tx.try_send(Ok(()));
                        }
                    },
                    move |err| {
                        tracing::error!("Playback stream error: {}", err);
                        let _ = error_tx.try_send(Err(err.to_string()));
                    },
                    None,
                )
                .map_err(|e| Error::Playback(e.to_string()))?;

            stream
                .play()
                .map_err(|e| Error::Playback(e.to_string()))?;

            tracing::info!(
                "Playing {} bytes ({:?})",
                container.payload_len(),
                container.duration()
            );

            wait_for_completion(&done_rx)?;

            // let the device drain its last buffer
            std::thread::sleep(Duration::from_millis(100));
            Ok(())
        }
    }

    /// Sent once by the stream: end of samples, or the stream's error
    type PlaybackOutcome = std::result::Result<(), String>;

    /// Block until the stream reports completion or failure
    fn wait_for_completion(done_rx: &Receiver<PlaybackOutcome>) -> Result<()> {
        match done_rx.recv() {
            Ok(Ok(())) => Ok(()),
            Ok(Err(message)) => Err(Error::Playback(message)),
            Err(_) => Err(Error::Playback("Playback stream stopped".to_string())),
        }
    }

}
