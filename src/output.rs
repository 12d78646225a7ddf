// ============================================================================
// OUTPUT.RS - Audio Device Output
// ============================================================================
//
// The one impure edge of the renderer: a miniaudio playback device whose
// data callback pulls interleaved stereo frames from the shared mixer.
//
// FAILURE POLICY:
// Device creation can fail (no sound hardware, suspended audio server,
// headless CI). That is captured ONCE at startup: the output object
// simply reports available() == false and every play call returns
// failure from then on. No retries, no panics - a silent chime engine
// must never take tab switching down with it.
// ============================================================================

use std::sync::{Arc, Mutex};

use anyhow::Result;
use miniaudio::{Device, DeviceConfig, DeviceType, Format};

use crate::renderer::Mixer;

/// The real-time audio output path
pub struct AudioOutput {
    /// The running playback device, when one could be started
    device: Option<Device>,
}

impl AudioOutput {
    /// Tries to open and start the playback device. On any failure the
    /// output comes back in the unavailable state instead of erroring.
    pub fn start(mixer: Arc<Mutex<Mixer>>) -> Self {
        match Self::init_device(mixer) {
            Ok(device) => Self { device: Some(device) },
            Err(error) => {
                eprintln!("[OUTPUT] audio device unavailable: {error:#}");
                Self { device: None }
            }
        }
    }

    /// Creates an output that never plays. Used by tests and by hosts
    /// that only want offline rendering.
    pub fn disabled() -> Self {
        Self { device: None }
    }

    /// Whether the device is up and pulling samples
    pub fn available(&self) -> bool {
        self.device.is_some()
    }

    fn init_device(mixer: Arc<Mutex<Mixer>>) -> Result<Device> {
        let sample_rate = mixer.lock().unwrap().sample_rate();

        let mut config = DeviceConfig::new(DeviceType::Playback);
        config.playback_mut().set_format(Format::F32);
        config.playback_mut().set_channels(2);
        config.set_sample_rate(sample_rate);

        config.set_data_callback(move |_device, output, _input| {
            let frames = output.as_samples_mut::<f32>();
            mixer.lock().unwrap().process_frame(frames);
        });

        let device = Device::new(None, &config)
            .map_err(|e| anyhow::anyhow!("Failed to create audio device: {:?}", e))?;

        device.start()
            .map_err(|e| anyhow::anyhow!("Failed to start audio device: {:?}", e))?;

        Ok(device)
    }
}

// ============================================================================
// UNIT TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_output_reports_unavailable() {
        let output = AudioOutput::disabled();
        assert!(!output.available());
    }
}
