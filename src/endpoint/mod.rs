//! Bindings to the system's default output endpoint

#[cfg(all(windows, feature = "wasapi"))]
mod wasapi;

#[cfg(all(windows, feature = "wasapi"))]
#[cfg_attr(docsrs, doc(cfg(all(windows, feature = "wasapi"))))]
pub use wasapi::*;

#[cfg(feature = "output")]
pub use cpal;

use crate::{Balance, ChannelVolumeSink, MemorySink, SinkError, SinkResult};

/// Get the default output device
#[cfg(feature = "output")]
pub fn default_output_device() -> Option<cpal::Device> {
    use cpal::traits::HostTrait;
    cpal::default_host().default_output_device()
}

/// Get the display name of the default output device
pub fn default_output_name() -> Option<String> {
    #[cfg(feature = "output")]
    {
        use cpal::traits::DeviceTrait;
        default_output_device().and_then(|device| device.name().ok())
    }
    #[cfg(not(feature = "output"))]
    {
        None
    }
}

/**
A [`ChannelVolumeSink`] for platforms without endpoint volume control

Balances are only remembered, not applied. The endpoint name is
looked up again on every request.
*/
#[derive(Debug, Clone)]
pub struct PreviewSink {
    memory: MemorySink,
}

impl Default for PreviewSink {
    fn default() -> Self {
        PreviewSink {
            memory: MemorySink::new(crate::UNKNOWN_ENDPOINT),
        }
    }
}

impl PreviewSink {
    /// Create a new preview sink
    pub fn new() -> Self {
        Self::default()
    }
    /// Get the last balance set on this sink
    pub fn balance(&self) -> Balance {
        self.memory.balance()
    }
}

impl ChannelVolumeSink for PreviewSink {
    fn set_channel_volume(&mut self, left: f32, right: f32) -> SinkResult<()> {
        self.memory.set_channel_volume(left, right)
    }
    fn channel_volume(&mut self) -> SinkResult<Balance> {
        self.memory.channel_volume()
    }
    fn endpoint_name(&mut self) -> SinkResult<String> {
        default_output_name().ok_or(SinkError::EndpointUnavailable)
    }
}

/// Get the best available sink for the default output endpoint
pub fn default_sink() -> Box<dyn ChannelVolumeSink + Send> {
    #[cfg(all(windows, feature = "wasapi"))]
    {
        Box::new(EndpointVolumeSink::new())
    }
    #[cfg(not(all(windows, feature = "wasapi")))]
    {
        log::warn!("No endpoint volume control on this platform, balance changes are only previewed");
        Box::new(PreviewSink::new())
    }
}
