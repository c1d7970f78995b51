use crate::{Balance, Shared};

/// An error returned by a [`ChannelVolumeSink`]
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SinkError {
    /// There is no active output device, or the bound device was removed or disabled
    #[error("No audio output endpoint is available")]
    EndpointUnavailable,
    /// The OS rejected the call, or the endpoint is in an unusable state
    #[error("The audio endpoint rejected the request: {0}")]
    InvalidEndpointState(String),
}

/// A result type for [`ChannelVolumeSink`] operations
pub type SinkResult<T> = Result<T, SinkError>;

/**
Sets the per-channel volume of the current default output endpoint

Implementations should check which endpoint is the default before each call,
since it can change at any time.
*/
pub trait ChannelVolumeSink {
    /// Set the left and right channel volumes, each in `[0.0, 1.0]`
    fn set_channel_volume(&mut self, left: f32, right: f32) -> SinkResult<()>;
    /// Get the current left and right channel volumes
    fn channel_volume(&mut self) -> SinkResult<Balance> {
        Err(SinkError::EndpointUnavailable)
    }
    /// Get the display name of the current endpoint
    fn endpoint_name(&mut self) -> SinkResult<String> {
        Err(SinkError::EndpointUnavailable)
    }
}

impl<S> ChannelVolumeSink for Box<S>
where
    S: ChannelVolumeSink + ?Sized,
{
    fn set_channel_volume(&mut self, left: f32, right: f32) -> SinkResult<()> {
        (**self).set_channel_volume(left, right)
    }
    fn channel_volume(&mut self) -> SinkResult<Balance> {
        (**self).channel_volume()
    }
    fn endpoint_name(&mut self) -> SinkResult<String> {
        (**self).endpoint_name()
    }
}

/// A [`ChannelVolumeSink`] that only remembers the last balance it was given
///
/// Clones share the same stored balance.
#[derive(Debug, Clone)]
pub struct MemorySink {
    balance: Shared<Balance>,
    name: String,
}

impl MemorySink {
    /// Create a new memory sink with the given display name
    pub fn new(name: impl Into<String>) -> Self {
        MemorySink {
            balance: Shared::new(Balance::CENTERED),
            name: name.into(),
        }
    }
    /// Get the last balance set on this sink
    pub fn balance(&self) -> Balance {
        self.balance.get()
    }
}

impl ChannelVolumeSink for MemorySink {
    fn set_channel_volume(&mut self, left: f32, right: f32) -> SinkResult<()> {
        self.balance.set(Balance::new(left, right));
        Ok(())
    }
    fn channel_volume(&mut self) -> SinkResult<Balance> {
        Ok(self.balance.get())
    }
    fn endpoint_name(&mut self) -> SinkResult<String> {
        Ok(self.name.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_sink() {
        let mut sink = MemorySink::new("Speakers");
        let observer = sink.clone();
        sink.set_channel_volume(0.2, 0.8).unwrap();
        assert_eq!(observer.balance(), Balance::new(0.2, 0.8));
        assert_eq!(sink.endpoint_name().unwrap(), "Speakers");
    }

    #[test]
    fn test_boxed_defaults() {
        struct WriteOnly;
        impl ChannelVolumeSink for WriteOnly {
            fn set_channel_volume(&mut self, _: f32, _: f32) -> SinkResult<()> {
                Ok(())
            }
        }
        let mut sink: Box<dyn ChannelVolumeSink + Send> = Box::new(WriteOnly);
        assert_eq!(sink.set_channel_volume(0.0, 1.0), Ok(()));
        assert_eq!(sink.channel_volume(), Err(SinkError::EndpointUnavailable));
        assert_eq!(sink.endpoint_name(), Err(SinkError::EndpointUnavailable));
    }
}
