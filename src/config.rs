//! Driver configuration.
use std::num::NonZeroUsize;

/// How emissions are buffered between the polling task and the consumer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Buffer {
    /// The producer never waits for the consumer; all delay comes from the policy.
    ///
    /// A consumer that stops reading without dropping the stream lets the buffer grow
    /// by one entry per remaining iteration.
    #[default]
    Unbounded,

    /// At most `n` unread emissions; the producer waits for capacity before emitting.
    Bounded(NonZeroUsize),
}

/// Configuration for a [`PollingDriver`](crate::PollingDriver).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DriverConfig {
    /// Channel buffering between producer and consumer.
    pub buffer: Buffer,
    /// Optional name recorded on the polling task's tracing span.
    pub name: Option<String>,
}

impl DriverConfig {
    /// Sets the buffering mode.
    pub fn with_buffer(mut self, buffer: Buffer) -> Self {
        self.buffer = buffer;
        self
    }

    /// Sets the name used in tracing output.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

#[test]
fn default_config_is_unbounded_and_unnamed() {
    let config = DriverConfig::default();
    assert_eq!(config.buffer, Buffer::Unbounded);
    assert!(config.name.is_none());

    let config = config
        .with_name("health-check")
        .with_buffer(Buffer::Bounded(NonZeroUsize::MIN));
    assert_eq!(config.name.as_deref(), Some("health-check"));
    assert_eq!(config.buffer, Buffer::Bounded(NonZeroUsize::MIN));
}
