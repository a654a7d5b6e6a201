use std::time::Duration;

use paystream_stream::MaterializedBuffer;

/// Media element the controller feeds.
///
/// Calls are synchronous and made while session state is locked; an
/// implementation must not call back into the controller.
#[cfg_attr(
    any(test, feature = "test-utils"),
    unimock::unimock(api = MediaSinkMock)
)]
pub trait MediaSink: Send + Sync {
    fn current_time(&self) -> Duration;

    /// `None` until the media length is known.
    fn duration(&self) -> Option<Duration>;

    fn is_paused(&self) -> bool;

    fn play(&self);

    fn pause(&self);

    fn seek(&self, position: Duration);

    /// Replace the source. Any previously set buffer handle is already
    /// revoked or about to be.
    fn set_source(&self, buffer: &MaterializedBuffer);
}
