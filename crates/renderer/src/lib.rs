// Output sink: feeds decoded frames to an audio device with live gain

#[cfg(feature = "cpal-device")]
mod cpal_sink;
mod feed;
mod pull_sink;
mod sink;

#[cfg(feature = "cpal-device")]
pub use cpal_sink::CpalSink;
pub use feed::FeedQueue;
pub use pull_sink::PullSink;
pub use sink::{CompletionCallback, GainControl, OutputSink};
