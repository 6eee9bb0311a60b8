// Playback controller: station catalog, session lifecycle and the
// resolve + fetch + decode pipeline feeding an output sink

pub mod catalog;
pub mod controller;
pub mod pipeline;
mod session;

pub use catalog::{Catalog, Station, STATIONS};
pub use controller::{PlaybackController, PlaybackControllerBuilder};
pub use pipeline::open_stream;
