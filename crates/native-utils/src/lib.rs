//! Native audio output for the tutor: device lookup, resampling to the
//! device rate and a cpal-backed `AudioPlayer`.

pub mod audio;
pub mod device;
pub mod player;

pub use player::CpalPlayer;
