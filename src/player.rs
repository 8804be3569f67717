//! Transport state machine.
//!
//! `Player` owns the playlist and the single live engine stream, and is the
//! only component that talks to the `AudioEngine`.

mod transport;
mod types;

pub use transport::*;
pub use types::*;

#[cfg(test)]
mod tests;
