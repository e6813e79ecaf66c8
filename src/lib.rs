//! mediashrink - shrink media uploads by re-encoding them
//!
//! The transcoding itself lives in `mediashrink-av`; this crate holds the
//! configuration layer used by the binary, exposed for integration testing.

pub mod config;
