//! Voice service client.
//!
//! [`VoiceClient`] composes the transport with the response cache, in-flight
//! sharing, retry policy, job poller, and event bus. Operations are split
//! into submodules under `src/client/` by area.

pub mod builder;
pub mod core;
mod jobs;
mod synthesis;
mod validation;
mod voices;

pub use builder::VoiceClientBuilder;
pub use self::core::VoiceClient;
