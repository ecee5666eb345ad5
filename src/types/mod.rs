//! 领域类型：语音目录、合成与克隆参数、音频数据。
//!
//! Typed request parameters and response bodies of the voice service.
//! Unknown fields in server responses are ignored; missing optional fields default.

pub mod audio;
pub mod cloning;
pub mod synthesis;
pub mod system;
pub mod voice;

pub use audio::{AudioClip, AudioFormat};
pub use cloning::{AudioFile, CloneJob, CloneQuality, CloneRequest};
pub use synthesis::{SynthesisJob, SynthesisRequest};
pub use system::{Analytics, DeleteAck, HealthStatus};
pub use voice::{Voice, VoiceCatalog, VoiceKind, VoicePreview};
