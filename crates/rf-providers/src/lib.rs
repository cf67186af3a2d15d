//! rf-providers: remote services the pipeline calls out to.
//!
//! Each provider implements one stage trait from `rf-pipeline`:
//!
//! | provider | stage |
//! |---|---|
//! | [`RedditFetcher`] | fetch |
//! | [`GoogleSpeechSynthesizer`] | synthesize |
//! | [`AssemblyAiTranscriber`] | transcribe |
//! | [`YoutubePublisher`] | publish |
//!
//! Base URLs come from configuration so every provider can be pointed at a
//! mock server.

mod http;

pub mod assemblyai;
pub mod google_tts;
pub mod reddit;
pub mod youtube;

pub use assemblyai::AssemblyAiTranscriber;
pub use google_tts::GoogleSpeechSynthesizer;
pub use reddit::RedditFetcher;
pub use youtube::YoutubePublisher;
