//! Stage implementations backed by local ffmpeg / ffprobe.

mod captions;
mod compose;

pub use captions::FfmpegCaptionBurner;
pub use compose::FfmpegComposer;
