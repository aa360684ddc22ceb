//! 基础设施层：持有终端输出这一稀缺资源，只暴露"朗读"与"背景音"能力

pub mod chime_audio;
pub mod terminal_speech;

pub use chime_audio::ChimeAudio;
pub use terminal_speech::TerminalSpeech;
