//! YouTube audio source

mod ytdlp;

pub use ytdlp::YtDlp;
