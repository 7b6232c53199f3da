//! Source discovery and media download through `yt-dlp`.

pub mod discovery;
pub mod download;
pub mod process;

pub use discovery::{SourceFinder, YtDlpSourceFinder};
pub use download::{CachedDownloader, Downloader, YtDlpDownloader};
