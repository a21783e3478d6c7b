//! yt-dlp backed search and download

use async_trait::async_trait;
use serde::Deserialize;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::sync::{AudioSource, SearchCandidate};

/// Preferred formats, native m4a first
const AUDIO_FORMAT: &str = "bestaudio[ext=m4a]/bestaudio/best";

/// Suffix of a download still in flight
const PARTIAL_SUFFIX: &str = "download";

/// Search result as printed by `yt-dlp --dump-json`
#[derive(Debug, Deserialize)]
struct VideoInfo {
    title: Option<String>,
    duration: Option<f64>,
    webpage_url: Option<String>,
    url: Option<String>,
}

impl VideoInfo {
    fn into_candidate(self) -> Option<SearchCandidate> {
        let source_url = self.webpage_url.or(self.url)?;
        let duration_seconds = self
            .duration
            .filter(|d| d.is_finite() && *d >= 0.0)
            .map(|d| d.round() as u32);

        Some(SearchCandidate {
            title: self.title.unwrap_or_else(|| source_url.clone()),
            duration_seconds,
            source_url,
        })
    }
}

/// Parse the line-delimited JSON of a search, skipping lines that are not results
fn parse_search_output(stdout: &str) -> Vec<SearchCandidate> {
    stdout
        .lines()
        .filter(|line| !line.trim().is_empty())
        .filter_map(|line| match serde_json::from_str::<VideoInfo>(line) {
            Ok(info) => info.into_candidate(),
            Err(e) => {
                debug!("Skipping unparsable yt-dlp line: {}", e);
                None
            }
        })
        .collect()
}

/// Where a download is written before it is complete
fn partial_path(destination: &Path) -> PathBuf {
    let mut name = destination
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| OsString::from("track"));
    name.push(".");
    name.push(PARTIAL_SUFFIX);
    destination.with_file_name(name)
}

/// yt-dlp output templates treat `%` as a field marker
fn escape_template(path: &Path) -> String {
    path.to_string_lossy().replace('%', "%%")
}

/// Audio source that shells out to yt-dlp
pub struct YtDlp {
    binary: PathBuf,
}

impl YtDlp {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }
}

#[async_trait]
impl AudioSource for YtDlp {
    async fn search(&self, query: &str, max_results: usize) -> Vec<SearchCandidate> {
        debug!("Searching YouTube: {}", query);

        let output = Command::new(&self.binary)
            .arg("--dump-json")
            .arg("--skip-download")
            .arg("--no-playlist")
            .arg("--quiet")
            .arg("--no-warnings")
            .arg(format!("ytsearch{}:{}", max_results, query))
            .stdin(Stdio::null())
            .output()
            .await;

        let output = match output {
            Ok(output) => output,
            Err(e) => {
                warn!("Failed to run {}: {}", self.binary.display(), e);
                return Vec::new();
            }
        };

        if !output.status.success() {
            warn!(
                "Search failed for '{}': {}",
                query,
                String::from_utf8_lossy(&output.stderr).trim()
            );
            return Vec::new();
        }

        let candidates = parse_search_output(&String::from_utf8_lossy(&output.stdout));
        debug!("{} results for '{}'", candidates.len(), query);
        candidates
    }

    async fn download(&self, source_url: &str, destination: &Path) -> bool {
        let partial = partial_path(destination);

        let output = Command::new(&self.binary)
            .arg("-f")
            .arg(AUDIO_FORMAT)
            .arg("--no-playlist")
            .arg("--quiet")
            .arg("--no-warnings")
            .arg("--force-overwrites")
            .arg("-o")
            .arg(escape_template(&partial))
            .arg("--")
            .arg(source_url)
            .stdin(Stdio::null())
            .output()
            .await;

        let succeeded = match output {
            Ok(output) if output.status.success() => true,
            Ok(output) => {
                warn!(
                    "Download failed for {}: {}",
                    source_url,
                    String::from_utf8_lossy(&output.stderr).trim()
                );
                false
            }
            Err(e) => {
                warn!("Failed to run {}: {}", self.binary.display(), e);
                false
            }
        };

        if succeeded {
            match tokio::fs::rename(&partial, destination).await {
                Ok(()) => {
                    info!("Saved {}", destination.display());
                    return true;
                }
                Err(e) => warn!(
                    "Failed to move {} into place: {}",
                    partial.display(),
                    e
                ),
            }
        }

        if let Err(e) = tokio::fs::remove_file(&partial).await {
            debug!("No partial file to clean up at {}: {}", partial.display(), e);
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_search_output() {
        let stdout = concat!(
            r#"{"title": "Daft Punk - Harder Better Faster Stronger", "duration": 224.0, "webpage_url": "https://www.youtube.com/watch?v=gAjR4_CbPpQ"}"#,
            "\n",
            r#"{"title": "Live version", "duration": null, "url": "https://www.youtube.com/watch?v=x"}"#,
            "\n",
            "\n",
            "WARNING: not json\n",
            r#"{"title": "No url", "duration": 10}"#,
            "\n",
        );

        let candidates = parse_search_output(stdout);

        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].duration_seconds, Some(224));
        assert_eq!(
            candidates[0].source_url,
            "https://www.youtube.com/watch?v=gAjR4_CbPpQ"
        );
        assert_eq!(candidates[1].duration_seconds, None);
        assert_eq!(candidates[1].source_url, "https://www.youtube.com/watch?v=x");
    }

    #[test]
    fn test_duration_rounding() {
        let info = VideoInfo {
            title: Some("t".into()),
            duration: Some(204.6),
            webpage_url: Some("u".into()),
            url: None,
        };
        assert_eq!(info.into_candidate().unwrap().duration_seconds, Some(205));
    }

    #[test]
    fn test_partial_path() {
        assert_eq!(
            partial_path(Path::new("/lib/Mix/X - Y.m4a")),
            PathBuf::from("/lib/Mix/X - Y.m4a.download")
        );
    }

    #[test]
    fn test_escape_template() {
        assert_eq!(escape_template(Path::new("/a/100% Pure.m4a")), "/a/100%% Pure.m4a");
    }

    #[tokio::test]
    async fn test_missing_binary_is_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let ytdlp = YtDlp::new(dir.path().join("no-such-yt-dlp"));
        let dest = dir.path().join("out.m4a");

        assert!(ytdlp.search("anything", 5).await.is_empty());
        assert!(!ytdlp.download("https://example.com", &dest).await);
        assert!(!dest.exists());
        assert!(!partial_path(&dest).exists());
    }
}
