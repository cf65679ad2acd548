use async_process::Command;
use regex::Regex;
use serde::Deserialize;
use std::sync::LazyLock;
use std::time::Duration;
use tokio::sync::Semaphore;
use tracing::debug;

use crate::error::ResolveError;

static YOUTUBE_URL: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(
        r"^(https?://)?(www\.|m\.)?(youtube\.com/(watch\?v=|embed/|v/|shorts/)|youtu\.be/|music\.youtube\.com/)",
    )
    .ok()
});

/// Información extraída de yt-dlp
#[derive(Debug, Clone, Deserialize)]
pub struct YtDlpInfo {
    pub id: String,
    pub title: String,
    pub duration: Option<f64>,
    pub uploader: Option<String>,
    pub artist: Option<String>,
    pub thumbnail: Option<String>,
    pub webpage_url: String,
    pub is_live: Option<bool>,
}

impl YtDlpInfo {
    pub fn duration(&self) -> Option<Duration> {
        self.duration
            .filter(|d| d.is_finite() && *d >= 0.0)
            .map(Duration::from_secs_f64)
    }

    /// Artista si yt-dlp lo reconoce, si no el canal que subió el video.
    pub fn performer(&self) -> Option<String> {
        self.artist.clone().or_else(|| self.uploader.clone())
    }
}

/// Cliente para interactuar con yt-dlp
pub struct YtDlpClient {
    binary: String,
    rate_limiter: Semaphore,
}

impl YtDlpClient {
    pub fn new() -> Self {
        Self {
            binary: "yt-dlp".to_string(),
            // Limitar procesos concurrentes para evitar rate limiting
            rate_limiter: Semaphore::new(3),
        }
    }

    /// Ejecuta `yt-dlp --dump-json` sobre una URL o una búsqueda `ytsearch1:`.
    pub async fn dump_info(&self, target: &str) -> Result<YtDlpInfo, ResolveError> {
        let _permit = self
            .rate_limiter
            .acquire()
            .await
            .map_err(|e| ResolveError::Backend(e.to_string()))?;

        debug!("📊 Obteniendo info de: {}", target);

        let output = Command::new(&self.binary)
            .args([
                "--no-playlist",
                "--dump-json",
                "--skip-download",
                "--no-warnings",
                "-f",
                "bestaudio/best",
                target,
            ])
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| ResolveError::Backend(format!("no se pudo ejecutar yt-dlp: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(classify_stderr(target, &stderr));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let line = stdout
            .lines()
            .find(|line| !line.trim().is_empty())
            .ok_or_else(|| ResolveError::NotFound(target.to_string()))?;

        serde_json::from_str(line)
            .map_err(|e| ResolveError::Backend(format!("respuesta de yt-dlp inválida: {e}")))
    }

    /// Verifica si una URL es de YouTube
    pub fn is_youtube_url(url: &str) -> bool {
        YOUTUBE_URL
            .as_ref()
            .is_some_and(|regex| regex.is_match(url))
    }
}

impl Default for YtDlpClient {
    fn default() -> Self {
        Self::new()
    }
}

/// Traduce el stderr de yt-dlp a un [`ResolveError`].
pub fn classify_stderr(target: &str, stderr: &str) -> ResolveError {
    let lower = stderr.to_lowercase();
    let detail = stderr.trim().lines().last().unwrap_or_default().to_string();

    if lower.contains("unsupported url") {
        ResolveError::Unsupported(target.to_string())
    } else if lower.contains("video unavailable")
        || lower.contains("private video")
        || lower.contains("not found")
        || lower.contains("has been removed")
    {
        ResolveError::NotFound(target.to_string())
    } else if lower.contains("unable to download")
        || lower.contains("timed out")
        || lower.contains("connection")
        || lower.contains("http error 5")
    {
        ResolveError::Network(detail)
    } else {
        ResolveError::Backend(detail)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_youtube_url_detection() {
        assert!(YtDlpClient::is_youtube_url(
            "https://www.youtube.com/watch?v=dQw4w9WgXcQ"
        ));
        assert!(YtDlpClient::is_youtube_url("https://youtu.be/dQw4w9WgXcQ"));
        assert!(YtDlpClient::is_youtube_url(
            "https://music.youtube.com/watch?v=test"
        ));
        assert!(!YtDlpClient::is_youtube_url("https://example.com/video"));
    }

    #[test]
    fn test_stderr_classification() {
        assert_eq!(
            classify_stderr("x", "ERROR: Unsupported URL: x"),
            ResolveError::Unsupported("x".into())
        );
        assert_eq!(
            classify_stderr("x", "ERROR: [youtube] abc: Private video. Sign in"),
            ResolveError::NotFound("x".into())
        );
        assert!(matches!(
            classify_stderr("x", "ERROR: Unable to download webpage: timed out"),
            ResolveError::Network(_)
        ));
        assert!(matches!(
            classify_stderr("x", "something odd"),
            ResolveError::Backend(_)
        ));
    }

    #[test]
    fn test_info_parsing() {
        let json = r#"{"id":"abc","title":"Song","duration":215.4,"uploader":"Channel",
            "artist":null,"thumbnail":"https://i.ytimg.com/a.jpg",
            "webpage_url":"https://www.youtube.com/watch?v=abc","is_live":false}"#;
        let info: YtDlpInfo = serde_json::from_str(json).unwrap();

        assert_eq!(info.duration(), Some(Duration::from_secs_f64(215.4)));
        assert_eq!(info.performer().as_deref(), Some("Channel"));
    }
}
