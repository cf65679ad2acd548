pub mod youtube;

use async_trait::async_trait;
use tracing::{debug, info};

pub use youtube::YtDlpClient;

use crate::audio::{ResolvedTrack, StreamRef, TrackResolver};
use crate::cache::{cache_key, MetadataCache};
use crate::error::ResolveError;

/// [`TrackResolver`] respaldado por yt-dlp con cache de metadata.
pub struct YtDlpResolver {
    client: YtDlpClient,
    cache: MetadataCache,
    search_suffix: Option<String>,
}

impl YtDlpResolver {
    pub fn new(client: YtDlpClient, cache: MetadataCache, search_suffix: Option<String>) -> Self {
        Self {
            client,
            cache,
            search_suffix: search_suffix.filter(|s| !s.trim().is_empty()),
        }
    }

    pub fn cache(&self) -> &MetadataCache {
        &self.cache
    }

    /// URLs pasan tal cual; el texto libre se convierte en `ytsearch1:`.
    pub fn target_for(&self, source: &str) -> String {
        let source = source.trim();
        if is_url(source) {
            return source.to_string();
        }

        match &self.search_suffix {
            Some(suffix) => format!("ytsearch1:{} {}", source, suffix.trim()),
            None => format!("ytsearch1:{}", source),
        }
    }
}

pub fn is_url(source: &str) -> bool {
    url::Url::parse(source)
        .map(|url| matches!(url.scheme(), "http" | "https"))
        .unwrap_or(false)
}

#[async_trait]
impl TrackResolver for YtDlpResolver {
    async fn resolve(&self, source: &str) -> Result<ResolvedTrack, ResolveError> {
        let key = cache_key(source);
        if let Some(cached) = self.cache.get(&key) {
            debug!("💾 Cache hit: {}", source);
            return Ok(cached);
        }

        let target = self.target_for(source);
        let info = self.client.dump_info(&target).await?;

        if info.is_live.unwrap_or(false) {
            info!("📡 Transmisión en vivo: {}", info.title);
        }

        let resolved = ResolvedTrack {
            stream: StreamRef::new(info.webpage_url.clone()),
            title: Some(info.title.clone()),
            artist: info.performer(),
            duration: info.duration(),
            thumbnail: info.thumbnail.clone(),
            webpage_url: Some(info.webpage_url.clone()),
        };

        info!("✅ Resuelto: {} → {} ({})", source, info.title, info.id);
        self.cache.insert(key, resolved.clone());
        Ok(resolved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::metadata_cache;
    use std::time::Duration;

    fn resolver(suffix: Option<&str>) -> YtDlpResolver {
        YtDlpResolver::new(
            YtDlpClient::new(),
            metadata_cache(10, Duration::from_secs(60)),
            suffix.map(str::to_string),
        )
    }

    #[test]
    fn test_target_for_queries_and_urls() {
        let plain = resolver(None);
        assert_eq!(plain.target_for(" lofi beats "), "ytsearch1:lofi beats");
        assert_eq!(
            plain.target_for("https://youtu.be/abc"),
            "https://youtu.be/abc"
        );

        let suffixed = resolver(Some("official audio"));
        assert_eq!(
            suffixed.target_for("daft punk"),
            "ytsearch1:daft punk official audio"
        );
        assert_eq!(resolver(Some("  ")).target_for("x"), "ytsearch1:x");
    }

    #[tokio::test]
    async fn test_cached_resolution_skips_backend() {
        let resolver = resolver(None);
        let cached = ResolvedTrack {
            stream: StreamRef::new("https://www.youtube.com/watch?v=abc"),
            title: Some("Cached".into()),
            artist: None,
            duration: None,
            thumbnail: None,
            webpage_url: None,
        };
        resolver.cache().insert(cache_key("Some Query"), cached);

        let resolved = resolver.resolve("some query").await.unwrap();
        assert_eq!(resolved.title.as_deref(), Some("Cached"));
    }
}
