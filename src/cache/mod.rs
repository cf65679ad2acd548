//! # Módulo de Cache
//!
//! Cache de metadatos de canciones resueltas. Ejecutar `yt-dlp` tarda
//! segundos, así que cada resolución se guarda durante `CACHE_TTL` y se reusa
//! cuando la misma fuente vuelve a aparecer (la playlist se repite en cada ciclo).
//!
//! ```env
//! CACHE_SIZE=100   # Máximo de entradas
//! CACHE_TTL=1h     # Vida de cada entrada
//! ```

pub mod lru_cache;

use lru_cache::LRUCache;
use std::time::Duration;
use tracing::info;

use crate::audio::ResolvedTrack;

/// Resoluciones indexadas por la fuente normalizada (URL o búsqueda).
pub type MetadataCache = LRUCache<String, ResolvedTrack>;

pub fn metadata_cache(capacity: usize, ttl: Duration) -> MetadataCache {
    LRUCache::new(capacity, Some(ttl))
}

/// Clave de cache: sin espacios sobrantes y en minúsculas para búsquedas.
pub fn cache_key(source: &str) -> String {
    let trimmed = source.trim();
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        trimmed.to_lowercase()
    }
}

impl MetadataCache {
    /// Elimina las entradas vencidas. Pensado para una tarea periódica.
    pub fn cleanup_old_entries(&self) {
        let removed = self.cleanup_expired();
        if removed > 0 {
            let metrics = self.metrics();
            info!(
                "🧹 Cache: {} entradas expiradas eliminadas, {}/{} en uso (hit rate {:.0}%)",
                removed,
                self.len(),
                self.capacity(),
                metrics.hit_rate() * 100.0
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_key_normalization() {
        assert_eq!(cache_key("  Daft Punk Around "), "daft punk around");
        assert_eq!(
            cache_key("https://youtu.be/AbC"),
            "https://youtu.be/AbC"
        );
    }
}
