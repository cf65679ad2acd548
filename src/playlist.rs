//! Playlist: la lista plana de canciones registradas que se usa de respaldo.
//!
//! El cargador acepta tres formatos por línea, mezclables en un mismo archivo:
//!
//! ```text
//! # comentario
//! https://youtu.be/abc
//! https://youtu.be/def, Título, Artista
//! [Sección]
//! https://youtu.be/ghi; Artista - Título
//! ```
//!
//! Las entradas solo se agregan al final. Los números de canción siguen el
//! orden del archivo, empezando en 1.

use parking_lot::RwLock;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::{fs, io::AsyncWriteExt};
use tracing::{debug, info, warn};

use crate::audio::track::{UNKNOWN_ARTIST, UNKNOWN_TITLE};
use crate::error::PlaylistError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaylistEntry {
    pub source: String,
    pub title: String,
    pub artist: String,
    pub track_number: usize,
    pub section: Option<String>,
}

pub struct PlaylistStore {
    path: Option<PathBuf>,
    entries: RwLock<Arc<Vec<PlaylistEntry>>>,
}

impl PlaylistStore {
    /// Playlist solo en memoria (los agregados no se persisten).
    pub fn in_memory(entries: Vec<PlaylistEntry>) -> Self {
        Self {
            path: None,
            entries: RwLock::new(Arc::new(entries)),
        }
    }

    /// Carga la playlist desde disco. Un archivo inexistente produce una
    /// playlist vacía que se creará en el primer `append`.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, PlaylistError> {
        let path = path.as_ref().to_path_buf();

        let entries = match fs::read_to_string(&path).await {
            Ok(content) => parse(&content),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!("📄 Playlist {} no existe, se inicia vacía", path.display());
                Vec::new()
            }
            Err(e) => return Err(e.into()),
        };

        info!("📋 Playlist cargada: {} canciones desde {}", entries.len(), path.display());

        Ok(Self {
            path: Some(path),
            entries: RwLock::new(Arc::new(entries)),
        })
    }

    /// Copia de las entradas actuales. Los agregados posteriores no la afectan.
    pub fn snapshot(&self) -> Arc<Vec<PlaylistEntry>> {
        self.entries.read().clone()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Agrega una canción al final de la playlist y la persiste como fila
    /// `url,title,artist`. Si la escritura falla la entrada no se agrega.
    pub async fn append(
        &self,
        source: &str,
        title: &str,
        artist: &str,
    ) -> Result<PlaylistEntry, PlaylistError> {
        let source = source.trim();
        if source.is_empty() {
            return Err(PlaylistError::InvalidEntry("URL vacía".into()));
        }

        let title = non_empty_or(title.trim(), UNKNOWN_TITLE);
        let artist = non_empty_or(artist.trim(), UNKNOWN_ARTIST);

        if let Some(path) = &self.path {
            let needs_newline = match fs::read(path).await {
                Ok(bytes) => bytes.last().is_some_and(|b| *b != b'\n'),
                Err(_) => false,
            };

            let mut line = String::new();
            if needs_newline {
                line.push('\n');
            }
            line.push_str(&format_row(&[source, &title, &artist]));
            line.push('\n');

            let mut file = fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .await?;
            file.write_all(line.as_bytes()).await?;
            file.flush().await?;
        }

        let mut guard = self.entries.write();
        let mut entries = guard.as_ref().clone();
        let entry = PlaylistEntry {
            source: source.to_string(),
            title,
            artist,
            track_number: entries.len() + 1,
            section: None,
        };
        entries.push(entry.clone());
        *guard = Arc::new(entries);

        info!("➕ Agregada a la playlist: {} - {}", entry.artist, entry.title);
        Ok(entry)
    }
}

/// Parsea el contenido completo de un archivo de playlist.
pub fn parse(content: &str) -> Vec<PlaylistEntry> {
    let mut entries = Vec::new();
    let mut section: Option<String> = None;

    for (index, raw) in content.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        if line.starts_with('[') && line.ends_with(']') {
            section = Some(line[1..line.len() - 1].trim().to_string());
            continue;
        }

        let parsed = if let Some((url, description)) = line.split_once(';') {
            let (artist, title) = split_description(description.trim());
            Some((url.trim().to_string(), title, artist))
        } else if line.contains(',') {
            let fields = parse_row(line);
            if fields
                .first()
                .is_some_and(|f| f.eq_ignore_ascii_case("url"))
            {
                debug!("Encabezado de playlist ignorado en línea {}", index + 1);
                continue;
            }
            let mut fields = fields.into_iter();
            let url = fields.next().unwrap_or_default();
            let title = fields.next().unwrap_or_default();
            let artist = fields.next().unwrap_or_default();
            Some((url, title, artist))
        } else {
            Some((line.to_string(), String::new(), String::new()))
        };

        let Some((url, title, artist)) = parsed else {
            continue;
        };

        if url.is_empty() {
            warn!("⚠️ Línea {} de la playlist sin URL, se omite: {}", index + 1, line);
            continue;
        }

        entries.push(PlaylistEntry {
            source: url,
            title: non_empty_or(title.trim(), UNKNOWN_TITLE),
            artist: non_empty_or(artist.trim(), UNKNOWN_ARTIST),
            track_number: entries.len() + 1,
            section: section.clone(),
        });
    }

    entries
}

/// `"Artista - Título"` → `(artista, título)`. Sin separador todo es título.
pub fn split_description(description: &str) -> (String, String) {
    match description.split_once(" - ") {
        Some((artist, title)) => (artist.trim().to_string(), title.trim().to_string()),
        None => (String::new(), description.to_string()),
    }
}

fn non_empty_or(value: &str, fallback: &str) -> String {
    if value.is_empty() {
        fallback.to_string()
    } else {
        value.to_string()
    }
}

/// Separa una fila por comas respetando comillas dobles (`""` escapa una comilla).
fn parse_row(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes && chars.peek() == Some(&'"') => {
                current.push('"');
                chars.next();
            }
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => {
                fields.push(current.trim().to_string());
                current.clear();
            }
            _ => current.push(c),
        }
    }
    fields.push(current.trim().to_string());

    fields
}

fn format_row(fields: &[&str]) -> String {
    fields
        .iter()
        .map(|field| {
            if field.contains(',') || field.contains('"') {
                format!("\"{}\"", field.replace('"', "\"\""))
            } else {
                field.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join(",")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_url_per_line() {
        let entries = parse("https://youtu.be/a\n\n# comentario\nhttps://youtu.be/b\n");
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].source, "https://youtu.be/a");
        assert_eq!(entries[0].title, UNKNOWN_TITLE);
        assert_eq!(entries[0].artist, UNKNOWN_ARTIST);
        assert_eq!(entries[1].track_number, 2);
    }

    #[test]
    fn test_parse_rows_with_header_and_quotes() {
        let content = "url,title,artist\n\
                       https://youtu.be/a, Song A , Artist A\n\
                       https://youtu.be/b,\"Hello, World\",Band\n\
                       https://youtu.be/c,Only Title\n";
        let entries = parse(content);

        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].title, "Song A");
        assert_eq!(entries[0].artist, "Artist A");
        assert_eq!(entries[1].title, "Hello, World");
        assert_eq!(entries[2].artist, UNKNOWN_ARTIST);
    }

    #[test]
    fn test_parse_sectioned_variant() {
        let content = "[Rock]\n\
                       https://youtu.be/a; Queen - Bohemian Rhapsody\n\
                       https://youtu.be/b;\n\
                       [Chill]\n\
                       https://youtu.be/c; Lofi Beats\n";
        let entries = parse(content);

        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].artist, "Queen");
        assert_eq!(entries[0].title, "Bohemian Rhapsody");
        assert_eq!(entries[0].section.as_deref(), Some("Rock"));
        assert_eq!(entries[1].title, UNKNOWN_TITLE);
        assert_eq!(entries[2].title, "Lofi Beats");
        assert_eq!(entries[2].artist, UNKNOWN_ARTIST);
        assert_eq!(entries[2].section.as_deref(), Some("Chill"));
    }

    #[test]
    fn test_parse_skips_rows_without_url() {
        let entries = parse(",Title,Artist\n; Someone - Something\nhttps://youtu.be/x\n");
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].track_number, 1);
    }

    #[tokio::test]
    async fn test_missing_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = PlaylistStore::load(dir.path().join("nope.txt")).await.unwrap();
        assert_eq!(store.len(), 0);
    }

    #[tokio::test]
    async fn test_append_persists_row() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("playlist.csv");
        std::fs::write(&path, "https://youtu.be/a").unwrap();

        let store = PlaylistStore::load(&path).await.unwrap();
        let before = store.snapshot();
        let entry = store
            .append("https://youtu.be/b", "Hello, World", "Band")
            .await
            .unwrap();

        assert_eq!(entry.track_number, 2);
        assert_eq!(before.len(), 1);
        assert_eq!(store.len(), 2);

        let reloaded = PlaylistStore::load(&path).await.unwrap();
        let entries = reloaded.snapshot();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].title, "Hello, World");
        assert_eq!(entries[1].artist, "Band");
    }

    #[tokio::test]
    async fn test_append_rejects_empty_url() {
        let store = PlaylistStore::in_memory(Vec::new());
        assert!(store.append("  ", "t", "a").await.is_err());
        assert_eq!(store.len(), 0);
    }
}
