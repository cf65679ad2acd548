use chrono::{DateTime, Utc};
use serenity::model::id::UserId;
use std::time::Duration;

use crate::audio::ResolvedTrack;
use crate::playlist::PlaylistEntry;

pub const UNKNOWN_TITLE: &str = "Unknown Title";
pub const UNKNOWN_ARTIST: &str = "Unknown Artist";

/// Quién pidió la canción.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requester {
    User(UserId),
    /// Elegida por la playlist de respaldo.
    AutoSelected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    UserRequested,
    FallbackPlaylist,
}

#[derive(Debug, Clone)]
pub struct TrackRequest {
    /// URL o texto de búsqueda
    pub source: String,
    pub title: String,
    pub artist: String,
    pub requested_by: Requester,
    pub origin: Origin,
    pub duration: Option<Duration>,
    pub thumbnail: Option<String>,
    pub track_number: Option<usize>,
    pub added_at: DateTime<Utc>,
}

impl TrackRequest {
    pub fn user(source: impl Into<String>, user: UserId) -> Self {
        Self {
            source: source.into(),
            title: UNKNOWN_TITLE.to_string(),
            artist: UNKNOWN_ARTIST.to_string(),
            requested_by: Requester::User(user),
            origin: Origin::UserRequested,
            duration: None,
            thumbnail: None,
            track_number: None,
            added_at: Utc::now(),
        }
    }

    pub fn from_playlist(entry: &PlaylistEntry) -> Self {
        Self {
            source: entry.source.clone(),
            title: entry.title.clone(),
            artist: entry.artist.clone(),
            requested_by: Requester::AutoSelected,
            origin: Origin::FallbackPlaylist,
            duration: None,
            thumbnail: None,
            track_number: Some(entry.track_number),
            added_at: Utc::now(),
        }
    }

    /// Completa los datos con lo que devolvió el resolver. Título y artista
    /// registrados en la playlist tienen prioridad sobre los del extractor.
    pub fn apply_metadata(&mut self, resolved: &ResolvedTrack) {
        if self.title == UNKNOWN_TITLE {
            if let Some(title) = resolved.title.as_deref().filter(|t| !t.is_empty()) {
                self.title = title.to_string();
            }
        }
        if self.artist == UNKNOWN_ARTIST {
            if let Some(artist) = resolved.artist.as_deref().filter(|a| !a.is_empty()) {
                self.artist = artist.to_string();
            }
        }
        self.duration = resolved.duration;
        self.thumbnail = resolved.thumbnail.clone();
    }

    pub fn is_user_requested(&self) -> bool {
        self.origin == Origin::UserRequested
    }

    /// `Artista - Título`, o solo el título si el artista es desconocido.
    pub fn display_name(&self) -> String {
        if self.artist == UNKNOWN_ARTIST {
            self.title.clone()
        } else {
            format!("{} - {}", self.artist, self.title)
        }
    }

    pub fn url(&self) -> Option<&str> {
        if self.source.starts_with("http://") || self.source.starts_with("https://") {
            Some(&self.source)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::StreamRef;

    fn resolved(title: Option<&str>, artist: Option<&str>) -> ResolvedTrack {
        ResolvedTrack {
            stream: StreamRef::new("https://cdn.example/audio"),
            title: title.map(str::to_string),
            artist: artist.map(str::to_string),
            duration: Some(Duration::from_secs(200)),
            thumbnail: Some("https://img.example/t.jpg".into()),
            webpage_url: None,
        }
    }

    #[test]
    fn test_metadata_fills_placeholders_only() {
        let mut request = TrackRequest::user("lofi beats", UserId::new(7));
        request.apply_metadata(&resolved(Some("Lofi Mix"), Some("Chillhop")));
        assert_eq!(request.title, "Lofi Mix");
        assert_eq!(request.artist, "Chillhop");
        assert_eq!(request.duration, Some(Duration::from_secs(200)));

        let entry = PlaylistEntry {
            source: "https://youtu.be/a".into(),
            title: "Registered".into(),
            artist: UNKNOWN_ARTIST.into(),
            track_number: 4,
            section: None,
        };
        let mut request = TrackRequest::from_playlist(&entry);
        request.apply_metadata(&resolved(Some("Uploader Title"), None));
        assert_eq!(request.title, "Registered");
        assert_eq!(request.artist, UNKNOWN_ARTIST);
        assert_eq!(request.track_number, Some(4));
        assert_eq!(request.requested_by, Requester::AutoSelected);
    }

    #[test]
    fn test_display_name() {
        let mut request = TrackRequest::user("x", UserId::new(1));
        assert_eq!(request.display_name(), UNKNOWN_TITLE);
        assert!(request.url().is_none());
        request.title = "Song".into();
        request.artist = "Band".into();
        assert_eq!(request.display_name(), "Band - Song");
    }
}
