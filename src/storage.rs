use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serenity::model::id::UserId;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::{fs, sync::Mutex};
use tracing::{debug, info, warn};

use crate::audio::StatsSink;

/// Contadores por canción, indexados por título.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrackStats {
    pub played_count: u64,
    pub requested_count: u64,
    pub skipped_count: u64,
    pub last_played: Option<DateTime<Utc>>,
}

impl TrackStats {
    /// `(pedidas - saltadas) / (reproducidas + 1)`
    pub fn temperature(&self) -> f64 {
        (self.requested_count as f64 - self.skipped_count as f64) / (self.played_count as f64 + 1.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VoteKind {
    Up,
    Down,
    Report,
}

impl VoteKind {
    pub fn emoji(self) -> &'static str {
        match self {
            VoteKind::Up => "👍",
            VoteKind::Down => "👎",
            VoteKind::Report => "⚠️",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VoteTally {
    pub up: u64,
    pub down: u64,
    pub reports: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct VoteRecord {
    title: String,
    user_id: u64,
    kind: VoteKind,
    at: DateTime<Utc>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct StatsFile {
    #[serde(default)]
    songs: HashMap<String, TrackStats>,
    #[serde(default)]
    votes: Vec<VoteRecord>,
}

/// Estadísticas de canciones y votos persistidas en `stats.json`.
pub struct StatsStore {
    path: PathBuf,
    data: Mutex<StatsFile>,
}

impl StatsStore {
    pub async fn open(data_dir: impl AsRef<Path>) -> Result<Self> {
        let data_dir = data_dir.as_ref();
        fs::create_dir_all(data_dir).await?;
        let path = data_dir.join("stats.json");

        let data = match fs::read_to_string(&path).await {
            Ok(content) => match serde_json::from_str::<StatsFile>(&content) {
                Ok(data) => data,
                Err(e) => {
                    warn!("⚠️ stats.json corrupto, se empieza de cero: {}", e);
                    StatsFile::default()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => StatsFile::default(),
            Err(e) => return Err(e.into()),
        };

        info!(
            "📁 Estadísticas cargadas: {} canciones, {} votos ({})",
            data.songs.len(),
            data.votes.len(),
            path.display()
        );

        Ok(Self {
            path,
            data: Mutex::new(data),
        })
    }

    pub async fn stats_for(&self, title: &str) -> Option<TrackStats> {
        self.data.lock().await.songs.get(title).cloned()
    }

    /// Canciones ordenadas por temperatura, de mayor a menor.
    pub async fn hottest(&self, limit: usize) -> Vec<(String, TrackStats)> {
        let data = self.data.lock().await;
        let mut songs: Vec<_> = data
            .songs
            .iter()
            .map(|(title, stats)| (title.clone(), stats.clone()))
            .collect();

        songs.sort_by(|a, b| {
            b.1.temperature()
                .total_cmp(&a.1.temperature())
                .then_with(|| a.0.cmp(&b.0))
        });
        songs.truncate(limit);
        songs
    }

    /// Registra un voto. Devuelve `false` si el usuario ya había votado lo mismo.
    pub async fn record_vote(&self, title: &str, user: UserId, kind: VoteKind) -> Result<bool> {
        let mut data = self.data.lock().await;
        let duplicate = data
            .votes
            .iter()
            .any(|v| v.title == title && v.user_id == user.get() && v.kind == kind);
        if duplicate {
            return Ok(false);
        }

        data.votes.push(VoteRecord {
            title: title.to_string(),
            user_id: user.get(),
            kind,
            at: Utc::now(),
        });
        if let Err(e) = self.save(&data).await {
            data.votes.pop();
            return Err(e);
        }

        debug!("{} Voto registrado para '{}' por {}", kind.emoji(), title, user);
        Ok(true)
    }

    pub async fn votes_for(&self, title: &str) -> VoteTally {
        let data = self.data.lock().await;
        data.votes
            .iter()
            .filter(|v| v.title == title)
            .fold(VoteTally::default(), |mut tally, vote| {
                match vote.kind {
                    VoteKind::Up => tally.up += 1,
                    VoteKind::Down => tally.down += 1,
                    VoteKind::Report => tally.reports += 1,
                }
                tally
            })
    }

    async fn update(&self, title: &str, apply: impl FnOnce(&mut TrackStats)) {
        let mut data = self.data.lock().await;
        apply(data.songs.entry(title.to_string()).or_default());

        if let Err(e) = self.save(&data).await {
            warn!("⚠️ No se pudieron guardar las estadísticas: {}", e);
        }
    }

    async fn save(&self, data: &StatsFile) -> Result<()> {
        let content = serde_json::to_string_pretty(data)?;
        fs::write(&self.path, content).await?;
        Ok(())
    }
}

#[async_trait]
impl StatsSink for StatsStore {
    async fn track_requested(&self, title: &str) {
        self.update(title, |stats| stats.requested_count += 1).await;
    }

    async fn track_played(&self, title: &str) {
        self.update(title, |stats| {
            stats.played_count += 1;
            stats.last_played = Some(Utc::now());
        })
        .await;
    }

    async fn track_skipped(&self, title: &str) {
        self.update(title, |stats| stats.skipped_count += 1).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_counters_persist() {
        let dir = tempfile::tempdir().unwrap();
        {
            let store = StatsStore::open(dir.path()).await.unwrap();
            store.track_requested("Song").await;
            store.track_played("Song").await;
            store.track_played("Song").await;
            store.track_skipped("Song").await;
        }

        let store = StatsStore::open(dir.path()).await.unwrap();
        let stats = store.stats_for("Song").await.unwrap();
        assert_eq!(stats.played_count, 2);
        assert_eq!(stats.requested_count, 1);
        assert_eq!(stats.skipped_count, 1);
        assert!(stats.last_played.is_some());
        assert!(store.stats_for("Other").await.is_none());
    }

    #[tokio::test]
    async fn test_votes_are_unique_per_user_and_kind() {
        let dir = tempfile::tempdir().unwrap();
        let store = StatsStore::open(dir.path()).await.unwrap();
        let user = UserId::new(9);

        assert!(store.record_vote("Song", user, VoteKind::Up).await.unwrap());
        assert!(!store.record_vote("Song", user, VoteKind::Up).await.unwrap());
        assert!(store.record_vote("Song", user, VoteKind::Report).await.unwrap());
        assert!(store
            .record_vote("Song", UserId::new(10), VoteKind::Up)
            .await
            .unwrap());

        let tally = store.votes_for("Song").await;
        assert_eq!(
            tally,
            VoteTally {
                up: 2,
                down: 0,
                reports: 1
            }
        );
    }

    #[tokio::test]
    async fn test_failed_vote_write_can_be_retried() {
        let dir = tempfile::tempdir().unwrap();
        let store = StatsStore::open(dir.path()).await.unwrap();
        let user = UserId::new(9);

        // Un directorio en lugar del archivo hace fallar la escritura.
        let blocker = dir.path().join("stats.json");
        std::fs::create_dir(&blocker).unwrap();
        assert!(store.record_vote("Song", user, VoteKind::Up).await.is_err());
        assert_eq!(store.votes_for("Song").await, VoteTally::default());

        std::fs::remove_dir(&blocker).unwrap();
        assert!(store.record_vote("Song", user, VoteKind::Up).await.unwrap());
        assert_eq!(store.votes_for("Song").await.up, 1);
    }

    #[tokio::test]
    async fn test_hottest_orders_by_temperature() {
        let dir = tempfile::tempdir().unwrap();
        let store = StatsStore::open(dir.path()).await.unwrap();

        for _ in 0..3 {
            store.track_requested("Hit").await;
        }
        store.track_played("Hit").await;
        store.track_played("Filler").await;
        store.track_requested("Skipped").await;
        store.track_skipped("Skipped").await;
        store.track_skipped("Skipped").await;

        let ranking: Vec<_> = store
            .hottest(10)
            .await
            .into_iter()
            .map(|(title, _)| title)
            .collect();
        assert_eq!(ranking, vec!["Hit", "Filler", "Skipped"]);
        assert_eq!(store.hottest(1).await.len(), 1);
    }

    #[test]
    fn test_temperature_formula() {
        let stats = TrackStats {
            played_count: 3,
            requested_count: 5,
            skipped_count: 1,
            last_played: None,
        };
        assert!((stats.temperature() - 1.0).abs() < f64::EPSILON);
    }
}
