//! # Audio Module
//!
//! Cola de reproducción y máquina de estados de sesión de Open Jukebox.
//!
//! - [`session`]: estado por guild (cola pendiente, pozo de respaldo, historial)
//! - [`fallback`]: playlist mezclada cuando nadie pidió nada
//! - [`controller`]: decide qué suena después y reacciona al fin de cada pista
//! - [`inactivity`]: desconexión con período de gracia por canal vacío o sin música
//! - [`events`]: avisos publicados hacia la capa de presentación
//!
//! El controlador solo habla con el exterior a través de los traits definidos
//! aquí, así toda la máquina de estados corre en tests sin Discord:
//!
//! ```text
//! play cmd ─► request_play ─► TrackResolver ─► VoiceTransport::play
//!                  ▲                                   │
//!                  └──── on_playback_complete ◄─ CompletionHandle
//! ```

pub mod controller;
pub mod events;
pub mod fallback;
pub mod inactivity;
pub mod session;
pub mod track;

use async_trait::async_trait;
use serenity::model::id::{ChannelId, GuildId};
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;
use tracing::debug;

use crate::error::{ResolveError, TransportError};

/// Algo que el transporte de voz puede abrir y reproducir.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamRef {
    pub url: String,
}

impl StreamRef {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

/// Resultado de una resolución exitosa.
#[derive(Debug, Clone)]
pub struct ResolvedTrack {
    pub stream: StreamRef,
    pub title: Option<String>,
    pub artist: Option<String>,
    pub duration: Option<Duration>,
    pub thumbnail: Option<String>,
    pub webpage_url: Option<String>,
}

/// Convierte una URL o una búsqueda en un stream reproducible.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TrackResolver: Send + Sync {
    async fn resolve(&self, source: &str) -> Result<ResolvedTrack, ResolveError>;
}

/// Conexión de voz del bot, una por guild.
#[async_trait]
pub trait VoiceTransport: Send + Sync {
    async fn connect(&self, guild: GuildId, channel: ChannelId) -> Result<(), TransportError>;

    /// Inicia el stream. `completion` se notifica exactamente una vez, cuando
    /// el stream termina o falla.
    async fn play(
        &self,
        guild: GuildId,
        stream: &StreamRef,
        completion: CompletionHandle,
    ) -> Result<(), TransportError>;

    /// Detiene el stream actual. Su finalización se notifica igual.
    async fn stop(&self, guild: GuildId) -> Result<(), TransportError>;

    async fn pause(&self, guild: GuildId) -> Result<(), TransportError>;

    async fn resume(&self, guild: GuildId) -> Result<(), TransportError>;

    /// Ajusta el volumen del stream actual y de los siguientes de la guild.
    /// `1.0` es el volumen original.
    async fn set_volume(&self, guild: GuildId, volume: f32) -> Result<(), TransportError>;

    async fn disconnect(&self, guild: GuildId) -> Result<(), TransportError>;

    /// `true` mientras haya un stream abierto, aunque esté en pausa.
    async fn is_playing(&self, guild: GuildId) -> bool;

    /// Miembros humanos en el canal de voz del bot, `None` sin conexión.
    async fn occupants(&self, guild: GuildId) -> Option<usize>;
}

/// Registro de estadísticas sin garantías. La implementación loguea sus fallos.
#[async_trait]
pub trait StatsSink: Send + Sync {
    async fn track_requested(&self, title: &str);
    async fn track_played(&self, title: &str);
    async fn track_skipped(&self, title: &str);
}

/// Resultado de un intento de reproducción, devuelto al controlador.
#[derive(Debug)]
pub struct Completion {
    pub guild: GuildId,
    pub attempt: u64,
    pub error: Option<TransportError>,
}

/// Acompaña a cada stream que recibe el transporte. Se dispara a lo sumo una vez.
#[derive(Debug, Clone)]
pub struct CompletionHandle {
    guild: GuildId,
    attempt: u64,
    tx: UnboundedSender<Completion>,
    fired: Arc<AtomicBool>,
}

impl CompletionHandle {
    pub fn new(guild: GuildId, attempt: u64, tx: UnboundedSender<Completion>) -> Self {
        Self {
            guild,
            attempt,
            tx,
            fired: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn attempt(&self) -> u64 {
        self.attempt
    }

    pub fn notify(&self, error: Option<TransportError>) {
        if self.fired.swap(true, Ordering::SeqCst) {
            return;
        }

        let completion = Completion {
            guild: self.guild,
            attempt: self.attempt,
            error,
        };
        if self.tx.send(completion).is_err() {
            debug!("Canal de finalización cerrado para guild {}", self.guild);
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Dobles compartidos por los tests del controlador y de inactividad.

    use super::*;
    use parking_lot::Mutex;
    use std::collections::{HashMap, HashSet};

    #[derive(Default)]
    pub struct FakeTransport {
        pub connected: Mutex<HashMap<GuildId, ChannelId>>,
        pub active: Mutex<HashMap<GuildId, CompletionHandle>>,
        pub played: Mutex<Vec<(GuildId, String)>>,
        pub occupants: Mutex<HashMap<GuildId, usize>>,
        pub paused: Mutex<HashSet<GuildId>>,
        pub volumes: Mutex<HashMap<GuildId, f32>>,
        pub disconnects: Mutex<u32>,
        pub fail_play: AtomicBool,
        /// `stop` falla sin notificar la finalización.
        pub fail_stop: AtomicBool,
    }

    impl FakeTransport {
        pub fn played_urls(&self) -> Vec<String> {
            self.played.lock().iter().map(|(_, url)| url.clone()).collect()
        }

        pub fn set_occupants(&self, guild: GuildId, count: usize) {
            self.occupants.lock().insert(guild, count);
        }

        /// Simula que el stream llegó a su fin natural.
        pub fn finish(&self, guild: GuildId) {
            if let Some(handle) = self.active.lock().remove(&guild) {
                handle.notify(None);
            }
        }

        pub fn fail(&self, guild: GuildId, error: TransportError) {
            if let Some(handle) = self.active.lock().remove(&guild) {
                handle.notify(Some(error));
            }
        }

        pub fn disconnect_count(&self) -> u32 {
            *self.disconnects.lock()
        }
    }

    #[async_trait]
    impl VoiceTransport for FakeTransport {
        async fn connect(&self, guild: GuildId, channel: ChannelId) -> Result<(), TransportError> {
            self.connected.lock().insert(guild, channel);
            Ok(())
        }

        async fn play(
            &self,
            guild: GuildId,
            stream: &StreamRef,
            completion: CompletionHandle,
        ) -> Result<(), TransportError> {
            if self.fail_play.load(Ordering::SeqCst) {
                return Err(TransportError::Stream("fake failure".into()));
            }
            self.played.lock().push((guild, stream.url.clone()));
            self.active.lock().insert(guild, completion);
            Ok(())
        }

        async fn stop(&self, guild: GuildId) -> Result<(), TransportError> {
            if self.fail_stop.load(Ordering::SeqCst) {
                return Err(TransportError::Stream("track handle gone".into()));
            }
            self.paused.lock().remove(&guild);
            self.finish(guild);
            Ok(())
        }

        async fn pause(&self, guild: GuildId) -> Result<(), TransportError> {
            if !self.active.lock().contains_key(&guild) {
                return Err(TransportError::NotConnected);
            }
            self.paused.lock().insert(guild);
            Ok(())
        }

        async fn resume(&self, guild: GuildId) -> Result<(), TransportError> {
            if !self.active.lock().contains_key(&guild) {
                return Err(TransportError::NotConnected);
            }
            self.paused.lock().remove(&guild);
            Ok(())
        }

        async fn set_volume(&self, guild: GuildId, volume: f32) -> Result<(), TransportError> {
            self.volumes.lock().insert(guild, volume);
            Ok(())
        }

        async fn disconnect(&self, guild: GuildId) -> Result<(), TransportError> {
            self.active.lock().remove(&guild);
            *self.disconnects.lock() += 1;
            match self.connected.lock().remove(&guild) {
                Some(_) => Ok(()),
                None => Err(TransportError::NotConnected),
            }
        }

        async fn is_playing(&self, guild: GuildId) -> bool {
            self.active.lock().contains_key(&guild)
        }

        async fn occupants(&self, guild: GuildId) -> Option<usize> {
            if !self.connected.lock().contains_key(&guild) {
                return None;
            }
            Some(self.occupants.lock().get(&guild).copied().unwrap_or(1))
        }
    }

    #[derive(Default)]
    pub struct RecordingStats {
        pub requested: Mutex<Vec<String>>,
        pub played: Mutex<Vec<String>>,
        pub skipped: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl StatsSink for RecordingStats {
        async fn track_requested(&self, title: &str) {
            self.requested.lock().push(title.to_string());
        }

        async fn track_played(&self, title: &str) {
            self.played.lock().push(title.to_string());
        }

        async fn track_skipped(&self, title: &str) {
            self.skipped.lock().push(title.to_string());
        }
    }

    /// Resolver que devuelve la fuente como URL del stream y título.
    pub struct EchoResolver;

    #[async_trait]
    impl TrackResolver for EchoResolver {
        async fn resolve(&self, source: &str) -> Result<ResolvedTrack, ResolveError> {
            Ok(ResolvedTrack {
                stream: StreamRef::new(source),
                title: Some(source.to_string()),
                artist: None,
                duration: Some(Duration::from_secs(180)),
                thumbnail: None,
                webpage_url: Some(source.to_string()),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    #[tokio::test]
    async fn test_completion_fires_once() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let handle = CompletionHandle::new(GuildId::new(1), 9, tx);
        let clone = handle.clone();

        handle.notify(None);
        clone.notify(Some(TransportError::Stream("late".into())));

        let first = rx.recv().await.unwrap();
        assert_eq!(first.attempt, 9);
        assert!(first.error.is_none());
        assert!(rx.try_recv().is_err());
    }
}
