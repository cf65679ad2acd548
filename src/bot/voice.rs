//! [`VoiceTransport`] sobre Songbird.
//!
//! Los streams se abren con `yt-dlp` a través de [`YoutubeDl`], igual que el
//! resolver, y cada pista registra manejadores de fin y de error que avisan al
//! controlador mediante su [`CompletionHandle`].

use async_trait::async_trait;
use dashmap::DashMap;
use serenity::{
    cache::Cache,
    model::id::{ChannelId, GuildId},
};
use songbird::{
    input::YoutubeDl,
    tracks::{PlayMode, TrackHandle},
    Event, EventContext, EventHandler as VoiceEventHandler, Songbird, TrackEvent,
};
use std::sync::{Arc, OnceLock};
use tracing::{debug, error, info, warn};

use crate::audio::{CompletionHandle, StreamRef, VoiceTransport};
use crate::error::TransportError;

pub struct SongbirdTransport {
    manager: Arc<Songbird>,
    http: reqwest::Client,
    cache: OnceLock<Arc<Cache>>,
    current_tracks: DashMap<GuildId, TrackHandle>,
    volumes: DashMap<GuildId, f32>,
    volume: f32,
}

impl SongbirdTransport {
    pub fn new(manager: Arc<Songbird>, http: reqwest::Client, volume: f32) -> Self {
        Self {
            manager,
            http,
            cache: OnceLock::new(),
            current_tracks: DashMap::new(),
            volumes: DashMap::new(),
            volume,
        }
    }

    /// La cache de serenity existe recién cuando se construye el cliente.
    pub fn attach_cache(&self, cache: Arc<Cache>) {
        if self.cache.set(cache).is_err() {
            warn!("⚠️ La cache de Discord ya estaba asociada al transporte");
        }
    }

    fn current_track(&self, guild: GuildId) -> Result<TrackHandle, TransportError> {
        self.current_tracks
            .get(&guild)
            .map(|t| t.clone())
            .ok_or(TransportError::NotConnected)
    }

    fn volume_for(&self, guild: GuildId) -> f32 {
        self.volumes.get(&guild).map(|v| *v).unwrap_or(self.volume)
    }

    /// Usuarios humanos en el canal de voz del bot.
    fn count_listeners(&self, guild: GuildId) -> Option<usize> {
        let cache = self.cache.get()?;
        let bot_id = cache.current_user().id;
        let guild = cache.guild(guild)?;

        let channel = guild.voice_states.get(&bot_id)?.channel_id?;
        let count = guild
            .voice_states
            .values()
            .filter(|state| state.channel_id == Some(channel))
            .filter(|state| state.user_id != bot_id)
            .filter(|state| !state.member.as_ref().is_some_and(|m| m.user.bot))
            .count();

        Some(count)
    }
}

#[async_trait]
impl VoiceTransport for SongbirdTransport {
    async fn connect(&self, guild: GuildId, channel: ChannelId) -> Result<(), TransportError> {
        if let Some(call) = self.manager.get(guild) {
            let current = call.lock().await.current_channel();
            if current == Some(channel.into()) {
                debug!("Ya conectado al canal {} en guild {}", channel, guild);
                return Ok(());
            }
        }

        self.manager
            .join(guild, channel)
            .await
            .map_err(|e| TransportError::Connect(e.to_string()))?;

        info!("🔊 Conectado al canal de voz {} en guild {}", channel, guild);
        Ok(())
    }

    async fn play(
        &self,
        guild: GuildId,
        stream: &StreamRef,
        completion: CompletionHandle,
    ) -> Result<(), TransportError> {
        let call = self.manager.get(guild).ok_or(TransportError::NotConnected)?;

        let input = YoutubeDl::new(self.http.clone(), stream.url.clone());
        let track = {
            let mut handler = call.lock().await;
            handler.play_only_input(input.into())
        };

        if let Err(e) = track.set_volume(self.volume_for(guild)) {
            warn!("⚠️ No se pudo ajustar el volumen en guild {}: {}", guild, e);
        }

        track
            .add_event(
                Event::Track(TrackEvent::End),
                TrackEndHandler {
                    guild,
                    completion: completion.clone(),
                },
            )
            .map_err(|e| TransportError::Stream(e.to_string()))?;
        track
            .add_event(
                Event::Track(TrackEvent::Error),
                TrackErrorHandler { guild, completion },
            )
            .map_err(|e| TransportError::Stream(e.to_string()))?;

        self.current_tracks.insert(guild, track);
        debug!("▶️ Stream iniciado en guild {}: {}", guild, stream.url);
        Ok(())
    }

    async fn stop(&self, guild: GuildId) -> Result<(), TransportError> {
        self.current_track(guild)?
            .stop()
            .map_err(|e| TransportError::Stream(e.to_string()))
    }

    async fn pause(&self, guild: GuildId) -> Result<(), TransportError> {
        self.current_track(guild)?
            .pause()
            .map_err(|e| TransportError::Stream(e.to_string()))
    }

    async fn resume(&self, guild: GuildId) -> Result<(), TransportError> {
        self.current_track(guild)?
            .play()
            .map_err(|e| TransportError::Stream(e.to_string()))
    }

    async fn set_volume(&self, guild: GuildId, volume: f32) -> Result<(), TransportError> {
        self.volumes.insert(guild, volume);

        // Sin pista activa el valor queda guardado para la siguiente.
        if let Ok(track) = self.current_track(guild) {
            track
                .set_volume(volume)
                .map_err(|e| TransportError::Stream(e.to_string()))?;
        }

        debug!("🔊 Volumen {:.2} en guild {}", volume, guild);
        Ok(())
    }

    async fn disconnect(&self, guild: GuildId) -> Result<(), TransportError> {
        if let Some((_, track)) = self.current_tracks.remove(&guild) {
            let _ = track.stop();
        }
        self.volumes.remove(&guild);

        match self.manager.remove(guild).await {
            Ok(()) => {
                info!("👋 Desconectado del canal de voz en guild {}", guild);
                Ok(())
            }
            Err(songbird::error::JoinError::NoCall) => Err(TransportError::NotConnected),
            Err(e) => Err(TransportError::Disconnect(e.to_string())),
        }
    }

    async fn is_playing(&self, guild: GuildId) -> bool {
        let Some(track) = self.current_tracks.get(&guild).map(|t| t.clone()) else {
            return false;
        };

        match track.get_info().await {
            Ok(info) => matches!(info.playing, PlayMode::Play | PlayMode::Pause),
            Err(_) => false,
        }
    }

    async fn occupants(&self, guild: GuildId) -> Option<usize> {
        self.manager.get(guild)?;
        self.count_listeners(guild)
    }
}

/// Fin normal de la pista (o `stop`).
struct TrackEndHandler {
    guild: GuildId,
    completion: CompletionHandle,
}

#[async_trait]
impl VoiceEventHandler for TrackEndHandler {
    async fn act(&self, _ctx: &EventContext<'_>) -> Option<Event> {
        debug!(
            "Track terminado en guild {} (intento {})",
            self.guild,
            self.completion.attempt()
        );
        self.completion.notify(None);
        None
    }
}

struct TrackErrorHandler {
    guild: GuildId,
    completion: CompletionHandle,
}

#[async_trait]
impl VoiceEventHandler for TrackErrorHandler {
    async fn act(&self, ctx: &EventContext<'_>) -> Option<Event> {
        let detail = match ctx {
            EventContext::Track(tracks) => tracks
                .first()
                .map(|(state, _)| format!("{:?}", state.playing))
                .unwrap_or_else(|| "desconocido".to_string()),
            _ => "desconocido".to_string(),
        };

        error!("❌ Error de reproducción en guild {}: {}", self.guild, detail);
        self.completion.notify(Some(TransportError::Stream(detail)));
        None
    }
}
