//! Publica en el canal de texto de cada guild lo que va pasando en la
//! reproducción: "Reproduciendo Ahora" con su barra de progreso, avisos de
//! errores y, en modo radio, presentaciones y boletines de noticias.

use chrono::{Local, Timelike};
use dashmap::DashMap;
use serenity::{
    builder::{CreateMessage, EditMessage},
    http::Http,
    model::id::{ChannelId, GuildId, MessageId},
};
use std::sync::{Arc, OnceLock};
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::{
    audio::{
        controller::PlaybackController,
        events::{CloseReason, PlayerEvent},
        inactivity::DisconnectReason,
        track::TrackRequest,
    },
    radio::{news::NewsClient, RadioCue, RadioHost},
    storage::StatsStore,
    ui::{buttons, embeds},
};

pub struct Announcer {
    http: OnceLock<Arc<Http>>,
    channels: DashMap<GuildId, ChannelId>,
    controller: Arc<PlaybackController>,
    stats: Arc<StatsStore>,
    radio: Arc<RadioHost>,
    news: NewsClient,
    progress_interval: Duration,
}

impl Announcer {
    pub fn new(
        controller: Arc<PlaybackController>,
        stats: Arc<StatsStore>,
        radio: Arc<RadioHost>,
        news: NewsClient,
        progress_interval: Duration,
    ) -> Self {
        Self {
            http: OnceLock::new(),
            channels: DashMap::new(),
            controller,
            stats,
            radio,
            news,
            progress_interval,
        }
    }

    pub fn attach_http(&self, http: Arc<Http>) {
        if self.http.set(http).is_err() {
            warn!("⚠️ El cliente HTTP del anunciador ya estaba asociado");
        }
    }

    /// Canal de texto donde se anuncia la reproducción de `guild`.
    pub fn bind_channel(&self, guild: GuildId, channel: ChannelId) {
        self.channels.insert(guild, channel);
    }

    pub fn spawn(self: &Arc<Self>) -> JoinHandle<()> {
        let announcer = Arc::clone(self);
        let mut events = self.controller.subscribe();

        tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(event) => announcer.handle_event(event).await,
                    Err(RecvError::Lagged(missed)) => {
                        warn!("⚠️ El anunciador perdió {} eventos", missed);
                    }
                    Err(RecvError::Closed) => break,
                }
            }
            debug!("Anunciador detenido");
        })
    }

    async fn handle_event(self: &Arc<Self>, event: PlayerEvent) {
        match event {
            PlayerEvent::TrackStarted {
                guild,
                track,
                cancel,
            } => self.announce_track(guild, track, cancel).await,
            PlayerEvent::TrackFinished {
                guild,
                track,
                skipped,
            } => {
                debug!(
                    "Terminó en guild {}: {} (saltada: {})",
                    guild, track.title, skipped
                );
            }
            PlayerEvent::ResolutionFailed {
                guild,
                source,
                error,
            } => {
                let text = format!(
                    "⚠️ No se pudo reproducir `{}`. {}",
                    source,
                    embeds::resolve_hint(&error)
                );
                self.post(guild, CreateMessage::new().content(text)).await;
            }
            PlayerEvent::QueueExhausted { guild } => {
                let embed = embeds::info_embed(
                    "Sin canciones",
                    "La cola y la playlist están vacías. Usa `/play` o `/add_to_playlist`.",
                );
                self.post(guild, CreateMessage::new().embed(embed)).await;
            }
            PlayerEvent::SessionClosed { guild, reason } => {
                self.radio.deactivate(guild);
                self.post(guild, CreateMessage::new().content(closed_message(reason)))
                    .await;
                self.channels.remove(&guild);
            }
        }
    }

    async fn announce_track(
        self: &Arc<Self>,
        guild: GuildId,
        track: TrackRequest,
        cancel: CancellationToken,
    ) {
        let cue = {
            let mut rng = rand::thread_rng();
            self.radio
                .on_track_started(guild, &track, Local::now().hour(), &mut rng)
        };
        if let Some(cue) = cue {
            self.announce_radio(guild, &track, cue).await;
        }

        let votes = self.stats.votes_for(&track.title).await;
        let snapshot = self.controller.snapshot(guild);
        let message = CreateMessage::new()
            .embed(embeds::now_playing_embed(&track, &snapshot, votes))
            .components(buttons::now_playing_buttons());

        if let Some((channel, message_id)) = self.post(guild, message).await {
            self.spawn_progress(guild, channel, message_id, cancel);
        }
    }

    async fn announce_radio(&self, guild: GuildId, track: &TrackRequest, cue: RadioCue) {
        if let Some(category) = cue.news_category {
            info!("📰 Boletín de {} en guild {}", category, guild);
            let items = self.news.headlines(&category).await;
            self.post(
                guild,
                CreateMessage::new().embed(embeds::news_embed(&category, &items)),
            )
            .await;
        }

        if let Some(intro) = cue.intro {
            self.post(
                guild,
                CreateMessage::new().embed(embeds::radio_intro_embed(track, &intro)),
            )
            .await;
        }
    }

    /// Edita el mensaje de "Reproduciendo Ahora" hasta que termine el intento.
    fn spawn_progress(
        self: &Arc<Self>,
        guild: GuildId,
        channel: ChannelId,
        message_id: MessageId,
        cancel: CancellationToken,
    ) {
        let announcer = Arc::clone(self);
        let every = self.progress_interval;

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = tokio::time::sleep(every) => {}
                }

                let Some(http) = announcer.http.get() else {
                    break;
                };
                let snapshot = announcer.controller.snapshot(guild);
                let Some(current) = snapshot.current.as_ref() else {
                    break;
                };
                let votes = announcer.stats.votes_for(&current.title).await;
                let embed = embeds::now_playing_embed(current, &snapshot, votes);

                if let Err(e) = channel
                    .edit_message(http.as_ref(), message_id, EditMessage::new().embed(embed))
                    .await
                {
                    debug!("Progreso detenido en guild {}: {}", guild, e);
                    break;
                }
            }
        });
    }

    async fn post(&self, guild: GuildId, message: CreateMessage) -> Option<(ChannelId, MessageId)> {
        let http = self.http.get()?;
        let channel = *self.channels.get(&guild)?;

        match channel.send_message(http.as_ref(), message).await {
            Ok(sent) => Some((channel, sent.id)),
            Err(e) => {
                warn!("⚠️ No se pudo enviar mensaje en guild {}: {}", guild, e);
                None
            }
        }
    }
}

pub fn closed_message(reason: CloseReason) -> &'static str {
    match reason {
        CloseReason::Requested => "⏹️ Reproducción detenida. ¡Hasta la próxima!",
        CloseReason::Inactivity(DisconnectReason::EmptyChannel) => {
            "👋 Me desconecté porque el canal de voz quedó vacío."
        }
        CloseReason::Inactivity(DisconnectReason::Idle) => {
            "💤 Me desconecté por inactividad."
        }
        CloseReason::TransportFailure => {
            "🔌 Se perdió la conexión de voz. Usa `/play` para volver a empezar."
        }
    }
}
