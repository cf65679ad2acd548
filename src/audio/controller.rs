//! Controlador de reproducción: una máquina de estados por guild.
//!
//! ```text
//! Idle ──request_play──► Starting ──resolved──► Playing
//!  ▲                      │ failure (retry ≤ N)    │ end / error / skip
//!  └──────────────────────┴──────── Ending ◄───────┘
//! ```
//!
//! Toda continuación pasa por [`PlaybackController::on_playback_complete`].
//! Los locks de sesión nunca se mantienen a través de un `.await`.

use futures::future::join_all;
use parking_lot::Mutex;
use serenity::model::id::{ChannelId, GuildId};
use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc, Weak,
};
use std::time::Duration;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::audio::{
    events::{CloseReason, PlayerEvent},
    inactivity::{ArmedTimer, DisconnectReason, InactivityMonitor},
    session::{PlaybackState, Session, SessionRegistry, SessionSnapshot},
    track::TrackRequest,
    Completion, CompletionHandle, StatsSink, TrackResolver, VoiceTransport,
};
use crate::error::{PlaybackError, ResolveError, TransportError, MAX_VOLUME_PERCENT};
use crate::playlist::PlaylistStore;

static NEXT_ATTEMPT: AtomicU64 = AtomicU64::new(1);

fn next_attempt_id() -> u64 {
    NEXT_ATTEMPT.fetch_add(1, Ordering::Relaxed)
}

#[derive(Debug, Clone)]
pub struct ControllerSettings {
    pub max_resolution_failures: u32,
    pub resolve_timeout: Duration,
    pub inactivity_grace: Duration,
    pub idle_timeout: Duration,
    /// Volumen inicial de cada sesión, en porcentaje.
    pub default_volume: u16,
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self {
            max_resolution_failures: 3,
            resolve_timeout: Duration::from_secs(30),
            inactivity_grace: Duration::from_secs(30),
            idle_timeout: Duration::from_secs(60),
            default_volume: 100,
        }
    }
}

/// Lo que terminó haciendo una llamada a [`PlaybackController::request_play`].
#[derive(Debug, Clone)]
pub enum PlayOutcome {
    Started(Box<TrackRequest>),
    /// Se agregó a la cola detrás de la reproducción en curso.
    Queued { position: usize },
    /// Ya hay otro intento en curso para esta guild.
    AlreadyActive,
    NothingToPlay,
    /// La sesión se detuvo mientras el intento estaba en curso.
    Cancelled,
}

pub struct PlaybackController {
    sessions: SessionRegistry,
    inactivity: InactivityMonitor,
    resolver: Arc<dyn TrackResolver>,
    transport: Arc<dyn VoiceTransport>,
    stats: Arc<dyn StatsSink>,
    playlist: Arc<PlaylistStore>,
    events: broadcast::Sender<PlayerEvent>,
    completions: mpsc::UnboundedSender<Completion>,
    settings: ControllerSettings,
    me: Weak<Self>,
}

impl PlaybackController {
    pub fn new(
        resolver: Arc<dyn TrackResolver>,
        transport: Arc<dyn VoiceTransport>,
        stats: Arc<dyn StatsSink>,
        playlist: Arc<PlaylistStore>,
        settings: ControllerSettings,
    ) -> (Arc<Self>, mpsc::UnboundedReceiver<Completion>) {
        let (completions, rx) = mpsc::unbounded_channel();
        let (events, _) = broadcast::channel(64);

        let controller = Arc::new_cyclic(|me| Self {
            sessions: SessionRegistry::new(),
            inactivity: InactivityMonitor::new(),
            resolver,
            transport,
            stats,
            playlist,
            events,
            completions,
            settings,
            me: me.clone(),
        });

        (controller, rx)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PlayerEvent> {
        self.events.subscribe()
    }

    pub fn playlist(&self) -> &Arc<PlaylistStore> {
        &self.playlist
    }

    pub fn snapshot(&self, guild: GuildId) -> SessionSnapshot {
        self.sessions
            .snapshot(guild)
            .unwrap_or_else(SessionSnapshot::empty)
    }

    pub fn has_session(&self, guild: GuildId) -> bool {
        self.sessions.get(guild).is_some()
    }

    /// Conecta al canal de voz y crea la sesión si no existía.
    pub async fn join(&self, guild: GuildId, channel: ChannelId) -> Result<(), PlaybackError> {
        self.transport.connect(guild, channel).await?;
        self.sessions.get_or_create(guild);
        info!("🔊 Conectado al canal {} en guild {}", channel, guild);
        Ok(())
    }

    /// Encola `request` (si hay) e inicia la reproducción si la sesión está
    /// inactiva.
    pub async fn request_play(
        &self,
        guild: GuildId,
        request: Option<TrackRequest>,
    ) -> Result<PlayOutcome, PlaybackError> {
        let queued = request.map(|request| {
            info!("➕ Agregado a la cola en guild {}: {}", guild, request.source);
            self.sessions.enqueue(guild, request)
        });
        let session = self.sessions.get_or_create(guild);

        if session.lock().state != PlaybackState::Idle {
            return Ok(match queued {
                Some(position) => PlayOutcome::Queued { position },
                None => PlayOutcome::AlreadyActive,
            });
        }

        self.play_next(guild, session).await
    }

    async fn play_next(
        &self,
        guild: GuildId,
        session: Arc<Mutex<Session>>,
    ) -> Result<PlayOutcome, PlaybackError> {
        let mut failures = 0u32;

        loop {
            let picked = {
                let mut s = session.lock();
                if s.closed {
                    return Ok(PlayOutcome::Cancelled);
                }
                if s.state != PlaybackState::Idle {
                    return Ok(PlayOutcome::AlreadyActive);
                }
                match Self::pick_next(&mut s, &self.playlist) {
                    Some(track) => {
                        s.state = PlaybackState::Starting;
                        s.attempt = next_attempt_id();
                        s.cancel.cancel();
                        s.cancel = CancellationToken::new();
                        Some((track, s.attempt, s.cancel.clone()))
                    }
                    None => None,
                }
            };

            let Some((mut track, attempt, token)) = picked else {
                info!("📭 Nada más para reproducir en guild {}", guild);
                self.emit(PlayerEvent::QueueExhausted { guild });
                self.arm(guild, DisconnectReason::Idle, self.settings.idle_timeout);
                return Ok(PlayOutcome::NothingToPlay);
            };

            debug!("🔍 Resolviendo '{}' en guild {} (intento {})", track.source, guild, attempt);
            let timeout = self.settings.resolve_timeout;
            let result = tokio::select! {
                _ = token.cancelled() => None,
                result = tokio::time::timeout(timeout, self.resolver.resolve(&track.source)) => {
                    Some(result.unwrap_or(Err(ResolveError::Timeout(timeout))))
                }
            };

            let Some(result) = result else {
                debug!("Resolución cancelada en guild {}", guild);
                return Ok(PlayOutcome::Cancelled);
            };

            let resolved = match result {
                Ok(resolved) => resolved,
                Err(error) => {
                    {
                        let mut s = session.lock();
                        if s.attempt != attempt || s.state != PlaybackState::Starting {
                            return Ok(PlayOutcome::Cancelled);
                        }
                        s.state = PlaybackState::Idle;
                    }

                    failures += 1;
                    warn!(
                        "⚠️ No se pudo resolver '{}' en guild {} ({}/{}): {}",
                        track.source, guild, failures, self.settings.max_resolution_failures, error
                    );
                    self.emit(PlayerEvent::ResolutionFailed {
                        guild,
                        source: track.source.clone(),
                        error: error.clone(),
                    });

                    if failures >= self.settings.max_resolution_failures {
                        error!("❌ Demasiados fallos de resolución en guild {}", guild);
                        self.arm(guild, DisconnectReason::Idle, self.settings.idle_timeout);
                        return Err(PlaybackError::ResolutionExhausted {
                            attempts: failures,
                            last: error,
                        });
                    }
                    continue;
                }
            };

            track.apply_metadata(&resolved);

            {
                let mut s = session.lock();
                if s.closed || s.attempt != attempt || s.state != PlaybackState::Starting {
                    return Ok(PlayOutcome::Cancelled);
                }
                s.current = Some(track.clone());
                s.mark_started();
                s.skip_requested = false;
                s.state = PlaybackState::Playing;
            }

            let completion = CompletionHandle::new(guild, attempt, self.completions.clone());
            if let Err(e) = self.transport.play(guild, &resolved.stream, completion).await {
                error!("❌ Error del transporte de voz en guild {}: {}", guild, e);
                self.teardown(guild).await;
                return Err(e.into());
            }

            // El evento sale antes que las estadísticas: un registro lento no
            // puede retrasar el anuncio.
            self.inactivity.cancel_reason(guild, DisconnectReason::Idle);
            info!("🎵 Reproduciendo en guild {}: {}", guild, track.display_name());
            self.emit(PlayerEvent::TrackStarted {
                guild,
                track: track.clone(),
                cancel: token,
            });

            if track.is_user_requested() {
                self.stats.track_requested(&track.title).await;
            }
            self.stats.track_played(&track.title).await;

            return Ok(PlayOutcome::Started(Box::new(track)));
        }
    }

    /// Cola pendiente primero, playlist mezclada después.
    fn pick_next(session: &mut Session, playlist: &PlaylistStore) -> Option<TrackRequest> {
        if let Some(track) = session.pending.pop_front() {
            return Some(track);
        }

        let entries = playlist.snapshot();
        let mut rng = rand::thread_rng();
        session
            .fallback
            .next_entry(&entries, &mut rng)
            .map(|entry| TrackRequest::from_playlist(&entry))
    }

    /// Continuación tras terminar (o fallar) la canción actual.
    pub async fn on_playback_complete(
        &self,
        guild: GuildId,
        error: Option<TransportError>,
    ) -> Result<PlayOutcome, PlaybackError> {
        let Some(session) = self.sessions.get(guild) else {
            return Ok(PlayOutcome::Cancelled);
        };

        if let Some(error) = error {
            error!("❌ Error de reproducción en guild {}: {}", guild, error);
            self.teardown(guild).await;
            return Err(error.into());
        }

        let (finished, skipped) = {
            let mut s = session.lock();
            if s.state != PlaybackState::Playing {
                debug!("Finalización sin reproducción activa en guild {}", guild);
                return Ok(PlayOutcome::Cancelled);
            }
            s.state = PlaybackState::Ending;
            s.cancel.cancel();
            let skipped = std::mem::take(&mut s.skip_requested);
            (s.retire_current(), skipped)
        };

        if let Some(track) = finished {
            if skipped {
                self.stats.track_skipped(&track.title).await;
            }
            debug!("⏹️ Terminó en guild {}: {}", guild, track.display_name());
            self.emit(PlayerEvent::TrackFinished {
                guild,
                track,
                skipped,
            });
        }

        {
            let mut s = session.lock();
            if s.state == PlaybackState::Ending {
                s.state = PlaybackState::Idle;
            }
        }

        self.play_next(guild, session).await
    }

    /// Entrega una finalización del transporte. Devuelve `None` si pertenece a
    /// un intento anterior.
    pub async fn handle_completion(
        &self,
        completion: Completion,
    ) -> Option<Result<PlayOutcome, PlaybackError>> {
        let current = self
            .sessions
            .get(completion.guild)
            .map(|session| session.lock().attempt);

        if current != Some(completion.attempt) {
            debug!(
                "Finalización obsoleta ignorada en guild {} (intento {})",
                completion.guild, completion.attempt
            );
            return None;
        }

        Some(
            self.on_playback_complete(completion.guild, completion.error)
                .await,
        )
    }

    pub fn spawn_completion_pump(
        self: &Arc<Self>,
        mut rx: mpsc::UnboundedReceiver<Completion>,
    ) -> JoinHandle<()> {
        let controller = Arc::clone(self);
        tokio::spawn(async move {
            while let Some(completion) = rx.recv().await {
                let controller = Arc::clone(&controller);
                tokio::spawn(async move {
                    let guild = completion.guild;
                    match controller.handle_completion(completion).await {
                        Some(Err(e)) => warn!("⚠️ Reproducción detenida en guild {}: {}", guild, e),
                        Some(Ok(outcome)) => debug!("Continuación en guild {}: {:?}", guild, outcome),
                        None => {}
                    }
                });
            }
            debug!("Canal de finalizaciones cerrado");
        })
    }

    /// Salta la canción actual. Solo válido mientras se reproduce algo.
    pub async fn skip(&self, guild: GuildId) -> Result<TrackRequest, PlaybackError> {
        let session = self
            .sessions
            .get(guild)
            .ok_or(PlaybackError::NothingPlaying)?;

        let track = {
            let mut s = session.lock();
            if s.state != PlaybackState::Playing {
                return Err(PlaybackError::NothingPlaying);
            }
            let Some(track) = s.current.clone() else {
                return Err(PlaybackError::NothingPlaying);
            };
            s.skip_requested = true;
            track
        };

        self.interrupt(guild).await?;
        info!("⏭️ Saltada en guild {}: {}", guild, track.display_name());
        Ok(track)
    }

    /// Corta el stream actual; la continuación llega por la finalización.
    async fn interrupt(&self, guild: GuildId) -> Result<(), PlaybackError> {
        let Err(e) = self.transport.stop(guild).await else {
            return Ok(());
        };

        // Si la pista terminó sola entre tanto, su finalización ya avanza la sesión.
        if !self.transport.is_playing(guild).await {
            debug!("Stream ya terminado en guild {} al cortarlo: {}", guild, e);
            return Ok(());
        }

        error!("❌ No se pudo detener el stream en guild {}: {}", guild, e);
        self.teardown(guild).await;
        Err(e.into())
    }

    /// Devuelve la sesión si está reproduciendo, junto con el intento actual.
    fn playing_session(
        &self,
        guild: GuildId,
    ) -> Result<(Arc<Mutex<Session>>, u64), PlaybackError> {
        let session = self
            .sessions
            .get(guild)
            .ok_or(PlaybackError::NothingPlaying)?;
        let attempt = {
            let s = session.lock();
            if s.state != PlaybackState::Playing || s.current.is_none() {
                return Err(PlaybackError::NothingPlaying);
            }
            s.attempt
        };
        Ok((session, attempt))
    }

    pub async fn pause(&self, guild: GuildId) -> Result<TrackRequest, PlaybackError> {
        let (session, attempt) = self.playing_session(guild)?;
        if session.lock().is_paused() {
            return Err(PlaybackError::AlreadyPaused);
        }

        if let Err(e) = self.transport.pause(guild).await {
            error!("❌ No se pudo pausar en guild {}: {}", guild, e);
            self.teardown(guild).await;
            return Err(e.into());
        }

        let mut s = session.lock();
        if s.attempt != attempt {
            return Err(PlaybackError::NothingPlaying);
        }
        s.mark_paused();
        let track = s.current.clone().ok_or(PlaybackError::NothingPlaying)?;
        info!("⏸️ Pausada en guild {}: {}", guild, track.display_name());
        Ok(track)
    }

    pub async fn resume(&self, guild: GuildId) -> Result<TrackRequest, PlaybackError> {
        let (session, attempt) = self.playing_session(guild)?;
        if !session.lock().is_paused() {
            return Err(PlaybackError::NotPaused);
        }

        if let Err(e) = self.transport.resume(guild).await {
            error!("❌ No se pudo reanudar en guild {}: {}", guild, e);
            self.teardown(guild).await;
            return Err(e.into());
        }

        let mut s = session.lock();
        if s.attempt != attempt {
            return Err(PlaybackError::NothingPlaying);
        }
        s.mark_resumed();
        let track = s.current.clone().ok_or(PlaybackError::NothingPlaying)?;
        info!("▶️ Reanudada en guild {}: {}", guild, track.display_name());
        Ok(track)
    }

    /// Volumen actual en porcentaje.
    pub fn volume(&self, guild: GuildId) -> u16 {
        self.sessions
            .get(guild)
            .and_then(|session| session.lock().volume)
            .unwrap_or(self.settings.default_volume)
    }

    /// Fija el volumen de la sesión. Sobrevive a los cambios de canción.
    pub async fn set_volume(&self, guild: GuildId, percent: u16) -> Result<u16, PlaybackError> {
        if percent > MAX_VOLUME_PERCENT {
            return Err(PlaybackError::InvalidVolume(percent));
        }
        let session = self.sessions.get(guild).ok_or(PlaybackError::NothingPlaying)?;

        self.transport
            .set_volume(guild, f32::from(percent) / 100.0)
            .await?;
        session.lock().volume = Some(percent);

        info!("🔊 Volumen {}% en guild {}", percent, guild);
        Ok(percent)
    }

    /// Vuelve a poner la canción actual desde el principio.
    pub async fn replay(&self, guild: GuildId) -> Result<TrackRequest, PlaybackError> {
        let (session, _) = self.playing_session(guild)?;
        let track = {
            let mut s = session.lock();
            let track = s.current.clone().ok_or(PlaybackError::NothingPlaying)?;
            s.pending.push_front(track.clone());
            track
        };

        self.interrupt(guild).await?;
        info!("🔄 Repitiendo en guild {}: {}", guild, track.display_name());
        Ok(track)
    }

    /// Corta la canción actual y vuelve a la que sonó antes.
    pub async fn previous(&self, guild: GuildId) -> Result<TrackRequest, PlaybackError> {
        let (session, _) = self.playing_session(guild)?;
        let track = {
            let mut s = session.lock();
            let track = s
                .last_played
                .front()
                .cloned()
                .ok_or(PlaybackError::NoPreviousTrack)?;
            s.pending.push_front(track.clone());
            track
        };

        self.interrupt(guild).await?;
        info!("⏮️ Volviendo en guild {} a: {}", guild, track.display_name());
        Ok(track)
    }

    /// Detiene todo y desconecta. Se puede llamar en cualquier estado.
    pub async fn stop(&self, guild: GuildId) -> Result<(), PlaybackError> {
        self.close(guild, CloseReason::Requested).await
    }

    async fn close(&self, guild: GuildId, reason: CloseReason) -> Result<(), PlaybackError> {
        self.inactivity.cancel(guild);

        let existed = match self.sessions.remove(guild) {
            Some(session) => {
                let mut s = session.lock();
                s.closed = true;
                s.clear();
                true
            }
            None => false,
        };

        match self.transport.disconnect(guild).await {
            Ok(()) | Err(TransportError::NotConnected) => {}
            Err(e) => {
                warn!("⚠️ Error al desconectar en guild {}: {}", guild, e);
                return Err(e.into());
            }
        }

        if existed {
            info!("👋 Sesión cerrada en guild {} ({:?})", guild, reason);
            self.emit(PlayerEvent::SessionClosed { guild, reason });
        }

        Ok(())
    }

    async fn teardown(&self, guild: GuildId) {
        if let Err(e) = self.close(guild, CloseReason::TransportFailure).await {
            warn!("⚠️ Limpieza incompleta en guild {}: {}", guild, e);
        }
    }

    /// Ocupantes del canal (sin contar al bot) cambiaron.
    pub fn occupancy_changed(&self, guild: GuildId, occupants: usize) {
        if self.sessions.get(guild).is_none() {
            return;
        }

        if occupants == 0 {
            if self.inactivity.pending_reason(guild) == Some(DisconnectReason::EmptyChannel) {
                return;
            }
            info!(
                "👻 Canal vacío en guild {}, desconexión en {:?}",
                guild, self.settings.inactivity_grace
            );
            self.arm(guild, DisconnectReason::EmptyChannel, self.settings.inactivity_grace);
        } else if self
            .inactivity
            .cancel_reason(guild, DisconnectReason::EmptyChannel)
        {
            info!("👥 Volvieron usuarios al canal en guild {}", guild);
            self.rearm_idle_if_needed(guild);
        }
    }

    /// El temporizador de canal vacío reemplaza al de sesión ociosa; al
    /// descartarlo hay que volver a armar este último.
    fn rearm_idle_if_needed(&self, guild: GuildId) {
        let idle = self.sessions.get(guild).is_some_and(|session| {
            let s = session.lock();
            s.state == PlaybackState::Idle && s.pending.is_empty()
        });
        if idle {
            self.arm(guild, DisconnectReason::Idle, self.settings.idle_timeout);
        }
    }

    pub async fn refresh_occupancy(&self, guild: GuildId) {
        let occupants = self.transport.occupants(guild).await.unwrap_or(0);
        self.occupancy_changed(guild, occupants);
    }

    pub fn spawn_occupancy_sweep(self: &Arc<Self>, every: Duration) -> JoinHandle<()> {
        let weak = Arc::downgrade(self);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(every);
            interval.tick().await;
            loop {
                interval.tick().await;
                let Some(controller) = weak.upgrade() else {
                    break;
                };
                let guilds = controller.sessions.guilds();
                join_all(guilds.into_iter().map(|guild| controller.refresh_occupancy(guild))).await;
            }
        })
    }

    fn arm(&self, guild: GuildId, reason: DisconnectReason, delay: Duration) {
        if let Some(armed) = self.inactivity.schedule(guild, reason) {
            self.spawn_timer(guild, armed, delay);
        }
    }

    fn spawn_timer(&self, guild: GuildId, armed: ArmedTimer, delay: Duration) {
        let weak = self.me.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = armed.cancel.cancelled() => return,
                _ = tokio::time::sleep(delay) => {}
            }

            let Some(controller) = weak.upgrade() else {
                return;
            };
            if !controller.inactivity.complete(guild, armed.id) {
                return;
            }
            controller.on_timer_elapsed(guild, armed.reason).await;
        });
    }

    async fn on_timer_elapsed(&self, guild: GuildId, reason: DisconnectReason) {
        let still_inactive = match reason {
            DisconnectReason::EmptyChannel => {
                matches!(self.transport.occupants(guild).await, None | Some(0))
            }
            DisconnectReason::Idle => match self.sessions.get(guild) {
                Some(session) => {
                    let s = session.lock();
                    let idle = s.state == PlaybackState::Idle && s.pending.is_empty();
                    idle
                }
                None => false,
            },
        };

        if !still_inactive {
            debug!("Temporizador {:?} vencido sin efecto en guild {}", reason, guild);
            if reason == DisconnectReason::EmptyChannel {
                self.rearm_idle_if_needed(guild);
            }
            return;
        }

        info!("⏰ Desconectando por inactividad en guild {} ({:?})", guild, reason);
        if let Err(e) = self.close(guild, CloseReason::Inactivity(reason)).await {
            warn!("⚠️ Error al desconectar por inactividad en guild {}: {}", guild, e);
        }
    }

    fn emit(&self, event: PlayerEvent) {
        let _ = self.events.send(event);
    }
}
