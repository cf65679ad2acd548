use dashmap::DashMap;
use parking_lot::Mutex;
use serenity::model::id::GuildId;
use std::{
    collections::VecDeque,
    sync::Arc,
    time::{Duration, Instant},
};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::audio::{fallback::FallbackPool, track::TrackRequest};

/// Capacidad del historial corto mostrado en "now playing".
pub const LAST_PLAYED_LEN: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    Idle,
    /// Resolviendo la siguiente canción.
    Starting,
    /// Hay una canción en curso, posiblemente en pausa.
    Playing,
    /// Terminó el stream anterior y se está registrando su final.
    Ending,
}

/// Estado de reproducción de una guild.
///
/// `current` es `Some` exactamente cuando `state` es [`PlaybackState::Playing`].
#[derive(Debug)]
pub struct Session {
    pub pending: VecDeque<TrackRequest>,
    pub fallback: FallbackPool,
    pub current: Option<TrackRequest>,
    pub started_at: Option<Instant>,
    pub paused_at: Option<Instant>,
    /// Tiempo en pausa acumulado de la canción actual.
    pub paused_total: Duration,
    pub state: PlaybackState,
    pub last_played: VecDeque<TrackRequest>,
    pub history: Vec<TrackRequest>,
    pub attempt: u64,
    pub cancel: CancellationToken,
    pub skip_requested: bool,
    /// Volumen elegido con `/volume`, en porcentaje.
    pub volume: Option<u16>,
    /// Se marca al quitar la sesión del registro con `stop`.
    pub closed: bool,
}

impl Session {
    pub fn new() -> Self {
        Self {
            pending: VecDeque::new(),
            fallback: FallbackPool::new(),
            current: None,
            started_at: None,
            paused_at: None,
            paused_total: Duration::ZERO,
            state: PlaybackState::Idle,
            last_played: VecDeque::with_capacity(LAST_PLAYED_LEN),
            history: Vec::new(),
            attempt: 0,
            cancel: CancellationToken::new(),
            skip_requested: false,
            volume: None,
            closed: false,
        }
    }

    pub fn is_paused(&self) -> bool {
        self.paused_at.is_some()
    }

    /// Marca el inicio de la canción actual.
    pub fn mark_started(&mut self) {
        self.started_at = Some(Instant::now());
        self.paused_at = None;
        self.paused_total = Duration::ZERO;
    }

    pub fn mark_paused(&mut self) {
        if self.paused_at.is_none() {
            self.paused_at = Some(Instant::now());
        }
    }

    pub fn mark_resumed(&mut self) {
        if let Some(paused_at) = self.paused_at.take() {
            self.paused_total += paused_at.elapsed();
        }
    }

    /// Tiempo reproducido de la canción actual, sin contar las pausas.
    pub fn elapsed(&self) -> Option<Duration> {
        let started = self.started_at?;
        let paused = self.paused_total + self.paused_at.map(|p| p.elapsed()).unwrap_or_default();
        Some(started.elapsed().saturating_sub(paused))
    }

    /// Mueve la canción actual al historial.
    pub fn retire_current(&mut self) -> Option<TrackRequest> {
        let track = self.current.take()?;
        self.started_at = None;
        self.paused_at = None;
        self.paused_total = Duration::ZERO;

        if self.last_played.len() == LAST_PLAYED_LEN {
            self.last_played.pop_back();
        }
        self.last_played.push_front(track.clone());
        self.history.push(track.clone());

        Some(track)
    }

    /// Vacía colas y cancela cualquier trabajo en curso de la sesión.
    pub fn clear(&mut self) {
        self.cancel.cancel();
        self.cancel = CancellationToken::new();
        self.pending.clear();
        self.fallback.clear();
        self.current = None;
        self.started_at = None;
        self.paused_at = None;
        self.paused_total = Duration::ZERO;
        self.skip_requested = false;
        self.state = PlaybackState::Idle;
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            state: self.state,
            current: self.current.clone(),
            elapsed: self.elapsed(),
            paused: self.is_paused(),
            pending: self.pending.iter().cloned().collect(),
            last_played: self.last_played.iter().cloned().collect(),
            history_len: self.history.len(),
            fallback_remaining: self.fallback.remaining(),
            fallback_cycle: self.fallback.cycle(),
        }
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

/// Copia de solo lectura para la capa de presentación.
#[derive(Debug, Clone)]
pub struct SessionSnapshot {
    pub state: PlaybackState,
    pub current: Option<TrackRequest>,
    pub elapsed: Option<Duration>,
    pub paused: bool,
    pub pending: Vec<TrackRequest>,
    pub last_played: Vec<TrackRequest>,
    pub history_len: usize,
    pub fallback_remaining: usize,
    pub fallback_cycle: u64,
}

impl SessionSnapshot {
    pub fn empty() -> Self {
        Session::new().snapshot()
    }

    /// Página de la cola pendiente (base 1).
    pub fn page(&self, page: usize, per_page: usize) -> QueuePage {
        let per_page = per_page.max(1);
        let total_items = self.pending.len();
        let total_pages = total_items.div_ceil(per_page).max(1);
        let current_page = page.clamp(1, total_pages);
        let start = (current_page - 1) * per_page;
        let end = (start + per_page).min(total_items);

        QueuePage {
            items: self.pending[start..end].to_vec(),
            offset: start,
            current_page,
            total_pages,
            total_items,
        }
    }
}

#[derive(Debug, Clone)]
pub struct QueuePage {
    pub items: Vec<TrackRequest>,
    /// Índice del primer elemento de la página dentro de la cola.
    pub offset: usize,
    pub current_page: usize,
    pub total_pages: usize,
    pub total_items: usize,
}

/// Registro de sesiones por guild.
#[derive(Default)]
pub struct SessionRegistry {
    sessions: DashMap<GuildId, Arc<Mutex<Session>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_create(&self, guild: GuildId) -> Arc<Mutex<Session>> {
        self.sessions
            .entry(guild)
            .or_insert_with(|| {
                debug!("Nueva sesión para guild {}", guild);
                Arc::new(Mutex::new(Session::new()))
            })
            .clone()
    }

    pub fn get(&self, guild: GuildId) -> Option<Arc<Mutex<Session>>> {
        self.sessions.get(&guild).map(|s| s.clone())
    }

    /// Agrega a la cola pendiente y devuelve la posición (base 1).
    pub fn enqueue(&self, guild: GuildId, request: TrackRequest) -> usize {
        let session = self.get_or_create(guild);
        let mut session = session.lock();
        session.pending.push_back(request);
        session.pending.len()
    }

    pub fn remove(&self, guild: GuildId) -> Option<Arc<Mutex<Session>>> {
        self.sessions.remove(&guild).map(|(_, session)| session)
    }

    pub fn guilds(&self) -> Vec<GuildId> {
        self.sessions.iter().map(|entry| *entry.key()).collect()
    }

    pub fn snapshot(&self, guild: GuildId) -> Option<SessionSnapshot> {
        self.get(guild).map(|session| session.lock().snapshot())
    }
}
