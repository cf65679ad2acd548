use serenity::model::id::GuildId;
use tokio_util::sync::CancellationToken;

use crate::audio::{inactivity::DisconnectReason, track::TrackRequest};
use crate::error::ResolveError;

/// Avisos que publica el controlador de reproducción.
#[derive(Debug, Clone)]
pub enum PlayerEvent {
    TrackStarted {
        guild: GuildId,
        track: TrackRequest,
        /// Se cancela cuando termina este intento.
        cancel: CancellationToken,
    },
    TrackFinished {
        guild: GuildId,
        track: TrackRequest,
        skipped: bool,
    },
    ResolutionFailed {
        guild: GuildId,
        source: String,
        error: ResolveError,
    },
    /// Nada en la cola ni en la playlist.
    QueueExhausted { guild: GuildId },
    SessionClosed {
        guild: GuildId,
        reason: CloseReason,
    },
}

impl PlayerEvent {
    pub fn guild(&self) -> GuildId {
        match self {
            PlayerEvent::TrackStarted { guild, .. }
            | PlayerEvent::TrackFinished { guild, .. }
            | PlayerEvent::ResolutionFailed { guild, .. }
            | PlayerEvent::QueueExhausted { guild }
            | PlayerEvent::SessionClosed { guild, .. } => *guild,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    /// Comando `stop`.
    Requested,
    Inactivity(DisconnectReason),
    TransportFailure,
}
