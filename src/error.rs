//! Errores de reproducción.
//!
//! Todo fallo de un colaborador externo se convierte en uno de estos tipos en
//! el borde del [`PlaybackController`](crate::audio::controller::PlaybackController):
//!
//! - [`ResolveError`]: la fuente no se pudo convertir en stream. Recuperable,
//!   el controlador pasa al siguiente elemento.
//! - [`TransportError`]: falló la conexión de voz. Fatal para la sesión, que se
//!   limpia y desconecta.
//! - [`PlaylistError`]: no se pudo leer o escribir el archivo de playlist.
//! - Variantes de entrada de usuario de [`PlaybackError`]: se informan a quien
//!   pidió, sin cambiar el estado.

use std::time::Duration;
use thiserror::Error;

/// El resolver no pudo producir un stream reproducible.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ResolveError {
    #[error("no se encontró el recurso: {0}")]
    NotFound(String),

    #[error("formato o URL no soportados: {0}")]
    Unsupported(String),

    #[error("error de red: {0}")]
    Network(String),

    #[error("la resolución superó el tiempo límite de {0:?}")]
    Timeout(Duration),

    /// Falló el propio extractor (no instalado, salida inválida...).
    #[error("fallo del extractor: {0}")]
    Backend(String),
}

/// Falló el transporte de voz. Siempre fatal para la sesión.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    #[error("no hay conexión de voz activa")]
    NotConnected,

    #[error("no se pudo conectar al canal de voz: {0}")]
    Connect(String),

    #[error("error durante la reproducción: {0}")]
    Stream(String),

    #[error("no se pudo desconectar del canal de voz: {0}")]
    Disconnect(String),
}

#[derive(Debug, Error)]
pub enum PlaylistError {
    #[error("no se pudo acceder al archivo de playlist: {0}")]
    Io(#[from] std::io::Error),

    #[error("entrada de playlist inválida: {0}")]
    InvalidEntry(String),

    #[error("la playlist no tiene archivo asociado")]
    NoBackingFile,
}

/// Errores que devuelve el controlador de reproducción.
#[derive(Debug, Error)]
pub enum PlaybackError {
    #[error("{attempts} intentos consecutivos de resolución fallaron (último: {last})")]
    ResolutionExhausted { attempts: u32, last: ResolveError },

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("el usuario no está en un canal de voz")]
    NotInVoiceChannel,

    #[error("no hay nada reproduciéndose")]
    NothingPlaying,

    #[error("la reproducción ya está en pausa")]
    AlreadyPaused,

    #[error("la reproducción no está en pausa")]
    NotPaused,

    #[error("no hay una canción anterior")]
    NoPreviousTrack,

    #[error("volumen fuera de rango: {0}% (0-{max}%)", max = MAX_VOLUME_PERCENT)]
    InvalidVolume(u16),
}

/// Volumen máximo aceptado, en porcentaje.
pub const MAX_VOLUME_PERCENT: u16 = 200;

/// Clasificación gruesa que usa la capa de presentación.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Resolution,
    Transport,
    Configuration,
    UserInput,
}

impl PlaybackError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PlaybackError::ResolutionExhausted { .. } => ErrorKind::Resolution,
            PlaybackError::Transport(_) => ErrorKind::Transport,
            PlaybackError::NotInVoiceChannel
            | PlaybackError::NothingPlaying
            | PlaybackError::AlreadyPaused
            | PlaybackError::NotPaused
            | PlaybackError::NoPreviousTrack
            | PlaybackError::InvalidVolume(_) => ErrorKind::UserInput,
        }
    }
}

impl PlaylistError {
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::Configuration
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        let exhausted = PlaybackError::ResolutionExhausted {
            attempts: 3,
            last: ResolveError::NotFound("x".into()),
        };
        assert_eq!(exhausted.kind(), ErrorKind::Resolution);
        assert_eq!(
            PlaybackError::from(TransportError::NotConnected).kind(),
            ErrorKind::Transport
        );
        assert_eq!(PlaybackError::NothingPlaying.kind(), ErrorKind::UserInput);
        assert_eq!(PlaybackError::InvalidVolume(250).kind(), ErrorKind::UserInput);
        assert_eq!(
            PlaylistError::NoBackingFile.kind(),
            ErrorKind::Configuration
        );
    }
}
