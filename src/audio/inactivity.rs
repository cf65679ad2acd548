use dashmap::{mapref::entry::Entry, DashMap};
use serenity::model::id::GuildId;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio_util::sync::CancellationToken;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisconnectReason {
    /// No quedan usuarios en el canal de voz.
    EmptyChannel,
    /// No queda nada por reproducir.
    Idle,
}

#[derive(Debug)]
struct PendingDisconnect {
    id: u64,
    reason: DisconnectReason,
    cancel: CancellationToken,
}

/// Temporizador armado por [`InactivityMonitor::schedule`]. Quien lo recibe
/// corre la espera y debe llamar a [`InactivityMonitor::complete`] antes de
/// actuar.
#[derive(Debug, Clone)]
pub struct ArmedTimer {
    pub id: u64,
    pub reason: DisconnectReason,
    pub cancel: CancellationToken,
}

/// Guarda a lo sumo una desconexión pendiente por guild.
#[derive(Default)]
pub struct InactivityMonitor {
    pending: DashMap<GuildId, PendingDisconnect>,
    next_id: AtomicU64,
}

impl InactivityMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arma un temporizador. Si ya hay uno del mismo tipo no hace nada y
    /// devuelve `None`; uno de otro tipo es reemplazado.
    pub fn schedule(&self, guild: GuildId, reason: DisconnectReason) -> Option<ArmedTimer> {
        let armed = ArmedTimer {
            id: self.next_id.fetch_add(1, Ordering::Relaxed) + 1,
            reason,
            cancel: CancellationToken::new(),
        };

        match self.pending.entry(guild) {
            Entry::Occupied(mut entry) => {
                if entry.get().reason == reason {
                    return None;
                }
                entry.get().cancel.cancel();
                debug!(
                    "⏱️ Temporizador {:?} reemplazado por {:?} en guild {}",
                    entry.get().reason,
                    reason,
                    guild
                );
                entry.insert(PendingDisconnect {
                    id: armed.id,
                    reason,
                    cancel: armed.cancel.clone(),
                });
            }
            Entry::Vacant(entry) => {
                entry.insert(PendingDisconnect {
                    id: armed.id,
                    reason,
                    cancel: armed.cancel.clone(),
                });
            }
        }

        Some(armed)
    }

    /// Cancela el temporizador pendiente, sea del tipo que sea.
    pub fn cancel(&self, guild: GuildId) -> Option<DisconnectReason> {
        let (_, pending) = self.pending.remove(&guild)?;
        pending.cancel.cancel();
        debug!("⏱️ Temporizador {:?} cancelado en guild {}", pending.reason, guild);
        Some(pending.reason)
    }

    /// Cancela el temporizador pendiente solo si es del tipo indicado.
    pub fn cancel_reason(&self, guild: GuildId, reason: DisconnectReason) -> bool {
        match self.pending.remove_if(&guild, |_, pending| pending.reason == reason) {
            Some((_, pending)) => {
                pending.cancel.cancel();
                debug!("⏱️ Temporizador {:?} cancelado en guild {}", reason, guild);
                true
            }
            None => false,
        }
    }

    /// Retira el temporizador `id` al vencer. `false` si ya fue cancelado o
    /// reemplazado, en cuyo caso no debe hacerse nada.
    pub fn complete(&self, guild: GuildId, id: u64) -> bool {
        self.pending
            .remove_if(&guild, |_, pending| pending.id == id)
            .is_some()
    }

    pub fn pending_reason(&self, guild: GuildId) -> Option<DisconnectReason> {
        self.pending.get(&guild).map(|p| p.reason)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GUILD: GuildId = GuildId::new(42);

    #[test]
    fn test_same_kind_is_noop() {
        let monitor = InactivityMonitor::new();
        let first = monitor.schedule(GUILD, DisconnectReason::EmptyChannel).unwrap();
        assert!(monitor.schedule(GUILD, DisconnectReason::EmptyChannel).is_none());
        assert!(!first.cancel.is_cancelled());
        assert!(monitor.complete(GUILD, first.id));
        assert_eq!(monitor.pending_reason(GUILD), None);
    }

    #[test]
    fn test_different_kind_replaces() {
        let monitor = InactivityMonitor::new();
        let idle = monitor.schedule(GUILD, DisconnectReason::Idle).unwrap();
        let empty = monitor.schedule(GUILD, DisconnectReason::EmptyChannel).unwrap();

        assert!(idle.cancel.is_cancelled());
        assert!(!monitor.complete(GUILD, idle.id));
        assert_eq!(monitor.pending_reason(GUILD), Some(DisconnectReason::EmptyChannel));
        assert!(monitor.complete(GUILD, empty.id));
    }

    #[test]
    fn test_cancel_reason_only_matching() {
        let monitor = InactivityMonitor::new();
        let armed = monitor.schedule(GUILD, DisconnectReason::Idle).unwrap();

        assert!(!monitor.cancel_reason(GUILD, DisconnectReason::EmptyChannel));
        assert!(!armed.cancel.is_cancelled());
        assert!(monitor.cancel_reason(GUILD, DisconnectReason::Idle));
        assert!(armed.cancel.is_cancelled());
        assert_eq!(monitor.cancel(GUILD), None);
    }
}
