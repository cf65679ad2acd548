use rand::{seq::SliceRandom, Rng};
use std::collections::{HashSet, VecDeque};
use tracing::{debug, info};

use crate::playlist::PlaylistEntry;

/// Copia mezclada de la playlist que se consume de a una entrada.
///
/// Solo se vuelve a mezclar cuando el pozo está vacío al sacar, así cada
/// entrada suena exactamente una vez por ciclo. Lo agregado a la playlist a
/// mitad de un ciclo entra en la próxima mezcla.
#[derive(Debug, Default)]
pub struct FallbackPool {
    pool: VecDeque<PlaylistEntry>,
    played_in_cycle: HashSet<usize>,
    cycle_len: usize,
    cycle: u64,
}

impl FallbackPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Saca la siguiente canción del ciclo. `None` si la playlist está vacía.
    pub fn next_entry<R: Rng + ?Sized>(
        &mut self,
        playlist: &[PlaylistEntry],
        rng: &mut R,
    ) -> Option<PlaylistEntry> {
        if self.pool.is_empty() {
            if playlist.is_empty() {
                debug!("Playlist vacía, no hay canciones de respaldo");
                return None;
            }

            let mut shuffled = playlist.to_vec();
            shuffled.shuffle(rng);
            self.pool = shuffled.into();
            self.played_in_cycle.clear();
            self.cycle_len = playlist.len();
            self.cycle += 1;
            info!("🔀 Playlist mezclada: {} canciones (ciclo {})", self.cycle_len, self.cycle);
        }

        let entry = self.pool.pop_front()?;
        self.played_in_cycle.insert(entry.track_number);

        if self.played_in_cycle.len() >= self.cycle_len {
            debug!("🔁 Ciclo {} completo", self.cycle);
        }

        Some(entry)
    }

    pub fn clear(&mut self) {
        self.pool.clear();
        self.played_in_cycle.clear();
        self.cycle_len = 0;
    }

    pub fn remaining(&self) -> usize {
        self.pool.len()
    }

    pub fn played_in_cycle(&self) -> &HashSet<usize> {
        &self.played_in_cycle
    }

    pub fn cycle(&self) -> u64 {
        self.cycle
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::track::{UNKNOWN_ARTIST, UNKNOWN_TITLE};
    use rand::{rngs::StdRng, SeedableRng};

    fn playlist(n: usize) -> Vec<PlaylistEntry> {
        (1..=n)
            .map(|i| PlaylistEntry {
                source: format!("https://youtu.be/{i}"),
                title: UNKNOWN_TITLE.into(),
                artist: UNKNOWN_ARTIST.into(),
                track_number: i,
                section: None,
            })
            .collect()
    }

    fn draw_cycle(pool: &mut FallbackPool, entries: &[PlaylistEntry], rng: &mut StdRng) -> Vec<usize> {
        (0..entries.len())
            .filter_map(|_| pool.next_entry(entries, rng))
            .map(|e| e.track_number)
            .collect()
    }

    #[test]
    fn test_empty_playlist_yields_nothing() {
        let mut pool = FallbackPool::new();
        let mut rng = StdRng::seed_from_u64(1);
        assert!(pool.next_entry(&[], &mut rng).is_none());
        assert_eq!(pool.cycle(), 0);
    }

    #[test]
    fn test_single_entry_repeats_each_cycle() {
        let entries = playlist(1);
        let mut pool = FallbackPool::new();
        let mut rng = StdRng::seed_from_u64(2);

        for cycle in 1..=3 {
            let entry = pool.next_entry(&entries, &mut rng).unwrap();
            assert_eq!(entry.track_number, 1);
            assert_eq!(pool.cycle(), cycle);
        }
    }

    #[test]
    fn test_every_entry_once_per_cycle() {
        let entries = playlist(50);
        let mut pool = FallbackPool::new();
        let mut rng = StdRng::seed_from_u64(3);

        for cycle in 1..=3 {
            let mut drawn = draw_cycle(&mut pool, &entries, &mut rng);
            assert_eq!(pool.cycle(), cycle);
            assert_eq!(pool.remaining(), 0);
            assert_eq!(pool.played_in_cycle().len(), 50);
            drawn.sort_unstable();
            assert_eq!(drawn, (1..=50).collect::<Vec<_>>());
        }
    }

    #[test]
    fn test_order_is_shuffled() {
        let entries = playlist(50);
        let mut pool = FallbackPool::new();
        let mut rng = StdRng::seed_from_u64(4);

        let drawn = draw_cycle(&mut pool, &entries, &mut rng);
        assert_ne!(drawn, (1..=50).collect::<Vec<_>>());
    }

    #[test]
    fn test_append_mid_cycle_waits_for_reshuffle() {
        let mut entries = playlist(3);
        let mut pool = FallbackPool::new();
        let mut rng = StdRng::seed_from_u64(5);

        pool.next_entry(&entries, &mut rng).unwrap();
        entries.extend(playlist(4).into_iter().skip(3));

        let rest: Vec<_> = (0..2)
            .filter_map(|_| pool.next_entry(&entries, &mut rng))
            .map(|e| e.track_number)
            .collect();
        assert!(!rest.contains(&4));
        assert_eq!(pool.cycle(), 1);

        let next_cycle = draw_cycle(&mut pool, &entries, &mut rng);
        assert_eq!(pool.cycle(), 2);
        assert!(next_cycle.contains(&4));
    }

    #[test]
    fn test_clear_forces_reshuffle() {
        let entries = playlist(5);
        let mut pool = FallbackPool::new();
        let mut rng = StdRng::seed_from_u64(6);

        pool.next_entry(&entries, &mut rng);
        pool.clear();
        assert_eq!(pool.remaining(), 0);
        assert!(pool.played_in_cycle().is_empty());

        pool.next_entry(&entries, &mut rng);
        assert_eq!(pool.cycle(), 2);
        assert_eq!(pool.remaining(), 4);
    }
}
