//! Modo radio: saludos según la hora, presentación de canciones y boletines
//! de noticias intercalados con la playlist.
//!
//! El host solo decide *qué* anunciar. Publicar los anuncios y traer los
//! titulares queda en manos del anunciador del bot.

pub mod news;

use anyhow::Result;
use dashmap::DashMap;
use parking_lot::RwLock;
use rand::{seq::SliceRandom, Rng};
use serde::{Deserialize, Serialize};
use serenity::model::id::GuildId;
use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::{fs, sync::Mutex};
use tracing::{info, warn};

use crate::audio::track::{TrackRequest, UNKNOWN_ARTIST};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RadioConfig {
    pub news_enabled: bool,
    /// Canciones entre boletines.
    pub news_frequency: u32,
    pub news_categories: Vec<String>,
    pub host_personality: HostPersonality,
    pub trivia_enabled: bool,
    /// Ajusta la frecuencia de noticias según la hora del día.
    pub time_based_content: bool,
    pub morning_greeting: String,
    pub afternoon_greeting: String,
    pub evening_greeting: String,
    pub night_greeting: String,
}

impl Default for RadioConfig {
    fn default() -> Self {
        Self {
            news_enabled: true,
            news_frequency: 5,
            news_categories: vec!["technology".into(), "general".into()],
            host_personality: HostPersonality::Friendly,
            trivia_enabled: true,
            time_based_content: true,
            morning_greeting: "¡Buenos días! Arrancamos un nuevo día con tu música favorita.".into(),
            afternoon_greeting: "¡Buenas tardes! Esperamos que estés teniendo un gran día.".into(),
            evening_greeting: "¡Buenas noches! Hora de relajarse con buenos temas.".into(),
            night_greeting: "Ya es de noche. Disfruta de unos temas tranquilos para cerrar el día."
                .into(),
        }
    }
}

impl RadioConfig {
    /// Carga la configuración, mezclando con los valores por defecto. Si el
    /// archivo no existe se crea.
    pub async fn load_or_create(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        match fs::read_to_string(path).await {
            Ok(content) => match serde_json::from_str(&content) {
                Ok(config) => Ok(config),
                Err(e) => {
                    warn!("⚠️ Configuración de radio inválida ({}), usando valores por defecto", e);
                    Ok(Self::default())
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let config = Self::default();
                config.save(path).await?;
                info!("📝 Configuración de radio creada en {}", path.display());
                Ok(config)
            }
            Err(e) => Err(e.into()),
        }
    }

    pub async fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?).await?;
        Ok(())
    }
}

/// Estilo con el que el host presenta cada canción.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HostPersonality {
    #[default]
    Friendly,
    Formal,
    Humorous,
    Energetic,
}

impl HostPersonality {
    pub const ALL: [HostPersonality; 4] = [
        HostPersonality::Friendly,
        HostPersonality::Formal,
        HostPersonality::Humorous,
        HostPersonality::Energetic,
    ];

    /// Nombre tal como se guarda en el archivo de configuración.
    pub fn as_str(&self) -> &'static str {
        match self {
            HostPersonality::Friendly => "friendly",
            HostPersonality::Formal => "formal",
            HostPersonality::Humorous => "humorous",
            HostPersonality::Energetic => "energetic",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        let name = name.trim().to_lowercase();
        Self::ALL.into_iter().find(|p| p.as_str() == name)
    }

    pub fn label(&self) -> &'static str {
        match self {
            HostPersonality::Friendly => "Amigable",
            HostPersonality::Formal => "Formal",
            HostPersonality::Humorous => "Divertido",
            HostPersonality::Energetic => "Enérgico",
        }
    }

    fn lead_ins(&self) -> &'static [&'static str] {
        match self {
            HostPersonality::Friendly => &[
                "¡Seguimos con buena música!",
                "Esta va para todos los que nos escuchan.",
                "Ponte cómodo, que viene una linda.",
            ],
            HostPersonality::Formal => &[
                "A continuación, el siguiente tema de nuestra programación.",
                "Presentamos ahora una nueva selección musical.",
            ],
            HostPersonality::Humorous => &[
                "Sube el volumen, que los vecinos también merecen escuchar esto.",
                "Prometo que esta no la elegí yo. Bueno, un poco sí.",
                "Si no bailas con esta, revisa que estés despierto.",
            ],
            HostPersonality::Energetic => &[
                "¡Arriba esa energía!",
                "¡Esto no para, vamos con todo!",
                "¡Subimos las revoluciones!",
            ],
        }
    }

    /// Frase de entrada para la presentación de una canción.
    pub fn lead_in<R: Rng + ?Sized>(&self, rng: &mut R) -> &'static str {
        self.lead_ins().choose(rng).copied().unwrap_or_default()
    }
}

/// Canciones entre boletines que se aceptan al cambiar la configuración.
pub const NEWS_FREQUENCY_RANGE: RangeInclusive<u32> = 3..=10;

#[derive(Debug, Error)]
pub enum RadioSettingsError {
    #[error("la frecuencia de noticias debe estar entre 3 y 10 canciones (recibido {0})")]
    InvalidFrequency(u32),

    #[error("personalidad desconocida: {0}")]
    InvalidPersonality(String),

    #[error(transparent)]
    Save(#[from] anyhow::Error),
}

/// Cambios pedidos con `/radio_settings`. Los campos en `None` no se tocan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RadioSettingsUpdate {
    pub news_enabled: Option<bool>,
    pub trivia_enabled: Option<bool>,
    pub news_frequency: Option<u32>,
    pub host_personality: Option<String>,
    pub time_based_content: Option<bool>,
}

impl RadioSettingsUpdate {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    fn apply(&self, config: &mut RadioConfig) -> Result<(), RadioSettingsError> {
        if let Some(frequency) = self.news_frequency {
            if !NEWS_FREQUENCY_RANGE.contains(&frequency) {
                return Err(RadioSettingsError::InvalidFrequency(frequency));
            }
            config.news_frequency = frequency;
        }
        if let Some(name) = &self.host_personality {
            config.host_personality = HostPersonality::parse(name)
                .ok_or_else(|| RadioSettingsError::InvalidPersonality(name.clone()))?;
        }
        if let Some(enabled) = self.news_enabled {
            config.news_enabled = enabled;
        }
        if let Some(enabled) = self.trivia_enabled {
            config.trivia_enabled = enabled;
        }
        if let Some(enabled) = self.time_based_content {
            config.time_based_content = enabled;
        }
        Ok(())
    }
}

/// Franja horaria de un saludo.
pub fn greeting_for_hour(config: &RadioConfig, hour: u32) -> &str {
    match hour {
        5..=11 => &config.morning_greeting,
        12..=16 => &config.afternoon_greeting,
        17..=21 => &config.evening_greeting,
        _ => &config.night_greeting,
    }
}

/// Canciones entre boletines: más seguido en horas pico, menos de madrugada.
pub fn news_frequency_for_hour(config: &RadioConfig, hour: u32) -> u32 {
    if !config.time_based_content {
        return config.news_frequency.max(1);
    }

    match hour {
        7..=8 | 16..=18 => 3,
        23 | 0..=4 => 8,
        _ => config.news_frequency.max(1),
    }
}

pub fn song_trivia<R: Rng + ?Sized>(title: &str, artist: &str, rng: &mut R) -> String {
    let options = [
        format!("¿Sabías que {artist} lleva más de una década haciendo música?"),
        format!("Este tema de {artist} es uno de sus más populares."),
        format!("{title} salió en un álbum que recibió muy buenas críticas."),
        format!("{artist} escribió esta canción en una etapa especialmente creativa."),
        format!("Los fans consideran {title} una de las obras definitorias de {artist}."),
        format!("El ritmo de {title} muestra el estilo único de {artist}."),
        format!("{artist} ha dicho que esta es una de sus canciones favoritas."),
        format!("La letra de {title} se inspira en experiencias personales de {artist}."),
        format!("Este tema tiene el sonido característico de {artist} que tanto gusta."),
        format!("{title} demuestra por qué {artist} destaca en su género."),
    ];

    options
        .choose(rng)
        .cloned()
        .unwrap_or_else(|| format!("Suena {title}."))
}

/// Lo que hay que anunciar al empezar una canción en modo radio.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RadioCue {
    pub intro: Option<String>,
    pub news_category: Option<String>,
}

#[derive(Debug, Default)]
struct RadioState {
    songs_since_news: u32,
}

/// Estado del modo radio por guild. La configuración es compartida por todas.
pub struct RadioHost {
    config: RwLock<RadioConfig>,
    path: Option<PathBuf>,
    save_lock: Mutex<()>,
    active: DashMap<GuildId, RadioState>,
}

impl RadioHost {
    /// Host con configuración solo en memoria.
    pub fn new(config: RadioConfig) -> Self {
        Self {
            config: RwLock::new(config),
            path: None,
            save_lock: Mutex::new(()),
            active: DashMap::new(),
        }
    }

    /// Host que persiste los cambios de configuración en `path`.
    pub fn with_path(config: RadioConfig, path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
            ..Self::new(config)
        }
    }

    pub fn config(&self) -> RadioConfig {
        self.config.read().clone()
    }

    /// Aplica y guarda un cambio de configuración. Si la escritura falla la
    /// configuración en uso no cambia.
    pub async fn update_settings(
        &self,
        update: &RadioSettingsUpdate,
    ) -> Result<RadioConfig, RadioSettingsError> {
        let _guard = self.save_lock.lock().await;

        let mut updated = self.config();
        update.apply(&mut updated)?;

        if let Some(path) = &self.path {
            updated.save(path).await?;
        }
        *self.config.write() = updated.clone();

        info!("📻 Configuración de radio actualizada: {:?}", update);
        Ok(updated)
    }

    /// Activa el modo radio y devuelve el saludo para la hora indicada.
    pub fn activate(&self, guild: GuildId, hour: u32) -> String {
        self.active.insert(guild, RadioState::default());
        info!("📻 Modo radio activado en guild {}", guild);
        greeting_for_hour(&self.config.read(), hour).to_string()
    }

    pub fn deactivate(&self, guild: GuildId) -> bool {
        let was_active = self.active.remove(&guild).is_some();
        if was_active {
            info!("📻 Modo radio desactivado en guild {}", guild);
        }
        was_active
    }

    pub fn is_active(&self, guild: GuildId) -> bool {
        self.active.contains_key(&guild)
    }

    pub fn on_track_started<R: Rng + ?Sized>(
        &self,
        guild: GuildId,
        track: &TrackRequest,
        hour: u32,
        rng: &mut R,
    ) -> Option<RadioCue> {
        let mut state = self.active.get_mut(&guild)?;
        let config = self.config();
        let mut cue = RadioCue::default();

        if config.trivia_enabled {
            let artist = if track.artist == UNKNOWN_ARTIST {
                "este artista"
            } else {
                track.artist.as_str()
            };
            let lead_in = config.host_personality.lead_in(rng);
            let trivia = song_trivia(&track.title, artist, rng);
            cue.intro = Some(format!("{lead_in} {trivia}"));
        }

        state.songs_since_news += 1;
        if config.news_enabled && state.songs_since_news >= news_frequency_for_hour(&config, hour)
        {
            state.songs_since_news = 0;
            cue.news_category = config
                .news_categories
                .choose(rng)
                .cloned()
                .or_else(|| Some("general".to_string()));
        }

        Some(cue)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};
    use serenity::model::id::UserId;

    const GUILD: GuildId = GuildId::new(5);

    fn track() -> TrackRequest {
        let mut track = TrackRequest::user("https://youtu.be/x", UserId::new(1));
        track.title = "Song".into();
        track.artist = "Band".into();
        track
    }

    #[test]
    fn test_greeting_boundaries() {
        let config = RadioConfig::default();
        assert_eq!(greeting_for_hour(&config, 5), config.morning_greeting);
        assert_eq!(greeting_for_hour(&config, 11), config.morning_greeting);
        assert_eq!(greeting_for_hour(&config, 12), config.afternoon_greeting);
        assert_eq!(greeting_for_hour(&config, 17), config.evening_greeting);
        assert_eq!(greeting_for_hour(&config, 22), config.night_greeting);
        assert_eq!(greeting_for_hour(&config, 4), config.night_greeting);
    }

    #[test]
    fn test_news_frequency_by_hour() {
        let mut config = RadioConfig::default();
        assert_eq!(news_frequency_for_hour(&config, 8), 3);
        assert_eq!(news_frequency_for_hour(&config, 17), 3);
        assert_eq!(news_frequency_for_hour(&config, 23), 8);
        assert_eq!(news_frequency_for_hour(&config, 2), 8);
        assert_eq!(news_frequency_for_hour(&config, 13), 5);

        config.time_based_content = false;
        assert_eq!(news_frequency_for_hour(&config, 8), 5);
    }

    #[test]
    fn test_news_every_n_tracks() {
        let host = RadioHost::new(RadioConfig::default());
        let mut rng = StdRng::seed_from_u64(1);

        assert!(host.on_track_started(GUILD, &track(), 13, &mut rng).is_none());
        host.activate(GUILD, 13);

        let cues: Vec<_> = (0..10)
            .map(|_| host.on_track_started(GUILD, &track(), 13, &mut rng).unwrap())
            .collect();
        let news_at: Vec<_> = cues
            .iter()
            .enumerate()
            .filter(|(_, cue)| cue.news_category.is_some())
            .map(|(i, _)| i + 1)
            .collect();

        assert_eq!(news_at, vec![5, 10]);
        assert!(cues.iter().all(|cue| cue.intro.is_some()));
        assert!(host.deactivate(GUILD));
        assert!(!host.deactivate(GUILD));
    }

    #[test]
    fn test_trivia_disabled() {
        let config = RadioConfig {
            trivia_enabled: false,
            news_enabled: false,
            ..RadioConfig::default()
        };
        let host = RadioHost::new(config);
        let mut rng = StdRng::seed_from_u64(2);
        host.activate(GUILD, 9);

        for _ in 0..6 {
            let cue = host.on_track_started(GUILD, &track(), 9, &mut rng).unwrap();
            assert_eq!(cue, RadioCue::default());
        }
    }

    #[test]
    fn test_intro_uses_host_personality() {
        let config = RadioConfig {
            host_personality: HostPersonality::Energetic,
            news_enabled: false,
            ..RadioConfig::default()
        };
        let host = RadioHost::new(config);
        let mut rng = StdRng::seed_from_u64(3);
        host.activate(GUILD, 10);

        for _ in 0..5 {
            let intro = host
                .on_track_started(GUILD, &track(), 10, &mut rng)
                .unwrap()
                .intro
                .unwrap();
            assert!(
                HostPersonality::Energetic
                    .lead_ins()
                    .iter()
                    .any(|lead| intro.starts_with(lead)),
                "{intro}"
            );
        }
    }

    #[test]
    fn test_personality_names() {
        assert_eq!(HostPersonality::parse(" Humorous "), Some(HostPersonality::Humorous));
        assert_eq!(HostPersonality::parse("grumpy"), None);
        for personality in HostPersonality::ALL {
            assert_eq!(HostPersonality::parse(personality.as_str()), Some(personality));
        }
    }

    #[tokio::test]
    async fn test_settings_update_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("radio_config.json");
        let host = RadioHost::with_path(RadioConfig::default(), &path);

        let update = RadioSettingsUpdate {
            news_frequency: Some(7),
            host_personality: Some("formal".into()),
            trivia_enabled: Some(false),
            ..RadioSettingsUpdate::default()
        };
        let updated = host.update_settings(&update).await.unwrap();
        assert_eq!(updated.news_frequency, 7);
        assert_eq!(updated.host_personality, HostPersonality::Formal);
        assert!(!host.config().trivia_enabled);

        let reloaded = RadioConfig::load_or_create(&path).await.unwrap();
        assert_eq!(reloaded, updated);
        assert!(std::fs::read_to_string(&path).unwrap().contains("\"formal\""));
    }

    #[tokio::test]
    async fn test_settings_update_rejects_invalid_values() {
        let host = RadioHost::new(RadioConfig::default());

        let too_often = RadioSettingsUpdate {
            news_frequency: Some(2),
            news_enabled: Some(false),
            ..RadioSettingsUpdate::default()
        };
        assert!(matches!(
            host.update_settings(&too_often).await,
            Err(RadioSettingsError::InvalidFrequency(2))
        ));

        let unknown = RadioSettingsUpdate {
            host_personality: Some("grumpy".into()),
            ..RadioSettingsUpdate::default()
        };
        assert!(matches!(
            host.update_settings(&unknown).await,
            Err(RadioSettingsError::InvalidPersonality(_))
        ));

        assert_eq!(host.config(), RadioConfig::default());
        assert!(RadioSettingsUpdate::default().is_empty());
    }

    #[tokio::test]
    async fn test_failed_settings_write_keeps_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("radio_config.json");
        std::fs::create_dir(&path).unwrap();
        let host = RadioHost::with_path(RadioConfig::default(), &path);

        let update = RadioSettingsUpdate {
            news_enabled: Some(false),
            ..RadioSettingsUpdate::default()
        };
        assert!(matches!(
            host.update_settings(&update).await,
            Err(RadioSettingsError::Save(_))
        ));
        assert!(host.config().news_enabled);
    }

    #[tokio::test]
    async fn test_config_created_and_merged() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("radio_config.json");

        let created = RadioConfig::load_or_create(&path).await.unwrap();
        assert_eq!(created, RadioConfig::default());
        assert!(path.exists());

        std::fs::write(&path, r#"{"news_frequency": 2, "trivia_enabled": false}"#).unwrap();
        let merged = RadioConfig::load_or_create(&path).await.unwrap();
        assert_eq!(merged.news_frequency, 2);
        assert!(!merged.trivia_enabled);
        assert_eq!(merged.news_categories, RadioConfig::default().news_categories);
    }
}
