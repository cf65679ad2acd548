use anyhow::{Context, Result};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::audio::controller::ControllerSettings;

#[derive(Debug, Clone)]
pub struct Config {
    // Discord
    pub discord_token: String,
    pub guild_id: Option<u64>, // Para comandos de desarrollo

    // Paths
    pub data_dir: PathBuf,
    pub playlist_path: PathBuf,
    pub radio_config_path: PathBuf,

    // Audio
    pub default_volume: f32,
    pub max_resolution_failures: u32,
    pub resolve_timeout: Duration,
    pub search_suffix: Option<String>,

    // Inactividad
    pub inactivity_check_interval: Duration,
    pub inactivity_grace: Duration,
    pub idle_timeout: Duration,

    // UI
    pub progress_update_interval: Duration,

    // Cache
    pub cache_size: usize,
    pub cache_ttl: Duration,

    // APIs (Opcionales)
    pub news_api_key: Option<String>,
}

impl Config {
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();
        let config = Self::from_lookup(|key| std::env::var(key).ok())?;

        std::fs::create_dir_all(&config.data_dir)
            .with_context(|| format!("No se pudo crear {}", config.data_dir.display()))?;

        Ok(config)
    }

    /// Construye la configuración a partir de una función de búsqueda de
    /// variables, con los valores por defecto para las que falten.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        let data_dir: PathBuf = var("DATA_DIR").map(PathBuf::from).unwrap_or(defaults.data_dir);
        let playlist_path = var("PLAYLIST_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| data_dir.join("playlist.txt"));
        let radio_config_path = var("RADIO_CONFIG_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| data_dir.join("radio_config.json"));

        let config = Self {
            discord_token: var("DISCORD_TOKEN").context("DISCORD_TOKEN no está definido")?,
            guild_id: var("GUILD_ID").map(|s| parse("GUILD_ID", &s)).transpose()?,

            data_dir,
            playlist_path,
            radio_config_path,

            default_volume: parse_or(&var, "DEFAULT_VOLUME", defaults.default_volume)?,
            max_resolution_failures: parse_or(
                &var,
                "MAX_RESOLUTION_FAILURES",
                defaults.max_resolution_failures,
            )?,
            resolve_timeout: duration_or(&var, "RESOLVE_TIMEOUT", defaults.resolve_timeout)?,
            search_suffix: var("SEARCH_SUFFIX"),

            inactivity_check_interval: duration_or(
                &var,
                "INACTIVITY_CHECK_INTERVAL",
                defaults.inactivity_check_interval,
            )?,
            inactivity_grace: duration_or(&var, "INACTIVITY_GRACE", defaults.inactivity_grace)?,
            idle_timeout: duration_or(&var, "IDLE_TIMEOUT", defaults.idle_timeout)?,

            progress_update_interval: duration_or(
                &var,
                "PROGRESS_UPDATE_INTERVAL",
                defaults.progress_update_interval,
            )?,

            cache_size: parse_or(&var, "CACHE_SIZE", defaults.cache_size)?,
            cache_ttl: duration_or(&var, "CACHE_TTL", defaults.cache_ttl)?,

            news_api_key: var("NEWS_API_KEY"),
        };

        config.validate()?;
        Ok(config)
    }

    /// Valida los valores de configuración.
    pub fn validate(&self) -> Result<()> {
        if self.discord_token.trim().is_empty() {
            anyhow::bail!("DISCORD_TOKEN must not be empty");
        }

        if !(0.0..=2.0).contains(&self.default_volume) {
            anyhow::bail!(
                "Default volume must be between 0.0 and 2.0, got: {}",
                self.default_volume
            );
        }

        if self.max_resolution_failures == 0 {
            anyhow::bail!("Max resolution failures must be greater than 0");
        }

        if self.cache_size == 0 {
            anyhow::bail!("Cache size must be greater than 0");
        }

        for (name, value) in [
            ("RESOLVE_TIMEOUT", self.resolve_timeout),
            ("INACTIVITY_CHECK_INTERVAL", self.inactivity_check_interval),
            ("PROGRESS_UPDATE_INTERVAL", self.progress_update_interval),
        ] {
            if value.is_zero() {
                anyhow::bail!("{} must be greater than 0", name);
            }
        }

        Ok(())
    }

    pub fn controller_settings(&self) -> ControllerSettings {
        ControllerSettings {
            max_resolution_failures: self.max_resolution_failures,
            resolve_timeout: self.resolve_timeout,
            inactivity_grace: self.inactivity_grace,
            idle_timeout: self.idle_timeout,
            default_volume: (self.default_volume * 100.0).round() as u16,
        }
    }

    /// Resumen de la configuración para los logs, sin secretos.
    pub fn summary(&self) -> String {
        format!(
            "Config Summary:\n  \
            Discord: Guild {}\n  \
            Playlist: {}\n  \
            Audio: {}% vol, {} fallos máx, resolución {}\n  \
            Inactividad: barrido {}, gracia {}, inactivo {}\n  \
            Cache: {} entradas, ttl {}\n  \
            Noticias: {}",
            self.guild_id.map_or("global".to_string(), |id| id.to_string()),
            self.playlist_path.display(),
            (self.default_volume * 100.0) as u32,
            self.max_resolution_failures,
            humantime::format_duration(self.resolve_timeout),
            humantime::format_duration(self.inactivity_check_interval),
            humantime::format_duration(self.inactivity_grace),
            humantime::format_duration(self.idle_timeout),
            self.cache_size,
            humantime::format_duration(self.cache_ttl),
            if self.news_api_key.is_some() { "NewsAPI" } else { "titulares locales" },
        )
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            // Discord (no defaults - must be provided)
            discord_token: String::new(),
            guild_id: None,

            data_dir: "data".into(),
            playlist_path: "data/playlist.txt".into(),
            radio_config_path: "data/radio_config.json".into(),

            default_volume: 0.5,
            max_resolution_failures: 3,
            resolve_timeout: Duration::from_secs(30),
            search_suffix: None,

            inactivity_check_interval: Duration::from_secs(60),
            inactivity_grace: Duration::from_secs(30),
            idle_timeout: Duration::from_secs(60),

            progress_update_interval: Duration::from_secs(10),

            cache_size: 100,
            cache_ttl: Duration::from_secs(3600),

            news_api_key: None,
        }
    }
}

fn parse<T>(key: &str, value: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    value
        .trim()
        .parse()
        .with_context(|| format!("Valor inválido para {}: {:?}", key, value))
}

fn parse_or<T>(var: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    var(key).map_or(Ok(default), |value| parse(key, &value))
}

/// Acepta `"30s"`, `"1m 30s"`, o un número de segundos.
fn duration_or(
    var: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: Duration,
) -> Result<Duration> {
    let Some(value) = var(key) else {
        return Ok(default);
    };
    let value = value.trim();

    if let Ok(secs) = value.parse::<u64>() {
        return Ok(Duration::from_secs(secs));
    }

    humantime::parse_duration(value).with_context(|| format!("Duración inválida para {}: {:?}", key, value))
}
