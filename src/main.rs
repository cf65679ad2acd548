use anyhow::Result;
use serenity::{model::gateway::GatewayIntents, Client};
use songbird::{SerenityInit, Songbird};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

mod audio;
mod bot;
mod cache;
mod config;
mod error;
mod playlist;
mod radio;
mod sources;
mod storage;
mod ui;

use crate::audio::controller::PlaybackController;
use crate::bot::{announcer::Announcer, voice::SongbirdTransport, JukeboxBot};
use crate::cache::metadata_cache;
use crate::config::Config;
use crate::playlist::PlaylistStore;
use crate::radio::{news::NewsClient, RadioConfig, RadioHost};
use crate::sources::{YtDlpClient, YtDlpResolver};
use crate::storage::StatsStore;

const CACHE_CLEANUP_INTERVAL: Duration = Duration::from_secs(3600);

#[tokio::main]
async fn main() -> Result<()> {
    // Inicializar logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("open_jukebox=debug".parse()?)
                .add_directive("serenity=info".parse()?)
                .add_directive("songbird=info".parse()?),
        )
        .init();

    info!("🎵 Iniciando Open Jukebox v{}", env!("CARGO_PKG_VERSION"));

    // Manejar health check si es necesario
    if std::env::args().any(|arg| arg == "--health-check") {
        return health_check().await;
    }

    // Cargar configuración
    let config = Arc::new(Config::load()?);
    info!("{}", config.summary());

    let stats = Arc::new(StatsStore::open(&config.data_dir).await?);
    let playlist = match PlaylistStore::load(&config.playlist_path).await {
        Ok(playlist) => playlist,
        Err(e) => {
            warn!("⚠️ No se pudo leer la playlist ({}), se usará una vacía", e);
            PlaylistStore::in_memory(Vec::new())
        }
    };
    if playlist.is_empty() {
        warn!("⚠️ La playlist está vacía, /play sin argumentos no tendrá qué reproducir");
    }
    let playlist = Arc::new(playlist);
    let radio_config = RadioConfig::load_or_create(&config.radio_config_path).await?;

    let http_client = reqwest::Client::builder()
        .user_agent(concat!("open-jukebox/", env!("CARGO_PKG_VERSION")))
        .build()?;

    let resolver = Arc::new(YtDlpResolver::new(
        YtDlpClient::new(),
        metadata_cache(config.cache_size, config.cache_ttl),
        config.search_suffix.clone(),
    ));

    let songbird = Songbird::serenity();
    let transport = Arc::new(SongbirdTransport::new(
        songbird.clone(),
        http_client.clone(),
        config.default_volume,
    ));

    let (controller, completions) = PlaybackController::new(
        resolver.clone(),
        transport.clone(),
        stats.clone(),
        playlist,
        config.controller_settings(),
    );
    controller.spawn_completion_pump(completions);
    controller.spawn_occupancy_sweep(config.inactivity_check_interval);

    let radio = Arc::new(RadioHost::with_path(
        radio_config,
        config.radio_config_path.clone(),
    ));
    let announcer = Arc::new(Announcer::new(
        controller.clone(),
        stats.clone(),
        radio.clone(),
        NewsClient::new(http_client, config.news_api_key.clone()),
        config.progress_update_interval,
    ));
    announcer.spawn();

    // Limpiar caché viejo
    {
        let resolver = resolver.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(CACHE_CLEANUP_INTERVAL);
            loop {
                interval.tick().await;
                resolver.cache().cleanup_old_entries();
            }
        });
    }

    // Configurar intents mínimos necesarios
    let intents = GatewayIntents::GUILDS | GatewayIntents::GUILD_VOICE_STATES;

    let handler = JukeboxBot::new(
        config.clone(),
        controller,
        stats,
        radio,
        announcer.clone(),
    );

    let mut client = Client::builder(&config.discord_token, intents)
        .event_handler(handler)
        .register_songbird_with(songbird)
        .await?;

    transport.attach_cache(client.cache.clone());
    announcer.attach_http(client.http.clone());

    // Manejar shutdown graceful
    let shard_manager = client.shard_manager.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("⚠️ Señal de shutdown recibida, cerrando...");
                shard_manager.shutdown_all().await;
            }
            Err(e) => error!("Error al registrar Ctrl+C: {:?}", e),
        }
    });

    // Iniciar bot
    info!("🚀 Bot iniciado exitosamente");
    if let Err(why) = client.start().await {
        error!("Error al ejecutar cliente: {:?}", why);
    }

    Ok(())
}

async fn health_check() -> Result<()> {
    // Verificar dependencias críticas
    let yt_dlp = async_process::Command::new("yt-dlp")
        .arg("--version")
        .output()
        .await?;

    let ffmpeg = async_process::Command::new("ffmpeg")
        .arg("-version")
        .output()
        .await?;

    if yt_dlp.status.success() && ffmpeg.status.success() {
        println!("OK");
        Ok(())
    } else {
        anyhow::bail!("Dependencias faltantes");
    }
}
