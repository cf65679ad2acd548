use num_format::{Locale, ToFormattedString};
use serenity::{
    all::Timestamp,
    builder::{CreateEmbed, CreateEmbedFooter},
};
use std::time::Duration;

use crate::{
    audio::{
        session::SessionSnapshot,
        track::{Requester, TrackRequest, UNKNOWN_ARTIST},
    },
    error::{ErrorKind, PlaybackError, ResolveError, MAX_VOLUME_PERCENT},
    playlist::PlaylistEntry,
    radio::{news::NewsItem, RadioConfig},
    sources::YtDlpClient,
    storage::{TrackStats, VoteTally},
};

/// Paleta de colores estandarizada para el bot
pub mod colors {
    use serenity::all::Colour;

    pub const SUCCESS_GREEN: Colour = Colour::from_rgb(67, 181, 129);
    pub const ERROR_RED: Colour = Colour::from_rgb(220, 53, 69);
    pub const WARNING_ORANGE: Colour = Colour::from_rgb(255, 193, 7);
    pub const INFO_BLUE: Colour = Colour::from_rgb(52, 144, 220);
    pub const MUSIC_PURPLE: Colour = Colour::from_rgb(138, 43, 226);
    pub const NEUTRAL_GRAY: Colour = Colour::from_rgb(108, 117, 125);
    pub const RADIO_CYAN: Colour = Colour::from_rgb(23, 162, 184);
}

/// Footer estandarizado para todos los embeds
const STANDARD_FOOTER: &str = "🎵 Open Jukebox";

pub const PROGRESS_CELLS: usize = 20;
pub const UPCOMING_LIMIT: usize = 10;
pub const QUEUE_PAGE_SIZE: usize = 10;
pub const PLAYLIST_PAGE_SIZE: usize = 15;

/// Embed de "Reproduciendo Ahora" con progreso, próximas canciones y las
/// últimas reproducidas. Se regenera en cada actualización del progreso.
pub fn now_playing_embed(
    track: &TrackRequest,
    snapshot: &SessionSnapshot,
    votes: VoteTally,
) -> CreateEmbed {
    let elapsed = snapshot.elapsed.unwrap_or_default();

    let title = if snapshot.paused {
        "⏸️ En Pausa"
    } else {
        "🎶 Reproduciendo Ahora"
    };

    let mut embed = CreateEmbed::default()
        .title(title)
        .description(format!("**{}**", track.title))
        .color(colors::SUCCESS_GREEN)
        .field("🎤 Artista", artist_label(track), true)
        .field(
            "⏱️ Duración",
            track
                .duration
                .map(format_duration)
                .unwrap_or_else(|| "🔴 En vivo".to_string()),
            true,
        )
        .field("👤 Solicitado por", requester_label(track), true)
        .field("🔗 Fuente", source_label(track), true)
        .field("📊 Progreso", progress_bar(elapsed, track.duration), false);

    let (upcoming, more) = upcoming_lines(&snapshot.pending);
    embed = embed.field("📋 En cola", upcoming, false);
    if let Some(more) = more {
        embed = embed.field("➕ Ver más", more, false);
    }

    if !snapshot.last_played.is_empty() {
        let recent = snapshot
            .last_played
            .iter()
            .enumerate()
            .map(|(i, t)| format!("{}. {}", i + 1, t.display_name()))
            .collect::<Vec<_>>()
            .join("\n");
        embed = embed.field("⏮️ Últimas reproducidas", recent, false);
    }

    if votes != VoteTally::default() {
        embed = embed.field(
            "🗳️ Votos",
            format!("👍 {}  👎 {}", votes.up, votes.down),
            true,
        );
    }

    if let Some(thumbnail) = &track.thumbnail {
        embed = embed.thumbnail(thumbnail);
    }
    if let Some(url) = track.url() {
        embed = embed.url(url);
    }

    embed
        .timestamp(Timestamp::now())
        .footer(CreateEmbedFooter::new(STANDARD_FOOTER))
}

/// Barra de 20 celdas con tiempo transcurrido y total.
pub fn progress_bar(elapsed: Duration, total: Option<Duration>) -> String {
    let Some(total) = total.filter(|t| !t.is_zero()) else {
        return format!("🔴 En vivo · {}", format_duration(elapsed));
    };

    let elapsed = elapsed.min(total);
    let filled = ((elapsed.as_secs_f64() / total.as_secs_f64()) * PROGRESS_CELLS as f64) as usize;
    let filled = filled.min(PROGRESS_CELLS);

    format!(
        "`{}{}` {} / {}",
        "█".repeat(filled),
        "░".repeat(PROGRESS_CELLS - filled),
        format_duration(elapsed),
        format_duration(total)
    )
}

/// Las primeras diez canciones pendientes y, si hay más, el aviso de "ver más".
pub fn upcoming_lines(pending: &[TrackRequest]) -> (String, Option<String>) {
    if pending.is_empty() {
        return ("🎲 Sigue la playlist aleatoria".to_string(), None);
    }

    let lines = pending
        .iter()
        .take(UPCOMING_LIMIT)
        .enumerate()
        .map(|(i, t)| format!("{}. {}", i + 1, t.display_name()))
        .collect::<Vec<_>>()
        .join("\n");

    let more = (pending.len() > UPCOMING_LIMIT).then(|| {
        format!(
            "Y {} más... usa `/queue` para ver la cola completa",
            pending.len() - UPCOMING_LIMIT
        )
    });

    (lines, more)
}

pub fn track_queued_embed(track: &TrackRequest, position: usize) -> CreateEmbed {
    CreateEmbed::default()
        .title("✅ Canción Agregada")
        .description(format!("**{}** se agregó a la cola", track.source))
        .color(colors::SUCCESS_GREEN)
        .field("📍 Posición", position.to_string(), true)
        .field("👤 Solicitado por", requester_label(track), true)
        .footer(CreateEmbedFooter::new(
            "🎵 Se reproducirá al terminar la canción actual",
        ))
        .timestamp(Timestamp::now())
}

/// Crea un embed para mostrar la cola de reproducción
pub fn queue_embed(snapshot: &SessionSnapshot, page: usize) -> CreateEmbed {
    let queue_page = snapshot.page(page, QUEUE_PAGE_SIZE);

    let mut embed = CreateEmbed::default()
        .title("📋 Cola de Reproducción")
        .color(colors::INFO_BLUE);

    if let Some(current) = &snapshot.current {
        embed = embed.field(
            "▶️ Reproduciendo",
            format!("**{}**", current.display_name()),
            false,
        );
    }

    if queue_page.total_items == 0 {
        return embed
            .description(
                "😴 **La cola está vacía**\n\n🎲 Se elegirán canciones de la playlist.\n💡 Usa `/play <canción>` para agregar música",
            )
            .color(colors::NEUTRAL_GRAY)
            .footer(CreateEmbedFooter::new(STANDARD_FOOTER))
            .timestamp(Timestamp::now());
    }

    let mut description = String::new();
    for (i, item) in queue_page.items.iter().enumerate() {
        let duration = item
            .duration
            .map(|d| format!(" `[{}]`", format_duration(d)))
            .unwrap_or_default();
        description.push_str(&format!(
            "**{}**. {}{} · <t:{}:R>\n",
            queue_page.offset + i + 1,
            item.display_name(),
            duration,
            item.added_at.timestamp()
        ));
    }

    embed
        .description(description)
        .footer(CreateEmbedFooter::new(format!(
            "Página {}/{} • {} canciones en cola",
            queue_page.current_page, queue_page.total_pages, queue_page.total_items
        )))
        .timestamp(Timestamp::now())
}

pub fn playlist_embed(entries: &[PlaylistEntry], page: usize) -> CreateEmbed {
    let embed = CreateEmbed::default()
        .title("🎼 Playlist")
        .color(colors::MUSIC_PURPLE);

    if entries.is_empty() {
        return embed
            .description("La playlist está vacía. Usa `/add_to_playlist` para agregar canciones.")
            .color(colors::NEUTRAL_GRAY)
            .footer(CreateEmbedFooter::new(STANDARD_FOOTER));
    }

    let total_pages = entries.len().div_ceil(PLAYLIST_PAGE_SIZE);
    let page = page.clamp(1, total_pages);
    let start = (page - 1) * PLAYLIST_PAGE_SIZE;

    let mut description = String::new();
    let mut section: Option<&str> = None;
    for entry in entries.iter().skip(start).take(PLAYLIST_PAGE_SIZE) {
        if entry.section.as_deref() != section {
            section = entry.section.as_deref();
            if let Some(name) = section {
                description.push_str(&format!("\n__**{}**__\n", name));
            }
        }
        description.push_str(&format!(
            "**{}**. {} - {}\n",
            entry.track_number, entry.artist, entry.title
        ));
    }

    embed
        .description(description)
        .footer(CreateEmbedFooter::new(format!(
            "Página {}/{} • {} canciones",
            page,
            total_pages,
            entries.len()
        )))
}

pub fn playlist_added_embed(entry: &PlaylistEntry) -> CreateEmbed {
    CreateEmbed::default()
        .title("📥 Agregada a la Playlist")
        .description(format!("**{}** - {}", entry.artist, entry.title))
        .color(colors::SUCCESS_GREEN)
        .field("#️⃣ Número", entry.track_number.to_string(), true)
        .field("🔗 Fuente", entry.source.clone(), false)
        .footer(CreateEmbedFooter::new(STANDARD_FOOTER))
        .timestamp(Timestamp::now())
}

/// Canciones más "calientes" según `(pedidas - saltadas) / (reproducidas + 1)`.
pub fn stats_embed(hottest: &[(String, TrackStats)]) -> CreateEmbed {
    let embed = CreateEmbed::default()
        .title("🔥 Canciones Más Populares")
        .color(colors::WARNING_ORANGE);

    if hottest.is_empty() {
        return embed
            .description("Todavía no hay estadísticas. ¡Pon algo de música!")
            .color(colors::NEUTRAL_GRAY)
            .footer(CreateEmbedFooter::new(STANDARD_FOOTER));
    }

    let mut description = String::new();
    for (i, (title, stats)) in hottest.iter().enumerate() {
        description.push_str(&format!(
            "**{}**. {} · 🌡️ {:.2}\n▶️ {} · 🙋 {} · ⏭️ {}\n",
            i + 1,
            title,
            stats.temperature(),
            stats.played_count.to_formatted_string(&Locale::es),
            stats.requested_count.to_formatted_string(&Locale::es),
            stats.skipped_count.to_formatted_string(&Locale::es),
        ));
    }

    embed
        .description(description)
        .footer(CreateEmbedFooter::new(STANDARD_FOOTER))
        .timestamp(Timestamp::now())
}

pub fn news_embed(category: &str, items: &[NewsItem]) -> CreateEmbed {
    let mut embed = CreateEmbed::default()
        .title(format!("📰 Boletín de Noticias · {}", category_label(category)))
        .color(colors::RADIO_CYAN);

    for item in items.iter().take(5) {
        let description = item
            .description
            .as_deref()
            .filter(|d| !d.trim().is_empty())
            .unwrap_or("Sin descripción");
        embed = embed.field(truncate(&item.title, 250), truncate(description, 1000), false);
    }

    embed
        .footer(CreateEmbedFooter::new("📻 Open Jukebox Radio"))
        .timestamp(Timestamp::now())
}

pub fn radio_greeting_embed(greeting: &str) -> CreateEmbed {
    CreateEmbed::default()
        .title("📻 Modo Radio Activado")
        .description(greeting)
        .color(colors::RADIO_CYAN)
        .footer(CreateEmbedFooter::new("📻 Open Jukebox Radio"))
        .timestamp(Timestamp::now())
}

pub fn radio_intro_embed(track: &TrackRequest, intro: &str) -> CreateEmbed {
    CreateEmbed::default()
        .title(format!("🎙️ A continuación: {}", track.title))
        .description(intro)
        .color(colors::RADIO_CYAN)
}

pub fn radio_settings_embed(config: &RadioConfig) -> CreateEmbed {
    let on_off = |enabled: bool| if enabled { "✅ Activado" } else { "❌ Desactivado" };

    CreateEmbed::default()
        .title("📻 Configuración de Radio")
        .color(colors::RADIO_CYAN)
        .field("📰 Noticias", on_off(config.news_enabled), true)
        .field(
            "🔁 Frecuencia",
            format!("Cada {} canciones", config.news_frequency),
            true,
        )
        .field("💡 Datos curiosos", on_off(config.trivia_enabled), true)
        .field("🎙️ Presentador", config.host_personality.label(), true)
        .field("🕒 Según la hora", on_off(config.time_based_content), true)
        .footer(CreateEmbedFooter::new("📻 Open Jukebox Radio"))
        .timestamp(Timestamp::now())
}

/// Crea un embed de error
pub fn error_embed(title: &str, description: &str) -> CreateEmbed {
    CreateEmbed::default()
        .title(format!("❌ {}", title))
        .description(description)
        .color(colors::ERROR_RED)
        .timestamp(Timestamp::now())
        .footer(CreateEmbedFooter::new(STANDARD_FOOTER))
}

/// Crea un embed de éxito
pub fn success_embed(title: &str, description: &str) -> CreateEmbed {
    CreateEmbed::default()
        .title(format!("✅ {}", title))
        .description(description)
        .color(colors::SUCCESS_GREEN)
        .timestamp(Timestamp::now())
        .footer(CreateEmbedFooter::new(STANDARD_FOOTER))
}

/// Crea un embed de información
pub fn info_embed(title: &str, description: &str) -> CreateEmbed {
    CreateEmbed::default()
        .title(format!("ℹ️ {}", title))
        .description(description)
        .color(colors::INFO_BLUE)
        .timestamp(Timestamp::now())
        .footer(CreateEmbedFooter::new(STANDARD_FOOTER))
}

/// Texto para el usuario de un error de reproducción.
pub fn error_message(error: &PlaybackError) -> String {
    match error {
        PlaybackError::NotInVoiceChannel => {
            "🔇 Debes estar en un canal de voz para usar este comando.".to_string()
        }
        PlaybackError::NothingPlaying => "🤷 No hay nada reproduciéndose.".to_string(),
        PlaybackError::AlreadyPaused => "⏸️ La música ya está en pausa.".to_string(),
        PlaybackError::NotPaused => "▶️ La música no está en pausa.".to_string(),
        PlaybackError::NoPreviousTrack => "⏮️ Todavía no hay canciones anteriores.".to_string(),
        PlaybackError::InvalidVolume(level) => format!(
            "🔊 El volumen debe estar entre 0 y {}% (pediste {}%).",
            MAX_VOLUME_PERCENT, level
        ),
        PlaybackError::ResolutionExhausted { attempts, last } => format!(
            "😵 No pude reproducir nada tras {} intentos seguidos. {}",
            attempts,
            resolve_hint(last)
        ),
        PlaybackError::Transport(_) => kind_message(ErrorKind::Transport).to_string(),
    }
}

/// Texto genérico por tipo de error.
pub fn kind_message(kind: ErrorKind) -> &'static str {
    match kind {
        ErrorKind::Resolution => "😵 No pude obtener el audio de esa fuente.",
        ErrorKind::Transport => {
            "🔌 Se perdió la conexión de voz. La sesión se cerró; usa `/play` para volver a empezar."
        }
        ErrorKind::Configuration => "⚙️ El bot no está bien configurado. Avisa a un administrador.",
        ErrorKind::UserInput => "🤔 No entendí ese pedido.",
    }
}

/// Pista breve para una resolución fallida.
pub fn resolve_hint(error: &ResolveError) -> &'static str {
    match error {
        ResolveError::NotFound(_) => "No se encontró el video o es privado.",
        ResolveError::Unsupported(_) => "Ese enlace no está soportado.",
        ResolveError::Network(_) | ResolveError::Timeout(_) => {
            "Hay problemas de red, inténtalo en un momento."
        }
        ResolveError::Backend(_) => "El extractor de audio falló.",
    }
}

/// Formatea una duración en formato legible
pub fn format_duration(duration: Duration) -> String {
    let total_seconds = duration.as_secs();
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, seconds)
    } else {
        format!("{}:{:02}", minutes, seconds)
    }
}

fn requester_label(track: &TrackRequest) -> String {
    match track.requested_by {
        Requester::User(user) => format!("<@{}>", user),
        Requester::AutoSelected => "🎲 Playlist".to_string(),
    }
}

fn source_label(track: &TrackRequest) -> &'static str {
    match track.url() {
        Some(url) if YtDlpClient::is_youtube_url(url) => "YouTube",
        Some(_) => "Enlace directo",
        None => "Búsqueda en YouTube",
    }
}

fn artist_label(track: &TrackRequest) -> String {
    if track.artist == UNKNOWN_ARTIST {
        "Desconocido".to_string()
    } else {
        track.artist.clone()
    }
}

fn category_label(category: &str) -> &str {
    match category {
        "technology" => "Tecnología",
        "general" => "General",
        "weather" => "Clima",
        "business" => "Negocios",
        "science" => "Ciencia",
        "sports" => "Deportes",
        "entertainment" => "Entretenimiento",
        "health" => "Salud",
        other => other,
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut truncated: String = text.chars().take(max_chars.saturating_sub(1)).collect();
    truncated.push('…');
    truncated
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::session::Session;
    use pretty_assertions::assert_eq;
    use serenity::model::id::UserId;

    fn request(title: &str) -> TrackRequest {
        let mut track = TrackRequest::user(format!("https://youtu.be/{title}"), UserId::new(7));
        track.title = title.to_string();
        track
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_secs(65)), "1:05");
        assert_eq!(format_duration(Duration::from_secs(3725)), "1:02:05");
    }

    #[test]
    fn test_progress_bar_cells() {
        let bar = progress_bar(Duration::from_secs(90), Some(Duration::from_secs(180)));
        assert_eq!(bar, format!("`{}{}` 1:30 / 3:00", "█".repeat(10), "░".repeat(10)));

        let overrun = progress_bar(Duration::from_secs(500), Some(Duration::from_secs(180)));
        assert!(overrun.starts_with(&format!("`{}`", "█".repeat(20))));

        assert_eq!(progress_bar(Duration::from_secs(5), None), "🔴 En vivo · 0:05");
    }

    #[test]
    fn test_upcoming_shows_ten_and_more_hint() {
        let pending: Vec<_> = (0..12).map(|i| request(&format!("t{i}"))).collect();
        let (lines, more) = upcoming_lines(&pending);

        assert_eq!(lines.lines().count(), 10);
        assert!(lines.starts_with("1. t0"));
        assert_eq!(
            more.as_deref(),
            Some("Y 2 más... usa `/queue` para ver la cola completa")
        );

        let (lines, more) = upcoming_lines(&pending[..3]);
        assert_eq!(lines.lines().count(), 3);
        assert!(more.is_none());
    }

    #[test]
    fn test_now_playing_embed_fields() {
        let mut session = Session::new();
        session.last_played.push_back(request("old-1"));
        session.last_played.push_back(request("old-2"));
        session.pending.push_back(request("next"));
        let current = request("now");
        session.current = Some(current.clone());

        let embed = now_playing_embed(&current, &session.snapshot(), VoteTally::default());
        let json = serde_json::to_value(&embed).unwrap();
        let names: Vec<_> = json["fields"]
            .as_array()
            .unwrap()
            .iter()
            .map(|f| f["name"].as_str().unwrap().to_string())
            .collect();

        assert!(names.contains(&"📊 Progreso".to_string()));
        assert!(names.contains(&"⏮️ Últimas reproducidas".to_string()));
        assert!(!names.contains(&"🗳️ Votos".to_string()));
        assert_eq!(json["description"], "**now**");
    }

    #[test]
    fn test_now_playing_title_reflects_pause() {
        let mut session = Session::new();
        let current = request("now");
        session.current = Some(current.clone());
        session.mark_started();

        let playing = serde_json::to_value(now_playing_embed(
            &current,
            &session.snapshot(),
            VoteTally::default(),
        ))
        .unwrap();
        assert_eq!(playing["title"], "🎶 Reproduciendo Ahora");

        session.mark_paused();
        let paused = serde_json::to_value(now_playing_embed(
            &current,
            &session.snapshot(),
            VoteTally::default(),
        ))
        .unwrap();
        assert_eq!(paused["title"], "⏸️ En Pausa");
    }

    #[test]
    fn test_radio_settings_embed_lists_values() {
        let config = RadioConfig {
            news_frequency: 7,
            host_personality: crate::radio::HostPersonality::Humorous,
            trivia_enabled: false,
            ..RadioConfig::default()
        };
        let json = serde_json::to_value(radio_settings_embed(&config)).unwrap();
        let values: Vec<_> = json["fields"]
            .as_array()
            .unwrap()
            .iter()
            .map(|f| f["value"].as_str().unwrap().to_string())
            .collect();

        assert!(values.contains(&"Cada 7 canciones".to_string()));
        assert!(values.contains(&"Divertido".to_string()));
        assert!(values.contains(&"❌ Desactivado".to_string()));
    }

    #[test]
    fn test_error_messages_by_kind() {
        assert!(error_message(&PlaybackError::NotInVoiceChannel).contains("canal de voz"));
        let exhausted = PlaybackError::ResolutionExhausted {
            attempts: 3,
            last: ResolveError::NotFound("x".into()),
        };
        assert!(error_message(&exhausted).contains("3 intentos"));
        assert!(error_message(&exhausted).contains("privado"));
        let transport = PlaybackError::Transport(crate::error::TransportError::NotConnected);
        assert!(error_message(&transport).contains("conexión de voz"));
        assert!(error_message(&PlaybackError::InvalidVolume(250)).contains("250%"));
        assert!(error_message(&PlaybackError::NoPreviousTrack).contains("anteriores"));
    }

    #[test]
    fn test_truncate_keeps_char_boundaries() {
        assert_eq!(truncate("canción", 10), "canción");
        assert_eq!(truncate("canción", 4), "can…");
    }
}
