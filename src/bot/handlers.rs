use anyhow::Result;
use chrono::{Local, Timelike};
use serenity::{
    builder::{
        CreateActionRow, CreateEmbed, CreateInteractionResponse,
        CreateInteractionResponseMessage, EditInteractionResponse,
    },
    model::{
        application::{CommandInteraction, ComponentInteraction},
        id::{ChannelId, GuildId, UserId},
    },
    prelude::Context,
};
use tracing::{debug, error, info, warn};

use crate::{
    audio::{controller::PlayOutcome, track::TrackRequest},
    bot::JukeboxBot,
    error::{PlaybackError, MAX_VOLUME_PERCENT},
    radio::{RadioSettingsError, RadioSettingsUpdate},
    sources::is_url,
    storage::VoteKind,
    ui::{
        buttons::{self, button_ids, ButtonAction},
        embeds,
    },
};

const DEFAULT_STATS_LIMIT: usize = 10;

/// Maneja comandos slash
pub async fn handle_command(
    ctx: &Context,
    command: CommandInteraction,
    bot: &JukeboxBot,
) -> Result<()> {
    let guild_id = command
        .guild_id
        .ok_or_else(|| anyhow::anyhow!("Comando usado fuera de un servidor"))?;

    info!(
        "📝 Comando /{} usado por {} en guild {}",
        command.data.name, command.user.name, guild_id
    );

    // Los anuncios van al último canal desde el que se usó el bot.
    bot.announcer.bind_channel(guild_id, command.channel_id);

    match command.data.name.as_str() {
        "play" => handle_play(ctx, &command, bot, guild_id).await?,
        "pause" => handle_pause(ctx, &command, bot, guild_id).await?,
        "resume" => handle_resume(ctx, &command, bot, guild_id).await?,
        "skip" => handle_skip(ctx, &command, bot, guild_id).await?,
        "previous" => handle_previous(ctx, &command, bot, guild_id).await?,
        "replay" => handle_replay(ctx, &command, bot, guild_id).await?,
        "stop" => handle_stop(ctx, &command, bot, guild_id).await?,
        "volume" => handle_volume(ctx, &command, bot, guild_id).await?,
        "queue" => handle_queue(ctx, &command, bot, guild_id).await?,
        "nowplaying" => handle_nowplaying(ctx, &command, bot, guild_id).await?,
        "add_to_playlist" => handle_add_to_playlist(ctx, &command, bot).await?,
        "list_playlist" => handle_list_playlist(ctx, &command, bot).await?,
        "stats" => handle_stats(ctx, &command, bot).await?,
        "radio" => handle_radio(ctx, &command, bot, guild_id).await?,
        "stop_radio" => handle_stop_radio(ctx, &command, bot, guild_id).await?,
        "radio_settings" => handle_radio_settings(ctx, &command, bot).await?,
        _ => {
            command
                .create_response(
                    &ctx.http,
                    CreateInteractionResponse::Message(
                        CreateInteractionResponseMessage::new()
                            .content("❌ Comando no reconocido")
                            .ephemeral(true),
                    ),
                )
                .await?;
        }
    }

    Ok(())
}

/// Maneja interacciones con componentes (botones)
pub async fn handle_component(
    ctx: &Context,
    component: ComponentInteraction,
    bot: &JukeboxBot,
) -> Result<()> {
    let guild_id = component
        .guild_id
        .ok_or_else(|| anyhow::anyhow!("Componente usado fuera de un servidor"))?;

    info!(
        "🔘 Botón {} presionado por {} en guild {}",
        component.data.custom_id, component.user.name, guild_id
    );

    let Some(action) = ButtonAction::parse(&component.data.custom_id) else {
        debug!("Componente no manejado: {}", component.data.custom_id);
        return respond_ephemeral(ctx, &component, "⚠️ Función no implementada").await;
    };

    match action {
        ButtonAction::Vote(kind) => handle_vote(ctx, &component, bot, guild_id, kind).await?,
        ButtonAction::TogglePause => {
            let text = if bot.controller.snapshot(guild_id).paused {
                match bot.controller.resume(guild_id).await {
                    Ok(track) => format!("▶️ Reanudada: **{}**", track.display_name()),
                    Err(e) => embeds::error_message(&e),
                }
            } else {
                match bot.controller.pause(guild_id).await {
                    Ok(track) => format!("⏸️ En pausa: **{}**", track.display_name()),
                    Err(e) => embeds::error_message(&e),
                }
            };
            respond_ephemeral(ctx, &component, &text).await?;
        }
        ButtonAction::Previous => {
            let text = match bot.controller.previous(guild_id).await {
                Ok(track) => format!("⏮️ Volviendo a: **{}**", track.display_name()),
                Err(e) => embeds::error_message(&e),
            };
            respond_ephemeral(ctx, &component, &text).await?;
        }
        ButtonAction::Replay => {
            let text = match bot.controller.replay(guild_id).await {
                Ok(track) => format!("🔄 Desde el principio: **{}**", track.display_name()),
                Err(e) => embeds::error_message(&e),
            };
            respond_ephemeral(ctx, &component, &text).await?;
        }
        ButtonAction::VolumeDown | ButtonAction::VolumeUp => {
            let current = bot.controller.volume(guild_id);
            let level = if action == ButtonAction::VolumeUp {
                (current + buttons::VOLUME_STEP).min(MAX_VOLUME_PERCENT)
            } else {
                current.saturating_sub(buttons::VOLUME_STEP)
            };
            let text = match bot.controller.set_volume(guild_id, level).await {
                Ok(level) => format!("🔊 Volumen: **{}%**", level),
                Err(e) => embeds::error_message(&e),
            };
            respond_ephemeral(ctx, &component, &text).await?;
        }
        ButtonAction::Skip => {
            let text = match bot.controller.skip(guild_id).await {
                Ok(track) => format!("⏭️ Saltada: **{}**", track.display_name()),
                Err(e) => embeds::error_message(&e),
            };
            respond_ephemeral(ctx, &component, &text).await?;
        }
        ButtonAction::Stop => {
            bot.radio.deactivate(guild_id);
            let text = match bot.controller.stop(guild_id).await {
                Ok(()) => "⏹️ Reproducción detenida".to_string(),
                Err(e) => embeds::error_message(&e),
            };
            respond_ephemeral(ctx, &component, &text).await?;
        }
        ButtonAction::ShowQueue => {
            let (embed, rows) = queue_view(bot, guild_id, 1);
            component
                .create_response(
                    &ctx.http,
                    CreateInteractionResponse::Message(
                        CreateInteractionResponseMessage::new()
                            .embed(embed)
                            .components(rows)
                            .ephemeral(true),
                    ),
                )
                .await?;
        }
        ButtonAction::QueuePage(page) => {
            let (embed, rows) = queue_view(bot, guild_id, page);
            update_message(ctx, &component, embed, rows).await?;
        }
        ButtonAction::PlaylistPage(page) => {
            let (embed, rows) = playlist_view(bot, page);
            update_message(ctx, &component, embed, rows).await?;
        }
    }

    Ok(())
}

// Handlers específicos para cada comando

async fn handle_play(
    ctx: &Context,
    command: &CommandInteraction,
    bot: &JukeboxBot,
    guild_id: GuildId,
) -> Result<()> {
    let query = option_str(command, "query").map(str::trim).filter(|q| !q.is_empty());

    // Defer la respuesta ya que la resolución puede tomar tiempo
    command.defer(&ctx.http).await?;

    let request = query.map(|q| TrackRequest::user(q, command.user.id));
    let queued = request.clone();
    let embed = match join_caller(ctx, bot, guild_id, command.user.id).await {
        Ok(()) => match bot.controller.request_play(guild_id, request).await {
            Ok(outcome) => outcome_embed(outcome, queued.as_ref()),
            Err(e) => embeds::error_embed("No se pudo reproducir", &embeds::error_message(&e)),
        },
        Err(e) => embeds::error_embed("No se pudo reproducir", &embeds::error_message(&e)),
    };

    command
        .edit_response(&ctx.http, EditInteractionResponse::new().embed(embed))
        .await?;

    Ok(())
}

fn outcome_embed(outcome: PlayOutcome, request: Option<&TrackRequest>) -> CreateEmbed {
    match outcome {
        PlayOutcome::Started(track) => embeds::success_embed(
            "Reproduciendo",
            &format!("▶️ **{}**", track.display_name()),
        ),
        PlayOutcome::Queued { position } => match request {
            Some(track) => embeds::track_queued_embed(track, position),
            None => embeds::info_embed(
                "Agregada a la cola",
                &format!("Posición {} en la cola", position),
            ),
        },
        PlayOutcome::AlreadyActive => {
            embeds::info_embed("Ya estoy reproduciendo", "La música ya está sonando 🎶")
        }
        PlayOutcome::NothingToPlay => embeds::info_embed(
            "Nada para reproducir",
            "La cola y la playlist están vacías. Usa `/add_to_playlist` para sumar canciones.",
        ),
        PlayOutcome::Cancelled => embeds::info_embed(
            "Reproducción cancelada",
            "La sesión se detuvo antes de empezar.",
        ),
    }
}

async fn handle_skip(
    ctx: &Context,
    command: &CommandInteraction,
    bot: &JukeboxBot,
    guild_id: GuildId,
) -> Result<()> {
    let embed = match bot.controller.skip(guild_id).await {
        Ok(track) => embeds::success_embed("Saltada", &format!("⏭️ **{}**", track.display_name())),
        Err(e) => embeds::error_embed("No se pudo saltar", &embeds::error_message(&e)),
    };

    respond_embed(ctx, command, embed, Vec::new()).await
}

async fn handle_pause(
    ctx: &Context,
    command: &CommandInteraction,
    bot: &JukeboxBot,
    guild_id: GuildId,
) -> Result<()> {
    let embed = match bot.controller.pause(guild_id).await {
        Ok(track) => embeds::success_embed("En pausa", &format!("⏸️ **{}**", track.display_name())),
        Err(e) => embeds::error_embed("No se pudo pausar", &embeds::error_message(&e)),
    };

    respond_embed(ctx, command, embed, Vec::new()).await
}

async fn handle_resume(
    ctx: &Context,
    command: &CommandInteraction,
    bot: &JukeboxBot,
    guild_id: GuildId,
) -> Result<()> {
    let embed = match bot.controller.resume(guild_id).await {
        Ok(track) => embeds::success_embed("Reanudada", &format!("▶️ **{}**", track.display_name())),
        Err(e) => embeds::error_embed("No se pudo reanudar", &embeds::error_message(&e)),
    };

    respond_embed(ctx, command, embed, Vec::new()).await
}

async fn handle_previous(
    ctx: &Context,
    command: &CommandInteraction,
    bot: &JukeboxBot,
    guild_id: GuildId,
) -> Result<()> {
    let embed = match bot.controller.previous(guild_id).await {
        Ok(track) => embeds::success_embed(
            "Canción anterior",
            &format!("⏮️ **{}**", track.display_name()),
        ),
        Err(e) => embeds::error_embed("No se pudo volver", &embeds::error_message(&e)),
    };

    respond_embed(ctx, command, embed, Vec::new()).await
}

async fn handle_replay(
    ctx: &Context,
    command: &CommandInteraction,
    bot: &JukeboxBot,
    guild_id: GuildId,
) -> Result<()> {
    let embed = match bot.controller.replay(guild_id).await {
        Ok(track) => embeds::success_embed(
            "Desde el principio",
            &format!("🔄 **{}**", track.display_name()),
        ),
        Err(e) => embeds::error_embed("No se pudo repetir", &embeds::error_message(&e)),
    };

    respond_embed(ctx, command, embed, Vec::new()).await
}

/// Sin nivel solo informa el volumen actual.
async fn handle_volume(
    ctx: &Context,
    command: &CommandInteraction,
    bot: &JukeboxBot,
    guild_id: GuildId,
) -> Result<()> {
    let Some(level) = option_int(command, "level") else {
        let embed = embeds::info_embed(
            "Volumen",
            &format!("🔊 Volumen actual: **{}%**", bot.controller.volume(guild_id)),
        );
        return respond_embed(ctx, command, embed, Vec::new()).await;
    };

    let level = u16::try_from(level).unwrap_or(u16::MAX);
    let embed = match bot.controller.set_volume(guild_id, level).await {
        Ok(level) => embeds::success_embed("Volumen", &format!("🔊 Volumen ajustado a **{}%**", level)),
        Err(e) => embeds::error_embed("No se pudo ajustar el volumen", &embeds::error_message(&e)),
    };

    respond_embed(ctx, command, embed, Vec::new()).await
}

async fn handle_stop(
    ctx: &Context,
    command: &CommandInteraction,
    bot: &JukeboxBot,
    guild_id: GuildId,
) -> Result<()> {
    command.defer(&ctx.http).await?;
    bot.radio.deactivate(guild_id);

    let embed = match bot.controller.stop(guild_id).await {
        Ok(()) => embeds::success_embed(
            "Reproducción detenida",
            "⏹️ Cola vaciada y canal de voz liberado",
        ),
        Err(e) => embeds::error_embed("No se pudo detener", &embeds::error_message(&e)),
    };

    command
        .edit_response(&ctx.http, EditInteractionResponse::new().embed(embed))
        .await?;

    Ok(())
}

async fn handle_queue(
    ctx: &Context,
    command: &CommandInteraction,
    bot: &JukeboxBot,
    guild_id: GuildId,
) -> Result<()> {
    let page = option_page(command, "page");
    let (embed, rows) = queue_view(bot, guild_id, page);
    respond_embed(ctx, command, embed, rows).await
}

async fn handle_nowplaying(
    ctx: &Context,
    command: &CommandInteraction,
    bot: &JukeboxBot,
    guild_id: GuildId,
) -> Result<()> {
    let snapshot = bot.controller.snapshot(guild_id);

    match &snapshot.current {
        Some(current) => {
            let votes = bot.stats.votes_for(&current.title).await;
            let mut embed = embeds::now_playing_embed(current, &snapshot, votes);
            if let Some(stats) = bot.stats.stats_for(&current.title).await {
                embed = embed.field(
                    "🔁 Reproducciones",
                    format!("{} · 🌡️ {:.2}", stats.played_count, stats.temperature()),
                    true,
                );
            }
            respond_embed(ctx, command, embed, buttons::now_playing_buttons()).await
        }
        None => {
            command
                .create_response(
                    &ctx.http,
                    CreateInteractionResponse::Message(
                        CreateInteractionResponseMessage::new()
                            .content(embeds::error_message(&PlaybackError::NothingPlaying))
                            .ephemeral(true),
                    ),
                )
                .await?;
            Ok(())
        }
    }
}

async fn handle_add_to_playlist(
    ctx: &Context,
    command: &CommandInteraction,
    bot: &JukeboxBot,
) -> Result<()> {
    let url = option_str(command, "url").unwrap_or_default().trim();
    let title = option_str(command, "title").unwrap_or_default().trim();
    let artist = option_str(command, "artist").unwrap_or_default().trim();

    if !is_url(url) {
        let embed = embeds::error_embed("URL inválida", "La canción debe ser un enlace http(s).");
        return respond_embed(ctx, command, embed, Vec::new()).await;
    }

    let embed = match bot.controller.playlist().append(url, title, artist).await {
        Ok(entry) => {
            info!("📥 {} agregó a la playlist: {}", command.user.name, entry.source);
            embeds::playlist_added_embed(&entry)
        }
        Err(e) => {
            error!("❌ Error escribiendo la playlist: {}", e);
            embeds::error_embed("No se pudo guardar", embeds::kind_message(e.kind()))
        }
    };

    respond_embed(ctx, command, embed, Vec::new()).await
}

async fn handle_list_playlist(
    ctx: &Context,
    command: &CommandInteraction,
    bot: &JukeboxBot,
) -> Result<()> {
    let (embed, rows) = playlist_view(bot, option_page(command, "page"));
    respond_embed(ctx, command, embed, rows).await
}

async fn handle_stats(ctx: &Context, command: &CommandInteraction, bot: &JukeboxBot) -> Result<()> {
    let limit = option_int(command, "limit")
        .and_then(|n| usize::try_from(n).ok())
        .filter(|n| *n > 0)
        .unwrap_or(DEFAULT_STATS_LIMIT);

    let hottest = bot.stats.hottest(limit).await;
    respond_embed(ctx, command, embeds::stats_embed(&hottest), Vec::new()).await
}

async fn handle_radio(
    ctx: &Context,
    command: &CommandInteraction,
    bot: &JukeboxBot,
    guild_id: GuildId,
) -> Result<()> {
    if bot.radio.is_active(guild_id) {
        let embed = embeds::info_embed("Radio", "📻 El modo radio ya está activo.");
        return respond_embed(ctx, command, embed, Vec::new()).await;
    }

    command.defer(&ctx.http).await?;

    if let Err(e) = join_caller(ctx, bot, guild_id, command.user.id).await {
        let embed = embeds::error_embed("No se pudo iniciar la radio", &embeds::error_message(&e));
        command
            .edit_response(&ctx.http, EditInteractionResponse::new().embed(embed))
            .await?;
        return Ok(());
    }

    let greeting = bot.radio.activate(guild_id, Local::now().hour());
    command
        .edit_response(
            &ctx.http,
            EditInteractionResponse::new().embed(embeds::radio_greeting_embed(&greeting)),
        )
        .await?;

    match bot.controller.request_play(guild_id, None).await {
        Ok(outcome) => debug!("Radio en guild {}: {:?}", guild_id, outcome),
        Err(e) => warn!("⚠️ La radio no pudo arrancar en guild {}: {}", guild_id, e),
    }

    Ok(())
}

async fn handle_stop_radio(
    ctx: &Context,
    command: &CommandInteraction,
    bot: &JukeboxBot,
    guild_id: GuildId,
) -> Result<()> {
    command.defer(&ctx.http).await?;

    let embed = if bot.radio.deactivate(guild_id) {
        match bot.controller.stop(guild_id).await {
            Ok(()) => embeds::success_embed("Radio apagada", "📻 ¡Gracias por escuchar!"),
            Err(e) => embeds::error_embed("No se pudo detener", &embeds::error_message(&e)),
        }
    } else {
        embeds::info_embed("Radio", "El modo radio no estaba activo.")
    };

    command
        .edit_response(&ctx.http, EditInteractionResponse::new().embed(embed))
        .await?;

    Ok(())
}

async fn handle_radio_settings(
    ctx: &Context,
    command: &CommandInteraction,
    bot: &JukeboxBot,
) -> Result<()> {
    let allowed = command
        .member
        .as_ref()
        .and_then(|member| member.permissions)
        .is_some_and(|permissions| permissions.manage_guild());
    if !allowed {
        let embed = embeds::error_embed(
            "Sin permisos",
            "Necesitas el permiso **Gestionar servidor** para cambiar la radio.",
        );
        return respond_embed_ephemeral(ctx, command, embed).await;
    }

    let update = RadioSettingsUpdate {
        news_enabled: option_bool(command, "news"),
        trivia_enabled: option_bool(command, "trivia"),
        news_frequency: option_int(command, "news_frequency")
            .map(|n| u32::try_from(n).unwrap_or(u32::MAX)),
        host_personality: option_str(command, "personality").map(str::to_string),
        time_based_content: option_bool(command, "time_based"),
    };

    if update.is_empty() {
        let embed = embeds::radio_settings_embed(&bot.radio.config());
        return respond_embed_ephemeral(ctx, command, embed).await;
    }

    let embed = match bot.radio.update_settings(&update).await {
        Ok(config) => {
            info!("📻 {} cambió la configuración de radio", command.user.name);
            embeds::radio_settings_embed(&config)
        }
        Err(RadioSettingsError::Save(e)) => {
            error!("❌ Error guardando la configuración de radio: {:?}", e);
            embeds::error_embed("No se pudo guardar", "La configuración no cambió.")
        }
        Err(e) => embeds::error_embed("Configuración inválida", &e.to_string()),
    };

    respond_embed_ephemeral(ctx, command, embed).await
}

async fn handle_vote(
    ctx: &Context,
    component: &ComponentInteraction,
    bot: &JukeboxBot,
    guild_id: GuildId,
    kind: VoteKind,
) -> Result<()> {
    let Some(current) = bot.controller.snapshot(guild_id).current else {
        let text = embeds::error_message(&PlaybackError::NothingPlaying);
        return respond_ephemeral(ctx, component, &text).await;
    };

    let text = match bot.stats.record_vote(&current.title, component.user.id, kind).await {
        Ok(true) => {
            if kind == VoteKind::Report {
                warn!(
                    "⚠️ {} ({}) reportó la canción \"{}\" en guild {}",
                    component.user.name, component.user.id, current.title, guild_id
                );
                "⚠️ Gracias, la canción fue reportada a los moderadores".to_string()
            } else {
                format!("{} ¡Voto registrado!", kind.emoji())
            }
        }
        Ok(false) => format!("{} Ya habías votado por esta canción", kind.emoji()),
        Err(e) => {
            error!("Error registrando voto: {:?}", e);
            "❌ No se pudo registrar el voto".to_string()
        }
    };

    respond_ephemeral(ctx, component, &text).await
}

// Vistas paginadas

fn queue_view(bot: &JukeboxBot, guild_id: GuildId, page: usize) -> (CreateEmbed, Vec<CreateActionRow>) {
    let snapshot = bot.controller.snapshot(guild_id);
    let queue_page = snapshot.page(page, embeds::QUEUE_PAGE_SIZE);
    let embed = embeds::queue_embed(&snapshot, queue_page.current_page);

    let rows = if queue_page.total_pages > 1 {
        vec![buttons::pagination_buttons(
            button_ids::QUEUE_PAGE,
            queue_page.current_page,
            queue_page.total_pages,
        )]
    } else {
        Vec::new()
    };

    (embed, rows)
}

fn playlist_view(bot: &JukeboxBot, page: usize) -> (CreateEmbed, Vec<CreateActionRow>) {
    let entries = bot.controller.playlist().snapshot();
    let total_pages = entries.len().div_ceil(embeds::PLAYLIST_PAGE_SIZE).max(1);
    let page = page.clamp(1, total_pages);
    let embed = embeds::playlist_embed(&entries, page);

    let rows = if total_pages > 1 {
        vec![buttons::pagination_buttons(
            button_ids::PLAYLIST_PAGE,
            page,
            total_pages,
        )]
    } else {
        Vec::new()
    };

    (embed, rows)
}

// Funciones auxiliares

async fn join_caller(
    ctx: &Context,
    bot: &JukeboxBot,
    guild_id: GuildId,
    user_id: UserId,
) -> Result<(), PlaybackError> {
    let channel = get_user_voice_channel(ctx, guild_id, user_id)
        .ok_or(PlaybackError::NotInVoiceChannel)?;
    bot.controller.join(guild_id, channel).await
}

fn get_user_voice_channel(ctx: &Context, guild_id: GuildId, user_id: UserId) -> Option<ChannelId> {
    let guild = guild_id.to_guild_cached(&ctx.cache)?;

    guild
        .voice_states
        .get(&user_id)
        .and_then(|voice_state| voice_state.channel_id)
}

fn option_str<'a>(command: &'a CommandInteraction, name: &str) -> Option<&'a str> {
    command
        .data
        .options
        .iter()
        .find(|opt| opt.name == name)
        .and_then(|opt| opt.value.as_str())
}

fn option_bool(command: &CommandInteraction, name: &str) -> Option<bool> {
    command
        .data
        .options
        .iter()
        .find(|opt| opt.name == name)
        .and_then(|opt| opt.value.as_bool())
}

fn option_int(command: &CommandInteraction, name: &str) -> Option<i64> {
    command
        .data
        .options
        .iter()
        .find(|opt| opt.name == name)
        .and_then(|opt| opt.value.as_i64())
}

fn option_page(command: &CommandInteraction, name: &str) -> usize {
    option_int(command, name)
        .and_then(|n| usize::try_from(n).ok())
        .unwrap_or(1)
        .max(1)
}

async fn respond_embed(
    ctx: &Context,
    command: &CommandInteraction,
    embed: CreateEmbed,
    rows: Vec<CreateActionRow>,
) -> Result<()> {
    command
        .create_response(
            &ctx.http,
            CreateInteractionResponse::Message(
                CreateInteractionResponseMessage::new()
                    .embed(embed)
                    .components(rows),
            ),
        )
        .await?;

    Ok(())
}

async fn respond_embed_ephemeral(
    ctx: &Context,
    command: &CommandInteraction,
    embed: CreateEmbed,
) -> Result<()> {
    command
        .create_response(
            &ctx.http,
            CreateInteractionResponse::Message(
                CreateInteractionResponseMessage::new()
                    .embed(embed)
                    .ephemeral(true),
            ),
        )
        .await?;

    Ok(())
}

async fn respond_ephemeral(ctx: &Context, component: &ComponentInteraction, content: &str) -> Result<()> {
    component
        .create_response(
            &ctx.http,
            CreateInteractionResponse::Message(
                CreateInteractionResponseMessage::new()
                    .content(content)
                    .ephemeral(true),
            ),
        )
        .await?;

    Ok(())
}

async fn update_message(
    ctx: &Context,
    component: &ComponentInteraction,
    embed: CreateEmbed,
    rows: Vec<CreateActionRow>,
) -> Result<()> {
    component
        .create_response(
            &ctx.http,
            CreateInteractionResponse::UpdateMessage(
                CreateInteractionResponseMessage::new()
                    .embed(embed)
                    .components(rows),
            ),
        )
        .await?;

    Ok(())
}
