use anyhow::Result;
use serenity::{
    builder::{CreateCommand, CreateCommandOption},
    model::{application::CommandOptionType, id::GuildId, permissions::Permissions},
    prelude::Context,
};

use crate::error::MAX_VOLUME_PERCENT;
use crate::radio::{HostPersonality, NEWS_FREQUENCY_RANGE};

/// Registra comandos globales
pub async fn register_global_commands(ctx: &Context) -> Result<()> {
    for command in all_commands() {
        ctx.http.create_global_command(&command).await?;
    }

    Ok(())
}

/// Registra comandos para una guild específica (desarrollo)
pub async fn register_guild_commands(ctx: &Context, guild_id: GuildId) -> Result<()> {
    guild_id.set_commands(&ctx.http, all_commands()).await?;

    Ok(())
}

pub fn all_commands() -> Vec<CreateCommand> {
    vec![
        play_command(),
        pause_command(),
        resume_command(),
        skip_command(),
        previous_command(),
        replay_command(),
        stop_command(),
        volume_command(),
        queue_command(),
        nowplaying_command(),
        add_to_playlist_command(),
        list_playlist_command(),
        stats_command(),
        radio_command(),
        stop_radio_command(),
        radio_settings_command(),
    ]
}

// Comandos de reproducción

fn play_command() -> CreateCommand {
    CreateCommand::new("play")
        .description("Reproduce una canción, o la playlist aleatoria si no indicas nada")
        .add_option(CreateCommandOption::new(
            CommandOptionType::String,
            "query",
            "URL o término de búsqueda",
        ))
}

fn pause_command() -> CreateCommand {
    CreateCommand::new("pause").description("Pausa la reproducción actual")
}

fn resume_command() -> CreateCommand {
    CreateCommand::new("resume").description("Reanuda la reproducción pausada")
}

fn skip_command() -> CreateCommand {
    CreateCommand::new("skip").description("Salta a la siguiente canción")
}

fn previous_command() -> CreateCommand {
    CreateCommand::new("previous").description("Vuelve a la canción anterior")
}

fn replay_command() -> CreateCommand {
    CreateCommand::new("replay").description("Reinicia la canción actual desde el principio")
}

fn volume_command() -> CreateCommand {
    CreateCommand::new("volume")
        .description("Ajusta el volumen de reproducción")
        .add_option(
            CreateCommandOption::new(
                CommandOptionType::Integer,
                "level",
                format!("Nivel de volumen (0-{})", MAX_VOLUME_PERCENT),
            )
            .min_int_value(0)
            .max_int_value(u64::from(MAX_VOLUME_PERCENT)),
        )
}

fn stop_command() -> CreateCommand {
    CreateCommand::new("stop").description("Detiene la reproducción, vacía la cola y desconecta")
}

fn queue_command() -> CreateCommand {
    CreateCommand::new("queue")
        .description("Muestra la cola de reproducción")
        .add_option(
            CreateCommandOption::new(CommandOptionType::Integer, "page", "Número de página")
                .min_int_value(1),
        )
}

fn nowplaying_command() -> CreateCommand {
    CreateCommand::new("nowplaying").description("Muestra la canción actual")
}

// Comandos de playlist

fn add_to_playlist_command() -> CreateCommand {
    CreateCommand::new("add_to_playlist")
        .description("Agrega una canción a la playlist del servidor")
        .add_option(
            CreateCommandOption::new(CommandOptionType::String, "url", "URL de la canción")
                .required(true),
        )
        .add_option(
            CreateCommandOption::new(CommandOptionType::String, "title", "Título")
                .required(true),
        )
        .add_option(
            CreateCommandOption::new(CommandOptionType::String, "artist", "Artista")
                .required(true),
        )
}

fn list_playlist_command() -> CreateCommand {
    CreateCommand::new("list_playlist")
        .description("Muestra las canciones de la playlist")
        .add_option(
            CreateCommandOption::new(CommandOptionType::Integer, "page", "Número de página")
                .min_int_value(1),
        )
}

fn stats_command() -> CreateCommand {
    CreateCommand::new("stats")
        .description("Muestra las canciones más populares")
        .add_option(
            CreateCommandOption::new(CommandOptionType::Integer, "limit", "Cantidad de canciones")
                .min_int_value(1)
                .max_int_value(25),
        )
}

// Modo radio

fn radio_command() -> CreateCommand {
    CreateCommand::new("radio").description("Activa el modo radio con presentaciones y noticias")
}

fn stop_radio_command() -> CreateCommand {
    CreateCommand::new("stop_radio").description("Desactiva el modo radio y detiene la reproducción")
}

/// Sin opciones muestra la configuración actual.
fn radio_settings_command() -> CreateCommand {
    let mut personality = CreateCommandOption::new(
        CommandOptionType::String,
        "personality",
        "Estilo del presentador",
    );
    for choice in HostPersonality::ALL {
        personality = personality.add_string_choice(choice.label(), choice.as_str());
    }

    CreateCommand::new("radio_settings")
        .description("Configura el modo radio")
        .default_member_permissions(Permissions::MANAGE_GUILD)
        .add_option(CreateCommandOption::new(
            CommandOptionType::Boolean,
            "news",
            "Boletines de noticias",
        ))
        .add_option(CreateCommandOption::new(
            CommandOptionType::Boolean,
            "trivia",
            "Datos curiosos al presentar canciones",
        ))
        .add_option(
            CreateCommandOption::new(
                CommandOptionType::Integer,
                "news_frequency",
                "Canciones entre boletines (3-10)",
            )
            .min_int_value(u64::from(*NEWS_FREQUENCY_RANGE.start()))
            .max_int_value(u64::from(*NEWS_FREQUENCY_RANGE.end())),
        )
        .add_option(personality)
        .add_option(CreateCommandOption::new(
            CommandOptionType::Boolean,
            "time_based",
            "Frecuencia de noticias según la hora",
        ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_names_are_unique() {
        let names: Vec<String> = all_commands()
            .iter()
            .map(|c| serde_json::to_value(c).unwrap()["name"].as_str().unwrap().to_string())
            .collect();

        let mut unique = names.clone();
        unique.sort();
        unique.dedup();
        assert_eq!(unique.len(), names.len());
        assert!(names.contains(&"add_to_playlist".to_string()));
        assert!(names.contains(&"radio_settings".to_string()));
        assert_eq!(names.len(), 16);
    }

    #[test]
    fn test_radio_settings_requires_manage_guild() {
        let json = serde_json::to_value(radio_settings_command()).unwrap();
        assert_eq!(
            json["default_member_permissions"],
            Permissions::MANAGE_GUILD.bits().to_string()
        );

        let options = json["options"].as_array().unwrap();
        assert!(options.iter().all(|o| o["required"] != true));
        let personality = options.iter().find(|o| o["name"] == "personality").unwrap();
        assert_eq!(personality["choices"].as_array().unwrap().len(), 4);
    }
}
