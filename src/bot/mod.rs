//! # Bot Module
//!
//! Capa de Discord de Open Jukebox: registro de comandos slash, despacho de
//! interacciones y seguimiento de los estados de voz.
//!
//! [`JukeboxBot`] implementa el [`EventHandler`] de Serenity y delega toda la
//! lógica de reproducción en el
//! [`PlaybackController`](crate::audio::controller::PlaybackController). Los
//! mensajes que no responden a un comando los publica el
//! [`Announcer`](announcer::Announcer).

use anyhow::Result;
use serenity::{
    all::{Context, EventHandler, GuildId, Interaction, Ready, VoiceState},
    async_trait,
};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

pub mod announcer;
pub mod commands;
pub mod handlers;
pub mod voice;

use crate::{
    audio::controller::PlaybackController, config::Config, radio::RadioHost,
    storage::StatsStore,
};
use announcer::Announcer;

pub struct JukeboxBot {
    config: Arc<Config>,
    pub controller: Arc<PlaybackController>,
    pub stats: Arc<StatsStore>,
    pub radio: Arc<RadioHost>,
    pub announcer: Arc<Announcer>,
}

impl JukeboxBot {
    pub fn new(
        config: Arc<Config>,
        controller: Arc<PlaybackController>,
        stats: Arc<StatsStore>,
        radio: Arc<RadioHost>,
        announcer: Arc<Announcer>,
    ) -> Self {
        Self {
            config,
            controller,
            stats,
            radio,
            announcer,
        }
    }

    /// Registra los comandos slash, por guild si hay `GUILD_ID` (propagación
    /// inmediata) o globales si no.
    async fn register_commands(&self, ctx: &Context) -> Result<()> {
        info!("📝 Registrando comandos slash...");

        match self.config.guild_id {
            Some(guild_id) => {
                let guild_id = GuildId::new(guild_id);
                info!("🏠 Registrando comandos para guild específica: {}", guild_id);

                commands::register_guild_commands(ctx, guild_id)
                    .await
                    .map_err(|e| {
                        error!("❌ Error registrando comandos de guild: {:?}", e);
                        anyhow::anyhow!("No se pudieron registrar comandos de guild. Verifica que el bot tenga permisos de 'applications.commands' en la guild.")
                    })?;
                info!("✅ Comandos de guild registrados para: {}", guild_id);
            }
            None => {
                info!("🌐 Registrando comandos globalmente");
                commands::register_global_commands(ctx).await.map_err(|e| {
                    error!("❌ Error registrando comandos globales: {:?}", e);
                    anyhow::anyhow!("No se pudieron registrar comandos globales. Verifica que el bot tenga permisos de 'applications.commands'.")
                })?;
                info!("✅ Comandos globales registrados");
            }
        }

        Ok(())
    }
}

#[async_trait]
impl EventHandler for JukeboxBot {
    async fn ready(&self, ctx: Context, ready: Ready) {
        info!("🤖 {} está en línea!", ready.user.name);
        info!("📊 Conectado a {} servidores", ready.guilds.len());

        if let Err(e) = self.register_commands(&ctx).await {
            error!("Error al registrar comandos: {:?}", e);
        }
    }

    /// Los errores se loguean y nunca tiran el bot. En el peor caso el usuario
    /// ve el aviso de "interacción fallida" de Discord.
    async fn interaction_create(&self, ctx: Context, interaction: Interaction) {
        match interaction {
            Interaction::Command(command_interaction) => {
                if let Err(e) = handlers::handle_command(&ctx, command_interaction, self).await {
                    error!("Error manejando comando: {:?}", e);
                }
            }
            Interaction::Component(component_interaction) => {
                if let Err(e) = handlers::handle_component(&ctx, component_interaction, self).await
                {
                    error!("Error manejando componente: {:?}", e);
                }
            }
            _ => {}
        }
    }

    /// Cualquier cambio de voz en una guild con sesión vuelve a contar a los
    /// oyentes. Si el bot fue sacado del canal se cierra la sesión.
    async fn voice_state_update(&self, ctx: Context, old: Option<VoiceState>, new: VoiceState) {
        let Some(guild_id) = new.guild_id else {
            return;
        };
        if !self.controller.has_session(guild_id) {
            return;
        }

        let current_user_id = ctx.cache.current_user().id;
        if new.user_id == current_user_id && old.is_some() && new.channel_id.is_none() {
            info!("🔌 Bot desconectado en guild {}", guild_id);
            self.radio.deactivate(guild_id);
            if let Err(e) = self.controller.stop(guild_id).await {
                warn!("⚠️ Error al cerrar la sesión en guild {}: {}", guild_id, e);
            }
            return;
        }

        debug!("Estado de voz actualizado en guild {}", guild_id);
        self.controller.refresh_occupancy(guild_id).await;
    }
}
