//! # Bot Module
//!
//! Discord event handling for Encore.
//!
//! Command parsing and message rendering live outside this crate; the bot only
//! keeps guild playback sessions in step with the voice gateway:
//!
//! - `ready`: connection logging
//! - `voice_state_update`: tears down a guild's session when Discord drops the
//!   bot from voice

use serenity::{
    all::{Context, EventHandler, Ready, VoiceState},
    async_trait,
};
use std::sync::Arc;
use tracing::{debug, info};

use crate::audio::voice::VoiceManager;

/// Main Discord event handler.
pub struct EncoreBot {
    voice: Arc<VoiceManager>,
}

impl EncoreBot {
    pub fn new(voice: Arc<VoiceManager>) -> Self {
        Self { voice }
    }
}

#[async_trait]
impl EventHandler for EncoreBot {
    async fn ready(&self, _ctx: Context, ready: Ready) {
        info!("🤖 {} está en línea!", ready.user.name);
        info!("📊 Conectado a {} servidores", ready.guilds.len());
    }

    async fn voice_state_update(&self, ctx: Context, old: Option<VoiceState>, new: VoiceState) {
        // Sólo interesa el estado de voz del propio bot
        let current_user_id = ctx.cache.current_user().id;
        if new.user_id != current_user_id {
            return;
        }

        if old.is_some() && new.channel_id.is_none() {
            if let Some(guild_id) = new.guild_id {
                info!("🔌 Bot desconectado en guild {}", guild_id);

                match self.voice.teardown(guild_id).await {
                    Some(cleared) => debug!(
                        "Sesión de guild {} cerrada, {} tracks descartados",
                        guild_id, cleared
                    ),
                    None => debug!("Guild {} no tenía sesión activa", guild_id),
                }
            }
        }
    }
}
