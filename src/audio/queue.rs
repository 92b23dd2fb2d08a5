use serenity::model::id::GuildId;
use std::collections::VecDeque;
use tracing::{debug, info};

use super::track::Track;

/// Cola FIFO de tracks pendientes de un guild
///
/// No tiene lock propio: vive dentro de la sección crítica del
/// [`GuildPlayer`](super::player::GuildPlayer) junto con el slot "now playing",
/// así que ambos se observan y mutan siempre juntos.
#[derive(Debug)]
pub struct GuildQueue {
    guild_id: GuildId,
    items: VecDeque<Track>,
}

impl GuildQueue {
    pub fn new(guild_id: GuildId) -> Self {
        Self {
            guild_id,
            items: VecDeque::new(),
        }
    }

    pub fn guild_id(&self) -> GuildId {
        self.guild_id
    }

    /// Agrega un track al final de la cola
    pub fn enqueue(&mut self, track: Track) {
        info!("➕ Agregado a la cola de {}: {}", self.guild_id, track);
        self.items.push_back(track);
    }

    /// Obtiene el siguiente track (FIFO - First In, First Out)
    pub fn try_dequeue(&mut self) -> Option<Track> {
        let next = self.items.pop_front();
        match &next {
            Some(track) => debug!("➡️ Siguiente en cola (FIFO): {}", track),
            None => debug!("📭 Cola vacía en guild {}", self.guild_id),
        }
        next
    }

    /// Limpia la cola, devuelve cuántos tracks se descartaron
    pub fn clear(&mut self) -> usize {
        let cleared = self.items.len();
        self.items.clear();
        if cleared > 0 {
            info!("🗑️ Cola limpiada en guild {}: {} tracks removidos", self.guild_id, cleared);
        }
        cleared
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Track> {
        self.items.iter()
    }

    /// Copia de los tracks pendientes en orden de reproducción
    pub fn snapshot(&self) -> Vec<Track> {
        self.items.iter().cloned().collect()
    }
}
