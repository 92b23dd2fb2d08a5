use dashmap::DashMap;
use serenity::model::id::GuildId;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use super::{
    backend::{PlaybackBackend, PlaybackEvent},
    player::{Advance, GuildPlayer},
};

pub type EventSender = mpsc::UnboundedSender<PlaybackEvent>;
pub type EventReceiver = mpsc::UnboundedReceiver<PlaybackEvent>;

/// Canal por el que el backend notifica los fines de track de una sesión
pub fn event_channel() -> (EventSender, EventReceiver) {
    mpsc::unbounded_channel()
}

/// Sesión de voz de un guild: su reproductor más la única suscripción a
/// eventos de fin de track, creada una sola vez al iniciar la sesión.
pub struct GuildSession {
    player: Arc<GuildPlayer>,
    shutdown: CancellationToken,
}

impl GuildSession {
    /// Crea el reproductor y lanza la tarea que consume `events`
    ///
    /// Debe llamarse dentro de un runtime de tokio.
    pub fn start(
        guild_id: GuildId,
        backend: Arc<dyn PlaybackBackend>,
        events: EventReceiver,
    ) -> Self {
        let player = Arc::new(GuildPlayer::new(guild_id, backend));
        let shutdown = CancellationToken::new();

        tokio::spawn(run_event_pump(player.clone(), events, shutdown.clone()));
        info!("🔗 Sesión de reproducción creada para guild {}", guild_id);

        Self { player, shutdown }
    }

    pub fn guild_id(&self) -> GuildId {
        self.player.guild_id()
    }

    pub fn player(&self) -> &Arc<GuildPlayer> {
        &self.player
    }

    pub fn is_shut_down(&self) -> bool {
        self.shutdown.is_cancelled()
    }

    /// Corta la suscripción de eventos, detiene y cierra el reproductor
    ///
    /// Quien aún tenga el `GuildPlayer` recibe `SessionClosed` al encolar.
    /// Se puede llamar varias veces; devuelve los tracks pendientes descartados.
    pub async fn shutdown(&self) -> usize {
        self.shutdown.cancel();
        let cleared = self.player.shutdown().await;
        info!("👋 Sesión cerrada para guild {}", self.guild_id());
        cleared
    }
}

impl Drop for GuildSession {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

async fn run_event_pump(
    player: Arc<GuildPlayer>,
    mut events: EventReceiver,
    shutdown: CancellationToken,
) {
    loop {
        let event = tokio::select! {
            _ = shutdown.cancelled() => break,
            event = events.recv() => event,
        };

        let Some(PlaybackEvent::Finished(id)) = event else {
            debug!("Canal de eventos cerrado para guild {}", player.guild_id());
            break;
        };

        match player.on_track_finished(id).await {
            Ok(Advance::Playing(track)) => {
                debug!("Avance automático en guild {}: {}", player.guild_id(), track)
            }
            Ok(Advance::Idle) | Ok(Advance::Ignored) => {}
            Err(e) => error!(
                "Error al reproducir siguiente track en guild {}: {}",
                player.guild_id(),
                e
            ),
        }
    }

    debug!("Tarea de eventos terminada para guild {}", player.guild_id());
}

/// Sesiones activas, una por guild
///
/// No hay estado compartido entre guilds: cada entrada tiene su propio
/// reproductor, cola y lock.
#[derive(Default)]
pub struct SessionRegistry {
    sessions: DashMap<GuildId, Arc<GuildSession>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, guild_id: GuildId) -> Option<Arc<GuildSession>> {
        self.sessions.get(&guild_id).map(|entry| entry.value().clone())
    }

    /// Registra la sesión; si el guild ya tenía una se conserva la existente
    pub fn insert(&self, session: GuildSession) -> Arc<GuildSession> {
        self.sessions
            .entry(session.guild_id())
            .or_insert_with(|| Arc::new(session))
            .clone()
    }

    /// Cierra y elimina la sesión del guild
    pub async fn remove(&self, guild_id: GuildId) -> Option<usize> {
        let (_, session) = self.sessions.remove(&guild_id)?;
        Some(session.shutdown().await)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::{
        backend::{MockPlaybackBackend, PlaybackId},
        track::Track,
    };
    use pretty_assertions::assert_eq;

    fn idle_backend() -> Arc<dyn PlaybackBackend> {
        let mut backend = MockPlaybackBackend::new();
        backend.expect_stop().returning(|| ());
        backend
            .expect_start_playback()
            .returning(|_| Ok(PlaybackId::new()));
        Arc::new(backend)
    }

    #[tokio::test]
    async fn test_registry_keeps_guilds_independent() {
        let registry = SessionRegistry::new();
        let (_tx_a, rx_a) = event_channel();
        let (_tx_b, rx_b) = event_channel();
        let a = registry.insert(GuildSession::start(GuildId::new(1), idle_backend(), rx_a));
        let b = registry.insert(GuildSession::start(GuildId::new(2), idle_backend(), rx_b));

        a.player()
            .submit(Track::new("A", "Artist", "https://example.com/a"))
            .await
            .unwrap();
        a.player()
            .submit(Track::new("B", "Artist", "https://example.com/b"))
            .await
            .unwrap();

        assert_eq!(registry.len(), 2);
        assert!(a.player().is_playing().await);
        assert!(!b.player().is_playing().await);

        assert_eq!(registry.remove(GuildId::new(1)).await, Some(1));
        assert!(a.is_shut_down());
        assert!(!a.player().is_playing().await);
        assert!(registry.get(GuildId::new(1)).is_none());
        assert!(registry.get(GuildId::new(2)).is_some());
        assert_eq!(registry.remove(GuildId::new(1)).await, None);
    }

    #[tokio::test]
    async fn test_insert_keeps_existing_session() {
        let registry = SessionRegistry::new();
        let (_tx, rx) = event_channel();
        let first = registry.insert(GuildSession::start(GuildId::new(9), idle_backend(), rx));

        let (_tx2, rx2) = event_channel();
        let second = registry.insert(GuildSession::start(GuildId::new(9), idle_backend(), rx2));

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(registry.len(), 1);
    }

    #[tokio::test]
    async fn test_shutdown_is_repeatable() {
        let (_tx, rx) = event_channel();
        let session = GuildSession::start(GuildId::new(3), idle_backend(), rx);

        assert_eq!(session.shutdown().await, 0);
        assert_eq!(session.shutdown().await, 0);
        assert!(session.is_shut_down());
    }

    #[tokio::test]
    async fn test_player_kept_after_shutdown_rejects_submits() {
        let mut backend = MockPlaybackBackend::new();
        backend.expect_stop().returning(|| ());
        backend.expect_start_playback().never();
        let (_tx, rx) = event_channel();
        let session = GuildSession::start(GuildId::new(4), Arc::new(backend), rx);
        let player = session.player().clone();

        session.shutdown().await;
        assert_eq!(
            player
                .submit(Track::new("A", "Artist", "https://example.com/a"))
                .await,
            Err(crate::audio::PlaybackError::SessionClosed)
        );
        assert!(!player.is_playing().await);
    }
}
