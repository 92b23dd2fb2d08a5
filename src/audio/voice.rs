use dashmap::DashMap;
use serenity::model::id::{ChannelId, GuildId};
use serenity::prelude::TypeMapKey;
use songbird::Songbird;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, info};

use super::{
    error::{PlaybackError, PlaybackResult},
    player::{GuildPlayer, SubmitOutcome},
    resolver::{TrackResolver, YoutubeResolver},
    session::{event_channel, GuildSession, SessionRegistry},
    songbird_backend::SongbirdBackend,
};
use crate::config::Config;

/// Conexiones de voz y sesiones de reproducción por guild
pub struct VoiceManager {
    songbird: Arc<Songbird>,
    sessions: SessionRegistry,
    http: reqwest::Client,
    config: Arc<Config>,
    resolver: Arc<dyn TrackResolver>,
    membership: GuildLocks,
}

impl VoiceManager {
    pub fn new(songbird: Arc<Songbird>, config: Arc<Config>) -> Self {
        let http = reqwest::Client::new();
        let resolver = Arc::new(YoutubeResolver::new(http.clone()));
        Self::with_resolver(songbird, config, http, resolver)
    }

    pub fn with_resolver(
        songbird: Arc<Songbird>,
        config: Arc<Config>,
        http: reqwest::Client,
        resolver: Arc<dyn TrackResolver>,
    ) -> Self {
        Self {
            songbird,
            sessions: SessionRegistry::new(),
            http,
            config,
            resolver,
            membership: GuildLocks::default(),
        }
    }

    pub fn sessions(&self) -> &SessionRegistry {
        &self.sessions
    }

    /// Reproductor del guild, si hay sesión activa
    pub fn player(&self, guild_id: GuildId) -> Option<Arc<GuildPlayer>> {
        self.sessions
            .get(guild_id)
            .map(|session| session.player().clone())
    }

    /// Resuelve `query` (URL o búsqueda) y lo entrega al reproductor del guild
    ///
    /// Falla con `NotConnected` sin sesión y con `TrackNotFound` sin resultados.
    pub async fn play(&self, guild_id: GuildId, query: &str) -> PlaybackResult<SubmitOutcome> {
        let player = self.player(guild_id).ok_or(PlaybackError::NotConnected)?;
        let track = self.resolver.resolve(query).await?;
        debug!("Track resuelto para guild {}: {}", guild_id, track);
        player.submit(track).await
    }

    /// Conecta al canal de voz y crea la sesión del guild si no existe
    pub async fn join(
        &self,
        guild_id: GuildId,
        channel_id: ChannelId,
    ) -> PlaybackResult<Arc<GuildSession>> {
        let _guard = self.membership.acquire(guild_id).await;
        info!("🔗 Conectando al canal {} en guild {}", channel_id, guild_id);

        let call = self
            .songbird
            .join(guild_id, channel_id)
            .await
            .map_err(|e| PlaybackError::Join(e.to_string()))?;

        if let Some(session) = self.sessions.get(guild_id) {
            debug!("Reutilizando sesión existente de guild {}", guild_id);
            return Ok(session);
        }

        let (events_tx, events_rx) = event_channel();
        let backend = SongbirdBackend::attach(
            guild_id,
            call,
            self.http.clone(),
            self.config.default_volume,
            events_tx,
        )
        .await;

        let session = self
            .sessions
            .insert(GuildSession::start(guild_id, Arc::new(backend), events_rx));
        info!("✅ Conectado exitosamente al canal {} en guild {}", channel_id, guild_id);
        Ok(session)
    }

    /// Detiene, limpia la cola, cierra la sesión y desconecta
    pub async fn leave(&self, guild_id: GuildId) -> PlaybackResult<usize> {
        let _guard = self.membership.acquire(guild_id).await;

        let cleared = self
            .sessions
            .remove(guild_id)
            .await
            .ok_or(PlaybackError::NotConnected)?;
        self.drop_voice_events(guild_id).await;

        self.songbird
            .remove(guild_id)
            .await
            .map_err(|e| PlaybackError::Leave(e.to_string()))?;

        info!("👋 Desconectado del guild {}", guild_id);
        Ok(cleared)
    }

    /// Cierra la sesión sin tocar la conexión (Discord ya nos desconectó)
    pub async fn teardown(&self, guild_id: GuildId) -> Option<usize> {
        let _guard = self.membership.acquire(guild_id).await;

        let cleared = self.sessions.remove(guild_id).await?;
        self.drop_voice_events(guild_id).await;
        Some(cleared)
    }

    async fn drop_voice_events(&self, guild_id: GuildId) {
        if let Some(call) = self.songbird.get(guild_id) {
            call.lock().await.remove_all_global_events();
        }
    }
}

impl TypeMapKey for VoiceManager {
    type Value = Arc<VoiceManager>;
}

/// Serializa join/leave de un mismo guild para no crear dos sesiones
///
/// Cada guild tiene su propio lock: un join lento no frena a los demás.
#[derive(Default)]
struct GuildLocks {
    locks: DashMap<GuildId, Arc<Mutex<()>>>,
}

impl GuildLocks {
    async fn acquire(&self, guild_id: GuildId) -> OwnedMutexGuard<()> {
        // Se clona el Arc para no retener la entrada del DashMap durante el await
        let lock = self.locks.entry(guild_id).or_default().clone();
        lock.lock_owned().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::{
        backend::{MockPlaybackBackend, PlaybackId},
        resolver::MockTrackResolver,
        track::Track,
    };
    use pretty_assertions::assert_eq;
    use std::time::Duration;

    fn manager_with(resolver: MockTrackResolver) -> VoiceManager {
        VoiceManager::with_resolver(
            Songbird::serenity(),
            Arc::new(Config::default()),
            reqwest::Client::new(),
            Arc::new(resolver),
        )
    }

    fn playing_session(guild_id: GuildId) -> GuildSession {
        let mut backend = MockPlaybackBackend::new();
        backend
            .expect_start_playback()
            .returning(|_| Ok(PlaybackId::new()));
        backend.expect_stop().returning(|| ());
        let (_tx, rx) = event_channel();
        GuildSession::start(guild_id, Arc::new(backend), rx)
    }

    #[tokio::test]
    async fn test_play_without_session_skips_lookup() {
        let mut resolver = MockTrackResolver::new();
        resolver.expect_resolve().never();
        let manager = manager_with(resolver);

        assert_eq!(
            manager.play(GuildId::new(1), "queen").await,
            Err(PlaybackError::NotConnected)
        );
    }

    #[tokio::test]
    async fn test_play_resolves_query_and_submits() {
        let mut resolver = MockTrackResolver::new();
        resolver
            .expect_resolve()
            .withf(|query| query == "queen")
            .times(1)
            .returning(|_| Ok(Track::new("Bohemian Rhapsody", "Queen", "https://youtu.be/x")));
        let manager = manager_with(resolver);
        manager.sessions().insert(playing_session(GuildId::new(2)));

        assert_eq!(
            manager.play(GuildId::new(2), "queen").await,
            Ok(SubmitOutcome::NowPlaying(Track::new(
                "Bohemian Rhapsody",
                "Queen",
                "https://youtu.be/x"
            )))
        );
    }

    #[tokio::test]
    async fn test_play_with_no_matches_submits_nothing() {
        let mut resolver = MockTrackResolver::new();
        resolver
            .expect_resolve()
            .returning(|query| Err(PlaybackError::TrackNotFound(query.to_string())));
        let manager = manager_with(resolver);
        manager.sessions().insert(playing_session(GuildId::new(3)));

        assert_eq!(
            manager.play(GuildId::new(3), "zzzz").await,
            Err(PlaybackError::TrackNotFound("zzzz".to_string()))
        );
        let player = manager.player(GuildId::new(3)).unwrap();
        assert!(!player.is_playing().await);
        assert!(player.pending().await.is_empty());
    }

    #[tokio::test]
    async fn test_guild_locks_do_not_block_other_guilds() {
        let locks = GuildLocks::default();
        let _held = locks.acquire(GuildId::new(1)).await;

        let other = tokio::time::timeout(
            Duration::from_millis(100),
            locks.acquire(GuildId::new(2)),
        )
        .await;
        assert!(other.is_ok());

        let same = tokio::time::timeout(
            Duration::from_millis(50),
            locks.acquire(GuildId::new(1)),
        )
        .await;
        assert!(same.is_err());
    }

    #[tokio::test]
    async fn test_guild_lock_is_released_on_drop() {
        let locks = GuildLocks::default();
        drop(locks.acquire(GuildId::new(5)).await);

        let again = tokio::time::timeout(
            Duration::from_millis(100),
            locks.acquire(GuildId::new(5)),
        )
        .await;
        assert!(again.is_ok());
    }
}
