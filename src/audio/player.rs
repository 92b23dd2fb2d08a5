use chrono::{DateTime, Utc};
use serenity::model::id::GuildId;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use super::{
    backend::{PlaybackBackend, PlaybackId},
    error::{PlaybackError, PlaybackResult},
    queue::GuildQueue,
    track::Track,
};

/// Track ocupando el slot "now playing"
#[derive(Debug, Clone, PartialEq)]
pub struct NowPlaying {
    pub id: PlaybackId,
    pub track: Track,
    pub started_at: DateTime<Utc>,
    pub paused: bool,
}

impl NowPlaying {
    fn new(id: PlaybackId, track: Track) -> Self {
        Self {
            id,
            track,
            started_at: Utc::now(),
            paused: false,
        }
    }
}

/// Resultado de [`GuildPlayer::submit`]
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// El reproductor estaba libre y arrancó este track
    NowPlaying(Track),
    /// Quedó en cola; `position` empieza en 1
    Queued { track: Track, position: usize },
}

/// Resultado de avanzar la cola tras un fin de track
#[derive(Debug, Clone, PartialEq)]
pub enum Advance {
    Playing(Track),
    /// Cola vacía: el reproductor quedó libre
    Idle,
    /// Ya estaba libre, o la notificación era de un track anterior
    Ignored,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlayerSnapshot {
    pub guild_id: GuildId,
    pub now_playing: Option<NowPlaying>,
    pub pending: Vec<Track>,
}

#[derive(Debug)]
struct PlayerState {
    queue: GuildQueue,
    // "playing" es exactamente `now_playing.is_some()`; libre implica cola vacía
    now_playing: Option<NowPlaying>,
    closed: bool,
}

/// Controlador de reproducción de un guild
///
/// Toda decisión de arrancar, avanzar, saltar o detener pasa por un único
/// lock que protege a la vez la cola pendiente y el slot "now playing". El lock
/// se mantiene durante las llamadas al backend, de modo que un `submit` y una
/// notificación de fin concurrentes nunca se intercalan.
pub struct GuildPlayer {
    guild_id: GuildId,
    backend: Arc<dyn PlaybackBackend>,
    state: Mutex<PlayerState>,
}

impl GuildPlayer {
    pub fn new(guild_id: GuildId, backend: Arc<dyn PlaybackBackend>) -> Self {
        Self {
            guild_id,
            backend,
            state: Mutex::new(PlayerState {
                queue: GuildQueue::new(guild_id),
                now_playing: None,
                closed: false,
            }),
        }
    }

    pub fn guild_id(&self) -> GuildId {
        self.guild_id
    }

    /// Encola un track y, si no hay nada sonando, arranca la cabeza de la cola
    ///
    /// Siempre reproduce lo que se desencola, nunca el argumento directamente,
    /// para respetar FIFO cuando varios `submit` compiten. Como un reproductor
    /// libre nunca tiene pendientes, lo desencolado es el propio `track`: si el
    /// backend falla, ese track se descarta y el error vuelve al llamador.
    ///
    /// Falla con `SessionClosed` una vez cerrada la sesión del guild.
    pub async fn submit(&self, track: Track) -> PlaybackResult<SubmitOutcome> {
        let mut state = self.state.lock().await;
        if state.closed {
            warn!("Sesión cerrada en guild {}, se rechaza: {}", self.guild_id, track);
            return Err(PlaybackError::SessionClosed);
        }
        state.queue.enqueue(track.clone());

        if state.now_playing.is_some() {
            let position = state.queue.len();
            info!(
                "📝 En cola #{} en guild {}: {}",
                position, self.guild_id, track
            );
            return Ok(SubmitOutcome::Queued { track, position });
        }

        let playing = self.start_next(&mut state).await?;
        Ok(match playing {
            Some(now) => SubmitOutcome::NowPlaying(now),
            None => SubmitOutcome::Queued {
                position: state.queue.len(),
                track,
            },
        })
    }

    /// Avanza al siguiente track tras un fin de reproducción
    ///
    /// Idempotente: si ya está libre no hace nada.
    pub async fn advance_after_completion(&self) -> PlaybackResult<Advance> {
        let mut state = self.state.lock().await;
        self.advance_locked(&mut state).await
    }

    /// Entrada del canal de eventos: sólo avanza si `id` es el track actual
    pub async fn on_track_finished(&self, id: PlaybackId) -> PlaybackResult<Advance> {
        let mut state = self.state.lock().await;

        let is_current = state.now_playing.as_ref().is_some_and(|np| np.id == id);
        if !is_current {
            debug!(
                "Fin de track {} ignorado en guild {} (no es el actual)",
                id, self.guild_id
            );
            return Ok(Advance::Ignored);
        }

        self.advance_locked(&mut state).await
    }

    /// Salta la canción actual
    ///
    /// Sólo detiene el backend; el avance llega por la notificación de fin
    /// como cualquier otro final de track.
    pub async fn skip(&self) -> PlaybackResult<Track> {
        let state = self.state.lock().await;
        let current = state
            .now_playing
            .as_ref()
            .ok_or(PlaybackError::NoActiveTrack)?
            .track
            .clone();

        self.backend.stop().await;
        info!("⏭️ Canción saltada en guild {}: {}", self.guild_id, current);
        Ok(current)
    }

    /// Pausa la reproducción actual
    pub async fn pause(&self) -> PlaybackResult<Track> {
        let mut state = self.state.lock().await;
        let current = state
            .now_playing
            .as_mut()
            .ok_or(PlaybackError::NoActiveTrack)?;

        self.backend.pause().await?;
        current.paused = true;
        info!("⏸️ Reproducción pausada en guild {}", self.guild_id);
        Ok(current.track.clone())
    }

    /// Reanuda la reproducción
    pub async fn resume(&self) -> PlaybackResult<Track> {
        let mut state = self.state.lock().await;
        let current = state
            .now_playing
            .as_mut()
            .ok_or(PlaybackError::NoActiveTrack)?;

        self.backend.resume().await?;
        current.paused = false;
        info!("▶️ Reproducción reanudada en guild {}", self.guild_id);
        Ok(current.track.clone())
    }

    /// Detiene la reproducción y limpia la cola, devuelve los tracks descartados
    pub async fn stop_and_clear(&self) -> usize {
        let mut state = self.state.lock().await;
        self.stop_locked(&mut state).await
    }

    /// Como `stop_and_clear`, pero además rechaza cualquier `submit` posterior
    pub async fn shutdown(&self) -> usize {
        let mut state = self.state.lock().await;
        state.closed = true;
        self.stop_locked(&mut state).await
    }

    pub async fn is_closed(&self) -> bool {
        self.state.lock().await.closed
    }

    pub async fn is_playing(&self) -> bool {
        self.state.lock().await.now_playing.is_some()
    }

    pub async fn now_playing(&self) -> Option<Track> {
        let state = self.state.lock().await;
        state.now_playing.as_ref().map(|np| np.track.clone())
    }

    pub async fn pending(&self) -> Vec<Track> {
        self.state.lock().await.queue.snapshot()
    }

    pub async fn snapshot(&self) -> PlayerSnapshot {
        let state = self.state.lock().await;
        PlayerSnapshot {
            guild_id: self.guild_id,
            now_playing: state.now_playing.clone(),
            pending: state.queue.snapshot(),
        }
    }

    // Funciones privadas, siempre con el lock tomado

    async fn stop_locked(&self, state: &mut PlayerState) -> usize {
        self.backend.stop().await;
        let cleared = state.queue.clear();
        if let Some(stopped) = state.now_playing.take() {
            debug!("Detenido en guild {}: {}", self.guild_id, stopped.track);
        }

        info!(
            "⏹️ Reproducción detenida en guild {} ({} pendientes descartados)",
            self.guild_id, cleared
        );
        cleared
    }

    async fn advance_locked(&self, state: &mut PlayerState) -> PlaybackResult<Advance> {
        let Some(finished) = state.now_playing.take() else {
            debug!("Guild {} ya estaba libre, nada que avanzar", self.guild_id);
            return Ok(Advance::Ignored);
        };
        debug!("🎵 Track terminó en guild {}: {}", self.guild_id, finished.track);

        // Los tracks que no arrancan se descartan: sólo se queda libre con la
        // cola vacía
        let mut failure = None;
        loop {
            match self.start_next(state).await {
                Ok(Some(next)) => return Ok(Advance::Playing(next)),
                Ok(None) => break,
                Err(e) => failure = Some(e),
            }
        }

        match failure {
            Some(e) => Err(e),
            None => {
                info!("📭 Cola vacía en guild {}, reproductor libre", self.guild_id);
                Ok(Advance::Idle)
            }
        }
    }

    async fn start_next(&self, state: &mut PlayerState) -> PlaybackResult<Option<Track>> {
        let Some(track) = state.queue.try_dequeue() else {
            state.now_playing = None;
            return Ok(None);
        };

        match self.backend.start_playback(&track).await {
            Ok(id) => {
                info!("🎵 Reproduciendo en guild {}: {} ({})", self.guild_id, track, track.uri());
                state.now_playing = Some(NowPlaying::new(id, track.clone()));
                Ok(Some(track))
            }
            Err(e) => {
                state.now_playing = None;
                error!(
                    "❌ No se pudo iniciar {} en guild {}: {}",
                    track, self.guild_id, e
                );
                Err(e)
            }
        }
    }
}
