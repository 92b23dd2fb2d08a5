use async_trait::async_trait;
use std::fmt;
use uuid::Uuid;

use super::{error::PlaybackResult, track::Track};

/// Identifica un arranque concreto de reproducción en el backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PlaybackId(pub Uuid);

impl PlaybackId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for PlaybackId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for PlaybackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Eventos que el backend entrega por el canal de la sesión
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackEvent {
    /// El track terminó (natural, por skip o por error). Se emite una sola vez
    /// por cada `start_playback` exitoso.
    Finished(PlaybackId),
}

/// Contrato con el transporte de audio en tiempo real de un guild
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PlaybackBackend: Send + Sync {
    /// Inicia la reproducción; falla con `BackendUnavailable`
    async fn start_playback(&self, track: &Track) -> PlaybackResult<PlaybackId>;

    /// Detiene el track actual. No-op si no hay nada sonando.
    async fn stop(&self);

    async fn pause(&self) -> PlaybackResult<()>;

    async fn resume(&self) -> PlaybackResult<()>;
}
