use thiserror::Error;

/// Errores de reproducción, siempre locales al guild que los produce
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlaybackError {
    /// El transporte de audio no pudo iniciar la reproducción
    #[error("El backend de audio no está disponible: {0}")]
    BackendUnavailable(String),

    /// Pausa/reanudación/salto sin nada en el slot "now playing"
    #[error("No hay ninguna canción reproduciéndose")]
    NoActiveTrack,

    /// La búsqueda no devolvió ningún resultado reproducible
    #[error("No se encontró música para: {0}")]
    TrackNotFound(String),

    /// La sesión del guild ya se cerró; no acepta más tracks
    #[error("La sesión de reproducción ya está cerrada")]
    SessionClosed,

    #[error("No hay conexión de voz activa")]
    NotConnected,

    #[error("Error al unirse al canal: {0}")]
    Join(String),

    #[error("Error al salir del canal: {0}")]
    Leave(String),
}

pub type PlaybackResult<T> = Result<T, PlaybackError>;
