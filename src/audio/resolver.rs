use async_trait::async_trait;
use songbird::input::{AuxMetadata, Compose, YoutubeDl};
use tracing::{debug, info, warn};

use super::{
    error::{PlaybackError, PlaybackResult},
    track::Track,
};

/// Convierte lo que escribe el usuario (URL o texto libre) en un [`Track`]
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TrackResolver: Send + Sync {
    /// Falla con `TrackNotFound` si no hay resultados o la carga falla
    async fn resolve(&self, query: &str) -> PlaybackResult<Track>;
}

/// Resolver sobre yt-dlp: las URLs se consultan directo, el resto se busca
pub struct YoutubeResolver {
    http: reqwest::Client,
}

impl YoutubeResolver {
    pub fn new(http: reqwest::Client) -> Self {
        Self { http }
    }
}

#[async_trait]
impl TrackResolver for YoutubeResolver {
    async fn resolve(&self, query: &str) -> PlaybackResult<Track> {
        let query = query.trim();
        if query.is_empty() {
            return Err(PlaybackError::TrackNotFound(String::new()));
        }

        let mut source = if is_url(query) {
            debug!("📊 Obteniendo info de: {}", query);
            YoutubeDl::new(self.http.clone(), query.to_string())
        } else {
            info!("🔍 Buscando en YouTube: {}", query);
            YoutubeDl::new_search(self.http.clone(), query.to_string())
        };

        let metadata = source.aux_metadata().await.map_err(|e| {
            warn!("❌ Sin resultados para '{}': {}", query, e);
            PlaybackError::TrackNotFound(query.to_string())
        })?;

        track_from_metadata(query, metadata)
    }
}

pub fn is_url(query: &str) -> bool {
    query.starts_with("https://") || query.starts_with("http://")
}

fn track_from_metadata(query: &str, metadata: AuxMetadata) -> PlaybackResult<Track> {
    let title = metadata
        .title
        .or(metadata.track)
        .filter(|title| !title.trim().is_empty())
        .ok_or_else(|| PlaybackError::TrackNotFound(query.to_string()))?;

    let author = metadata
        .artist
        .or(metadata.channel)
        .unwrap_or_else(|| "Desconocido".to_string());

    // Sin URL de origen se reproduce el primer resultado de la búsqueda
    let uri = match metadata.source_url {
        Some(url) => url,
        None if is_url(query) => query.to_string(),
        None => format!("ytsearch1:{}", query),
    };

    Ok(Track::new(title, author, uri))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_is_url() {
        assert!(is_url("https://youtu.be/fJ9rUzIMcZQ"));
        assert!(is_url("http://example.com/song.mp3"));
        assert!(!is_url("queen bohemian rhapsody"));
        assert!(!is_url("ytsearch:queen"));
    }

    #[test]
    fn test_search_result_becomes_track() {
        let metadata = AuxMetadata {
            title: Some("Bohemian Rhapsody".to_string()),
            channel: Some("Queen Official".to_string()),
            source_url: Some("https://www.youtube.com/watch?v=fJ9rUzIMcZQ".to_string()),
            ..Default::default()
        };

        assert_eq!(
            track_from_metadata("queen bohemian", metadata),
            Ok(Track::new(
                "Bohemian Rhapsody",
                "Queen Official",
                "https://www.youtube.com/watch?v=fJ9rUzIMcZQ"
            ))
        );
    }

    #[test]
    fn test_missing_source_url_falls_back_to_query() {
        let metadata = AuxMetadata {
            title: Some("Song".to_string()),
            ..Default::default()
        };
        let track = track_from_metadata("some song", metadata.clone()).unwrap();
        assert_eq!(track.uri(), "ytsearch1:some song");
        assert_eq!(track.author(), "Desconocido");

        let track = track_from_metadata("https://example.com/a.mp3", metadata).unwrap();
        assert_eq!(track.uri(), "https://example.com/a.mp3");
    }

    #[test]
    fn test_result_without_title_is_not_found() {
        let metadata = AuxMetadata {
            title: Some("  ".to_string()),
            ..Default::default()
        };
        assert_eq!(
            track_from_metadata("nada", metadata),
            Err(PlaybackError::TrackNotFound("nada".to_string()))
        );
    }

    #[tokio::test]
    async fn test_empty_query_is_rejected_without_lookup() {
        let resolver = YoutubeResolver::new(reqwest::Client::new());
        assert_eq!(
            resolver.resolve("   ").await,
            Err(PlaybackError::TrackNotFound(String::new()))
        );
    }
}
