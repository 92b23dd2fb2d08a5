use async_trait::async_trait;
use parking_lot::Mutex;
use serenity::model::id::GuildId;
use songbird::{
    input::YoutubeDl, tracks::TrackHandle, Call, Event, EventContext,
    EventHandler as VoiceEventHandler, TrackEvent,
};
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::{
    backend::{PlaybackBackend, PlaybackEvent, PlaybackId},
    error::{PlaybackError, PlaybackResult},
    session::EventSender,
    track::Track,
};

/// Backend de reproducción sobre una llamada de voz de Songbird
pub struct SongbirdBackend {
    guild_id: GuildId,
    call: Arc<tokio::sync::Mutex<Call>>,
    http: reqwest::Client,
    volume: f32,
    current: Mutex<Option<TrackHandle>>,
}

impl SongbirdBackend {
    /// Suscribe los eventos de fin de track de la llamada, una sola vez por sesión
    pub async fn attach(
        guild_id: GuildId,
        call: Arc<tokio::sync::Mutex<Call>>,
        http: reqwest::Client,
        volume: f32,
        events: EventSender,
    ) -> Self {
        {
            let mut call_lock = call.lock().await;
            // End cubre fin natural y stop; Error los tracks que fallan
            for event in [TrackEvent::End, TrackEvent::Error] {
                call_lock.add_global_event(
                    Event::Track(event),
                    TrackEventForwarder {
                        guild_id,
                        events: events.clone(),
                    },
                );
            }
        }
        info!("🎧 Eventos de voz registrados para guild {}", guild_id);

        Self {
            guild_id,
            call,
            http,
            volume,
            current: Mutex::new(None),
        }
    }

    fn current_handle(&self) -> PlaybackResult<TrackHandle> {
        self.current
            .lock()
            .clone()
            .ok_or(PlaybackError::NoActiveTrack)
    }
}

#[async_trait]
impl PlaybackBackend for SongbirdBackend {
    async fn start_playback(&self, track: &Track) -> PlaybackResult<PlaybackId> {
        let input = YoutubeDl::new(self.http.clone(), track.uri().to_string());

        let mut call = self.call.lock().await;
        if call.current_connection().is_none() {
            return Err(PlaybackError::BackendUnavailable(format!(
                "sin conexión de voz en guild {}",
                self.guild_id
            )));
        }

        let handle = call.play_input(input.into());
        if let Err(e) = handle.set_volume(self.volume) {
            warn!("No se pudo ajustar volumen en guild {}: {}", self.guild_id, e);
        }

        let id = PlaybackId(handle.uuid());
        *self.current.lock() = Some(handle);
        Ok(id)
    }

    async fn stop(&self) {
        let handle = self.current.lock().take();
        if let Some(handle) = handle {
            if let Err(e) = handle.stop() {
                debug!("Track ya detenido en guild {}: {}", self.guild_id, e);
            }
        }
    }

    async fn pause(&self) -> PlaybackResult<()> {
        self.current_handle()?
            .pause()
            .map_err(|_| PlaybackError::NoActiveTrack)
    }

    async fn resume(&self) -> PlaybackResult<()> {
        self.current_handle()?
            .play()
            .map_err(|_| PlaybackError::NoActiveTrack)
    }
}

/// Reenvía los fines de track al canal de la sesión
struct TrackEventForwarder {
    guild_id: GuildId,
    events: EventSender,
}

#[async_trait]
impl VoiceEventHandler for TrackEventForwarder {
    async fn act(&self, ctx: &EventContext<'_>) -> Option<Event> {
        if let EventContext::Track(track_list) = ctx {
            for (state, handle) in *track_list {
                debug!(
                    "🎵 Track {} terminó en guild {}: {:?}",
                    handle.uuid(),
                    self.guild_id,
                    state.playing
                );

                let event = PlaybackEvent::Finished(PlaybackId(handle.uuid()));
                if self.events.send(event).is_err() {
                    warn!("Sesión de guild {} ya cerrada, evento descartado", self.guild_id);
                }
            }
        }

        None
    }
}
