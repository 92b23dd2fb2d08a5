//! # Audio Module
//!
//! Per-guild playback queue and playback state machine for Encore.
//!
//! This module provides the core audio functionality including:
//! - A FIFO queue of pending tracks per guild
//! - A playback controller that guarantees at most one track plays per guild
//! - Exactly-once continuation when the voice backend reports a track ended
//! - Fully independent guilds: no queue or lock is shared between them
//!
//! ## Architecture
//!
//! ### [`player`] - Playback Controller
//! - One critical section guards the pending queue and the now-playing slot
//! - `submit` enqueues, then dequeues-and-plays if idle (FIFO under races)
//! - Stale or duplicate completion notifications are ignored
//!
//! ### [`session`] - Guild Sessions
//! - One completion subscription per session, delivered through a channel
//! - Registry keyed by guild, torn down on leave
//!
//! ### [`resolver`] - Track Lookup
//! - Turns a URL or free-text search into a [`Track`] through yt-dlp
//! - No results, or a failed load, is reported as `TrackNotFound`
//!
//! ### [`songbird_backend`] - Voice Backend
//! - Songbird `Call` adapter implementing [`PlaybackBackend`]
//! - Forwards `TrackEvent::End`/`TrackEvent::Error` to the session channel
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use encore::audio::{event_channel, GuildSession, PlaybackBackend, PlaybackError, Track};
//! use serenity::all::GuildId;
//! use std::sync::Arc;
//!
//! # async fn example(backend: Arc<dyn PlaybackBackend>) -> Result<(), PlaybackError> {
//! let (_events_tx, events_rx) = event_channel();
//! let session = GuildSession::start(GuildId::new(123456789), backend, events_rx);
//!
//! // Play a track
//! let song = Track::new("Song", "Artist", "https://example.com/song.mp3");
//! session.player().submit(song).await?;
//!
//! // Control playback
//! session.player().pause().await?;
//! session.player().resume().await?;
//! session.player().skip().await?;
//! # Ok(())
//! # }
//! ```

pub mod backend;
pub mod error;
pub mod player;
pub mod queue;
pub mod resolver;
pub mod session;
pub mod songbird_backend;
pub mod track;
pub mod voice;

pub use backend::{PlaybackBackend, PlaybackEvent, PlaybackId};
pub use error::{PlaybackError, PlaybackResult};
pub use player::{Advance, GuildPlayer, NowPlaying, PlayerSnapshot, SubmitOutcome};
pub use queue::GuildQueue;
pub use resolver::{TrackResolver, YoutubeResolver};
pub use session::{event_channel, EventReceiver, EventSender, GuildSession, SessionRegistry};
pub use track::Track;
