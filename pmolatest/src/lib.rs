//! # pmolatest - Playlists "latest additions"
//!
//! Cette crate construit une playlist des morceaux les plus récemment ajoutés
//! à un ensemble de playlists sources :
//! - Fusion des sources par date d'ajout, sans doublon ni fichier local
//! - Lecture paginée à reculons, avec backfill proportionnel aux morceaux écartés
//! - Écriture de la playlist de destination (création ou remplacement)
//! - Réglages via pmoconfig
//!
//! # Architecture
//!
//! - **LatestAdditionsMerger** : moteur de fusion (un `SourceCursor` par source)
//! - **SourceReader** : lecture paginée d'une source (collaborateur externe)
//! - **PlaylistWriter** / **PlaylistHistory** : écriture et historique (collaborateurs externes)
//! - **LatestAdditionsService** : enchaînement complet d'une construction
//!
//! # Exemple d'utilisation
//!
//! ```no_run
//! use pmolatest::{
//!     BuildPlaylistRequest, LatestAdditionsService, MemoryPlaylistHistory,
//!     MemoryPlaylistWriter, MemorySourceReader,
//! };
//! use std::sync::Arc;
//!
//! # #[tokio::main]
//! # async fn main() -> pmolatest::Result<()> {
//! let reader = Arc::new(MemorySourceReader::new());
//! let service = LatestAdditionsService::new(
//!     reader,
//!     Arc::new(MemoryPlaylistWriter::new()),
//!     Arc::new(MemoryPlaylistHistory::new()),
//! );
//!
//! let request = BuildPlaylistRequest::new([
//!     ("spotify:user:me:playlist:rock", 120),
//!     ("spotify:user:me:playlist:jazz", 45),
//! ])
//! .with_num_tracks(30);
//!
//! let response = service.build("me", &request).await?;
//! println!("{}", response.playlist_url);
//! # Ok(())
//! # }
//! ```

mod candidate;
mod config_ext;
mod cursor;
mod engine;
mod error;
mod history;
mod reader;
mod request;
mod response;
mod service;
mod uri;
mod writer;

// Réexports publics
pub use candidate::TrackCandidate;
pub use config_ext::{DEFAULT_TRACK_COUNT, LatestConfigExt};
pub use cursor::{DEFAULT_BACKFILL_FLOOR, SourceCursor};
pub use engine::{LatestAdditionsMerger, MergeOptions, MergeOutcome, SourceReport};
pub use error::{LatestError, Result};
pub use history::{MemoryPlaylistHistory, PlaylistHistory};
pub use reader::{FetchCall, MemorySourceReader, SourceReader};
pub use request::BuildPlaylistRequest;
pub use response::{DEFAULT_PREVIEW_SIZE, LatestPlaylistResponse};
pub use service::LatestAdditionsService;
pub use uri::PlaylistUri;
pub use writer::{MemoryPlaylistWriter, PlaylistDetails, PlaylistWriter, StoredPlaylist};
