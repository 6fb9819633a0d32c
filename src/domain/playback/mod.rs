pub mod dto;
pub mod error;
pub mod service;

pub use dto::{
    CacheSource, HistoryItem, PlayRequest, PlayableResource, PlaybackPhase, StatusResponse,
    StopRequest,
};
pub use error::PlaybackError;
pub use service::{PlaybackService, PlaybackServiceApi};
