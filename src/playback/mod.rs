pub mod controller;
pub mod events;
pub mod state;

pub use controller::{Playback, PlaybackError};
pub use events::{Observers, Progress, StopReason, SubscriptionId};
pub use state::PlaybackState;
