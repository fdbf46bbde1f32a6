pub mod app_state;

pub use app_state::{texture_key, AppState, AvatarReport};
