// ─── mcskin Core ───
// Skin lookup and avatar cache backend.
//
// Architecture:
//   core/
//     resolver/  — Username / UUID → skin URL via the two Mojang APIs
//     profile/   — Session server profile + base64 textures payload
//     fetcher/   — Texture download, staged face/helm write
//     skins/     — Face crop + helm composite (image crate)
//     outcome    — LookupOutcome / FetchOutcome
//     config     — JSON settings with defaults
//     state/     — Wires everything into the avatar pipeline

pub mod config;
pub mod error;
pub mod fetcher;
pub mod http;
pub mod outcome;
pub mod profile;
pub mod resolver;
pub mod skins;
pub mod state;
