mod client;
mod config;
mod events;
mod input;
mod loader;
mod state;
mod statestrings;

pub use client::GameClient;
pub use config::{ClientConfig, ConfigError};
pub use events::{ChatChannel, ClientEvent, DisconnectReason};
pub use input::{ClientInput, InputState};
pub use loader::{MapDirectoryLoader, WorldInfo, WorldLoader};
pub use state::SessionState;
pub use statestrings::{StateStrings, VarSet, encode_var_blob, parse_var_blob};
