use std::fmt;

/// Connection lifecycle of a [`GameClient`](super::GameClient).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SessionState {
    #[default]
    Disconnected,
    /// Server asked for our cvars; state strings are being synchronized.
    Connecting,
    /// Waiting for a world download to finish.
    LoadingWorld,
    Ready,
    /// Join sent, no snapshot seen yet.
    WaitingFirstFrame,
    Spectating,
    Spawning,
    Playing,
}

impl SessionState {
    /// Joined and receiving snapshots.
    pub fn is_in_game(self) -> bool {
        matches!(self, Self::Spectating | Self::Spawning | Self::Playing)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::LoadingWorld => "loading world",
            Self::Ready => "ready",
            Self::WaitingFirstFrame => "waiting for first frame",
            Self::Spectating => "spectating",
            Self::Spawning => "spawning",
            Self::Playing => "playing",
        };
        f.write_str(name)
    }
}
