use super::state::SessionState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatChannel {
    All,
    Team,
    Squad,
}

impl ChatChannel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChatChannel::All => "ALL",
            ChatChannel::Team => "TEAM",
            ChatChannel::Squad => "SQUAD",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisconnectReason {
    Kicked,
    Denied,
    ShuttingDown,
    Local,
}

impl DisconnectReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            DisconnectReason::Kicked => "kicked",
            DisconnectReason::Denied => "denied",
            DisconnectReason::ShuttingDown => "server shutting down",
            DisconnectReason::Local => "disconnected",
        }
    }
}

/// Notable things the session saw, queued for the driving application.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientEvent {
    StateChanged {
        from: SessionState,
        to: SessionState,
    },
    Disconnected {
        reason: DisconnectReason,
        message: String,
    },
    Authenticated,
    WorldLoaded {
        name: String,
        checksum: String,
    },
    WorldDownloadProgress {
        received: usize,
        total: usize,
    },
    Chat {
        channel: ChatChannel,
        client_id: u32,
        message: String,
    },
    ServerMessage(String),
    Message(String),
    HitFeedback {
        kind: u8,
    },
    MinimapDraw {
        x: f32,
        y: f32,
    },
    MinimapPing {
        x: f32,
        y: f32,
    },
    PermanentItems(Vec<(u16, u32)>),
    VoiceCommand {
        client_id: u32,
        target: String,
        command: u32,
        kind: u8,
    },
    ConstructionStarted {
        building: u16,
    },
    ConstructionComplete {
        building: u16,
    },
    GoldmineLow {
        mine: u32,
    },
    BuildingDestroyed {
        building: u16,
        kind: u8,
    },
    Death {
        killer: u32,
        killed: u32,
        weapon: u16,
    },
    ExecScript {
        script: String,
        args: Vec<(String, String)>,
    },
}
