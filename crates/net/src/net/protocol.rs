pub const MAX_PACKET_SIZE: usize = 8192;
pub const DEFAULT_PORT: u16 = 11235;

pub const CONNECT_MAGIC: &str = "S2_K2_CONNECT";
pub const CLIENT_VERSION: &str = "2.1.1.1";
pub const PROTOCOL_VERSION: u8 = 1;

/// Sequence number carried by every unreliable frame, acks included.
pub const SEQ_UNRELIABLE: u32 = 0xF197_DE9A;

/// Schema version used to select which entity fields are on the wire.
pub const ENTITY_FIELD_VERSION: u32 = 27;

/// Separator between keys and values in cvar and state-string blobs.
pub const VAR_SEPARATOR: u8 = 0xFF;
/// Trailing byte appended to the cvar blob.
pub const CVAR_TRAILER: u8 = 0xC2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ClientCmd {
    DownloadWorld = 0x62,
    Connect = 0xC0,
    Vars = 0xC1,
    RequestStateStrings = 0xC2,
    Disconnect = 0xC3,
    Ready = 0xC4,
    Join = 0xC5,
    Message = 0xC6,
    Snapshot = 0xC7,
    Gamedata = 0xC8,
    AckEndgame = 0xCB,
    LoadingHeartbeat = 0xCD,
    Reauthenticate = 0xCE,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ServerCmd {
    KickClient = 0x05,
    ShuttingDown = 0x06,
    RequestVars = 0x50,
    DenyConnect = 0x51,
    StateReset = 0x52,
    StateUpdate = 0x53,
    CompressedStateUpdate = 0x54,
    StateFragment = 0x55,
    StateTerminate = 0x56,
    CompressedStateTerminate = 0x57,
    StateStringsEnd = 0x58,
    LoadWorld = 0x5A,
    Snapshot = 0x5B,
    CompressedSnapshot = 0x5C,
    SnapshotFragment = 0x5D,
    SnapshotTerminate = 0x5E,
    CompressedSnapshotTerminate = 0x5F,
    Gamedata = 0x60,
    ClientAuthenticated = 0x61,
    DownloadWorld = 0x62,
    DownloadFinished = 0x63,
    DownloadStart = 0x64,
    NewVoiceClient = 0x65,
    UpdateVoiceClient = 0x66,
    RemoveVoiceClient = 0x67,
}

impl TryFrom<u8> for ServerCmd {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Ok(match value {
            0x05 => Self::KickClient,
            0x06 => Self::ShuttingDown,
            0x50 => Self::RequestVars,
            0x51 => Self::DenyConnect,
            0x52 => Self::StateReset,
            0x53 => Self::StateUpdate,
            0x54 => Self::CompressedStateUpdate,
            0x55 => Self::StateFragment,
            0x56 => Self::StateTerminate,
            0x57 => Self::CompressedStateTerminate,
            0x58 => Self::StateStringsEnd,
            0x5A => Self::LoadWorld,
            0x5B => Self::Snapshot,
            0x5C => Self::CompressedSnapshot,
            0x5D => Self::SnapshotFragment,
            0x5E => Self::SnapshotTerminate,
            0x5F => Self::CompressedSnapshotTerminate,
            0x60 => Self::Gamedata,
            0x61 => Self::ClientAuthenticated,
            0x62 => Self::DownloadWorld,
            0x63 => Self::DownloadFinished,
            0x64 => Self::DownloadStart,
            0x65 => Self::NewVoiceClient,
            0x66 => Self::UpdateVoiceClient,
            0x67 => Self::RemoveVoiceClient,
            other => return Err(other),
        })
    }
}

/// Sub-command ids carried inside gamedata commands, in both directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Gamedata {
    RequestUnit = 0x01,
    RequestTeam = 0x02,
    ChatAll = 0x03,
    ChatTeam = 0x04,
    ChatSquad = 0x05,
    ServerMessage = 0x06,
    Spawn = 0x0B,
    RequestSpawn = 0x16,
    Message = 0x19,
    HitFeedback = 0x1B,
    MinimapDraw = 0x1C,
    MinimapPing = 0x1F,
    ConstructionComplete = 0x2E,
    GoldmineLow = 0x2F,
    PermanentItems = 0x31,
    VoiceCommand = 0x36,
    ExecScript = 0x38,
    StartConstructBuilding = 0x3E,
    BuildingDestroyed = 0x3F,
    Death = 0x47,
    SendMessage = 0x4A,
}

impl TryFrom<u8> for Gamedata {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Ok(match value {
            0x01 => Self::RequestUnit,
            0x02 => Self::RequestTeam,
            0x03 => Self::ChatAll,
            0x04 => Self::ChatTeam,
            0x05 => Self::ChatSquad,
            0x06 => Self::ServerMessage,
            0x0B => Self::Spawn,
            0x16 => Self::RequestSpawn,
            0x19 => Self::Message,
            0x1B => Self::HitFeedback,
            0x1C => Self::MinimapDraw,
            0x1F => Self::MinimapPing,
            0x2E => Self::ConstructionComplete,
            0x2F => Self::GoldmineLow,
            0x31 => Self::PermanentItems,
            0x36 => Self::VoiceCommand,
            0x38 => Self::ExecScript,
            0x3E => Self::StartConstructBuilding,
            0x3F => Self::BuildingDestroyed,
            0x47 => Self::Death,
            0x4A => Self::SendMessage,
            other => return Err(other),
        })
    }
}
