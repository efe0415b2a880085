pub mod delta;
pub mod error;
pub mod net;
pub mod session;
pub mod snapshot;

pub use delta::{FieldSpec, FieldType, FieldValue, PresenceBits, SchemaError, SchemaRegistry, TypeSchema};
pub use error::{DecodeError, SessionError};
pub use net::{
    ByteCursor, ClientCmd, Gamedata, MemoryTransport, Message, MessageFlags, ReliableSession,
    ServerCmd, Transport, UdpEndpoint,
};
pub use session::{
    ClientConfig, ClientEvent, ClientInput, GameClient, MapDirectoryLoader, SessionState,
    WorldInfo, WorldLoader,
};
pub use snapshot::{Entity, SnapshotAssembler, SnapshotHeader, World};
