mod cursor;
mod endpoint;
mod hexdump;
mod memory;
mod message;
mod protocol;
mod reliable;
mod stats;
mod transport;

pub use cursor::{ByteCursor, OutOfBounds, WireValue};
pub use endpoint::UdpEndpoint;
pub use hexdump::hexdump;
pub use memory::MemoryTransport;
pub use message::{FRAME_HEADER_LEN, Message, MessageFlags};
pub use protocol::{
    CLIENT_VERSION, CONNECT_MAGIC, CVAR_TRAILER, ClientCmd, DEFAULT_PORT, ENTITY_FIELD_VERSION,
    Gamedata, MAX_PACKET_SIZE, PROTOCOL_VERSION, SEQ_UNRELIABLE, ServerCmd, VAR_SEPARATOR,
};
pub use reliable::ReliableSession;
pub use stats::{NetworkStats, rand_client_id, rand_u64};
pub use transport::Transport;
