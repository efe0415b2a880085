mod assembler;
mod entity;
mod header;
mod world;

pub use assembler::{
    FragmentAssembler, SnapshotAssembler, SnapshotSummary, compress, decompress, read_snapshot,
};
pub use entity::{
    AttributeSlot, Entity, STATUS_ALIVE, STATUS_DEAD, STATUS_DORMANT, STATUS_SPAWNING,
};
pub use header::{EventFlags, GameEvent, SnapshotHeader};
pub use world::{
    CLIENT_INFO_TYPE, ClientInfo, GAME_INFO_TYPE, RecordOutcome, TEAM_INFO_TYPE, TeamInfo, World,
};
