use std::net::ToSocketAddrs;
use std::sync::Arc;
use std::time::Instant;

use glam::Vec3;

use crate::delta::SchemaRegistry;
use crate::error::{DecodeError, SessionError};
use crate::net::{
    ByteCursor, CLIENT_VERSION, CONNECT_MAGIC, CVAR_TRAILER, ClientCmd, Gamedata, NetworkStats,
    PROTOCOL_VERSION, ReliableSession, ServerCmd, Transport, UdpEndpoint, hexdump,
    rand_client_id,
};
use crate::snapshot::{ClientInfo, Entity, SnapshotAssembler, TeamInfo, World, read_snapshot};

use super::config::ClientConfig;
use super::events::{ChatChannel, ClientEvent, DisconnectReason};
use super::input::InputState;
use super::loader::{MapDirectoryLoader, WorldInfo, WorldLoader};
use super::state::SessionState;
use super::statestrings::{StateStrings, encode_var_blob};

const DEFAULT_SERVER_FPS: u32 = 20;
const HIT_FEEDBACK_POSITIONAL: u8 = 13;
const RECONNECT_SCRIPT: &str = "playerreconnect";

/// Client side of one game session: drives the handshake, keeps the world
/// in sync with server snapshots and exposes the outbound command API.
///
/// Everything runs on the caller's thread. Call [`GameClient::update`] once
/// per tick.
pub struct GameClient<T: Transport = UdpEndpoint, L: WorldLoader = MapDirectoryLoader> {
    config: ClientConfig,
    account_id: u32,
    password: String,
    net: Option<ReliableSession<T>>,
    loader: L,
    world: World,
    assembler: SnapshotAssembler,
    state_strings: StateStrings,
    state: SessionState,
    connected: bool,
    in_game: bool,
    server_fps: u32,
    current_frame: Option<u32>,
    last_think_frame: Option<u32>,
    last_server_timestamp: u32,
    last_server_frame_at: Instant,
    last_client_snapshot: Option<Instant>,
    sent_snapshots: u64,
    received_snapshots: u64,
    input: InputState,
    world_name: String,
    world_checksum: String,
    current_world: Option<WorldInfo>,
    download: Vec<u8>,
    download_len: usize,
    pending_reconnect: bool,
    events: Vec<ClientEvent>,
}

/// The command's declared byte range has been consumed even though its body
/// did not inflate, so the rest of the message is still readable.
fn inflate_failed(cmd: ServerCmd, err: &std::io::Error, body: &[u8]) {
    log::warn!("{:?} failed to inflate: {}\n{}", cmd, err, hexdump(body));
}

impl<L: WorldLoader> GameClient<UdpEndpoint, L> {
    pub fn connect_udp<A: ToSocketAddrs>(&mut self, server: A, password: &str) -> Result<bool, SessionError> {
        let endpoint = UdpEndpoint::connect(server)?;
        log::info!(
            "Connecting to {} from {}",
            endpoint.remote_addr(),
            endpoint.local_addr()
        );
        self.connect(endpoint, password)
    }
}

impl<T: Transport, L: WorldLoader> GameClient<T, L> {
    pub fn new(config: ClientConfig, schemas: Arc<SchemaRegistry>, loader: L, account_id: u32) -> Self {
        let world = World::with_version(schemas, config.entity_version);
        Self {
            config,
            account_id,
            password: String::new(),
            net: None,
            loader,
            world,
            assembler: SnapshotAssembler::new(),
            state_strings: StateStrings::new(),
            state: SessionState::Disconnected,
            connected: false,
            in_game: false,
            server_fps: DEFAULT_SERVER_FPS,
            current_frame: None,
            last_think_frame: None,
            last_server_timestamp: 0,
            last_server_frame_at: Instant::now(),
            last_client_snapshot: None,
            sent_snapshots: 0,
            received_snapshots: 0,
            input: InputState::default(),
            world_name: String::new(),
            world_checksum: String::new(),
            current_world: None,
            download: Vec::new(),
            download_len: 0,
            pending_reconnect: false,
            events: Vec::new(),
        }
    }

    // ----- lifecycle -----

    /// Sends the connect request over `transport` and polls for the server's
    /// answer, sleeping between attempts. Returns whether the server
    /// accepted us within the attempt budget.
    pub fn connect(&mut self, transport: T, password: &str) -> Result<bool, SessionError> {
        self.reset();
        self.password = password.to_string();
        self.net = Some(ReliableSession::new(transport, rand_client_id()));
        self.handshake()
    }

    fn handshake(&mut self) -> Result<bool, SessionError> {
        let account_id = self.account_id;
        let mut payload = ByteCursor::new();
        payload.write_string(CONNECT_MAGIC);
        payload.write_string(CLIENT_VERSION);
        payload.write_u8(PROTOCOL_VERSION);
        payload.write_string(&self.password);

        let net = self.net_mut()?;
        let client_id = net.client_id();
        payload.write_u16(client_id);
        payload.write_u32(account_id);
        payload.write_string("");

        if let Err(e) = net.send(false, ClientCmd::Connect as u8, payload.as_slice()) {
            self.connected = false;
            self.set_state(SessionState::Disconnected);
            return Err(e.into());
        }
        log::info!("Sent connect request (client id {:#06x})", client_id);

        let attempts = self.config.handshake_attempts.max(1);
        for attempt in 0..attempts {
            if self.update()? > 0 {
                break;
            }
            if attempt + 1 < attempts {
                std::thread::sleep(self.config.handshake_retry());
            }
        }

        if !self.connected {
            log::warn!("No answer from server after {} attempts", attempts);
        }
        Ok(self.connected)
    }

    /// Tells the server we are leaving and drops all session state.
    pub fn disconnect(&mut self, reason: &str) -> Result<(), SessionError> {
        let mut payload = ByteCursor::new();
        payload.write_string(reason);
        let result = self.send(true, ClientCmd::Disconnect, payload.as_slice());
        self.reset();
        self.push_event(ClientEvent::Disconnected {
            reason: DisconnectReason::Local,
            message: reason.to_string(),
        });
        result
    }

    /// Disconnects and runs the handshake again on the same transport under a
    /// fresh client id.
    pub fn reconnect(&mut self) -> Result<bool, SessionError> {
        log::info!("Reconnecting...");
        self.disconnect("reconnecting...")?;
        self.handshake()
    }

    fn reset(&mut self) {
        if let Some(net) = self.net.as_mut() {
            net.reset(rand_client_id());
        }
        self.server_fps = DEFAULT_SERVER_FPS;
        self.connected = false;
        self.world.set_local_client_number(-1);
        self.state_strings.reset();
        self.reset_world();
        self.set_state(SessionState::Disconnected);
    }

    fn reset_world(&mut self) {
        self.world.reset();
        self.in_game = false;
        self.current_frame = None;
        self.last_think_frame = None;
        self.last_client_snapshot = None;
        self.state_strings.clear_fragments();
        self.assembler.reset();
        self.input.clear();
    }

    fn set_state(&mut self, state: SessionState) {
        if self.state != state {
            log::info!("Session {} -> {}", self.state, state);
            self.push_event(ClientEvent::StateChanged {
                from: self.state,
                to: state,
            });
            self.state = state;
        }
    }

    fn push_event(&mut self, event: ClientEvent) {
        self.events.push(event);
    }

    /// One tick: handle at most one inbound message, send the periodic client
    /// snapshot when due, then step the session logic. Returns the number of
    /// server commands processed.
    pub fn update(&mut self) -> Result<usize, SessionError> {
        let now = Instant::now();
        let mut count = 0;

        if let Some(message) = self.net_mut()?.receive()? {
            let mut payload = message.into_cursor();
            while !payload.is_at_end() {
                let cmd = payload.read_u8()?;
                count += 1;
                if let Err(e) = self.process_command(cmd, &mut payload) {
                    log::warn!(
                        "Command {:#04x} failed: {}\n{}",
                        cmd,
                        e,
                        hexdump(payload.remaining_slice())
                    );
                    payload.skip_remaining();
                }
            }
        }

        if self.in_game && self.snapshot_due(now) {
            self.send_client_snapshot(now)?;
        }

        self.think()?;

        if std::mem::take(&mut self.pending_reconnect) {
            self.reconnect()?;
        }
        Ok(count)
    }

    fn snapshot_due(&self, now: Instant) -> bool {
        match self.last_client_snapshot {
            Some(last) => now.duration_since(last) >= self.config.snapshot_interval(),
            None => true,
        }
    }

    /// Advances spawn logic. Runs at most once per received server frame.
    pub fn think(&mut self) -> Result<(), SessionError> {
        let Some(frame) = self.current_frame else {
            return Ok(());
        };
        if self.last_think_frame == Some(frame) {
            return Ok(());
        }
        self.last_think_frame = Some(frame);

        match self.state {
            SessionState::Spectating => {
                let has_ping = self.world.client_info().is_some_and(|info| info.ping != 0);
                if self.in_game && has_ping {
                    for team in self.config.team_requests.clone() {
                        self.request_team(team)?;
                    }
                    self.set_state(SessionState::Spawning);
                }
            }
            SessionState::Spawning => {
                let local = self
                    .world
                    .local_entity()
                    .map(|e| (e.is_dormant(), e.is_alive(), e.team));
                match local {
                    None => self.request_unit(self.config.default_unit)?,
                    Some((dormant, alive, team)) => {
                        if dormant {
                            let unit = if team == 1 {
                                self.config.team1_unit
                            } else {
                                self.config.default_unit
                            };
                            self.request_unit(unit)?;
                        }
                        if alive {
                            self.set_state(SessionState::Playing);
                        } else {
                            let base = self.world.team_info(team as i32).base_building_index;
                            if base != 0 {
                                self.prepare_spawn()?;
                                self.request_spawn(base as u32)?;
                            }
                        }
                    }
                }
            }
            SessionState::Playing => {
                if self.world.local_entity().is_some_and(Entity::is_dormant) {
                    self.input.clear();
                    self.set_state(SessionState::Spectating);
                }
            }
            _ => {}
        }
        Ok(())
    }

    // ----- inbound -----

    pub fn process_command(&mut self, cmd: u8, payload: &mut ByteCursor) -> Result<(), SessionError> {
        let cmd = ServerCmd::try_from(cmd).map_err(SessionError::UnknownCommand)?;
        match cmd {
            ServerCmd::KickClient => {
                let reason = payload.read_string()?;
                log::warn!("Server kicked us: {}", reason);
                self.drop_session(DisconnectReason::Kicked, reason);
            }
            ServerCmd::ShuttingDown => {
                log::warn!("Server shutting down");
                self.drop_session(DisconnectReason::ShuttingDown, String::new());
            }
            ServerCmd::DenyConnect => {
                let raw = payload.remaining_slice();
                let end = raw.iter().position(|&b| b == 0).unwrap_or(raw.len());
                let reason = String::from_utf8_lossy(&raw[..end]).into_owned();
                payload.skip_remaining();
                log::warn!("Server denied connection: {}", reason);
                self.drop_session(DisconnectReason::Denied, reason);
            }
            ServerCmd::RequestVars => {
                let client_number = payload.read_u32()?;
                log::info!("Server assigned client number {}", client_number);
                self.world.set_local_client_number(client_number as i32);
                self.connected = true;
                self.set_state(SessionState::Connecting);
                self.send_cvars()?;
                self.send(true, ClientCmd::RequestStateStrings, &[])?;
            }
            ServerCmd::StateReset
            | ServerCmd::StateUpdate
            | ServerCmd::CompressedStateUpdate
            | ServerCmd::StateFragment
            | ServerCmd::StateTerminate
            | ServerCmd::CompressedStateTerminate => {
                let start = payload.position();
                match self.state_strings.handle(cmd, payload) {
                    Ok(_) => {}
                    Err(DecodeError::Decompress(e)) => {
                        inflate_failed(cmd, &e, &payload.as_slice()[start..payload.position()]);
                    }
                    Err(e) => return Err(e.into()),
                }
            }
            ServerCmd::StateStringsEnd => {
                match self
                    .state_strings
                    .get(1, "svr_gameFPS")
                    .and_then(|fps| fps.trim().parse::<u32>().ok())
                {
                    Some(fps) => self.server_fps = fps,
                    None => log::warn!("Server did not announce svr_gameFPS"),
                }
                log::info!(
                    "State strings complete (server fps {}), sending ready",
                    self.server_fps
                );
                self.send_ready()?;
            }
            ServerCmd::LoadWorld => {
                self.world_name = payload.read_string()?;
                self.world_checksum = payload.read_string()?;
                log::info!(
                    "Server requested world \"{}\" ({})",
                    self.world_name,
                    self.world_checksum
                );
                self.current_world = self.loader.load(&self.world_name, &self.world_checksum);
                self.reset_world();
                if self.current_world.is_some() {
                    self.world_loaded();
                    self.send_join()?;
                } else {
                    self.request_world_download()?;
                }
            }
            ServerCmd::DownloadStart => {
                self.download_len = payload.read_u32()? as usize;
                log::info!("World download started, {} KB", self.download_len / 1024);
                self.download.clear();
                self.download.reserve(self.download_len);
            }
            ServerCmd::DownloadWorld => {
                let len = payload.read_u16()? as usize;
                self.download.extend_from_slice(payload.read_bytes(len)?);
                log::debug!(
                    "[{}/{}] received {} bytes of world data",
                    self.download.len(),
                    self.download_len,
                    len
                );
                self.push_event(ClientEvent::WorldDownloadProgress {
                    received: self.download.len(),
                    total: self.download_len,
                });
            }
            ServerCmd::DownloadFinished => {
                log::info!("World download finished");
                let data = std::mem::take(&mut self.download);
                if let Err(e) = self
                    .loader
                    .install(&self.world_name, &self.world_checksum, &data)
                {
                    log::error!(
                        "Couldn't store world {}_{}: {}",
                        self.world_name,
                        self.world_checksum,
                        e
                    );
                }
                self.current_world = self.loader.load(&self.world_name, &self.world_checksum);
                if self.current_world.is_some() {
                    self.world_loaded();
                    self.send_join()?;
                } else {
                    log::error!(
                        "Failed to load downloaded world {}_{}",
                        self.world_name,
                        self.world_checksum
                    );
                }
            }
            ServerCmd::ClientAuthenticated => {
                log::info!("Client authenticated");
                self.push_event(ClientEvent::Authenticated);
            }
            ServerCmd::NewVoiceClient => {
                let client_id = payload.read_u32()?;
                let slot = payload.read_u8()?;
                log::info!("Voice client joined {:#x} (slot {})", client_id, slot);
            }
            ServerCmd::UpdateVoiceClient => {
                let _slot = payload.read_u8()?;
                let _flags = payload.read_u16()?;
                let count = payload.read_u8()?;
                for _ in 0..count {
                    let client_id = payload.read_u32()?;
                    let slot = payload.read_u8()?;
                    log::debug!("Voice client update {:#x} (slot {})", client_id, slot);
                }
            }
            ServerCmd::RemoveVoiceClient => {
                let slot = payload.read_u8()?;
                log::info!("Voice client in slot {} left", slot);
            }
            ServerCmd::Gamedata => {
                let id = payload.read_u8()?;
                self.process_gamedata(id, payload)?;
            }
            ServerCmd::Snapshot
            | ServerCmd::CompressedSnapshot
            | ServerCmd::SnapshotFragment
            | ServerCmd::SnapshotTerminate
            | ServerCmd::CompressedSnapshotTerminate => {
                let start = payload.position();
                match self.assembler.handle(cmd, payload) {
                    Ok(Some(snapshot)) => self.process_snapshot(&snapshot),
                    Ok(None) => {}
                    Err(DecodeError::Decompress(e)) => {
                        inflate_failed(cmd, &e, &payload.as_slice()[start..payload.position()]);
                    }
                    Err(e) => return Err(e.into()),
                }
            }
        }
        Ok(())
    }

    fn drop_session(&mut self, reason: DisconnectReason, message: String) {
        self.reset();
        self.push_event(ClientEvent::Disconnected { reason, message });
    }

    fn world_loaded(&mut self) {
        self.push_event(ClientEvent::WorldLoaded {
            name: self.world_name.clone(),
            checksum: self.world_checksum.clone(),
        });
    }

    fn process_snapshot(&mut self, data: &[u8]) {
        if self.state == SessionState::WaitingFirstFrame {
            self.in_game = true;
            self.set_state(SessionState::Spectating);
        }
        self.received_snapshots += 1;

        match read_snapshot(data, &mut self.world, self.state_strings.sequence()) {
            Ok(summary) => {
                log::debug!(
                    "Snapshot {} ({} records, {} errors, applied {})",
                    summary.header.frame,
                    summary.records,
                    summary.errors,
                    summary.applied
                );
                self.current_frame = Some(summary.header.frame);
                self.last_server_timestamp = summary.header.timestamp;
                self.last_server_frame_at = Instant::now();
            }
            Err(e) => {
                log::warn!("Unreadable snapshot: {}\n{}", e, hexdump(data));
            }
        }
    }

    pub fn process_gamedata(&mut self, id: u8, payload: &mut ByteCursor) -> Result<(), SessionError> {
        let id = Gamedata::try_from(id).map_err(SessionError::UnknownGamedata)?;
        let event = match id {
            Gamedata::ChatAll | Gamedata::ChatTeam | Gamedata::ChatSquad => {
                let channel = match id {
                    Gamedata::ChatTeam => ChatChannel::Team,
                    Gamedata::ChatSquad => ChatChannel::Squad,
                    _ => ChatChannel::All,
                };
                let client_id = payload.read_u32()?;
                let message = payload.read_string()?;
                log::info!("[{}] {}", channel.as_str(), message);
                ClientEvent::Chat {
                    channel,
                    client_id,
                    message,
                }
            }
            Gamedata::ServerMessage => {
                let message = payload.read_string()?;
                log::info!("[SERVER] {}", message);
                ClientEvent::ServerMessage(message)
            }
            Gamedata::Message | Gamedata::SendMessage => {
                let message = payload.read_string()?;
                log::info!("{}", message);
                ClientEvent::Message(message)
            }
            Gamedata::HitFeedback => {
                let kind = payload.read_u8()?;
                if kind == HIT_FEEDBACK_POSITIONAL {
                    payload.read_vec3()?;
                } else {
                    payload.read_u16()?;
                }
                ClientEvent::HitFeedback { kind }
            }
            Gamedata::MinimapDraw | Gamedata::MinimapPing => {
                let x = payload.read_f32()?;
                let y = payload.read_f32()?;
                log::info!("Minimap {:?} at {:.2}, {:.2}", id, x, y);
                if id == Gamedata::MinimapDraw {
                    ClientEvent::MinimapDraw { x, y }
                } else {
                    ClientEvent::MinimapPing { x, y }
                }
            }
            Gamedata::PermanentItems => {
                let mut items = Vec::with_capacity(5);
                for _ in 0..5 {
                    let count = payload.read_u16()?;
                    let item = payload.read_u32()?;
                    items.push((count, item));
                }
                ClientEvent::PermanentItems(items)
            }
            Gamedata::VoiceCommand => {
                let client_id = payload.read_u32()?;
                let target = payload.read_string()?;
                let command = payload.read_u32()?;
                let kind = payload.read_u8()?;
                ClientEvent::VoiceCommand {
                    client_id,
                    target,
                    command,
                    kind,
                }
            }
            Gamedata::ConstructionComplete => ClientEvent::ConstructionComplete {
                building: payload.read_u16()?,
            },
            Gamedata::StartConstructBuilding => ClientEvent::ConstructionStarted {
                building: payload.read_u16()?,
            },
            Gamedata::GoldmineLow => ClientEvent::GoldmineLow {
                mine: payload.read_u32()?,
            },
            Gamedata::BuildingDestroyed => {
                let building = payload.read_u16()?;
                let kind = payload.read_u8()?;
                ClientEvent::BuildingDestroyed { building, kind }
            }
            Gamedata::Death => {
                let killer = payload.read_u32()?;
                let killed = payload.read_u32()?;
                let weapon = payload.read_u16()?;
                if let Ok(id) = u16::try_from(killed) {
                    if self.world.mark_killed(id) {
                        let name = self
                            .world
                            .get(id)
                            .and_then(|e| self.world.type_name(e))
                            .unwrap_or("entity");
                        log::info!("{} {} was killed", name, id);
                    }
                }
                ClientEvent::Death {
                    killer,
                    killed,
                    weapon,
                }
            }
            Gamedata::ExecScript => {
                let script = payload.read_string()?;
                let count = payload.read_u16()?;
                let mut args = Vec::with_capacity(count as usize);
                for _ in 0..count {
                    let key = payload.read_string()?;
                    let value = payload.read_string()?;
                    args.push((key, value));
                }
                log::info!("Server script \"{}\" with {} args", script, args.len());
                if script == RECONNECT_SCRIPT {
                    self.pending_reconnect = true;
                }
                ClientEvent::ExecScript { script, args }
            }
            Gamedata::RequestUnit
            | Gamedata::RequestTeam
            | Gamedata::Spawn
            | Gamedata::RequestSpawn => {
                log::warn!("Unexpected client-only gamedata {:?}", id);
                payload.skip_remaining();
                return Ok(());
            }
        };
        self.push_event(event);
        Ok(())
    }

    // ----- outbound -----

    fn send(&mut self, reliable: bool, cmd: ClientCmd, payload: &[u8]) -> Result<(), SessionError> {
        self.net_mut()?.send(reliable, cmd as u8, payload)?;
        Ok(())
    }

    fn send_gamedata(&mut self, id: Gamedata, payload: &[u8]) -> Result<(), SessionError> {
        let mut body = Vec::with_capacity(1 + payload.len());
        body.push(id as u8);
        body.extend_from_slice(payload);
        self.send(true, ClientCmd::Gamedata, &body)
    }

    fn send_cvars(&mut self) -> Result<(), SessionError> {
        let cvars = self.config.cvars();
        let blob = encode_var_blob(cvars.iter().map(|(k, v)| (k.as_str(), v.as_str())));
        let mut payload = ByteCursor::with_capacity(blob.len() + 5);
        payload.write_u32(blob.len() as u32);
        payload.write_bytes(&blob);
        payload.write_u8(CVAR_TRAILER);
        self.send(true, ClientCmd::Vars, payload.as_slice())
    }

    fn send_client_snapshot(&mut self, now: Instant) -> Result<(), SessionError> {
        let Some(frame) = self.current_frame else {
            return Ok(());
        };
        let mut payload = ByteCursor::with_capacity(21);
        payload.write_u32(frame);
        payload.write_u32(self.server_time());
        payload.write_u8(self.input.weapon);
        payload.write_u16(self.input.buttons.bits());
        payload.write_u16(0);
        payload.write_u8(5);
        payload.write_f32(self.input.pitch);
        payload.write_f32(self.input.yaw);
        self.send(false, ClientCmd::Snapshot, payload.as_slice())?;
        self.last_client_snapshot = Some(now);
        self.sent_snapshots += 1;
        Ok(())
    }

    pub fn send_ready(&mut self) -> Result<(), SessionError> {
        self.in_game = false;
        self.set_state(SessionState::Ready);
        self.send(true, ClientCmd::Ready, &[])
    }

    pub fn send_join(&mut self) -> Result<(), SessionError> {
        log::info!("Sending client join");
        self.set_state(SessionState::WaitingFirstFrame);
        self.send(true, ClientCmd::Join, &[])
    }

    pub fn request_world_download(&mut self) -> Result<(), SessionError> {
        log::info!("Requesting world download");
        self.in_game = false;
        self.set_state(SessionState::LoadingWorld);
        self.send(true, ClientCmd::DownloadWorld, &[])
    }

    pub fn request_team(&mut self, team: u16) -> Result<(), SessionError> {
        self.send_gamedata(Gamedata::RequestTeam, &team.to_le_bytes())
    }

    pub fn request_unit(&mut self, unit: u16) -> Result<(), SessionError> {
        self.send_gamedata(Gamedata::RequestUnit, &unit.to_le_bytes())
    }

    pub fn prepare_spawn(&mut self) -> Result<(), SessionError> {
        self.send_gamedata(Gamedata::Spawn, &[])
    }

    pub fn request_spawn(&mut self, building: u32) -> Result<(), SessionError> {
        self.send_gamedata(Gamedata::RequestSpawn, &building.to_le_bytes())
    }

    pub fn chat_all(&mut self, message: &str) -> Result<(), SessionError> {
        let mut payload = ByteCursor::new();
        payload.write_string(message);
        self.send_gamedata(Gamedata::ChatAll, payload.as_slice())
    }

    pub fn chat_team(&mut self, message: &str) -> Result<(), SessionError> {
        let mut payload = ByteCursor::new();
        payload.write_string(message);
        self.send_gamedata(Gamedata::ChatTeam, payload.as_slice())
    }

    pub fn ping_minimap(&mut self, x: f32, y: f32) -> Result<(), SessionError> {
        self.send_minimap(Gamedata::MinimapPing, x, y)
    }

    pub fn draw_minimap(&mut self, x: f32, y: f32) -> Result<(), SessionError> {
        self.send_minimap(Gamedata::MinimapDraw, x, y)
    }

    fn send_minimap(&mut self, id: Gamedata, x: f32, y: f32) -> Result<(), SessionError> {
        let Some(size) = self.current_world.as_ref().and_then(|w| w.size) else {
            log::warn!("World size unknown, dropping minimap {:?}", id);
            return Ok(());
        };
        let mut payload = ByteCursor::with_capacity(9);
        payload.write_f32(x / size);
        payload.write_f32(y / size);
        payload.write_u8(0xFF);
        self.send_gamedata(id, payload.as_slice())
    }

    /// Points the local player at `target` and holds forward.
    pub fn move_towards(&mut self, target: Vec3) {
        if !self.in_game {
            return;
        }
        if let Some(position) = self.world.local_entity().map(|e| e.position) {
            self.input.move_towards(position, target);
        }
    }

    // ----- queries -----

    fn net_mut(&mut self) -> Result<&mut ReliableSession<T>, SessionError> {
        self.net.as_mut().ok_or(SessionError::NotConnected)
    }

    pub fn transport(&self) -> Option<&T> {
        self.net.as_ref().map(ReliableSession::transport)
    }

    pub fn transport_mut(&mut self) -> Option<&mut T> {
        self.net.as_mut().map(ReliableSession::transport_mut)
    }

    pub fn net_stats(&self) -> Option<&NetworkStats> {
        self.net.as_ref().map(ReliableSession::stats)
    }

    pub fn client_id(&self) -> Option<u16> {
        self.net.as_ref().map(ReliableSession::client_id)
    }

    pub fn loader(&self) -> &L {
        &self.loader
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    pub fn is_in_game(&self) -> bool {
        self.in_game
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn entity(&self, id: u16) -> Option<&Entity> {
        self.world.get(id)
    }

    pub fn entities_of_type<'a>(&'a self, prefix: &'a str) -> impl Iterator<Item = &'a Entity> + 'a {
        self.world.entities_of_type(prefix)
    }

    pub fn local_entity(&self) -> Option<&Entity> {
        if !self.in_game {
            return None;
        }
        self.world.local_entity()
    }

    pub fn client_info(&self) -> Option<&ClientInfo> {
        if !self.connected {
            return None;
        }
        self.world.client_info()
    }

    pub fn team_info(&self, team_id: i32) -> TeamInfo {
        self.world.team_info(team_id)
    }

    pub fn state_strings(&self) -> &StateStrings {
        &self.state_strings
    }

    pub fn current_world(&self) -> Option<&WorldInfo> {
        self.current_world.as_ref()
    }

    pub fn input(&self) -> &InputState {
        &self.input
    }

    pub fn input_mut(&mut self) -> &mut InputState {
        &mut self.input
    }

    pub fn server_fps(&self) -> u32 {
        self.server_fps
    }

    pub fn current_frame(&self) -> Option<u32> {
        self.current_frame
    }

    /// Server clock estimate: last snapshot timestamp plus local time since.
    pub fn server_time(&self) -> u32 {
        let elapsed = self.last_server_frame_at.elapsed().as_millis() as u32;
        self.last_server_timestamp.wrapping_add(elapsed)
    }

    pub fn sent_snapshots(&self) -> u64 {
        self.sent_snapshots
    }

    pub fn received_snapshots(&self) -> u64 {
        self.received_snapshots
    }

    pub fn drain_events(&mut self) -> Vec<ClientEvent> {
        std::mem::take(&mut self.events)
    }
}
