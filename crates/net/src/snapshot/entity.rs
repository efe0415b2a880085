use glam::Vec3;

use crate::delta::{FieldType, FieldValue};

pub const STATUS_ALIVE: u8 = 0;
pub const STATUS_SPAWNING: u8 = 1;
pub const STATUS_DEAD: u8 = 3;
pub const STATUS_DORMANT: u8 = 5;

/// Entity attributes that wire fields can be routed into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttributeSlot {
    NetFlags,
    Position,
    Angles,
    ClientNum,
    ClientNumber,
    AccountId,
    PlayerEntityIndex,
    Name,
    Ping,
    Status,
    GamePhase,
    Team,
    TeamId,
    BaseBuildingIndex,
    Health,
}

impl AttributeSlot {
    pub const ALL: [AttributeSlot; 15] = [
        Self::NetFlags,
        Self::Position,
        Self::Angles,
        Self::ClientNum,
        Self::ClientNumber,
        Self::AccountId,
        Self::PlayerEntityIndex,
        Self::Name,
        Self::Ping,
        Self::Status,
        Self::GamePhase,
        Self::Team,
        Self::TeamId,
        Self::BaseBuildingIndex,
        Self::Health,
    ];

    pub fn field_name(self) -> &'static str {
        match self {
            Self::NetFlags => "m_uiNetFlags",
            Self::Position => "m_v3Position",
            Self::Angles => "m_v3Angles",
            Self::ClientNum => "m_iClientNum",
            Self::ClientNumber => "m_iClientNumber",
            Self::AccountId => "m_iAccountID",
            Self::PlayerEntityIndex => "m_uiPlayerEntityIndex",
            Self::Name => "m_sName",
            Self::Ping => "m_unPing",
            Self::Status => "m_yStatus",
            Self::GamePhase => "m_uiGamePhase",
            Self::Team => "m_iTeam",
            Self::TeamId => "m_iTeamID",
            Self::BaseBuildingIndex => "m_uiBaseBuildingIndex",
            Self::Health => "m_fHealth",
        }
    }

    /// Exact, case-sensitive lookup.
    pub fn from_field_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|slot| slot.field_name() == name)
    }

    /// Whether values of `kind` fit this attribute. Integer slots take any
    /// integral kind no wider than their storage.
    pub fn accepts(self, kind: FieldType) -> bool {
        match self {
            Self::NetFlags
            | Self::ClientNum
            | Self::ClientNumber
            | Self::AccountId
            | Self::GamePhase
            | Self::TeamId => kind.integral_width().is_some_and(|w| w <= 4),
            Self::PlayerEntityIndex | Self::Ping | Self::BaseBuildingIndex => {
                kind.integral_width().is_some_and(|w| w <= 2)
            }
            Self::Status | Self::Team => kind.integral_width() == Some(1),
            Self::Position | Self::Angles => kind.is_vector(),
            Self::Name => kind == FieldType::String,
            Self::Health => kind.is_float(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    pub id: u16,
    pub type_id: u16,
    pub net_flags: u32,
    pub position: Vec3,
    pub angles: Vec3,
    pub client_num: i32,
    pub client_number: i32,
    pub account_id: i32,
    pub player_entity_index: u16,
    pub name: String,
    pub ping: u16,
    pub status: u8,
    pub game_phase: u32,
    pub team: u8,
    pub team_id: i32,
    pub base_building_index: u16,
    pub health: f32,
    /// Set when a death notice names this entity.
    pub killed: bool,
}

impl Entity {
    pub fn new(id: u16, type_id: u16) -> Self {
        Self {
            id,
            type_id,
            net_flags: 0,
            position: Vec3::ZERO,
            angles: Vec3::ZERO,
            client_num: 0,
            client_number: 0,
            account_id: 0,
            player_entity_index: 0,
            name: String::new(),
            ping: 0,
            status: STATUS_ALIVE,
            game_phase: 0,
            team: 0,
            team_id: 0,
            base_building_index: 0,
            health: 0.0,
            killed: false,
        }
    }

    pub fn is_alive(&self) -> bool {
        self.status == STATUS_ALIVE
    }

    pub fn is_dormant(&self) -> bool {
        self.status == STATUS_SPAWNING || self.status == STATUS_DORMANT
    }

    /// Stores `value` in `slot`. Values of the wrong shape are ignored.
    pub fn apply(&mut self, slot: AttributeSlot, value: &FieldValue) {
        match slot {
            AttributeSlot::Position => {
                if let Some(v) = value.as_vec3() {
                    self.position = v;
                }
            }
            AttributeSlot::Angles => {
                if let Some(v) = value.as_vec3() {
                    self.angles = v;
                }
            }
            AttributeSlot::Name => {
                if let Some(s) = value.as_str() {
                    self.name = s.to_owned();
                }
            }
            AttributeSlot::Health => {
                if let Some(v) = value.as_f32() {
                    self.health = v;
                }
            }
            _ => {
                if let Some(v) = value.as_u64() {
                    self.apply_integer(slot, v);
                }
            }
        }
    }

    fn apply_integer(&mut self, slot: AttributeSlot, v: u64) {
        match slot {
            AttributeSlot::NetFlags => self.net_flags = v as u32,
            AttributeSlot::ClientNum => self.client_num = v as i32,
            AttributeSlot::ClientNumber => self.client_number = v as i32,
            AttributeSlot::AccountId => self.account_id = v as i32,
            AttributeSlot::PlayerEntityIndex => self.player_entity_index = v as u16,
            AttributeSlot::Ping => self.ping = v as u16,
            AttributeSlot::Status => self.status = v as u8,
            AttributeSlot::GamePhase => self.game_phase = v as u32,
            AttributeSlot::Team => self.team = v as u8,
            AttributeSlot::TeamId => self.team_id = v as i32,
            AttributeSlot::BaseBuildingIndex => self.base_building_index = v as u16,
            AttributeSlot::Position
            | AttributeSlot::Angles
            | AttributeSlot::Name
            | AttributeSlot::Health => {}
        }
    }
}
