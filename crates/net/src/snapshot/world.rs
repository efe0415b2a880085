use std::collections::BTreeMap;
use std::sync::Arc;

use crate::delta::{SchemaRegistry, apply_entity_delta};
use crate::error::DecodeError;
use crate::net::{ByteCursor, ENTITY_FIELD_VERSION};

use super::entity::Entity;

pub const CLIENT_INFO_TYPE: &str = "Entity_ClientInfo";
pub const GAME_INFO_TYPE: &str = "Entity_GameInfo";
pub const TEAM_INFO_TYPE: &str = "Entity_TeamInfo";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientInfo {
    pub client_number: i32,
    pub player_entity_index: u16,
    pub ping: u16,
    pub name: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TeamInfo {
    pub base_building_index: u16,
}

/// What one entity record did to the world.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordOutcome {
    Created(u16),
    Updated(u16),
    Removed(u16),
    /// Removal of an id that was never present.
    Ignored(u16),
}

/// Entity map for the current world plus the tables derived from the
/// client, team and game info entities.
#[derive(Debug)]
pub struct World {
    schemas: Arc<SchemaRegistry>,
    version: u32,
    entities: BTreeMap<u16, Entity>,
    clients: BTreeMap<i32, ClientInfo>,
    teams: BTreeMap<i32, TeamInfo>,
    game_info_entity: Option<u16>,
    local_client_number: i32,
}

impl World {
    pub fn new(schemas: Arc<SchemaRegistry>) -> Self {
        Self::with_version(schemas, ENTITY_FIELD_VERSION)
    }

    pub fn with_version(schemas: Arc<SchemaRegistry>, version: u32) -> Self {
        Self {
            schemas,
            version,
            entities: BTreeMap::new(),
            clients: BTreeMap::new(),
            teams: BTreeMap::new(),
            game_info_entity: None,
            local_client_number: -1,
        }
    }

    pub fn schemas(&self) -> &SchemaRegistry {
        &self.schemas
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn local_client_number(&self) -> i32 {
        self.local_client_number
    }

    pub fn set_local_client_number(&mut self, client_number: i32) {
        self.local_client_number = client_number;
    }

    /// Drops every entity and derived table. The local client number survives.
    pub fn reset(&mut self) {
        self.entities.clear();
        self.clients.clear();
        self.teams.clear();
        self.game_info_entity = None;
    }

    /// Decodes one record: a 16-bit head (bit 0 baseline, id above it), a
    /// type id when baseline, then the changed fields.
    pub fn apply_entity_record(&mut self, cursor: &mut ByteCursor) -> Result<RecordOutcome, DecodeError> {
        let head = cursor.read_u16()?;
        let baseline = head & 1 != 0;
        let id = head >> 1;

        let (type_id, created) = if baseline {
            let type_id = cursor.read_u16()?;
            if type_id == 0 {
                return Ok(match self.entities.remove(&id) {
                    Some(_) => {
                        log::debug!("Removing entity {}", id);
                        RecordOutcome::Removed(id)
                    }
                    None => RecordOutcome::Ignored(id),
                });
            }
            if !self.schemas.contains(type_id) {
                return Err(DecodeError::UnknownEntityType { id, type_id });
            }
            let created = match self.entities.get(&id) {
                Some(existing) if existing.type_id == type_id => false,
                Some(existing) => {
                    log::debug!(
                        "Entity {} changed type {:#x} -> {:#x}, recreating",
                        id,
                        existing.type_id,
                        type_id
                    );
                    self.entities.insert(id, Entity::new(id, type_id));
                    true
                }
                None => {
                    self.entities.insert(id, Entity::new(id, type_id));
                    true
                }
            };
            (type_id, created)
        } else {
            if id == 0 {
                return Err(DecodeError::ZeroEntityId);
            }
            match self.entities.get(&id) {
                Some(entity) => (entity.type_id, false),
                None => return Err(DecodeError::UnknownEntity(id)),
            }
        };

        let schemas = Arc::clone(&self.schemas);
        let Some(schema) = schemas.get(type_id) else {
            return Err(DecodeError::UnknownEntityType { id, type_id });
        };
        let Some(entity) = self.entities.get_mut(&id) else {
            return Err(DecodeError::UnknownEntity(id));
        };
        apply_entity_delta(schema, self.version, entity, cursor)?;

        match schema.name.as_str() {
            CLIENT_INFO_TYPE => self.update_client(id),
            GAME_INFO_TYPE => self.game_info_entity = Some(id),
            TEAM_INFO_TYPE => self.update_team(id),
            _ => {}
        }

        Ok(if created {
            RecordOutcome::Created(id)
        } else {
            RecordOutcome::Updated(id)
        })
    }

    fn update_client(&mut self, id: u16) {
        let Some(entity) = self.entities.get(&id) else {
            return;
        };
        let info = ClientInfo {
            client_number: entity.client_number,
            player_entity_index: entity.player_entity_index,
            ping: entity.ping,
            name: entity.name.clone(),
        };
        self.clients.insert(info.client_number, info);
    }

    fn update_team(&mut self, id: u16) {
        let Some(entity) = self.entities.get(&id) else {
            return;
        };
        self.teams.insert(
            entity.team_id,
            TeamInfo {
                base_building_index: entity.base_building_index,
            },
        );
    }

    pub fn get(&self, id: u16) -> Option<&Entity> {
        self.entities.get(&id)
    }

    pub fn get_mut(&mut self, id: u16) -> Option<&mut Entity> {
        self.entities.get_mut(&id)
    }

    pub fn entities(&self) -> impl Iterator<Item = &Entity> {
        self.entities.values()
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    pub fn type_name(&self, entity: &Entity) -> Option<&str> {
        self.schemas.type_name(entity.type_id)
    }

    /// Entities whose type name starts with `prefix`, in id order.
    pub fn entities_of_type<'a>(&'a self, prefix: &'a str) -> impl Iterator<Item = &'a Entity> + 'a {
        self.entities.values().filter(move |e| {
            self.schemas
                .type_name(e.type_id)
                .is_some_and(|name| name.starts_with(prefix))
        })
    }

    pub fn client_info(&self) -> Option<&ClientInfo> {
        self.clients.get(&self.local_client_number)
    }

    pub fn client_info_for(&self, client_number: i32) -> Option<&ClientInfo> {
        self.clients.get(&client_number)
    }

    pub fn clients(&self) -> impl Iterator<Item = &ClientInfo> {
        self.clients.values()
    }

    pub fn team_info(&self, team_id: i32) -> TeamInfo {
        self.teams.get(&team_id).copied().unwrap_or_default()
    }

    pub fn game_info_entity(&self) -> Option<u16> {
        self.game_info_entity
    }

    /// The local player's entity, resolved through the local client info.
    pub fn local_entity(&self) -> Option<&Entity> {
        let index = self.client_info()?.player_entity_index;
        if index == 0 {
            return None;
        }
        self.entities.get(&index)
    }

    pub fn mark_killed(&mut self, id: u16) -> bool {
        match self.entities.get_mut(&id) {
            Some(entity) => {
                entity.killed = true;
                true
            }
            None => false,
        }
    }
}
