use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use crate::snapshot::AttributeSlot;

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("failed to read schema table: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse schema table: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("entity type {0} is declared twice")]
    DuplicateType(u16),
    #[error("entity type {type_id} field {field} has empty version range [{min}, {max})")]
    EmptyVersionRange {
        type_id: u16,
        field: String,
        min: u32,
        max: u32,
    },
}

/// Wire encoding of one entity field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum FieldType {
    Byte = 0,
    Short = 1,
    Int = 2,
    Float = 3,
    Qword = 4,
    Vector3 = 5,
    String = 6,
    WordEntityIndex = 7,
    WordHandle = 8,
    WordAngle = 9,
    /// u16 carried as a float, unscaled.
    WordFloat = 10,
    /// u8 divided by 255.
    ByteFloat = 11,
    /// Three unscaled u16 components.
    WordVector3 = 12,
}

impl FieldType {
    /// Width of the decoded integer, or `None` for non-integral kinds.
    pub fn integral_width(self) -> Option<usize> {
        match self {
            Self::Byte => Some(1),
            Self::Short | Self::WordEntityIndex | Self::WordHandle | Self::WordAngle => Some(2),
            Self::Int => Some(4),
            Self::Qword => Some(8),
            _ => None,
        }
    }

    pub fn is_float(self) -> bool {
        matches!(self, Self::Float | Self::WordFloat | Self::ByteFloat)
    }

    pub fn is_vector(self) -> bool {
        matches!(self, Self::Vector3 | Self::WordVector3)
    }
}

impl TryFrom<u8> for FieldType {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Ok(match value {
            0 => Self::Byte,
            1 => Self::Short,
            2 => Self::Int,
            3 => Self::Float,
            4 => Self::Qword,
            5 => Self::Vector3,
            6 => Self::String,
            7 => Self::WordEntityIndex,
            8 => Self::WordHandle,
            9 => Self::WordAngle,
            10 => Self::WordFloat,
            11 => Self::ByteFloat,
            12 => Self::WordVector3,
            other => return Err(other),
        })
    }
}

fn default_max_version() -> u32 {
    u32::MAX
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FieldSpec {
    pub name: String,
    pub kind: FieldType,
    #[serde(default)]
    pub min_version: u32,
    #[serde(default = "default_max_version")]
    pub max_version: u32,
    /// Entity attribute this field lands in, resolved when the table is loaded.
    #[serde(skip)]
    pub slot: Option<AttributeSlot>,
}

impl FieldSpec {
    pub fn new(name: impl Into<String>, kind: FieldType) -> Self {
        let mut field = Self {
            name: name.into(),
            kind,
            min_version: 0,
            max_version: u32::MAX,
            slot: None,
        };
        field.resolve_slot();
        field
    }

    pub fn with_versions(mut self, min_version: u32, max_version: u32) -> Self {
        self.min_version = min_version;
        self.max_version = max_version;
        self
    }

    /// Half-open: `min_version <= version < max_version`.
    pub fn in_version(&self, version: u32) -> bool {
        self.min_version <= version && version < self.max_version
    }

    fn resolve_slot(&mut self) {
        self.slot = AttributeSlot::from_field_name(&self.name).filter(|slot| slot.accepts(self.kind));
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TypeSchema {
    pub id: u16,
    pub name: String,
    #[serde(default)]
    pub fields: Vec<FieldSpec>,
}

impl TypeSchema {
    pub fn new(id: u16, name: impl Into<String>, fields: Vec<FieldSpec>) -> Self {
        Self {
            id,
            name: name.into(),
            fields,
        }
    }

    /// Fields on the wire at `version`, in declaration order.
    pub fn fields_for_version(&self, version: u32) -> impl Iterator<Item = &FieldSpec> {
        self.fields.iter().filter(move |f| f.in_version(version))
    }

    pub fn field_count(&self, version: u32) -> usize {
        self.fields_for_version(version).count()
    }
}

#[derive(Deserialize)]
struct SchemaFile {
    #[serde(default)]
    types: Vec<TypeSchema>,
}

/// Read-only catalog of entity types, built once and shared.
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    types: HashMap<u16, TypeSchema>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_toml_str(text: &str) -> Result<Self, SchemaError> {
        let file: SchemaFile = toml::from_str(text)?;
        let mut registry = Self::new();
        for schema in file.types {
            registry.insert(schema)?;
        }
        Ok(registry)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, SchemaError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    pub fn insert(&mut self, mut schema: TypeSchema) -> Result<(), SchemaError> {
        if self.types.contains_key(&schema.id) {
            return Err(SchemaError::DuplicateType(schema.id));
        }
        for field in &mut schema.fields {
            if field.min_version >= field.max_version {
                return Err(SchemaError::EmptyVersionRange {
                    type_id: schema.id,
                    field: field.name.clone(),
                    min: field.min_version,
                    max: field.max_version,
                });
            }
            field.resolve_slot();
        }
        self.types.insert(schema.id, schema);
        Ok(())
    }

    pub fn get(&self, type_id: u16) -> Option<&TypeSchema> {
        self.types.get(&type_id)
    }

    pub fn contains(&self, type_id: u16) -> bool {
        self.types.contains_key(&type_id)
    }

    pub fn type_name(&self, type_id: u16) -> Option<&str> {
        self.get(type_id).map(|s| s.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TypeSchema> {
        self.types.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TABLE: &str = r#"
        [[types]]
        id = 0x20
        name = "Entity_ClientInfo"
        fields = [
            { name = "m_iClientNumber", kind = "int" },
            { name = "m_sName", kind = "string" },
            { name = "m_unPing", kind = "short", min_version = 10 },
            { name = "m_yLegacy", kind = "byte", max_version = 20 },
            { name = "m_yStatus", kind = "short" },
        ]

        [[types]]
        id = 0x21
        name = "Player_Legionnaire"
        fields = [
            { name = "m_v3Position", kind = "word_vector3" },
            { name = "m_fHealth", kind = "byte_float" },
        ]
    "#;

    #[test]
    fn load_table() {
        let registry = SchemaRegistry::from_toml_str(TABLE).unwrap();
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.type_name(0x21), Some("Player_Legionnaire"));
        assert!(!registry.contains(0x22));

        let client_info = registry.get(0x20).unwrap();
        assert_eq!(client_info.fields[0].kind, FieldType::Int);
        assert_eq!(client_info.fields[0].slot, Some(AttributeSlot::ClientNumber));
        assert_eq!(client_info.fields[2].min_version, 10);
        assert_eq!(client_info.fields[2].max_version, u32::MAX);
    }

    #[test]
    fn fields_filtered_by_version() {
        let registry = SchemaRegistry::from_toml_str(TABLE).unwrap();
        let schema = registry.get(0x20).unwrap();

        let names = |v| {
            schema
                .fields_for_version(v)
                .map(|f| f.name.as_str())
                .collect::<Vec<_>>()
        };
        assert_eq!(
            names(5),
            vec!["m_iClientNumber", "m_sName", "m_yLegacy", "m_yStatus"]
        );
        assert_eq!(
            names(27),
            vec!["m_iClientNumber", "m_sName", "m_unPing", "m_yStatus"]
        );
        assert_eq!(schema.field_count(20), 4);
    }

    #[test]
    fn mismatched_or_unknown_fields_have_no_slot() {
        let registry = SchemaRegistry::from_toml_str(TABLE).unwrap();
        let schema = registry.get(0x20).unwrap();
        // Unknown attribute name.
        assert_eq!(schema.fields[3].slot, None);
        // Status only takes single bytes.
        assert_eq!(schema.fields[4].slot, None);
    }

    #[test]
    fn unknown_kind_rejected() {
        let table = r#"
            [[types]]
            id = 1
            name = "Broken"
            fields = [{ name = "m_x", kind = "half_float" }]
        "#;
        assert!(matches!(
            SchemaRegistry::from_toml_str(table),
            Err(SchemaError::Toml(_))
        ));
    }

    #[test]
    fn duplicate_and_empty_ranges_rejected() {
        let mut registry = SchemaRegistry::new();
        registry
            .insert(TypeSchema::new(1, "A", Vec::new()))
            .unwrap();
        assert!(matches!(
            registry.insert(TypeSchema::new(1, "B", Vec::new())),
            Err(SchemaError::DuplicateType(1))
        ));

        let field = FieldSpec::new("m_fHealth", FieldType::Float).with_versions(27, 27);
        assert!(matches!(
            registry.insert(TypeSchema::new(2, "C", vec![field])),
            Err(SchemaError::EmptyVersionRange { type_id: 2, .. })
        ));
    }

    #[test]
    fn wire_tags() {
        for tag in 0u8..=12 {
            assert_eq!(FieldType::try_from(tag).map(|t| t as u8), Ok(tag));
        }
        assert_eq!(FieldType::try_from(13), Err(13));
    }
}
