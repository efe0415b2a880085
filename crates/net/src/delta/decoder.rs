use glam::Vec3;

use crate::error::DecodeError;
use crate::net::{ByteCursor, OutOfBounds};
use crate::snapshot::Entity;

use super::bitfield::{self, PresenceBits};
use super::schema::{FieldSpec, FieldType, TypeSchema};

/// One decoded field value, already converted to its in-memory unit.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Byte(u8),
    Word(u16),
    Int(u32),
    Qword(u64),
    Float(f32),
    Vector(Vec3),
    String(String),
}

impl FieldValue {
    pub fn as_u64(&self) -> Option<u64> {
        match *self {
            Self::Byte(v) => Some(v as u64),
            Self::Word(v) => Some(v as u64),
            Self::Int(v) => Some(v as u64),
            Self::Qword(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_f32(&self) -> Option<f32> {
        match *self {
            Self::Float(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_vec3(&self) -> Option<Vec3> {
        match *self {
            Self::Vector(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }
}

pub fn read_field_value(kind: FieldType, cursor: &mut ByteCursor) -> Result<FieldValue, OutOfBounds> {
    Ok(match kind {
        FieldType::Byte => FieldValue::Byte(cursor.read_u8()?),
        FieldType::Short
        | FieldType::WordEntityIndex
        | FieldType::WordHandle
        | FieldType::WordAngle => FieldValue::Word(cursor.read_u16()?),
        FieldType::Int => FieldValue::Int(cursor.read_u32()?),
        FieldType::Qword => FieldValue::Qword(cursor.read_u64()?),
        FieldType::Float => FieldValue::Float(cursor.read_f32()?),
        FieldType::Vector3 => FieldValue::Vector(cursor.read_vec3()?),
        FieldType::String => FieldValue::String(cursor.read_string()?),
        FieldType::WordFloat => FieldValue::Float(cursor.read_u16()? as f32),
        FieldType::ByteFloat => FieldValue::Float(cursor.read_u8()? as f32 / 255.0),
        FieldType::WordVector3 => {
            let x = cursor.read_u16()?;
            let y = cursor.read_u16()?;
            let z = cursor.read_u16()?;
            FieldValue::Vector(Vec3::new(x as f32, y as f32, z as f32))
        }
    })
}

pub fn write_field_value(value: &FieldValue, kind: FieldType, cursor: &mut ByteCursor) {
    match (kind, value) {
        (FieldType::Byte, FieldValue::Byte(v)) => cursor.write_u8(*v),
        (
            FieldType::Short
            | FieldType::WordEntityIndex
            | FieldType::WordHandle
            | FieldType::WordAngle,
            FieldValue::Word(v),
        ) => cursor.write_u16(*v),
        (FieldType::Int, FieldValue::Int(v)) => cursor.write_u32(*v),
        (FieldType::Qword, FieldValue::Qword(v)) => cursor.write_u64(*v),
        (FieldType::Float, FieldValue::Float(v)) => cursor.write_f32(*v),
        (FieldType::Vector3, FieldValue::Vector(v)) => cursor.write_vec3(*v),
        (FieldType::String, FieldValue::String(s)) => cursor.write_string(s),
        (FieldType::WordFloat, FieldValue::Float(v)) => cursor.write_u16(*v as u16),
        (FieldType::ByteFloat, FieldValue::Float(v)) => cursor.write_u8((*v * 255.0).round() as u8),
        (FieldType::WordVector3, FieldValue::Vector(v)) => {
            cursor.write_u16(v.x as u16);
            cursor.write_u16(v.y as u16);
            cursor.write_u16(v.z as u16);
        }
        (kind, value) => log::warn!("Cannot encode {:?} as {:?}", value, kind),
    }
}

/// Reads the presence bits for `schema` at `version` and returns the fields
/// that follow, in schema order, along with the raw bits.
///
/// A type with no fields at `version` consumes nothing.
pub fn decode_changed_fields<'a>(
    schema: &'a TypeSchema,
    version: u32,
    cursor: &mut ByteCursor,
) -> Result<(Vec<&'a FieldSpec>, PresenceBits), OutOfBounds> {
    let count = schema.field_count(version);
    if count == 0 {
        return Ok((Vec::new(), PresenceBits::new(0)));
    }

    let bits = bitfield::decode(count, cursor)?;
    let changed = schema
        .fields_for_version(version)
        .enumerate()
        .filter_map(|(i, field)| bits.get(i).then_some(field))
        .collect();
    Ok((changed, bits))
}

/// Decodes one entity delta body and applies every recognized field to `entity`.
/// Returns the number of fields read.
pub fn apply_entity_delta(
    schema: &TypeSchema,
    version: u32,
    entity: &mut Entity,
    cursor: &mut ByteCursor,
) -> Result<usize, DecodeError> {
    let (fields, _) = decode_changed_fields(schema, version, cursor)?;
    for field in &fields {
        let value = read_field_value(field.kind, cursor)?;
        match field.slot {
            Some(slot) => entity.apply(slot, &value),
            None => log::trace!(
                "Discarded {}::{} = {:?}",
                schema.name,
                field.name,
                value
            ),
        }
    }
    Ok(fields.len())
}

/// Writes a delta body for `values`, which pairs each changed field index
/// (among the fields present at `version`) with its value.
pub fn encode_entity_delta(
    schema: &TypeSchema,
    version: u32,
    values: &[(usize, FieldValue)],
    cursor: &mut ByteCursor,
) {
    let fields: Vec<&FieldSpec> = schema.fields_for_version(version).collect();
    if fields.is_empty() {
        return;
    }

    let mut bits = PresenceBits::new(fields.len());
    for (index, _) in values {
        bits.set(*index, true);
    }
    bitfield::encode_into(&bits, cursor);

    let mut ordered: Vec<&(usize, FieldValue)> = values.iter().collect();
    ordered.sort_by_key(|(index, _)| *index);
    ordered.dedup_by_key(|(index, _)| *index);
    for (index, value) in ordered {
        if let Some(field) = fields.get(*index) {
            write_field_value(value, field.kind, cursor);
        }
    }
}
