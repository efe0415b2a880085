pub mod bitfield;
mod decoder;
mod schema;

pub use bitfield::PresenceBits;
pub use decoder::{
    FieldValue, apply_entity_delta, decode_changed_fields, encode_entity_delta, read_field_value,
    write_field_value,
};
pub use schema::{FieldSpec, FieldType, SchemaError, SchemaRegistry, TypeSchema};
