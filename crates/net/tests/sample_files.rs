use s2net::delta::{FieldType, SchemaRegistry};
use s2net::session::ClientConfig;
use s2net::snapshot::{AttributeSlot, CLIENT_INFO_TYPE, TEAM_INFO_TYPE};

const TYPES: &str = include_str!("../../../schemas/types.toml");
const CONFIG: &str = include_str!("../../../client.toml");

#[test]
fn test_bundled_type_table_loads() {
    let registry = SchemaRegistry::from_toml_str(TYPES).unwrap();
    assert_eq!(registry.type_name(0x10), Some(CLIENT_INFO_TYPE));
    assert_eq!(registry.type_name(0x11), Some(TEAM_INFO_TYPE));

    let player = registry.get(0x40).unwrap();
    assert_eq!(player.fields[2].kind, FieldType::WordVector3);
    assert_eq!(player.fields[2].slot, Some(AttributeSlot::Angles));
    assert_eq!(player.field_count(5), 6);
    assert_eq!(player.field_count(27), 7);

    // Every field in the bundled table lands in an attribute.
    for schema in registry.iter() {
        for field in &schema.fields {
            assert!(field.slot.is_some(), "{}::{}", schema.name, field.name);
        }
    }
}

#[test]
fn test_bundled_config_loads() {
    let config = ClientConfig::from_toml_str(CONFIG).unwrap();
    assert_eq!(config.entity_version, 27);
    assert_eq!(config.cvars()["cl_lang"], "en");
}
