//! Data-model graph types: models, entities, attributes, relationships.
//!
//! Ownership is unidirectional: a [`DataModel`] owns its entities and
//! relationships, an [`Entity`] owns its attributes. Relationships and
//! attribute mappings reference entities/attributes by id only; resolution
//! goes through the owning model's lookup helpers, never object pointers.

use chrono::{DateTime, Utc};
use heck::ToSnakeCase;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelType {
    Conceptual,
    Logical,
    Physical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationshipType {
    OneToOne,
    OneToMany,
    ManyToMany,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DataModel {
    pub id: Uuid,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub model_type: ModelType,
    pub project_id: Uuid,
    pub owner_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_model_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    pub is_latest_version: bool,
    #[serde(default)]
    pub entities: Vec<Entity>,
    #[serde(default)]
    pub relationships: Vec<Relationship>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DataModel {
    pub fn new(
        name: impl Into<String>,
        model_type: ModelType,
        project_id: Uuid,
        owner_id: Uuid,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            description: None,
            model_type,
            project_id,
            owner_id,
            parent_model_id: None,
            version: Some("1.0.0".to_string()),
            is_latest_version: true,
            entities: Vec::new(),
            relationships: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn entity(&self, id: Uuid) -> Option<&Entity> {
        self.entities.iter().find(|entity| entity.id == id)
    }

    pub fn attribute(&self, id: Uuid) -> Option<&Attribute> {
        self.entities
            .iter()
            .flat_map(|entity| entity.attributes.iter())
            .find(|attribute| attribute.id == id)
    }

    /// Entity that owns the given attribute, if any.
    pub fn attribute_owner(&self, attribute_id: Uuid) -> Option<&Entity> {
        self.entities.iter().find(|entity| {
            entity
                .attributes
                .iter()
                .any(|attribute| attribute.id == attribute_id)
        })
    }

    /// Every id minted inside this model: the model itself, entities,
    /// attributes, and relationships.
    pub fn all_ids(&self) -> Vec<Uuid> {
        let mut ids = vec![self.id];
        for entity in &self.entities {
            ids.push(entity.id);
            ids.extend(entity.attributes.iter().map(|attribute| attribute.id));
        }
        ids.extend(self.relationships.iter().map(|rel| rel.id));
        ids
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Entity {
    pub id: Uuid,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema_name: Option<String>,
    pub table_name: String,
    #[serde(default)]
    pub is_view: bool,
    pub position_x: f64,
    pub position_y: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default)]
    pub attributes: Vec<Attribute>,
}

impl Entity {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let table_name = name.to_snake_case();
        Self {
            id: Uuid::new_v4(),
            name,
            description: None,
            schema_name: None,
            table_name,
            is_view: false,
            position_x: 0.0,
            position_y: 0.0,
            color: None,
            attributes: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Attribute {
    pub id: Uuid,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub data_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub length: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub precision: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scale: Option<u32>,
    pub is_nullable: bool,
    #[serde(default)]
    pub is_primary_key: bool,
    #[serde(default)]
    pub is_unique: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,
    pub position: u32,
}

impl Attribute {
    pub fn new(name: impl Into<String>, data_type: impl Into<String>, position: u32) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            description: None,
            data_type: data_type.into(),
            length: None,
            precision: None,
            scale: None,
            is_nullable: true,
            is_primary_key: false,
            is_unique: false,
            default_value: None,
            position,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Relationship {
    pub id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub source_entity_id: Uuid,
    pub target_entity_id: Uuid,
    pub relationship_type: RelationshipType,
    #[serde(default)]
    pub identifying: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cardinality_source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cardinality_target: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verbalize_source_to_target: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verbalize_target_to_source: Option<String>,
    #[serde(default)]
    pub attribute_mappings: Vec<AttributeMapping>,
}

impl Relationship {
    pub fn new(
        source_entity_id: Uuid,
        target_entity_id: Uuid,
        relationship_type: RelationshipType,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: None,
            description: None,
            source_entity_id,
            target_entity_id,
            relationship_type,
            identifying: false,
            cardinality_source: None,
            cardinality_target: None,
            verbalize_source_to_target: None,
            verbalize_target_to_source: None,
            attribute_mappings: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct AttributeMapping {
    pub source_attribute_id: Uuid,
    pub target_attribute_id: Uuid,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entity_table_name_defaults_to_snake_case() {
        let entity = Entity::new("CustomerOrder");
        assert_eq!(entity.table_name, "customer_order");
    }

    #[test]
    fn attribute_owner_resolves_through_entities() {
        let mut model = DataModel::new("m", ModelType::Logical, Uuid::new_v4(), Uuid::new_v4());
        let mut entity = Entity::new("Customer");
        let attribute = Attribute::new("id", "INTEGER", 0);
        let attribute_id = attribute.id;
        entity.attributes.push(attribute);
        let entity_id = entity.id;
        model.entities.push(entity);

        assert_eq!(
            model.attribute_owner(attribute_id).map(|e| e.id),
            Some(entity_id)
        );
        assert!(model.attribute(attribute_id).is_some());
        assert!(model.attribute(Uuid::new_v4()).is_none());
    }

    #[test]
    fn all_ids_cover_every_graph_node() {
        let mut model = DataModel::new("m", ModelType::Logical, Uuid::new_v4(), Uuid::new_v4());
        let mut entity = Entity::new("A");
        entity.attributes.push(Attribute::new("x", "INTEGER", 0));
        model.entities.push(entity);
        // model + entity + attribute
        assert_eq!(model.all_ids().len(), 3);
    }
}
