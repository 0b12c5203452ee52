//! Model versioning: copy-on-version cloning with identity remapping.

use std::collections::HashMap;
use std::sync::OnceLock;

use chrono::Utc;
use log::debug;
use regex::Regex;
use uuid::Uuid;

use crate::{
    error::{Result, StudioError},
    model::{AttributeMapping, DataModel, Entity, Relationship},
    store::{Action, Authorizer, ModelStore},
};

/// First version assigned when a model carries none.
pub const INITIAL_VERSION: &str = "1.0.0";

/// Suffix appended to unparseable version labels. Marks the copy as derived;
/// carries no ordering semantics.
pub const DERIVED_SUFFIX: &str = "-new";

fn semver_pattern() -> &'static Regex {
    static SEMVER: OnceLock<Regex> = OnceLock::new();
    SEMVER.get_or_init(|| Regex::new(r"^(\d+)\.(\d+)\.(\d+)$").expect("semver pattern"))
}

/// Next version label: `MAJOR.MINOR.PATCH` increments the patch, a bare
/// integer increments itself, an unset label starts at [`INITIAL_VERSION`],
/// and anything else gets [`DERIVED_SUFFIX`] appended.
pub fn next_version(current: Option<&str>) -> String {
    let Some(current) = current.map(str::trim).filter(|value| !value.is_empty()) else {
        return INITIAL_VERSION.to_string();
    };

    if let Some(captures) = semver_pattern().captures(current) {
        let parsed = (
            captures[1].parse::<u64>(),
            captures[2].parse::<u64>(),
            captures[3].parse::<u64>(),
        );
        if let (Ok(major), Ok(minor), Ok(patch)) = parsed {
            return format!("{major}.{minor}.{}", patch + 1);
        }
    }

    if let Ok(number) = current.parse::<u64>() {
        return (number + 1).to_string();
    }

    format!("{current}{DERIVED_SUFFIX}")
}

/// Clones `model_id` into a new latest version owned by `requester`.
///
/// The copy is staged completely outside the store: fresh identities for the
/// model, every entity, attribute, and relationship, with references
/// resolved through old-to-new id maps. Only a fully staged graph reaches
/// [`ModelStore::commit_version`], which installs it and flips the source's
/// latest flag as one step.
pub fn clone_model_version(
    store: &mut ModelStore,
    model_id: Uuid,
    requester: Uuid,
    authorizer: &dyn Authorizer,
) -> Result<Uuid> {
    let source = store.model(model_id)?;
    if !authorizer.authorize(requester, source.project_id, Action::Write) {
        return Err(StudioError::AccessDenied {
            user: requester,
            action: Action::Write.as_str(),
            resource: model_id,
        });
    }

    let staged = stage_clone(source, requester);
    debug!(
        "staged version {:?} of model {model_id} with {} entities and {} relationships",
        staged.version,
        staged.entities.len(),
        staged.relationships.len()
    );
    store.commit_version(model_id, staged)
}

fn stage_clone(source: &DataModel, requester: Uuid) -> DataModel {
    let now = Utc::now();
    let mut staged = DataModel {
        id: Uuid::new_v4(),
        name: source.name.clone(),
        description: source.description.clone(),
        model_type: source.model_type,
        project_id: source.project_id,
        owner_id: requester,
        parent_model_id: Some(source.id),
        version: Some(next_version(source.version.as_deref())),
        is_latest_version: true,
        entities: Vec::new(),
        relationships: Vec::new(),
        created_at: now,
        updated_at: now,
    };

    let mut entity_ids: HashMap<Uuid, Uuid> = HashMap::new();
    let mut attribute_ids: HashMap<Uuid, Uuid> = HashMap::new();

    for entity in &source.entities {
        let mut copied = Entity {
            id: Uuid::new_v4(),
            attributes: Vec::new(),
            ..entity.clone()
        };
        entity_ids.insert(entity.id, copied.id);
        for attribute in &entity.attributes {
            let mut copy = attribute.clone();
            copy.id = Uuid::new_v4();
            attribute_ids.insert(attribute.id, copy.id);
            copied.attributes.push(copy);
        }
        staged.entities.push(copied);
    }

    for relationship in &source.relationships {
        // Guards partial-copy states; with a consistent source every
        // endpoint is present in the map.
        let (Some(&source_entity), Some(&target_entity)) = (
            entity_ids.get(&relationship.source_entity_id),
            entity_ids.get(&relationship.target_entity_id),
        ) else {
            continue;
        };
        let mut copied = Relationship {
            id: Uuid::new_v4(),
            source_entity_id: source_entity,
            target_entity_id: target_entity,
            attribute_mappings: Vec::new(),
            ..relationship.clone()
        };
        for mapping in &relationship.attribute_mappings {
            let (Some(&source_attribute), Some(&target_attribute)) = (
                attribute_ids.get(&mapping.source_attribute_id),
                attribute_ids.get(&mapping.target_attribute_id),
            ) else {
                continue;
            };
            copied.attribute_mappings.push(AttributeMapping {
                source_attribute_id: source_attribute,
                target_attribute_id: target_attribute,
            });
        }
        staged.relationships.push(copied);
    }

    staged
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn semver_labels_increment_the_patch() {
        assert_eq!(next_version(Some("1.2.3")), "1.2.4");
        assert_eq!(next_version(Some("0.0.0")), "0.0.1");
    }

    #[test]
    fn integer_labels_increment_themselves() {
        assert_eq!(next_version(Some("5")), "6");
    }

    #[test]
    fn unset_labels_start_at_the_initial_version() {
        assert_eq!(next_version(None), "1.0.0");
        assert_eq!(next_version(Some("")), "1.0.0");
        assert_eq!(next_version(Some("   ")), "1.0.0");
    }

    #[test]
    fn unparseable_labels_get_the_derived_suffix() {
        assert_eq!(next_version(Some("abc")), "abc-new");
        assert_eq!(next_version(Some("1.2")), "1.2-new");
        assert_eq!(next_version(Some("v1.2.3")), "v1.2.3-new");
    }
}
