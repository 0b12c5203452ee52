//! In-memory model store with JSON persistence.
//!
//! The store is the single writer for model graphs: reads hand out shared
//! references, and every mutation validates the full change before touching
//! stored state, so a failed operation leaves the store exactly as it was.

use std::{
    collections::{HashMap, HashSet},
    fs::File,
    io::BufReader,
    path::Path,
};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    error::{Result, StudioError},
    model::{DataModel, Relationship},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Read,
    Write,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Read => "read",
            Action::Write => "write",
        }
    }
}

/// Access-control seam. The studio's real policy lives with the caller;
/// the engine only asks yes/no before touching a resource.
pub trait Authorizer {
    fn authorize(&self, user: Uuid, resource: Uuid, action: Action) -> bool;
}

/// Default policy for local tooling: every request is allowed.
pub struct AllowAll;

impl Authorizer for AllowAll {
    fn authorize(&self, _user: Uuid, _resource: Uuid, _action: Action) -> bool {
        true
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModelStore {
    pub models: Vec<DataModel>,
}

impl ModelStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        let reader = BufReader::new(file);
        let store: ModelStore = serde_json::from_reader(reader)?;
        store.validate()?;
        Ok(store)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let file = File::create(path)?;
        serde_json::to_writer_pretty(file, self).map_err(StudioError::from)
    }

    pub fn model(&self, id: Uuid) -> Result<&DataModel> {
        self.models
            .iter()
            .find(|model| model.id == id)
            .ok_or(StudioError::NotFound {
                kind: "data model",
                id,
            })
    }

    pub fn insert_model(&mut self, model: DataModel) -> Result<()> {
        if self.models.iter().any(|existing| existing.id == model.id) {
            return Err(StudioError::Integrity(format!(
                "model {} already exists in the store",
                model.id
            )));
        }
        validate_model(&model)?;
        self.models.push(model);
        Ok(())
    }

    /// Removes a model and its owned graph. Descendant versions keep their
    /// parent reference; lineage walks simply stop at the gap.
    pub fn remove_model(&mut self, id: Uuid) -> Result<DataModel> {
        let position = self
            .models
            .iter()
            .position(|model| model.id == id)
            .ok_or(StudioError::NotFound {
                kind: "data model",
                id,
            })?;
        Ok(self.models.remove(position))
    }

    /// Latest versions only, scoped to one project.
    pub fn latest_models(&self, project_id: Uuid) -> Vec<&DataModel> {
        self.models
            .iter()
            .filter(|model| model.project_id == project_id && model.is_latest_version)
            .collect()
    }

    /// Walks parent references up to the lineage root. Unknown or cyclic
    /// parents terminate the walk at the last known model.
    pub fn lineage_root(&self, id: Uuid) -> Uuid {
        let mut current = id;
        let mut seen = HashSet::new();
        while seen.insert(current) {
            match self.models.iter().find(|model| model.id == current) {
                Some(model) => match model.parent_model_id {
                    Some(parent) if self.models.iter().any(|m| m.id == parent) => {
                        current = parent;
                    }
                    _ => break,
                },
                None => break,
            }
        }
        current
    }

    /// Adds a relationship to a model after scope checks: both endpoint
    /// entities must belong to the model, and every attribute mapping must
    /// pair an attribute of the source entity with one of the target entity.
    pub fn add_relationship(&mut self, model_id: Uuid, relationship: Relationship) -> Result<()> {
        {
            let model = self.model(model_id)?;
            validate_relationship(model, &relationship)?;
        }
        let model = self
            .models
            .iter_mut()
            .find(|model| model.id == model_id)
            .ok_or(StudioError::NotFound {
                kind: "data model",
                id: model_id,
            })?;
        model.relationships.push(relationship);
        model.updated_at = Utc::now();
        Ok(())
    }

    /// Installs a cloned version: flips the source's latest flag and inserts
    /// the new model in one step. All checks run before any mutation, so a
    /// failure leaves the store untouched.
    pub fn commit_version(&mut self, source_id: Uuid, new_model: DataModel) -> Result<Uuid> {
        let source = self.model(source_id)?;
        if new_model.parent_model_id != Some(source_id) {
            return Err(StudioError::CloneFailed(format!(
                "staged model {} does not descend from source {}",
                new_model.id, source_id
            )));
        }
        if !source.is_latest_version {
            return Err(StudioError::CloneFailed(format!(
                "source model {source_id} is no longer the latest version in its lineage"
            )));
        }
        validate_model(&new_model).map_err(|err| StudioError::CloneFailed(err.to_string()))?;

        let existing_ids: HashSet<Uuid> = self
            .models
            .iter()
            .flat_map(|model| model.all_ids())
            .collect();
        if let Some(clash) = new_model
            .all_ids()
            .into_iter()
            .find(|id| existing_ids.contains(id))
        {
            return Err(StudioError::CloneFailed(format!(
                "staged graph reuses existing identity {clash}"
            )));
        }

        let new_id = new_model.id;
        if let Some(source) = self.models.iter_mut().find(|model| model.id == source_id) {
            source.is_latest_version = false;
            source.updated_at = Utc::now();
        }
        self.models.push(new_model);
        Ok(new_id)
    }

    /// Full-store consistency check: per-model graph integrity, globally
    /// unique identities, and at most one latest version per lineage.
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for model in &self.models {
            validate_model(model)?;
            for id in model.all_ids() {
                if !seen.insert(id) {
                    return Err(StudioError::Integrity(format!(
                        "identity {id} appears more than once in the store"
                    )));
                }
            }
        }

        let mut latest_per_lineage: HashMap<Uuid, Uuid> = HashMap::new();
        for model in self.models.iter().filter(|model| model.is_latest_version) {
            let root = self.lineage_root(model.id);
            if let Some(other) = latest_per_lineage.insert(root, model.id) {
                return Err(StudioError::Integrity(format!(
                    "models {other} and {} are both marked latest in lineage {root}",
                    model.id
                )));
            }
        }
        Ok(())
    }
}

/// Structural integrity of a single model graph.
pub fn validate_model(model: &DataModel) -> Result<()> {
    let mut ids = HashSet::new();
    for id in model.all_ids() {
        if !ids.insert(id) {
            return Err(StudioError::Integrity(format!(
                "identity {id} appears more than once in model {}",
                model.id
            )));
        }
    }
    for relationship in &model.relationships {
        validate_relationship(model, relationship)?;
    }
    Ok(())
}

fn validate_relationship(model: &DataModel, relationship: &Relationship) -> Result<()> {
    let source = model.entity(relationship.source_entity_id).ok_or_else(|| {
        StudioError::Integrity(format!(
            "relationship {} references source entity {} outside model {}",
            relationship.id, relationship.source_entity_id, model.id
        ))
    })?;
    let target = model.entity(relationship.target_entity_id).ok_or_else(|| {
        StudioError::Integrity(format!(
            "relationship {} references target entity {} outside model {}",
            relationship.id, relationship.target_entity_id, model.id
        ))
    })?;
    for mapping in &relationship.attribute_mappings {
        let source_owns = source
            .attributes
            .iter()
            .any(|attribute| attribute.id == mapping.source_attribute_id);
        if !source_owns {
            return Err(StudioError::Integrity(format!(
                "mapping attribute {} does not belong to source entity {}",
                mapping.source_attribute_id, source.id
            )));
        }
        let target_owns = target
            .attributes
            .iter()
            .any(|attribute| attribute.id == mapping.target_attribute_id);
        if !target_owns {
            return Err(StudioError::Integrity(format!(
                "mapping attribute {} does not belong to target entity {}",
                mapping.target_attribute_id, target.id
            )));
        }
    }
    Ok(())
}
