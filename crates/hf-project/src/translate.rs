//! Forward and reverse translation between a [`Model`] and a [`Project`].

use std::collections::HashMap;
use std::str::FromStr;

use hf_core::{ObjectId, parse_handle};
use hf_graph::{AttributeValue, Model, ObjectKind, Port, Target};

use crate::ProjectResult;
use crate::migrate::LATEST_VERSION;
use crate::schema::{AttributeDef, ConnectionDef, ObjectDef, Project};
use crate::validate::validate_project;

/// Write every live object and edge of `model` into a project.
pub fn export_model(model: &Model, name: &str) -> Project {
    let handle_of = |obj: ObjectId| model.handle(obj).map(|h| h.to_string()).unwrap_or_default();

    let objects: Vec<ObjectDef> = model
        .objects()
        .filter_map(|obj| model.object(obj))
        .map(|o| ObjectDef {
            handle: o.handle().to_string(),
            kind: o.kind().label().to_string(),
            name: o.name().to_string(),
            attributes: o
                .attributes()
                .iter()
                .map(|(k, v)| (k.clone(), attribute_def(v)))
                .collect(),
            targets: o
                .targets()
                .iter()
                .map(|(field, &target)| (field.label().to_string(), handle_of(target)))
                .collect(),
            parent: o.parent().map(handle_of),
        })
        .collect();

    let connections: Vec<ConnectionDef> = model
        .edges()
        .into_iter()
        .map(|(from, to)| ConnectionDef {
            from: handle_of(from.obj),
            from_port: from.port.to_string(),
            to: handle_of(to.obj),
            to_port: to.port.to_string(),
        })
        .collect();

    tracing::debug!(
        objects = objects.len(),
        connections = connections.len(),
        "exported model"
    );
    Project {
        version: LATEST_VERSION,
        name: name.to_string(),
        objects,
        connections,
    }
}

/// Rebuild a model from `project`, keeping handles, names, attributes,
/// pointer fields, parents and edges.
///
/// The topology is taken as written; run
/// [`validate_model`](hf_graph::validate_model) to check it.
pub fn import_project(project: &Project) -> ProjectResult<Model> {
    validate_project(project)?;

    let mut model = Model::new();
    let mut ids: HashMap<&str, ObjectId> = HashMap::new();
    for def in &project.objects {
        let handle = parse_handle(&def.handle)?;
        let kind = ObjectKind::from_str(&def.kind)?;
        let obj = model.restore_object(handle, kind, def.name.clone())?;
        for (key, value) in &def.attributes {
            model.set_attribute(obj, key.clone(), attribute_value(value))?;
        }
        ids.insert(def.handle.as_str(), obj);
    }

    let lookup = |handle: &str| -> ProjectResult<ObjectId> {
        ids.get(handle).copied().ok_or_else(|| {
            hf_core::HfError::NotFound {
                what: format!("handle '{handle}'"),
            }
            .into()
        })
    };

    for def in &project.objects {
        let obj = lookup(&def.handle)?;
        if let Some(parent) = &def.parent {
            model.set_parent(obj, Some(lookup(parent)?))?;
        }
        for (field, target) in &def.targets {
            model.set_target(obj, Target::from_str(field)?, Some(lookup(target)?))?;
        }
    }

    for c in &project.connections {
        let from = lookup(&c.from)?;
        let to = lookup(&c.to)?;
        model.connect(from, Port::from_str(&c.from_port)?, to, Port::from_str(&c.to_port)?)?;
    }

    tracing::debug!(
        project = %project.name,
        objects = model.object_count(),
        "imported project"
    );
    Ok(model)
}

fn attribute_def(value: &AttributeValue) -> AttributeDef {
    match value {
        AttributeValue::Real(v) => AttributeDef::Real { value: *v },
        AttributeValue::Integer(v) => AttributeDef::Integer { value: *v },
        AttributeValue::Text(v) => AttributeDef::Text { value: v.clone() },
        AttributeValue::Flag(v) => AttributeDef::Flag { value: *v },
    }
}

fn attribute_value(def: &AttributeDef) -> AttributeValue {
    match def {
        AttributeDef::Real { value } => AttributeValue::Real(*value),
        AttributeDef::Integer { value } => AttributeValue::Integer(*value),
        AttributeDef::Text { value } => AttributeValue::Text(value.clone()),
        AttributeDef::Flag { value } => AttributeValue::Flag(*value),
    }
}
