//! Project validation logic.

use std::collections::{HashMap, HashSet};
use std::str::FromStr;

use hf_graph::{ObjectKind, Port, Target};

use crate::schema::{ConnectionDef, ObjectDef, Project};

#[derive(thiserror::Error, Debug)]
pub enum ValidationError {
    #[error("Duplicate ID: {id} in {context}")]
    DuplicateId { id: String, context: String },

    #[error("Missing reference: {id} in {context}")]
    MissingReference { id: String, context: String },

    #[error("Invalid value: {field} = {value} ({reason})")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Unsupported version: {version}")]
    UnsupportedVersion { version: u32 },
}

pub fn validate_project(project: &Project) -> Result<(), ValidationError> {
    if project.version > crate::migrate::LATEST_VERSION {
        return Err(ValidationError::UnsupportedVersion {
            version: project.version,
        });
    }

    let mut handles = HashSet::new();
    for object in &project.objects {
        if !handles.insert(object.handle.as_str()) {
            return Err(ValidationError::DuplicateId {
                id: object.handle.clone(),
                context: "objects".to_string(),
            });
        }
        validate_object(object)?;
    }

    for object in &project.objects {
        let context = format!("object '{}'", object.name);
        if let Some(parent) = &object.parent {
            require(&handles, parent, &format!("{context} parent"))?;
        }
        for handle in object.targets.values() {
            require(&handles, handle, &format!("{context} targets"))?;
        }
    }
    validate_ownership(project)?;

    let mut used_ports = HashSet::new();
    for connection in &project.connections {
        let (from_port, to_port) = validate_connection(connection, &handles)?;
        for (handle, port) in [(&connection.from, from_port), (&connection.to, to_port)] {
            if !used_ports.insert((handle.as_str(), port)) {
                return Err(ValidationError::DuplicateId {
                    id: format!("{handle}/{port}"),
                    context: "connection ports".to_string(),
                });
            }
        }
    }

    Ok(())
}

fn validate_object(object: &ObjectDef) -> Result<(), ValidationError> {
    if let Err(e) = hf_core::parse_handle(&object.handle) {
        return Err(ValidationError::InvalidValue {
            field: "handle".to_string(),
            value: object.handle.clone(),
            reason: e.to_string(),
        });
    }
    if let Err(e) = ObjectKind::from_str(&object.kind) {
        return Err(ValidationError::InvalidValue {
            field: format!("object '{}' kind", object.name),
            value: object.kind.clone(),
            reason: e.to_string(),
        });
    }
    for field in object.targets.keys() {
        if let Err(e) = Target::from_str(field) {
            return Err(ValidationError::InvalidValue {
                field: format!("object '{}' targets", object.name),
                value: field.clone(),
                reason: e.to_string(),
            });
        }
    }
    if object.parent.as_deref() == Some(object.handle.as_str()) {
        return Err(ValidationError::InvalidValue {
            field: format!("object '{}' parent", object.name),
            value: object.handle.clone(),
            reason: "object cannot own itself".to_string(),
        });
    }
    Ok(())
}

/// Parent links must form a forest.
fn validate_ownership(project: &Project) -> Result<(), ValidationError> {
    let parents: HashMap<&str, &str> = project
        .objects
        .iter()
        .filter_map(|o| Some((o.handle.as_str(), o.parent.as_deref()?)))
        .collect();

    for object in &project.objects {
        let mut seen = HashSet::new();
        let mut cursor = Some(object.handle.as_str());
        while let Some(handle) = cursor {
            if !seen.insert(handle) {
                return Err(ValidationError::InvalidValue {
                    field: format!("object '{}' parent", object.name),
                    value: handle.to_string(),
                    reason: "ownership cycle".to_string(),
                });
            }
            cursor = parents.get(handle).copied();
        }
    }
    Ok(())
}

fn validate_connection(
    connection: &ConnectionDef,
    handles: &HashSet<&str>,
) -> Result<(Port, Port), ValidationError> {
    require(handles, &connection.from, "connection from")?;
    require(handles, &connection.to, "connection to")?;
    let parse = |port: &String| {
        Port::from_str(port).map_err(|e| ValidationError::InvalidValue {
            field: "connection port".to_string(),
            value: port.clone(),
            reason: e.to_string(),
        })
    };
    Ok((parse(&connection.from_port)?, parse(&connection.to_port)?))
}

fn require(handles: &HashSet<&str>, handle: &str, context: &str) -> Result<(), ValidationError> {
    if handles.contains(handle) {
        Ok(())
    } else {
        Err(ValidationError::MissingReference {
            id: handle.to_string(),
            context: context.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::migrate::LATEST_VERSION;
    use std::collections::BTreeMap;

    const FAN: &str = "6d1f4d2c-3b0a-4e5f-9a8b-1c2d3e4f5a6b";
    const NODE: &str = "0b9e8f7a-6c5d-4e3f-8a1b-2c3d4e5f6a7b";

    fn object(handle: &str, kind: &str) -> ObjectDef {
        ObjectDef {
            handle: handle.to_string(),
            kind: kind.to_string(),
            name: kind.to_string(),
            attributes: BTreeMap::new(),
            targets: BTreeMap::new(),
            parent: None,
        }
    }

    fn connection(from: &str, from_port: &str, to: &str, to_port: &str) -> ConnectionDef {
        ConnectionDef {
            from: from.to_string(),
            from_port: from_port.to_string(),
            to: to.to_string(),
            to_port: to_port.to_string(),
        }
    }

    fn project(objects: Vec<ObjectDef>, connections: Vec<ConnectionDef>) -> Project {
        Project {
            version: LATEST_VERSION,
            name: "p".to_string(),
            objects,
            connections,
        }
    }

    #[test]
    fn accepts_simple_project() {
        let p = project(
            vec![object(NODE, "node"), object(FAN, "fan")],
            vec![connection(NODE, "outlet", FAN, "inlet")],
        );
        validate_project(&p).unwrap();
    }

    #[test]
    fn rejects_newer_version() {
        let mut p = project(vec![], vec![]);
        p.version = LATEST_VERSION + 1;
        assert!(matches!(
            validate_project(&p),
            Err(ValidationError::UnsupportedVersion { .. })
        ));
    }

    #[test]
    fn rejects_duplicate_handles() {
        let p = project(vec![object(NODE, "node"), object(NODE, "fan")], vec![]);
        assert!(matches!(
            validate_project(&p),
            Err(ValidationError::DuplicateId { .. })
        ));
    }

    #[test]
    fn rejects_unknown_kind_and_port() {
        let p = project(vec![object(NODE, "gizmo")], vec![]);
        assert!(matches!(
            validate_project(&p),
            Err(ValidationError::InvalidValue { .. })
        ));

        let p = project(
            vec![object(NODE, "node"), object(FAN, "fan")],
            vec![connection(NODE, "sideways", FAN, "inlet")],
        );
        assert!(matches!(
            validate_project(&p),
            Err(ValidationError::InvalidValue { .. })
        ));
    }

    #[test]
    fn rejects_dangling_references() {
        let mut fan = object(FAN, "fan");
        fan.parent = Some(NODE.to_string());
        let p = project(vec![fan], vec![]);
        assert!(matches!(
            validate_project(&p),
            Err(ValidationError::MissingReference { .. })
        ));

        let p = project(
            vec![object(FAN, "fan")],
            vec![connection(NODE, "outlet", FAN, "inlet")],
        );
        assert!(matches!(
            validate_project(&p),
            Err(ValidationError::MissingReference { .. })
        ));
    }

    #[test]
    fn rejects_ownership_cycles() {
        let mut node = object(NODE, "node");
        let mut fan = object(FAN, "fan");
        node.parent = Some(FAN.to_string());
        fan.parent = Some(NODE.to_string());
        let p = project(vec![node, fan], vec![]);
        assert!(matches!(
            validate_project(&p),
            Err(ValidationError::InvalidValue { reason, .. }) if reason == "ownership cycle"
        ));
    }

    #[test]
    fn accepts_ownership_chain() {
        let mut fan = object(FAN, "fan");
        fan.parent = Some(NODE.to_string());
        validate_project(&project(vec![object(NODE, "node"), fan], vec![])).unwrap();
    }

    #[test]
    fn port_reuse_is_caught_after_parsing() {
        let p = project(
            vec![object(NODE, "node"), object(FAN, "fan")],
            vec![
                connection(NODE, "outlet", FAN, "inlet"),
                connection(NODE, " outlet", FAN, "inlet "),
            ],
        );
        assert!(matches!(
            validate_project(&p),
            Err(ValidationError::DuplicateId { .. })
        ));
    }

    #[test]
    fn rejects_port_used_twice() {
        let p = project(
            vec![object(NODE, "node"), object(FAN, "fan")],
            vec![
                connection(NODE, "outlet", FAN, "inlet"),
                connection(FAN, "outlet", FAN, "inlet"),
            ],
        );
        assert!(matches!(
            validate_project(&p),
            Err(ValidationError::DuplicateId { .. })
        ));
    }
}
