//! Schema migration framework.

use crate::ProjectError;
use crate::schema::Project;

pub const LATEST_VERSION: u32 = 1;

pub fn migrate_to_latest(mut project: Project) -> Result<Project, ProjectError> {
    while project.version < LATEST_VERSION {
        project = migrate_one_version(project)?;
    }
    Ok(project)
}

fn migrate_one_version(project: Project) -> Result<Project, ProjectError> {
    match project.version {
        0 => migrate_v0_to_v1(project),
        v => Err(ProjectError::Migration {
            what: format!("No migration path from version {}", v),
        }),
    }
}

/// Version 0 files spelled kinds and ports in CamelCase and left names
/// empty. Labels become snake_case and unnamed objects get their handle as
/// name.
fn migrate_v0_to_v1(mut project: Project) -> Result<Project, ProjectError> {
    for object in &mut project.objects {
        object.kind = to_snake_case(&object.kind);
        if object.name.is_empty() {
            object.name = object.handle.clone();
        }
        object.targets = std::mem::take(&mut object.targets)
            .into_iter()
            .map(|(field, handle)| (to_snake_case(&field), handle))
            .collect();
    }
    for connection in &mut project.connections {
        connection.from_port = to_snake_case(&connection.from_port);
        connection.to_port = to_snake_case(&connection.to_port);
    }

    project.version = 1;
    Ok(project)
}

fn to_snake_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 4);
    for (i, c) in s.chars().enumerate() {
        if c.is_ascii_uppercase() {
            if i > 0 && !out.ends_with(['_', ':']) {
                out.push('_');
            }
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{ConnectionDef, ObjectDef};
    use std::collections::BTreeMap;

    fn object(handle: &str, kind: &str, name: &str) -> ObjectDef {
        ObjectDef {
            handle: handle.to_string(),
            kind: kind.to_string(),
            name: name.to_string(),
            attributes: BTreeMap::new(),
            targets: BTreeMap::new(),
            parent: None,
        }
    }

    #[test]
    fn migrate_latest_is_noop() {
        let project = Project {
            version: LATEST_VERSION,
            name: "test".to_string(),
            objects: vec![object("a", "AirLoop", "")],
            connections: vec![],
        };

        let migrated = migrate_to_latest(project.clone()).unwrap();
        assert_eq!(migrated, project);
    }

    #[test]
    fn migrate_camel_case_labels() {
        let mut system = object("s", "OutdoorAirSystem", "");
        system.targets.insert("Controller".to_string(), "c".to_string());
        let project = Project {
            version: 0,
            name: "Old".to_string(),
            objects: vec![system, object("c", "ControllerOutdoorAir", "OA Controller")],
            connections: vec![ConnectionDef {
                from: "n".to_string(),
                from_port: "Outlet".to_string(),
                to: "s".to_string(),
                to_port: "OutdoorAir".to_string(),
            }],
        };

        let migrated = migrate_to_latest(project).unwrap();
        assert_eq!(migrated.version, LATEST_VERSION);
        assert_eq!(migrated.objects[0].kind, "outdoor_air_system");
        assert_eq!(migrated.objects[0].name, "s");
        assert_eq!(migrated.objects[0].targets.get("controller").map(String::as_str), Some("c"));
        assert_eq!(migrated.objects[1].name, "OA Controller");
        assert_eq!(migrated.connections[0].to_port, "outdoor_air");
    }

    #[test]
    fn indexed_ports_keep_their_suffix() {
        assert_eq!(to_snake_case("SupplySideOutlet:1"), "supply_side_outlet:1");
        assert_eq!(to_snake_case("Branch:0"), "branch:0");
        assert_eq!(to_snake_case("fan"), "fan");
    }

    #[test]
    fn unknown_old_version_is_rejected() {
        assert!(migrate_one_version(Project {
            version: 7,
            name: "x".to_string(),
            objects: vec![],
            connections: vec![],
        })
        .is_err());
    }
}
