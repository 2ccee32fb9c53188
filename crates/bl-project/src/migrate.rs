//! Lab file migration.

use bl_scenarios::Field;
use tracing::debug;

use crate::ProjectError;
use crate::schema::LabFile;

pub const LATEST_VERSION: u32 = 1;

/// Unit suffixes that version 0 files appended to parameter names.
const LEGACY_SUFFIXES: [&str; 6] = ["_deg", "_kg", "_m", "_v", "_ohm", "_nm"];

pub fn migrate_to_latest(mut lab: LabFile) -> Result<LabFile, ProjectError> {
    while lab.version < LATEST_VERSION {
        lab = migrate_one_version(lab)?;
    }
    Ok(lab)
}

fn migrate_one_version(lab: LabFile) -> Result<LabFile, ProjectError> {
    match lab.version {
        0 => migrate_v0_to_v1(lab),
        v => Err(ProjectError::Migration {
            what: format!("No migration path from version {}", v),
        }),
    }
}

/// Version 0 named parameters with a unit suffix (`length_m`,
/// `release_angle_deg`). Version 1 uses the bare field name.
fn migrate_v0_to_v1(mut lab: LabFile) -> Result<LabFile, ProjectError> {
    for scenario in &mut lab.scenarios {
        let params = std::mem::take(&mut scenario.params);
        for (name, value) in params {
            let renamed = legacy_field_name(&name).unwrap_or(name);
            if scenario.params.insert(renamed.clone(), value).is_some() {
                return Err(ProjectError::Migration {
                    what: format!(
                        "scenario '{}' sets '{}' twice after renaming",
                        scenario.id, renamed
                    ),
                });
            }
        }
    }
    debug!(lab = %lab.name, "migrated lab file from version 0");
    lab.version = 1;
    Ok(lab)
}

fn legacy_field_name(name: &str) -> Option<String> {
    if name.parse::<Field>().is_ok() {
        return None;
    }
    LEGACY_SUFFIXES.iter().find_map(|suffix| {
        let stem = name.strip_suffix(suffix)?;
        stem.parse::<Field>().ok().map(|f| f.name().to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ScenarioDef;
    use bl_scenarios::ScenarioKind;

    #[test]
    fn migrate_latest_is_noop() {
        let mut lab = LabFile::new("test");
        lab.scenarios.push(
            ScenarioDef::new("p", "Pendulum", ScenarioKind::Pendulum)
                .with_param(Field::Length, 3.0),
        );
        let migrated = migrate_to_latest(lab.clone()).unwrap();
        assert_eq!(migrated, lab);
    }

    #[test]
    fn migrate_renames_unit_suffixed_params() {
        let mut lab = LabFile::new("old");
        lab.version = 0;
        let mut def = ScenarioDef::new("p", "Pendulum", ScenarioKind::Pendulum);
        def.params.insert("length_m".into(), 3.0);
        def.params.insert("release_angle_deg".into(), 30.0);
        def.params.insert("gravity_scale".into(), 1.5);
        lab.scenarios.push(def);

        let migrated = migrate_to_latest(lab).unwrap();
        assert_eq!(migrated.version, LATEST_VERSION);
        let params = &migrated.scenarios[0].params;
        assert_eq!(params.get("length"), Some(&3.0));
        assert_eq!(params.get("release_angle"), Some(&30.0));
        assert_eq!(params.get("gravity_scale"), Some(&1.5));
        assert_eq!(params.len(), 3);
    }

    #[test]
    fn migrate_rejects_collisions() {
        let mut lab = LabFile::new("old");
        lab.version = 0;
        let mut def = ScenarioDef::new("l", "Lever", ScenarioKind::Lever);
        def.params.insert("mass_left".into(), 2.0);
        def.params.insert("mass_left_kg".into(), 3.0);
        lab.scenarios.push(def);
        assert!(matches!(
            migrate_to_latest(lab),
            Err(ProjectError::Migration { .. })
        ));
    }
}
