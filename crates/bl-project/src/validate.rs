//! Lab file validation logic.
//!
//! Structural problems are rejected here. Scenario parameter values are only
//! checked for finiteness: range handling belongs to the scenario setters.

use std::collections::HashSet;

use bl_scenarios::{Field, ParameterEdit};

use crate::schema::{LabFile, ScenarioDef, TimingDef, ViewportDef};

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Duplicate ID: {id} in {context}")]
    DuplicateId { id: String, context: String },

    #[error("Invalid value: {field} = {value} ({reason})")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Unknown field '{name}' in scenario '{scenario}'")]
    UnknownField { scenario: String, name: String },

    #[error("Edit '{edit}' in scenario '{scenario}' does not apply to a {kind} scenario")]
    MismatchedEdit {
        scenario: String,
        edit: String,
        kind: String,
    },

    #[error("Unsupported version: {version}")]
    UnsupportedVersion { version: u32 },
}

pub fn validate_lab(lab: &LabFile) -> Result<(), ValidationError> {
    if lab.version > crate::migrate::LATEST_VERSION {
        return Err(ValidationError::UnsupportedVersion {
            version: lab.version,
        });
    }

    validate_viewport(&lab.viewport)?;
    validate_timing(&lab.timing)?;
    lab.circuit_limits
        .validate()
        .map_err(|e| ValidationError::InvalidValue {
            field: "circuit_limits".to_string(),
            value: format!(
                "{}/{}",
                lab.circuit_limits.bulb_blow_current_a, lab.circuit_limits.short_circuit_current_a
            ),
            reason: e.to_string(),
        })?;

    let mut ids = HashSet::new();
    for scenario in &lab.scenarios {
        if !ids.insert(scenario.id.as_str()) {
            return Err(ValidationError::DuplicateId {
                id: scenario.id.clone(),
                context: "scenarios".to_string(),
            });
        }
        validate_scenario(scenario)?;
    }

    Ok(())
}

fn validate_viewport(viewport: &ViewportDef) -> Result<(), ValidationError> {
    for (field, v) in [
        ("viewport.width", viewport.width),
        ("viewport.height", viewport.height),
    ] {
        if !v.is_finite() || v <= 0.0 {
            return Err(ValidationError::InvalidValue {
                field: field.to_string(),
                value: v.to_string(),
                reason: "must be finite and positive".to_string(),
            });
        }
    }
    Ok(())
}

fn validate_timing(timing: &TimingDef) -> Result<(), ValidationError> {
    if !timing.step_dt_s.is_finite() || timing.step_dt_s <= 0.0 {
        return Err(ValidationError::InvalidValue {
            field: "timing.step_dt_s".to_string(),
            value: timing.step_dt_s.to_string(),
            reason: "must be finite and positive".to_string(),
        });
    }
    if timing.max_substeps == 0 {
        return Err(ValidationError::InvalidValue {
            field: "timing.max_substeps".to_string(),
            value: "0".to_string(),
            reason: "must be at least 1".to_string(),
        });
    }
    Ok(())
}

fn validate_scenario(scenario: &ScenarioDef) -> Result<(), ValidationError> {
    if scenario.id.trim().is_empty() {
        return Err(ValidationError::InvalidValue {
            field: "scenarios.id".to_string(),
            value: format!("'{}'", scenario.id),
            reason: "must not be empty".to_string(),
        });
    }

    for (name, value) in &scenario.params {
        let field: Field = name.parse().map_err(|_| ValidationError::UnknownField {
            scenario: scenario.id.clone(),
            name: name.clone(),
        })?;
        if field.scenario() != scenario.kind {
            return Err(ValidationError::UnknownField {
                scenario: scenario.id.clone(),
                name: name.clone(),
            });
        }
        ensure_finite(&scenario.id, name, *value)?;
    }

    for edit in &scenario.edits {
        if edit.scenario() != scenario.kind {
            return Err(ValidationError::MismatchedEdit {
                scenario: scenario.id.clone(),
                edit: edit.to_string(),
                kind: scenario.kind.to_string(),
            });
        }
        match edit {
            ParameterEdit::Set { field, value } => {
                ensure_finite(&scenario.id, field.name(), *value)?;
            }
            ParameterEdit::UpdateComponent { value, .. } => {
                ensure_finite(&scenario.id, "component", *value)?;
            }
            _ => {}
        }
    }

    Ok(())
}

fn ensure_finite(scenario: &str, name: &str, value: f64) -> Result<(), ValidationError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ValidationError::InvalidValue {
            field: format!("{scenario}.{name}"),
            value: value.to_string(),
            reason: "must be finite".to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bl_scenarios::{ComponentKind, ScenarioKind, Topology};

    fn lab() -> LabFile {
        let mut lab = LabFile::new("test");
        lab.scenarios.push(
            ScenarioDef::new("p", "Pendulum", ScenarioKind::Pendulum)
                .with_param(Field::Length, 3.0),
        );
        lab.scenarios.push(
            ScenarioDef::new("c", "Circuit", ScenarioKind::Circuit)
                .with_edit(ParameterEdit::Topology {
                    topology: Topology::Parallel,
                })
                .with_edit(ParameterEdit::AddComponent {
                    kind: ComponentKind::Bulb,
                }),
        );
        lab
    }

    #[test]
    fn valid_lab_passes() {
        validate_lab(&lab()).unwrap();
    }

    #[test]
    fn out_of_range_params_are_left_to_setters() {
        let mut lab = lab();
        lab.scenarios[0].params.insert("length".into(), 99.0);
        validate_lab(&lab).unwrap();
    }

    #[test]
    fn duplicate_ids_rejected() {
        let mut lab = lab();
        lab.scenarios[1].id = "p".into();
        assert!(matches!(
            validate_lab(&lab),
            Err(ValidationError::DuplicateId { .. })
        ));
    }

    #[test]
    fn newer_version_rejected() {
        let mut lab = lab();
        lab.version = crate::migrate::LATEST_VERSION + 1;
        assert!(matches!(
            validate_lab(&lab),
            Err(ValidationError::UnsupportedVersion { .. })
        ));
    }

    #[test]
    fn non_finite_param_rejected() {
        let mut lab = lab();
        lab.scenarios[0].params.insert("length".into(), f64::NAN);
        assert!(matches!(
            validate_lab(&lab),
            Err(ValidationError::InvalidValue { .. })
        ));
    }

    #[test]
    fn foreign_field_rejected() {
        let mut lab = lab();
        lab.scenarios[0].params.insert("friction".into(), 0.3);
        assert!(matches!(
            validate_lab(&lab),
            Err(ValidationError::UnknownField { .. })
        ));
        lab.scenarios[0].params.remove("friction");
        lab.scenarios[0].params.insert("bogus".into(), 1.0);
        assert!(matches!(
            validate_lab(&lab),
            Err(ValidationError::UnknownField { .. })
        ));
    }

    #[test]
    fn foreign_edit_rejected() {
        let mut lab = lab();
        lab.scenarios[0].edits.push(ParameterEdit::Topology {
            topology: Topology::Series,
        });
        assert!(matches!(
            validate_lab(&lab),
            Err(ValidationError::MismatchedEdit { .. })
        ));
    }

    #[test]
    fn ambient_settings_checked() {
        let mut bad = lab();
        bad.viewport.width = 0.0;
        assert!(validate_lab(&bad).is_err());

        let mut bad = lab();
        bad.timing.step_dt_s = -1.0;
        assert!(validate_lab(&bad).is_err());

        let mut bad = lab();
        bad.timing.max_substeps = 0;
        assert!(validate_lab(&bad).is_err());

        let mut bad = lab();
        bad.circuit_limits.bulb_blow_current_a = 3.0;
        assert!(validate_lab(&bad).is_err());
    }
}
