//! Lab file loading, validation and introspection.

use std::path::Path;

use bl_project::{LabFile, ScenarioDef};
use bl_scenarios::{Field, MountOptions, ParameterEdit, Scenario, ScenarioKind};
use bl_view::Viewport;
use tracing::{debug, info};

use crate::error::{AppError, AppResult};
use crate::session::SessionOptions;

/// Summary of a scenario preset for listing.
#[derive(Debug, Clone, serde::Serialize)]
pub struct ScenarioSummary {
    pub id: String,
    pub name: String,
    pub kind: ScenarioKind,
    pub param_count: usize,
    pub edit_count: usize,
}

/// Load a lab file (`.json` as JSON, otherwise YAML), migrated and validated.
pub fn load_lab(path: &Path) -> AppResult<LabFile> {
    let content = std::fs::read_to_string(path).map_err(|e| AppError::LabFileRead {
        path: path.to_path_buf(),
        source: e,
    })?;
    let is_json = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("json"));
    let lab = if is_json {
        bl_project::from_json_str(&content)?
    } else {
        bl_project::from_yaml_str(&content)?
    };
    info!(path = %path.display(), name = %lab.name, "lab loaded");
    Ok(lab)
}

pub fn validate_lab(lab: &LabFile) -> AppResult<()> {
    bl_project::validate_lab(lab).map_err(|e| AppError::Project(e.to_string()))
}

pub fn list_scenarios(lab: &LabFile) -> Vec<ScenarioSummary> {
    lab.scenarios
        .iter()
        .map(|s| ScenarioSummary {
            id: s.id.clone(),
            name: s.name.clone(),
            kind: s.kind,
            param_count: s.params.len(),
            edit_count: s.edits.len(),
        })
        .collect()
}

pub fn get_scenario<'a>(lab: &'a LabFile, scenario_id: &str) -> AppResult<&'a ScenarioDef> {
    lab.scenario(scenario_id)
        .ok_or_else(|| AppError::ScenarioNotFound(scenario_id.to_string()))
}

/// Session settings taken from the lab's viewport, timing and circuit limits.
pub fn session_options(lab: &LabFile) -> AppResult<SessionOptions> {
    let viewport = Viewport::new(lab.viewport.width, lab.viewport.height)?;
    let mount = MountOptions {
        step: lab.timing.into(),
        circuit_limits: lab.circuit_limits,
    };
    mount.validate()?;
    Ok(SessionOptions {
        viewport,
        mount,
        ..SessionOptions::default()
    })
}

/// Apply a preset to a freshly mounted scenario.
///
/// Parameters go through the same setters as interactive edits, so
/// out-of-range values are clamped. Listed edits follow in order.
pub fn apply_preset(scenario: &mut dyn Scenario, preset: &ScenarioDef) -> AppResult<()> {
    if preset.kind != scenario.kind() {
        return Err(AppError::InvalidInput(format!(
            "preset '{}' is a {} scenario, mounted scenario is {}",
            preset.id,
            preset.kind,
            scenario.kind()
        )));
    }
    for (name, value) in &preset.params {
        let field: Field = name.parse()?;
        scenario.on_parameter_edit(&ParameterEdit::set(field, *value))?;
    }
    for edit in &preset.edits {
        scenario.on_parameter_edit(edit)?;
    }
    debug!(
        preset = %preset.id,
        params = preset.params.len(),
        edits = preset.edits.len(),
        "preset applied"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use bl_rigid::DefaultWorldFactory;
    use bl_scenarios::mount;

    fn lab() -> LabFile {
        let mut lab = LabFile::new("svc");
        lab.scenarios.push(
            ScenarioDef::new("p", "Long", ScenarioKind::Pendulum)
                .with_param(Field::Length, 9.0)
                .with_param(Field::ReleaseAngle, 10.0),
        );
        lab
    }

    #[test]
    fn lookup_by_id() {
        let lab = lab();
        assert_eq!(get_scenario(&lab, "p").unwrap().name, "Long");
        assert!(matches!(
            get_scenario(&lab, "nope"),
            Err(AppError::ScenarioNotFound(_))
        ));
        let summaries = list_scenarios(&lab);
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].param_count, 2);
    }

    #[test]
    fn preset_params_are_clamped() {
        let lab = lab();
        let mut s = mount(
            ScenarioKind::Pendulum,
            &DefaultWorldFactory,
            MountOptions::default(),
        )
        .unwrap();
        apply_preset(s.as_mut(), get_scenario(&lab, "p").unwrap()).unwrap();
        let values = s.values();
        assert!(values.contains(&(Field::Length, 5.0)));
        assert!(values.contains(&(Field::ReleaseAngle, 10.0)));
    }

    #[test]
    fn preset_for_another_kind_is_rejected() {
        let lab = lab();
        let mut s = mount(ScenarioKind::Lever, &DefaultWorldFactory, MountOptions::default())
            .unwrap();
        assert!(matches!(
            apply_preset(s.as_mut(), &lab.scenarios[0]),
            Err(AppError::InvalidInput(_))
        ));
    }

    #[test]
    fn options_follow_the_lab() {
        let mut lab = lab();
        lab.viewport.width = 1200.0;
        lab.timing.max_substeps = 4;
        let opts = session_options(&lab).unwrap();
        assert_eq!(opts.viewport.width, 1200.0);
        assert_eq!(opts.mount.step.max_substeps, 4);
    }
}
