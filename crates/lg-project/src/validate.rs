//! Mechanism file validation.
//!
//! Runs before anything is built, so errors name file ids rather than
//! registry indices.

use std::collections::{HashMap, HashSet};

use crate::schema::{ComponentDef, ComponentKind, DriveDef, OptionsDef, Project, ShapeDef};

pub const LATEST_VERSION: u32 = 1;

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

fn invalid(field: String, value: f64, reason: &str) -> ValidationError {
    ValidationError::InvalidValue {
        field,
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

fn finite(field: impl Fn() -> String, value: f64) -> Result<(), ValidationError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(invalid(field(), value, "must be finite"))
    }
}

fn positive(field: impl Fn() -> String, value: f64) -> Result<(), ValidationError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(invalid(field(), value, "must be positive and finite"))
    }
}

fn non_negative(field: impl Fn() -> String, value: f64) -> Result<(), ValidationError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(invalid(field(), value, "must be non-negative and finite"))
    }
}

pub fn validate_project(project: &Project) -> Result<(), ValidationError> {
    if project.version == 0 || project.version > LATEST_VERSION {
        return Err(ValidationError::UnsupportedVersion {
            version: project.version,
        });
    }
    validate_options(&project.options)?;

    // id -> declaration position
    let mut declared: HashMap<&str, usize> = HashMap::new();
    for (i, component) in project.components.iter().enumerate() {
        if declared.insert(component.id.as_str(), i).is_some() {
            return Err(ValidationError::DuplicateId {
                id: component.id.clone(),
                context: "components".to_string(),
            });
        }
    }

    for (i, component) in project.components.iter().enumerate() {
        if let Some(parent) = &component.parent {
            match declared.get(parent.as_str()) {
                Some(&p) if p < i => {}
                Some(_) => {
                    return Err(ValidationError::MissingReference {
                        id: parent.clone(),
                        context: format!(
                            "parent of '{}' (parents must be declared first)",
                            component.id
                        ),
                    });
                }
                None => {
                    return Err(ValidationError::MissingReference {
                        id: parent.clone(),
                        context: format!("parent of '{}'", component.id),
                    });
                }
            }
        }
        if let ComponentKind::ElasticLink {
            connects: Some(other),
            ..
        } = &component.kind
        {
            if !declared.contains_key(other.as_str()) || *other == component.id {
                return Err(ValidationError::MissingReference {
                    id: other.clone(),
                    context: format!("second endpoint of '{}'", component.id),
                });
            }
        }
        validate_component(component)?;
    }

    if let Some(sequence) = &project.sequence {
        let mut seen = HashSet::new();
        for id in sequence {
            if !declared.contains_key(id.as_str()) {
                return Err(ValidationError::MissingReference {
                    id: id.clone(),
                    context: "sequence".to_string(),
                });
            }
            if !seen.insert(id) {
                return Err(ValidationError::DuplicateId {
                    id: id.clone(),
                    context: "sequence".to_string(),
                });
            }
        }
    }

    Ok(())
}

fn validate_options(options: &OptionsDef) -> Result<(), ValidationError> {
    if let Some(dt) = options.dt_s {
        positive(|| "options dt_s".to_string(), dt)?;
    }
    if options.subintegrations == Some(0) {
        return Err(invalid(
            "options subintegrations".to_string(),
            0.0,
            "must be at least 1",
        ));
    }
    if let Some(g) = options.gravity_mps2 {
        finite(|| "options gravity_mps2".to_string(), g)?;
    }
    Ok(())
}

fn validate_drive(id: &str, axis: &str, drive: &DriveDef) -> Result<(), ValidationError> {
    let field = |name: &str| format!("component '{}' trace {} {}", id, axis, name);
    match drive {
        DriveDef::Fixed { value } => finite(|| field("value"), *value),
        DriveDef::Harmonic {
            amplitude,
            omega_rad_s,
            phase,
            offset,
        } => {
            finite(|| field("amplitude"), *amplitude)?;
            finite(|| field("omega_rad_s"), *omega_rad_s)?;
            finite(|| field("phase"), *phase)?;
            finite(|| field("offset"), *offset)
        }
        DriveDef::Linear { rate, offset } => {
            finite(|| field("rate"), *rate)?;
            finite(|| field("offset"), *offset)
        }
    }
}

fn validate_component(component: &ComponentDef) -> Result<(), ValidationError> {
    let id = component.id.as_str();
    let field = |name: &str| format!("component '{}' {}", id, name);

    match &component.kind {
        ComponentKind::Anchor { position_m, trace } => {
            finite(|| field("position_m"), position_m[0])?;
            finite(|| field("position_m"), position_m[1])?;
            if let Some(trace) = trace {
                validate_drive(id, "x", &trace.x)?;
                validate_drive(id, "y", &trace.y)?;
            }
            Ok(())
        }
        ComponentKind::Path { shape } => match shape {
            ShapeDef::Line { from_m, to_m } => {
                for v in from_m.iter().chain(to_m) {
                    finite(|| field("line endpoint"), *v)?;
                }
                if from_m == to_m {
                    return Err(ValidationError::InvalidValue {
                        field: field("shape"),
                        value: format!("{:?}", from_m),
                        reason: "line endpoints must differ".to_string(),
                    });
                }
                Ok(())
            }
            ShapeDef::Circle { radius_m } => positive(|| field("radius_m"), *radius_m),
        },
        ComponentKind::MassPoint { mass_kg, local } => {
            positive(|| field("mass_kg"), *mass_kg)?;
            finite(|| field("local"), *local)
        }
        ComponentKind::SlidingMass {
            mass_kg,
            loc0,
            dloc0,
            damping,
        } => {
            positive(|| field("mass_kg"), *mass_kg)?;
            finite(|| field("loc0"), *loc0)?;
            finite(|| field("dloc0"), *dloc0)?;
            non_negative(|| field("damping"), *damping)
        }
        ComponentKind::RotatingLink {
            length_m,
            offset,
            phi0,
            dphi0,
            damping,
        } => {
            positive(|| field("length_m"), *length_m)?;
            finite(|| field("offset"), *offset)?;
            finite(|| field("phi0"), *phi0)?;
            finite(|| field("dphi0"), *dphi0)?;
            non_negative(|| field("damping"), *damping)
        }
        ComponentKind::ElasticLink {
            stiffness,
            rest_length_m,
            connects,
            x0,
            dx0,
            phi0,
            dphi0,
        } => {
            non_negative(|| field("stiffness"), *stiffness)?;
            match (connects, rest_length_m) {
                (None, Some(l)) => positive(|| field("rest_length_m"), *l)?,
                (Some(_), Some(l)) => non_negative(|| field("rest_length_m"), *l)?,
                (_, None) => {}
            }
            for (name, v) in [("x0", x0), ("dx0", dx0), ("phi0", phi0), ("dphi0", dphi0)] {
                finite(|| field(name), *v)?;
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::TraceDef;

    fn project(components: Vec<ComponentDef>) -> Project {
        Project {
            version: 1,
            name: "test".to_string(),
            options: OptionsDef::default(),
            components,
            sequence: None,
        }
    }

    fn comp(id: &str, parent: Option<&str>, kind: ComponentKind) -> ComponentDef {
        ComponentDef {
            id: id.to_string(),
            parent: parent.map(str::to_string),
            kind,
        }
    }

    fn anchor() -> ComponentKind {
        ComponentKind::Anchor {
            position_m: [0.0, 0.0],
            trace: None,
        }
    }

    fn rod(length_m: f64) -> ComponentKind {
        ComponentKind::RotatingLink {
            length_m,
            offset: 0.0,
            phi0: 0.0,
            dphi0: 0.0,
            damping: 0.0,
        }
    }

    #[test]
    fn accepts_pendulum() {
        let p = project(vec![
            comp("base", None, anchor()),
            comp("rod", Some("base"), rod(1.0)),
        ]);
        assert!(validate_project(&p).is_ok());
    }

    #[test]
    fn rejects_duplicate_ids() {
        let p = project(vec![comp("a", None, anchor()), comp("a", None, anchor())]);
        assert!(matches!(
            validate_project(&p),
            Err(ValidationError::DuplicateId { .. })
        ));
    }

    #[test]
    fn rejects_forward_parent() {
        let p = project(vec![
            comp("rod", Some("base"), rod(1.0)),
            comp("base", None, anchor()),
        ]);
        let err = validate_project(&p).unwrap_err();
        assert!(err.to_string().contains("declared first"));
    }

    #[test]
    fn rejects_unknown_endpoint_and_sequence_entries() {
        let mut p = project(vec![
            comp("base", None, anchor()),
            comp(
                "spring",
                Some("base"),
                ComponentKind::ElasticLink {
                    stiffness: 1.0,
                    rest_length_m: None,
                    connects: Some("ghost".to_string()),
                    x0: 0.0,
                    dx0: 0.0,
                    phi0: 0.0,
                    dphi0: 0.0,
                },
            ),
        ]);
        assert!(matches!(
            validate_project(&p),
            Err(ValidationError::MissingReference { .. })
        ));

        p.components.truncate(1);
        p.sequence = Some(vec!["base".to_string(), "nope".to_string()]);
        assert!(matches!(
            validate_project(&p),
            Err(ValidationError::MissingReference { .. })
        ));
    }

    #[test]
    fn rejects_bad_values() {
        let p = project(vec![comp("base", None, anchor()), comp("rod", Some("base"), rod(-1.0))]);
        assert!(matches!(
            validate_project(&p),
            Err(ValidationError::InvalidValue { .. })
        ));

        let p = project(vec![comp(
            "base",
            None,
            ComponentKind::Anchor {
                position_m: [0.0, 0.0],
                trace: Some(TraceDef {
                    x: DriveDef::Harmonic {
                        amplitude: f64::NAN,
                        omega_rad_s: 1.0,
                        phase: 0.0,
                        offset: 0.0,
                    },
                    y: DriveDef::default(),
                }),
            },
        )]);
        assert!(validate_project(&p).is_err());

        let mut p = project(vec![]);
        p.version = 7;
        assert!(matches!(
            validate_project(&p),
            Err(ValidationError::UnsupportedVersion { version: 7 })
        ));
    }
}
