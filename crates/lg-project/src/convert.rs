//! Building a runnable mechanism from a validated file.

use std::collections::HashMap;

use lg_components::{
    Anchor, Body, Drive, ElasticLink, MassPoint, PathConstraint, RotatingLink, SlidingMass,
    Trajectory,
};
use lg_core::CompId;
use lg_core::units::{kg, m, mps2};
use lg_sim::{IntegratorType, SimOptions, Simulation, Unconfigured};
use lg_tree::{Mechanism, MechanismBuilder};

use crate::schema::{ComponentKind, DriveDef, IntegratorDef, OptionsDef, Project, ShapeDef};
use crate::validate::{ValidationError, validate_project};
use crate::{ProjectError, ProjectResult};

/// Component ids of a project, by file id.
///
/// Ids follow declaration order, so a connecting link may name a component
/// declared after it.
pub fn component_ids(project: &Project) -> HashMap<&str, CompId> {
    project
        .components
        .iter()
        .enumerate()
        .map(|(i, c)| (c.id.as_str(), CompId::from_index(i as u32)))
        .collect()
}

fn lookup(ids: &HashMap<&str, CompId>, id: &str, context: &str) -> ProjectResult<CompId> {
    ids.get(id).copied().ok_or_else(|| {
        ProjectError::Validation(ValidationError::MissingReference {
            id: id.to_string(),
            context: context.to_string(),
        })
    })
}

/// A trace drive shifted by the anchor's rest position on that axis.
fn drive(def: &DriveDef, base: f64) -> Drive {
    match *def {
        DriveDef::Fixed { value } => Drive::Fixed(base + value),
        DriveDef::Harmonic {
            amplitude,
            omega_rad_s,
            phase,
            offset,
        } => Drive::Harmonic {
            offset: base + offset,
            amplitude,
            omega: omega_rad_s,
            phase,
        },
        DriveDef::Linear { rate, offset } => Drive::Linear {
            offset: base + offset,
            rate,
        },
    }
}

fn body(kind: &ComponentKind, ids: &HashMap<&str, CompId>, owner: &str) -> ProjectResult<Body> {
    let body: Body = match kind {
        ComponentKind::Anchor { position_m, trace } => match trace {
            Some(trace) => Anchor::driven(Trajectory::new(
                drive(&trace.x, position_m[0]),
                drive(&trace.y, position_m[1]),
            ))
            .into(),
            None => Anchor::fixed(position_m[0], position_m[1]).into(),
        },
        ComponentKind::Path { shape } => match shape {
            ShapeDef::Line { from_m, to_m } => PathConstraint::line(*from_m, *to_m).into(),
            ShapeDef::Circle { radius_m } => PathConstraint::circle(m(*radius_m)).into(),
        },
        ComponentKind::MassPoint { mass_kg, local } => {
            MassPoint::new(kg(*mass_kg)).with_local(*local).into()
        }
        ComponentKind::SlidingMass {
            mass_kg,
            loc0,
            dloc0,
            damping,
        } => SlidingMass::new(kg(*mass_kg))
            .with_initial(*loc0, *dloc0)
            .with_damping(*damping)
            .into(),
        ComponentKind::RotatingLink {
            length_m,
            offset,
            phi0,
            dphi0,
            damping,
        } => RotatingLink::new(m(*length_m))
            .with_offset(*offset)
            .with_initial(*phi0, *dphi0)
            .with_damping(*damping)
            .into(),
        ComponentKind::ElasticLink {
            stiffness,
            rest_length_m,
            connects,
            x0,
            dx0,
            phi0,
            dphi0,
        } => match connects {
            Some(other) => {
                let other = lookup(ids, other, &format!("second endpoint of '{}'", owner))?;
                let link = ElasticLink::connecting(*stiffness, other);
                match rest_length_m {
                    Some(l) => link.with_rest_length(m(*l)).into(),
                    None => link.into(),
                }
            }
            None => ElasticLink::anchored(*stiffness, m(rest_length_m.unwrap_or(1.0)))
                .with_initial(*x0, *dx0, *phi0, *dphi0)
                .into(),
        },
    };
    Ok(body)
}

/// Build the mechanism tree described by `project`.
pub fn build_mechanism(project: &Project) -> ProjectResult<Mechanism> {
    validate_project(project)?;
    let ids = component_ids(project);

    let mut builder = MechanismBuilder::new();
    for def in &project.components {
        let body = body(&def.kind, &ids, &def.id)?;
        match &def.parent {
            Some(parent) => {
                let parent = lookup(&ids, parent, &format!("parent of '{}'", def.id))?;
                builder.add(def.id.as_str(), parent, body);
            }
            None => {
                builder.add_root(def.id.as_str(), body);
            }
        }
    }
    Ok(builder.build()?)
}

/// Simulation options with the file's overrides applied.
pub fn sim_options(options: &OptionsDef) -> SimOptions {
    let mut out = SimOptions::default();
    if let Some(dt) = options.dt_s {
        out.dt = dt;
    }
    if let Some(k) = options.subintegrations {
        out.subintegrations = k;
    }
    if let Some(g) = options.gravity_mps2 {
        out.gravity = mps2(g);
    }
    if let Some(integrator) = options.integrator {
        out.integrator = match integrator {
            IntegratorDef::Bdf => IntegratorType::Bdf,
            IntegratorDef::Rk4 => IntegratorType::Rk4,
        };
    }
    out
}

/// Presentation order: the explicit sequence, or declaration order.
pub fn presentation_sequence(project: &Project) -> ProjectResult<Vec<CompId>> {
    let ids = component_ids(project);
    match &project.sequence {
        Some(sequence) => sequence
            .iter()
            .map(|id| lookup(&ids, id, "sequence"))
            .collect(),
        None => Ok((0..project.components.len())
            .map(|i| CompId::from_index(i as u32))
            .collect()),
    }
}

/// A simulation ready to assemble.
pub fn simulation(project: &Project) -> ProjectResult<Simulation<Unconfigured>> {
    let mech = build_mechanism(project)?;
    let sequence = presentation_sequence(project)?;
    let sim = Simulation::new(mech, sim_options(&project.options))?;
    Ok(sim.with_sequence(sequence))
}
