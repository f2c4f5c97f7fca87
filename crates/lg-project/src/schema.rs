//! Mechanism file schema definitions.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Project {
    pub version: u32,
    pub name: String,
    #[serde(default)]
    pub options: OptionsDef,
    #[serde(default)]
    pub components: Vec<ComponentDef>,
    /// Presentation order by component id; declaration order when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sequence: Option<Vec<String>>,
}

/// Overrides of the simulation defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct OptionsDef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dt_s: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subintegrations: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gravity_mps2: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub integrator: Option<IntegratorDef>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum IntegratorDef {
    Bdf,
    Rk4,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ComponentDef {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    pub kind: ComponentKind,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum ComponentKind {
    Anchor {
        #[serde(default)]
        position_m: [f64; 2],
        #[serde(default, skip_serializing_if = "Option::is_none")]
        trace: Option<TraceDef>,
    },
    Path {
        shape: ShapeDef,
    },
    MassPoint {
        #[serde(default = "default_mass")]
        mass_kg: f64,
        #[serde(default = "default_local")]
        local: f64,
    },
    SlidingMass {
        #[serde(default = "default_mass")]
        mass_kg: f64,
        #[serde(default)]
        loc0: f64,
        #[serde(default)]
        dloc0: f64,
        #[serde(default)]
        damping: f64,
    },
    RotatingLink {
        #[serde(default = "default_length")]
        length_m: f64,
        #[serde(default)]
        offset: f64,
        #[serde(default)]
        phi0: f64,
        #[serde(default)]
        dphi0: f64,
        #[serde(default)]
        damping: f64,
    },
    ElasticLink {
        stiffness: f64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        rest_length_m: Option<f64>,
        /// Second endpoint; an anchored link when absent.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        connects: Option<String>,
        #[serde(default)]
        x0: f64,
        #[serde(default)]
        dx0: f64,
        #[serde(default)]
        phi0: f64,
        #[serde(default)]
        dphi0: f64,
    },
}

impl ComponentKind {
    pub fn type_name(&self) -> &'static str {
        match self {
            ComponentKind::Anchor { .. } => "Anchor",
            ComponentKind::Path { .. } => "Path",
            ComponentKind::MassPoint { .. } => "MassPoint",
            ComponentKind::SlidingMass { .. } => "SlidingMass",
            ComponentKind::RotatingLink { .. } => "RotatingLink",
            ComponentKind::ElasticLink { .. } => "ElasticLink",
        }
    }
}

fn default_mass() -> f64 {
    1.0
}

fn default_local() -> f64 {
    1.0
}

fn default_length() -> f64 {
    1.0
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum ShapeDef {
    Line {
        #[serde(default)]
        from_m: [f64; 2],
        #[serde(default = "default_line_end")]
        to_m: [f64; 2],
    },
    Circle {
        radius_m: f64,
    },
}

fn default_line_end() -> [f64; 2] {
    [1.0, 0.0]
}

/// Prescribed motion of an anchor, added to its position.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TraceDef {
    #[serde(default)]
    pub x: DriveDef,
    #[serde(default)]
    pub y: DriveDef,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum DriveDef {
    Fixed {
        value: f64,
    },
    Harmonic {
        amplitude: f64,
        omega_rad_s: f64,
        #[serde(default)]
        phase: f64,
        #[serde(default)]
        offset: f64,
    },
    Linear {
        rate: f64,
        #[serde(default)]
        offset: f64,
    },
}

impl Default for DriveDef {
    fn default() -> Self {
        DriveDef::Fixed { value: 0.0 }
    }
}
