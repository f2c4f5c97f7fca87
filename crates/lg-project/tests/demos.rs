use std::path::{Path, PathBuf};

use lg_project::{ProjectError, ValidationError};
use lg_sim::Diagnostic;

const DEMOS: [&str; 6] = [
    "damped_inverted_pendulum.yaml",
    "double_pendulum.yaml",
    "moving_anchor.yaml",
    "moving_pendulum.yaml",
    "restricted_spring.yaml",
    "swinging_spring.yaml",
];

fn demo_path(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("../../demos")
        .join(name)
}

#[test]
fn demos_load_and_validate() {
    for name in DEMOS {
        let project = lg_project::load_yaml(&demo_path(name))
            .unwrap_or_else(|e| panic!("Failed to load {}: {}", name, e));
        lg_project::validate_project(&project)
            .unwrap_or_else(|e| panic!("Failed to validate {}: {}", name, e));
        lg_project::build_mechanism(&project)
            .unwrap_or_else(|e| panic!("Failed to build {}: {}", name, e));
    }
}

#[test]
fn demos_run_a_few_frames() {
    for name in DEMOS {
        let project = lg_project::load_yaml(&demo_path(name)).unwrap();
        let mut sim = lg_project::simulation(&project)
            .and_then(|s| Ok(s.assemble()?.compile()?.start()?))
            .unwrap_or_else(|e| panic!("Failed to start {}: {}", name, e));

        let record = sim
            .run_frames(5)
            .unwrap_or_else(|e| panic!("Failed to run {}: {}", name, e));
        assert_eq!(record.len(), 6, "{}", name);
        assert!(
            sim.state().iter().all(|v| v.is_finite()),
            "{} produced a non-finite state",
            name
        );
        assert!(
            !sim.diagnostics()
                .iter()
                .any(|d| matches!(d, Diagnostic::IntegrationStepFailure { .. })),
            "{} had step failures",
            name
        );
    }
}

#[test]
fn coordinate_counts_match_the_trees() {
    let expected = [
        ("damped_inverted_pendulum.yaml", 1),
        ("double_pendulum.yaml", 2),
        ("moving_anchor.yaml", 1),
        ("moving_pendulum.yaml", 2),
        ("restricted_spring.yaml", 2),
        ("swinging_spring.yaml", 2),
    ];
    for (name, n) in expected {
        let project = lg_project::load_yaml(&demo_path(name)).unwrap();
        let sim = lg_project::simulation(&project).unwrap().assemble().unwrap();
        assert_eq!(sim.setup().coordinate_count(), n, "{}", name);
    }
}

#[test]
fn yaml_and_json_agree() {
    let project = lg_project::load_yaml(&demo_path("restricted_spring.yaml")).unwrap();
    let json = serde_json::to_string_pretty(&project).unwrap();
    let back: lg_project::Project = serde_json::from_str(&json).unwrap();
    assert_eq!(back, project);
}

#[test]
fn bad_file_reports_the_offending_id() {
    let text = r#"
version: 1
name: broken
components:
  - id: rod
    parent: base
    kind: { type: RotatingLink }
"#;
    let err = lg_project::from_yaml_str(text).unwrap_err();
    match err {
        ProjectError::Validation(ValidationError::MissingReference { id, .. }) => {
            assert_eq!(id, "base")
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn connecting_link_declared_before_its_endpoint_fails_setup() {
    let text = r#"
version: 1
name: out of order
components:
  - id: base
    kind: { type: Anchor, position_m: [0.0, 1.0] }
  - id: spring
    parent: base
    kind: { type: ElasticLink, stiffness: 5.0, connects: weight }
  - id: weight
    kind: { type: Anchor }
"#;
    let project = lg_project::from_yaml_str(text).unwrap();
    let sim = lg_project::simulation(&project).unwrap();
    assert!(matches!(
        sim.assemble(),
        Err(lg_sim::SimError::Configuration(_))
    ));

    let mut reordered = project.clone();
    reordered.sequence = Some(vec!["base".into(), "weight".into(), "spring".into()]);
    assert!(lg_project::simulation(&reordered).unwrap().assemble().is_ok());
}
