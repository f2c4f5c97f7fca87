//! lg-tree: the mechanism tree.
//!
//! Provides:
//! - The component registry (`Mechanism`) addressed by `CompId`
//! - Incremental builder with validation
//! - The setup pass assigning generalized coordinates in presentation order
//! - Position and energy expression building along the parent chain
//! - Interleaved state layout helpers
//!
//! # Example
//!
//! ```
//! use lg_components::{Anchor, MassPoint, RotatingLink};
//! use lg_core::units::{kg, m};
//! use lg_symbolic::ExprGraph;
//! use lg_tree::{MechanismBuilder, setup};
//!
//! let mut builder = MechanismBuilder::new();
//! let base = builder.add_root("base", Anchor::fixed(0.0, 0.0));
//! let rod = builder.add("rod", base, RotatingLink::new(m(1.0)));
//! builder.add("bob", rod, MassPoint::new(kg(1.0)));
//! let mech = builder.build().unwrap();
//!
//! let mut g = ExprGraph::new();
//! let st = setup(&mech, &mech.declaration_order(), &mut g).unwrap();
//! assert_eq!(st.coordinate_count(), 1);
//! ```

pub mod builder;
pub mod error;
pub mod kinematics;
pub mod mechanism;
pub mod setup;
pub mod state;
pub(crate) mod validate;

// Re-exports for ergonomics
pub use builder::MechanismBuilder;
pub use error::{TreeError, TreeResult};
pub use kinematics::Kinematics;
pub use mechanism::{Mechanism, Node};
pub use setup::{Setup, assign, setup};
pub use state::{initial_state, scatter};
