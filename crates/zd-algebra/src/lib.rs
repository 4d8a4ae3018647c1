//! Sparse assembly substrate for lumped-parameter network models.
//!
//! Blocks write fixed-pattern contributions into a [`SparseSystem`] holding
//! the DAE
//!
//! ```text
//! E·ẏ + F·y + C(y, ẏ, t) = 0
//! ```
//!
//! together with `D = ∂C/∂y`, the solution-dependent tangent correction.
//! Every write is an overwrite keyed by `(equation, variable)`; storage is
//! reserved once from the blocks' declared [`TripletBudget`]s and never
//! grows afterward.
//!
//! # Example
//!
//! ```
//! use zd_algebra::{SparseSystem, Term, TripletBudget};
//!
//! let mut system = SparseSystem::new(1, 2, TripletBudget::new(2, 0, 0));
//! system.set_constant(Term::F, 0, 0, 1.0).unwrap();
//! system.set_constant(Term::F, 0, 1, -1.0).unwrap();
//! assert_eq!(system.f().nnz(), 2);
//!
//! // A third distinct key would exceed the reservation.
//! assert!(system.set_constant(Term::E, 0, 0, 1.0).is_err());
//! ```

pub mod budget;
pub mod error;
pub mod gradient;
pub mod jacobian;
pub mod matrix;
pub mod system;

pub use budget::{Term, TripletBudget};
pub use error::{AlgebraError, AlgebraResult};
pub use gradient::GradientSystem;
pub use jacobian::{central_difference_jacobian, finite_difference_jacobian};
pub use matrix::SparseMatrix;
pub use system::{Phase, SparseSystem};
