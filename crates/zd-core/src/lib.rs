//! Shared numeric helpers, block ids, and the common error type for the
//! zerod crates.

pub mod error;
pub mod ids;
pub mod numeric;

pub use error::{CoreError, CoreResult};
pub use ids::BlockId;
pub use numeric::{Real, Tolerances, ensure_finite, nearly_equal, sign, wrap_into_period};
