//! HTTP plumbing shared by every route group.

mod error;
mod extract;
mod gate;
pub mod health;
pub mod registrar;
mod state;

pub use error::{ApiError, ErrorResponse};
pub use extract::{ApiJson, ApiQuery, AuthUser, Db};
pub use gate::DatabaseGate;
pub use state::{ApiState, ApiStateBuilder, ApiStateError, ApiStateErrorExt, ApiStateInner};
