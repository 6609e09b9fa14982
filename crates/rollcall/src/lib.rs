//! Facade crate for the Rollcall feature slices and shared modules.
//! Re-exports domain/kernel primitives and lists the route groups to register.
//! Keep this crate thin: it should compose other crates, not implement business logic.
//!
//! ## Usage
//! Pass [`route_groups`] to the route registrar; extend it as new slices appear.

pub use rollcall_domain as domain;
pub use rollcall_kernel as kernel;

use rollcall_kernel::server::ApiState;
use rollcall_kernel::server::registrar::RouteGroup;

/// Feature registry for runtime introspection.
pub mod features {
    pub use rollcall_attendance as attendance;
    pub use rollcall_classes as classes;
    pub use rollcall_identity as identity;

    /// Route group names, in registration order.
    pub const ENABLED: &[&str] = &[identity::GROUP, classes::GROUP, attendance::GROUP];

    #[must_use]
    pub fn is_enabled(name: &str) -> bool {
        ENABLED.contains(&name)
    }
}

/// Every feature route group, in registration order.
#[must_use]
pub fn route_groups() -> Vec<RouteGroup<ApiState>> {
    vec![features::identity::routes(), features::classes::routes(), features::attendance::routes()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn groups_follow_the_registry() {
        let names: Vec<String> = route_groups().iter().map(|g| g.name().to_owned()).collect();
        assert_eq!(names, features::ENABLED);
        assert!(features::is_enabled("classes"));
        assert!(!features::is_enabled("licensing"));
    }
}
