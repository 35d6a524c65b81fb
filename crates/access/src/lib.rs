//! `crossdock-access` — actor roles and location-scoped authority.
//!
//! Authentication itself lives upstream (session/JWT handling is an external
//! collaborator); this crate only answers "may this actor do that here",
//! which is what gates transfer transitions.

pub mod actor;
pub mod roles;

pub use actor::Actor;
pub use roles::ActorRole;
