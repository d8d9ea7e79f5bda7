//! In-process module façade (§4.F) and a networked RCP client for remote
//! subscribers.

pub mod builder;
pub mod facade;
pub mod remote;

pub use builder::{AttributeSpec, ModuleBuilder};
pub use facade::Facade;
pub use remote::RemoteClient;
