//! Operation orchestrators, one module per resource type.
//!
//! Each operation resolves what it references through [`crate::lookup`],
//! issues one mutating call and hands asynchronous work to the task monitor
//! via [`crate::operation::run_mutation`].

pub mod applications;
pub mod components;
pub mod global_defaults;
pub mod service_accounts;
pub mod vcenters;
pub mod virtual_machines;
pub mod vrni;
