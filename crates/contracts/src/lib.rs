//! Wire contracts shared between the backend and its clients.

pub mod dashboards;
pub mod domain;
pub mod system;
pub mod usecases;
