//! Accounting, usage integration and job templating

pub mod cluster;
pub mod template;
pub mod usage;
