//! Infrastructure: cluster/metrics clients, template storage, config, parsing utils

pub mod client;
pub mod config;
pub mod logging;
pub mod template_store;
pub mod util;
