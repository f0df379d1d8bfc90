//! Job template rendering: defaults merge, naming, node selectors, replicas

pub mod definition;
pub mod dto;
pub mod engine;
pub mod identity;
pub mod selector;
pub mod service;
pub mod value;
