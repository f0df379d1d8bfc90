pub mod cluster;
pub mod job;
pub mod node;
pub mod pod;
pub mod usage;
