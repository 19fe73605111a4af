// Domain layer: core models and ports. No I/O here beyond the trait signatures.

pub mod model;
pub mod ports;
