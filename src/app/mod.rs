// Application layer: wires configuration, adapters and the core pipeline together.

pub mod builder;
