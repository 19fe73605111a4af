// Adapters layer: concrete implementations of the domain ports (http providers, storage, reports).

pub mod amadeus;
pub mod http;
pub mod report;
pub mod ryanair;
pub mod storage;
pub mod wizzair;
