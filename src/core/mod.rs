pub mod aggregate;
pub mod dates;
pub mod engine;
pub mod filter;
pub mod normalize;
pub mod pipeline;

pub use crate::domain::model::{CanonicalOffer, DateRange, FilterConfig, RawOffer, ResultSet};
pub use crate::domain::ports::{Notifier, OfferSource, Pipeline, Storage, TokenProvider};
pub use crate::utils::error::Result;
