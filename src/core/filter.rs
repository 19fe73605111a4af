use crate::domain::model::{CanonicalOffer, FilterConfig, RegionTier};

/// Europe-tier iff the (case-normalized) country is listed; unknown countries are World-tier.
pub fn classify(offer: &CanonicalOffer, config: &FilterConfig) -> RegionTier {
    match offer.country.as_deref().map(str::trim) {
        Some(country) if config.europe_codes.contains(&country.to_ascii_uppercase()) => {
            RegionTier::Europe
        }
        _ => RegionTier::World,
    }
}

pub fn ceiling_for(tier: RegionTier, config: &FilterConfig) -> f64 {
    match tier {
        RegionTier::Europe => config.europe_price_ceiling,
        RegionTier::World => config.world_price_ceiling,
    }
}

pub fn passes(offer: &CanonicalOffer, config: &FilterConfig) -> bool {
    if offer.duration_minutes < config.min_duration_minutes {
        return false;
    }
    offer.price <= ceiling_for(classify(offer, config), config)
}

#[derive(Debug, Clone)]
pub struct RegionFilter {
    config: FilterConfig,
}

impl RegionFilter {
    pub fn new(config: FilterConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &FilterConfig {
        &self.config
    }

    pub fn classify(&self, offer: &CanonicalOffer) -> RegionTier {
        classify(offer, &self.config)
    }

    pub fn passes(&self, offer: &CanonicalOffer) -> bool {
        let accepted = passes(offer, &self.config);
        if !accepted {
            tracing::trace!(
                "Rejected {} -> {:?} at {:.2} ({} min)",
                offer.origin,
                offer.destination,
                offer.price,
                offer.duration_minutes
            );
        }
        accepted
    }
}
