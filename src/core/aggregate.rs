use crate::domain::model::{CanonicalOffer, ResultSet};

/// Stable ascending sort by price; equal prices keep discovery order.
pub fn aggregate(mut offers: Vec<CanonicalOffer>) -> Vec<CanonicalOffer> {
    offers.sort_by(|a, b| a.price.total_cmp(&b.price));
    offers
}

/// 收集所有 (日期 × 出發地) 組合中通過篩選的報價
#[derive(Debug, Default)]
pub struct ResultAggregator {
    accepted: Vec<CanonicalOffer>,
}

impl ResultAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, offer: CanonicalOffer) {
        self.accepted.push(offer);
    }

    pub fn len(&self) -> usize {
        self.accepted.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accepted.is_empty()
    }

    pub fn finish(self) -> ResultSet {
        ResultSet::from_sorted(aggregate(self.accepted))
    }
}

impl Extend<CanonicalOffer> for ResultAggregator {
    fn extend<T: IntoIterator<Item = CanonicalOffer>>(&mut self, iter: T) {
        self.accepted.extend(iter);
    }
}
