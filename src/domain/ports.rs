use crate::domain::model::{
    AuthToken, FetchedOffer, ProviderKind, ResultSet, RunSummary, SearchOutcome, SearchQuery,
};
use crate::utils::error::Result;
use async_trait::async_trait;

/// 報表輸出目的地
pub trait Storage: Send + Sync {
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

/// 航班搜尋來源：失敗不拋出，以 `SearchOutcome` 回報
#[async_trait]
pub trait OfferSource: Send + Sync {
    fn provider(&self) -> ProviderKind;

    fn requires_auth(&self) -> bool {
        false
    }

    async fn search(&self, query: &SearchQuery, token: Option<&AuthToken>) -> SearchOutcome;
}

#[async_trait]
pub trait TokenProvider: Send + Sync {
    async fn fetch_token(&self) -> Result<AuthToken>;
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, results: &ResultSet) -> Result<()>;
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn extract(&self) -> Result<Vec<FetchedOffer>>;
    async fn transform(&self, data: Vec<FetchedOffer>) -> Result<ResultSet>;
    async fn load(&self, result: ResultSet) -> Result<RunSummary>;
}
