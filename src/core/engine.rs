use crate::core::Pipeline;
use crate::domain::model::RunSummary;
use crate::utils::error::Result;
use std::time::Instant;

pub struct SearchEngine<P: Pipeline> {
    pipeline: P,
}

impl<P: Pipeline> SearchEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self { pipeline }
    }

    pub async fn run(&self) -> Result<RunSummary> {
        let started = Instant::now();
        tracing::info!("Starting fare search...");

        // Extract
        let fetched = self.pipeline.extract().await?;
        tracing::info!("📥 Fetched {} raw offers", fetched.len());

        // Transform
        let results = self.pipeline.transform(fetched).await?;
        tracing::info!("🧮 {} offers within budget", results.len());

        // Load
        let summary = self.pipeline.load(results).await?;
        tracing::info!(
            "📊 Done in {:?}: {} ranges, {} requests, {} matches",
            started.elapsed(),
            summary.ranges_searched,
            summary.requests,
            summary.matches
        );

        Ok(summary)
    }
}
