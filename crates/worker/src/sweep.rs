use finoak_core::domain::analysis::StockInsight;
use finoak_core::domain::market::Stock;
use finoak_core::llm::service::AnalysisService;

#[derive(Debug)]
pub struct SweepOutcome {
    /// One entry per analyzed stock, in input order.
    pub insights: Vec<StockInsight>,
}

impl SweepOutcome {
    /// Stocks whose three answers all came from the model.
    pub fn fully_modeled(&self) -> usize {
        self.insights
            .iter()
            .filter(|i| {
                !i.sentiment.is_fallback() && !i.prediction.is_fallback() && !i.social.is_fallback()
            })
            .count()
    }
}

/// Analyzes every stock concurrently. Each analysis degrades to fallback values on its own, so
/// the sweep itself cannot fail.
pub async fn analyze_all(analysis: &AnalysisService, stocks: &[Stock]) -> SweepOutcome {
    let futures = stocks.iter().map(|stock| async move {
        let insight = analysis
            .analyze_stock(&stock.id, &stock.name, stock.price)
            .await;
        tracing::debug!(symbol = %stock.id, "stock analyzed");
        insight
    });

    SweepOutcome {
        insights: futures::future::join_all(futures).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use finoak_core::market::mock::MockMarketData;
    use finoak_core::market::MarketDataProvider;

    #[tokio::test]
    async fn sweep_keeps_input_order_and_counts_fallbacks() {
        let stocks = MockMarketData::instant().all_stocks().await.unwrap();
        let expected: Vec<String> = stocks.iter().map(|s| s.id.clone()).collect();

        let outcome = analyze_all(&AnalysisService::new(None), &stocks).await;

        let symbols: Vec<String> = outcome.insights.iter().map(|i| i.symbol.clone()).collect();
        assert_eq!(symbols, expected);
        assert_eq!(outcome.fully_modeled(), 0);
    }

    #[tokio::test]
    async fn empty_universe_is_fine() {
        let outcome = analyze_all(&AnalysisService::new(None), &[]).await;
        assert!(outcome.insights.is_empty());
    }
}
