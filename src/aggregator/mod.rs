/// Production KPI aggregation
pub mod kpi_aggregator;

pub use kpi_aggregator::{KpiAggregator, KpiOutcome, KpiReport, OverallSummary, Warnings};
