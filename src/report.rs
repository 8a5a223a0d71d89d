// 📊 Aggregate Report - Income / expense totals
// Computes the report from parsed records and holds the process-wide copy

use crate::parser::{Category, CsvParser, TransactionRecord};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, RwLock};
use tracing::info;

// ============================================================================
// AGGREGATE REPORT
// ============================================================================

/// AggregateReport - Totals over every record of the last processed upload
///
/// `net_revenue` is always derived from the other two fields.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AggregateReport {
    pub gross_revenue: f64,
    pub expense: f64,
    pub net_revenue: f64,
}

impl AggregateReport {
    pub fn new(gross_revenue: f64, expense: f64) -> Self {
        AggregateReport {
            gross_revenue,
            expense,
            net_revenue: gross_revenue - expense,
        }
    }

    /// Sum amounts per category. Plain floating-point addition, no rounding.
    pub fn from_records<'a, I>(records: I) -> Self
    where
        I: IntoIterator<Item = &'a TransactionRecord>,
    {
        let mut gross_revenue = 0.0;
        let mut expense = 0.0;

        for record in records {
            match record.category() {
                Category::Income => gross_revenue += record.amount(),
                Category::Expense => expense += record.amount(),
            }
        }

        AggregateReport::new(gross_revenue, expense)
    }
}

// ============================================================================
// REPORT STORE
// ============================================================================

/// ReportStore - Shared handle to the current report
///
/// Readers get an immutable snapshot; writers swap the whole report, so a
/// reader never sees one field from an old upload and another from a new one.
/// Concurrent uploads are not serialized: the last one processed wins.
#[derive(Debug, Default)]
pub struct ReportStore {
    current: RwLock<Arc<AggregateReport>>,
}

impl ReportStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> Arc<AggregateReport> {
        let guard = self.current.read().unwrap_or_else(|poisoned| poisoned.into_inner());
        Arc::clone(&*guard)
    }

    pub fn replace(&self, report: AggregateReport) {
        let next = Arc::new(report);
        let mut guard = self.current.write().unwrap_or_else(|poisoned| poisoned.into_inner());
        *guard = next;
    }
}

// ============================================================================
// INGESTION
// ============================================================================

/// Outcome of one upload
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct IngestSummary {
    pub accepted: usize,
    pub rejected: usize,
    pub report: AggregateReport,
}

/// Parse `contents`, aggregate the accepted rows and publish the result.
///
/// Always replaces the stored report, even when no row was accepted.
pub fn process_upload(contents: &[u8], parser: &CsvParser, store: &ReportStore) -> IngestSummary {
    let batch = parser.parse(contents);
    let report = AggregateReport::from_records(&batch.records);
    store.replace(report);

    let summary = IngestSummary {
        accepted: batch.records.len(),
        rejected: batch.rejected,
        report,
    };

    info!(
        accepted = summary.accepted,
        rejected = summary.rejected,
        gross_revenue = report.gross_revenue,
        expense = report.expense,
        "processed transaction upload"
    );

    summary
}
