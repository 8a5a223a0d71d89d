// 🧾 CSV Parser - Transaction rows
// Row validation for `Date, Type, Amount($), Memo` uploads

use csv::{ReaderBuilder, StringRecord};
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

/// Number of leading fields kept from every accepted row.
pub const RECORD_FIELDS: usize = 4;

const TYPE_FIELD: usize = 1;
const AMOUNT_FIELD: usize = 2;

// ============================================================================
// CORE TYPES
// ============================================================================

/// Category - Income or expense classification of a transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Income,
    Expense,
}

impl Category {
    /// Canonical lower-case name
    pub fn name(&self) -> &'static str {
        match self {
            Category::Income => "income",
            Category::Expense => "expense",
        }
    }

    /// Trim and lower-case a raw token, then look it up.
    pub fn from_normalized(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "income" => Some(Category::Income),
            "expense" => Some(Category::Expense),
            _ => None,
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// TransactionRecord - One validated row
///
/// Only constructed through [`validate_row`], so `amount` is always finite and
/// non-negative.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransactionRecord {
    date: String,
    category: Category,
    amount: f64,
    memo: String,
}

impl TransactionRecord {
    pub fn date(&self) -> &str {
        &self.date
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn amount(&self) -> f64 {
        self.amount
    }

    pub fn memo(&self) -> &str {
        &self.memo
    }
}

/// Why a row was dropped
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("expected at least 4 fields, found {found}")]
    TooFewFields { found: usize },

    #[error("unknown transaction type: {0:?}")]
    UnknownCategory(String),

    #[error("amount is not a finite number: {0:?}")]
    InvalidAmount(String),

    #[error("amount is negative: {0}")]
    NegativeAmount(f64),

    #[error("unreadable row: {0}")]
    Unreadable(String),
}

// ============================================================================
// CATEGORY MATCHING
// ============================================================================

/// CategoryMatcher - Decides whether the type field names income or expense
///
/// `Normalized` trims and lower-cases before comparing. `Exact` compares the
/// raw field against literal tokens, for producers that write `" Income"`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum CategoryMatcher {
    #[default]
    Normalized,
    Exact { income: String, expense: String },
}

impl CategoryMatcher {
    pub fn exact(income: impl Into<String>, expense: impl Into<String>) -> Self {
        CategoryMatcher::Exact {
            income: income.into(),
            expense: expense.into(),
        }
    }

    pub fn matches(&self, raw: &str) -> Option<Category> {
        match self {
            CategoryMatcher::Normalized => Category::from_normalized(raw),
            CategoryMatcher::Exact { income, expense } => {
                if raw == income {
                    Some(Category::Income)
                } else if raw == expense {
                    Some(Category::Expense)
                } else {
                    None
                }
            }
        }
    }
}

// ============================================================================
// VALIDATION
// ============================================================================

/// Validate a single CSV row.
///
/// Rules, in order:
/// 1. at least 4 fields
/// 2. type field (index 1) accepted by `matcher`
/// 3. amount field (index 2) parses as a finite, non-negative number
///
/// Fields past the fourth are ignored.
pub fn validate_row(
    row: &StringRecord,
    matcher: &CategoryMatcher,
) -> Result<TransactionRecord, ValidationError> {
    if row.len() < RECORD_FIELDS {
        return Err(ValidationError::TooFewFields { found: row.len() });
    }

    let raw_type = &row[TYPE_FIELD];
    let category = matcher
        .matches(raw_type)
        .ok_or_else(|| ValidationError::UnknownCategory(raw_type.to_string()))?;

    let amount = parse_amount(&row[AMOUNT_FIELD])?;

    Ok(TransactionRecord {
        date: row[0].to_string(),
        category,
        amount,
        memo: row[3].to_string(),
    })
}

fn parse_amount(raw: &str) -> Result<f64, ValidationError> {
    let amount: f64 = raw
        .trim()
        .parse()
        .map_err(|_| ValidationError::InvalidAmount(raw.to_string()))?;

    if !amount.is_finite() {
        return Err(ValidationError::InvalidAmount(raw.to_string()));
    }
    if amount < 0.0 {
        return Err(ValidationError::NegativeAmount(amount));
    }

    Ok(amount)
}

// ============================================================================
// DIAGNOSTICS
// ============================================================================

/// RejectionObserver - Optional hook that sees every dropped row
///
/// Observing a rejection never changes the outcome: the row is still dropped.
pub trait RejectionObserver: Send + Sync {
    /// `line` is the 1-based row position reported by the CSV reader.
    fn on_reject(&self, line: u64, error: &ValidationError);
}

/// Logs each rejected row at debug level
#[derive(Debug, Default, Clone, Copy)]
pub struct LogRejections;

impl RejectionObserver for LogRejections {
    fn on_reject(&self, line: u64, error: &ValidationError) {
        debug!(line, %error, "dropping CSV row");
    }
}

// ============================================================================
// PARSER
// ============================================================================

/// Result of parsing one upload
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedBatch {
    pub records: Vec<TransactionRecord>,
    pub rejected: usize,
}

/// CsvParser - Turns raw upload bytes into validated records
#[derive(Clone, Default)]
pub struct CsvParser {
    matcher: CategoryMatcher,
    observer: Option<Arc<dyn RejectionObserver>>,
}

impl CsvParser {
    pub fn new(matcher: CategoryMatcher) -> Self {
        CsvParser {
            matcher,
            observer: None,
        }
    }

    /// Builder pattern: attach a rejection observer
    pub fn with_observer(mut self, observer: Arc<dyn RejectionObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Parse a whole upload. Malformed rows are counted and dropped; this
    /// never fails.
    pub fn parse(&self, contents: &[u8]) -> ParsedBatch {
        let mut reader = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(contents);

        let mut batch = ParsedBatch::default();
        let mut row = StringRecord::new();

        loop {
            // A failed UTF-8 check clears `row`, so keep the start line here.
            let line = reader.position().line();
            let outcome = match reader.read_record(&mut row) {
                Ok(true) => validate_row(&row, &self.matcher),
                Ok(false) => break,
                Err(e) => {
                    // Invalid UTF-8 leaves the reader positioned on the next row.
                    let unreadable = ValidationError::Unreadable(e.to_string());
                    if !matches!(e.kind(), csv::ErrorKind::Utf8 { .. }) {
                        self.reject(line, &unreadable);
                        batch.rejected += 1;
                        break;
                    }
                    Err(unreadable)
                }
            };

            match outcome {
                Ok(record) => batch.records.push(record),
                Err(error) => {
                    self.reject(row.position().map_or(line, |p| p.line()), &error);
                    batch.rejected += 1;
                }
            }
        }

        batch
    }

    fn reject(&self, line: u64, error: &ValidationError) {
        if let Some(observer) = &self.observer {
            observer.on_reject(line, error);
        }
    }
}

impl std::fmt::Debug for CsvParser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CsvParser")
            .field("matcher", &self.matcher)
            .field("observer", &self.observer.is_some())
            .finish()
    }
}

/// Parse with the default matcher and no observer.
pub fn parse_transactions(contents: &[u8]) -> Vec<TransactionRecord> {
    CsvParser::default().parse(contents).records
}
