// ⚙️ Server configuration
// CLI flags with environment-variable fallbacks

use crate::parser::CategoryMatcher;
use clap::{Parser, ValueEnum};
use std::net::{IpAddr, SocketAddr};

/// Default upload cap: 10 MiB
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// How the type column is matched against income / expense
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CategoryMatching {
    /// Trim and lower-case, then compare with `income` / `expense`
    Normalized,
    /// Compare the raw field with `--income-token` / `--expense-token`
    Exact,
}

/// Transaction report HTTP server
#[derive(Parser, Debug, Clone)]
#[command(
    name = "txn-report-server",
    about = "Aggregate uploaded transaction CSVs into an income/expense report",
    version
)]
pub struct ServerConfig {
    /// Address to bind
    #[arg(long, env = "TXN_REPORT_HOST", default_value = "0.0.0.0")]
    pub host: IpAddr,

    /// Port to listen on
    #[arg(long, env = "TXN_REPORT_PORT", default_value_t = 8000)]
    pub port: u16,

    /// Log filter directive (e.g. `info`, `txn_report=debug`)
    #[arg(long, env = "TXN_REPORT_LOG", default_value = "info")]
    pub log_level: String,

    /// Largest accepted request body, in bytes
    #[arg(long, env = "TXN_REPORT_MAX_UPLOAD_BYTES", default_value_t = DEFAULT_MAX_UPLOAD_BYTES)]
    pub max_upload_bytes: usize,

    #[command(flatten)]
    pub matching: MatchingArgs,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

/// Category matching options, shared by the server and the CLI
#[derive(clap::Args, Debug, Clone)]
pub struct MatchingArgs {
    /// Category matching mode
    #[arg(
        long,
        env = "TXN_REPORT_CATEGORY_MATCHING",
        value_enum,
        default_value_t = CategoryMatching::Normalized
    )]
    pub category_matching: CategoryMatching,

    /// Literal income token for `exact` matching
    #[arg(
        long,
        env = "TXN_REPORT_INCOME_TOKEN",
        default_value = " Income",
        allow_hyphen_values = true
    )]
    pub income_token: String,

    /// Literal expense token for `exact` matching
    #[arg(
        long,
        env = "TXN_REPORT_EXPENSE_TOKEN",
        default_value = " Expense",
        allow_hyphen_values = true
    )]
    pub expense_token: String,
}

impl MatchingArgs {
    pub fn matcher(&self) -> CategoryMatcher {
        match self.category_matching {
            CategoryMatching::Normalized => CategoryMatcher::Normalized,
            CategoryMatching::Exact => {
                CategoryMatcher::exact(self.income_token.clone(), self.expense_token.clone())
            }
        }
    }
}
