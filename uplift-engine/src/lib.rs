pub mod aggregate;
pub mod classify;
pub mod error;
pub mod export;
pub mod filter;
pub mod insight;
pub mod loader;
pub mod model;
pub mod rank;
pub mod snapshot;
pub mod thresholds;
pub mod util;

pub use aggregate::{branch_rollup, channel_rollup, group_by, monthly_rollup, summarize, Dimension};
pub use classify::{classify_branch, percentile_75, BranchCategory, Classification, Tone};
pub use error::{ExportError, LoadError};
pub use export::{export_payload, to_csv, ExportPayload};
pub use filter::{apply_filters, filter_key, FilterEngine};
pub use insight::{derive_insights, surface, Insight, InsightKind};
pub use loader::{ExportSource, FileExportSource, HttpExportSource};
pub use model::{BranchAgg, ChannelAgg, Dataset, FilterSpec, MonthAgg, Row, Selection, Summary};
pub use rank::{rank_branches, sort_branches, RankMode, RankedBranch, SortDir, SortKey, SortSpec};
pub use snapshot::{DashboardSnapshot, FilterOptions};
