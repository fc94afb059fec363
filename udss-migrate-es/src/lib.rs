pub mod client;
pub mod pager;
pub mod progress;
pub mod records;

pub use client::EsClient;

pub use pager::{
    FetchStats,
    PageQuery,
    Pager,
    SearchSource,
};

pub use progress::ProgressReport;

pub use records::{
    LogRecord,
    MetricRecord,
    SearchHit,
    SearchResponse,
};
