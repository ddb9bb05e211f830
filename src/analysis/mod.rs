pub mod cache;
pub mod offline;
pub mod orchestrator;
pub mod parser;
pub mod remote;

pub use cache::{fingerprint, InsightCache};
pub use offline::OfflineInsightProvider;
pub use orchestrator::{AnalysisOrchestrator, AnalysisOutcome, AnalysisStatus};
pub use parser::parse_response;
pub use remote::{AnalysisTransport, HttpProxy, ProxyError};
