pub mod insight;
pub mod sample;

pub use insight::{
    DisplayableInsight, InsightSource, OfflineInsight, OfflineKind, RawInsight, PATTERN_NONE,
};
pub use sample::{SampleScope, SampledText};
