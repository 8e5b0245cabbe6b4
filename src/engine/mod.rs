pub mod baseline;
pub mod cache;
pub mod factors;
pub mod lines;
pub mod odds;
pub mod projection;

pub use baseline::{Form, HistoryIndex, InsufficientHistory, RollingBaseline};
pub use cache::ProjectionCache;
pub use factors::{ContextFactors, FactorSource, FactorValue, TeamContextFactors};
pub use odds::{AmericanOdds, PricedProjection, Quote, Signal, ThresholdError, ThresholdLine};
pub use projection::{AppliedFactors, MatchupProjection, ProjectionEngine, ProjectionResult};
