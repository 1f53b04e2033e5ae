//! Statistics providers available to the CLI.

pub use fuzzstat_core::provider::{ProviderError, StatisticsProvider};

mod rscript;
pub use rscript::RscriptProvider;
