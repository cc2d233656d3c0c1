//! Proxy Module
//!
//! Request interception: classification, strategy execution and the
//! outbound network seam.

mod classifier;
mod network;
mod request;
mod response;
mod strategy;

pub use classifier::{
    is_static_asset, Classification, RegionKind, RequestClassifier, RequestPolicy, StrategyKind,
};
pub use network::{HttpNetwork, Network};
pub use request::{map_onto_origin, Destination, ProxyRequest};
pub use response::{ProxyResponse, ResponseSource, SOURCE_HEADER};
pub use strategy::StrategyExecutor;
