mod aggregator;
mod classifier;
mod collector;
mod frame;
pub mod types;

pub use aggregator::{DnsQueryAggregator, QueryCount};
pub use classifier::Classifier;
pub use collector::DnsCollector;
pub use frame::{DnsMessage, DnsQuestion, Frame};
