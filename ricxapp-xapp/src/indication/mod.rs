//! Indication filtering, queueing and delivery

pub mod processor;
pub mod sink;

pub use processor::{
    indication_subscription, IndicationDisposition, IndicationProcessor, IndicationQueue,
    IndicationStats, IndicationTask,
};
pub use sink::{ChannelSink, IndicationEvent, IndicationSink, LoggingSink};
