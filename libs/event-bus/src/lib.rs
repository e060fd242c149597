//! Cross-service cache invalidation over a durable message channel.
//!
//! The author service owns an [`InvalidationPublisher`]; the blog service
//! runs an [`InvalidationConsumer`] that deletes matching cache entries and
//! rebuilds the views registered as [`ViewRebuilder`]s.

pub mod backoff;
pub mod channel;
pub mod config;
pub mod consumer;
pub mod event;
pub mod metrics;
pub mod publisher;

pub use channel::{
    ChannelError, DeadLetter, Delivery, MemoryChannel, MessageChannel,
    MessageSource, RedisStreamChannel,
};
pub use config::PipelineConfig;
pub use consumer::{
    ConsumerError, ConsumerState, InvalidationConsumer, Outcome, RebuildError,
    ViewRebuilder,
};
pub use event::{Action, InvalidationEvent};
pub use metrics::{ConsumerSnapshot, PublisherSnapshot};
pub use publisher::{InvalidationPublisher, PublishError};
