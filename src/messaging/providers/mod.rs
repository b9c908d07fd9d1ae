//! Queue transport providers

mod in_memory;
mod rabbitmq;

pub use in_memory::InMemoryTransport;
pub use rabbitmq::RabbitMqTransport;
