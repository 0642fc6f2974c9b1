#![doc = include_str!("../README.md")]

pub mod decoder;
pub mod sink;
pub mod subscriber;

pub use decoder::{DecoderRouter, ObjectListDecoder, SingleObjectDecoder};
pub use sink::{ConsoleSink, FanoutSink, JsonlSink, RawLogSink, build_sinks};
pub use subscriber::{MqttSubscriber, SubscriberState};
