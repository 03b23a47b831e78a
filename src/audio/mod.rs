pub mod convert;
mod feeder;
pub mod null;
pub mod output;
pub mod sink;

pub use null::NullSink;
pub use output::CpalSink;
pub use sink::{OutputSink, SinkError, SinkEvent};
