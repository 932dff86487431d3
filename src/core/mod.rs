pub mod channels;
pub mod sample;

pub use channels::{ChannelSet, DEFAULT_CHANNELS};
pub use sample::{DatasetRow, FeatureVector, Sample};
