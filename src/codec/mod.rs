pub mod clock;
pub mod sample_codec;

pub use clock::{format_timestamp, parse_timestamp, MonotonicClock};
pub use sample_codec::{decode, encode_row, SampleCodec, TIMESTAMP_KEY};
