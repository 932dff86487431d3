pub mod dataset;
pub mod producer_loop;
pub mod server;

pub use dataset::Dataset;
pub use producer_loop::{ProducerLoop, ProducerReport};
pub use server::ProducerServer;
