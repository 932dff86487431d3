pub mod model;
pub mod notify;
pub mod step;

pub use model::{LinearModel, ModelService};
pub use notify::{DeliveryStatus, LogNotifier, NotificationSink};
pub use step::{InferenceOutcome, InferenceStep, Label, NO_SEIZURE_OUTPUT, SEIZURE_OUTPUT};
