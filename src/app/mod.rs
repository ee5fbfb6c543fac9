pub mod clean_file_use_case;
pub mod ports;

pub use clean_file_use_case::{CleanFileOutcome, CleanFileUseCase, HandlerResponse, TriggerEvent};
pub use ports::{ObjectStorePort, ProcessingSummary, SummaryStorePort};
