pub mod result_ledger;

pub use result_ledger::ResultLedger;
