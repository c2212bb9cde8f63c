/// CSV export of step records.
pub mod export;
pub mod layout;
