pub mod artifact;
pub mod listing;
pub mod reference;
pub mod report;
