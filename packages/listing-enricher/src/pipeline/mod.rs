pub mod extract;
pub mod harvest;
pub mod inject;
pub mod resolve;
pub mod run;

pub use extract::DescriptionExtractor;
pub use harvest::{harvest_references, Harvest};
pub use inject::{inject_document, split_paragraphs, InjectionTexts};
pub use resolve::DescriptionResolver;
pub use run::{run, run_with_http};
