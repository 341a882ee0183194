pub mod browser;
pub mod config;
pub mod extract;
pub mod feed;
pub mod filter;
pub mod occurrence;
pub mod requests;
pub mod text_manipulators;

pub use browser::{BrowserSession, CapturedResponse, RenderedPage};
pub use filter::FilterRules;
pub use occurrence::{ClassOccurrence, dedupe_occurrences};
pub use requests::RequestClient;
