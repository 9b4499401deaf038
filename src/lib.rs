pub mod archiver;
pub mod browser;
pub mod config;
pub mod crawl;
pub mod dedup;
pub mod dom;
pub mod error;
pub mod human;
pub mod interactive;
pub mod metadata;
pub mod normalizer;
pub mod pacing;
pub mod selectors;
pub mod types;

#[cfg(test)]
mod static_dom;
#[cfg(test)]
mod testing;

pub use browser::{BrowserSession, ChromeSession};
pub use config::Config;
pub use crawl::Crawler;
pub use dedup::DedupStore;
pub use error::{Result, ScribeError};
pub use interactive::{Interactive, TerminalPrompt};
pub use types::*;
