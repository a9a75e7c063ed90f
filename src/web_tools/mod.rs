//! Web tools: page fetching and internet search

pub mod html;
pub mod read_url;
pub mod search_internet;

pub use read_url::ReadUrlTool;
pub use search_internet::{SearchConfig, SearchHit, SearchInternetTool, SearchProvider};
