use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Configuration for the page scanner
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Milliseconds between scan ticks
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Container selectors, tried in order; the first one matching at
    /// least one element becomes the scan root
    #[serde(default = "default_container_selectors")]
    pub container_selectors: Vec<String>,

    /// Selector for one media item inside the active container
    #[serde(default = "default_item_selector")]
    pub item_selector: String,

    /// Selector for the link element inside an item
    #[serde(default = "default_link_selector")]
    pub link_selector: String,

    /// Selector for the title element in the item's sibling context
    #[serde(default = "default_title_selector")]
    pub title_selector: String,

    /// Selector for the thumbnail image inside the link element
    #[serde(default = "default_image_selector")]
    pub image_selector: String,

    /// Base URL for resolving relative hrefs and image sources
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            container_selectors: default_container_selectors(),
            item_selector: default_item_selector(),
            link_selector: default_link_selector(),
            title_selector: default_title_selector(),
            image_selector: default_image_selector(),
            base_url: None,
        }
    }
}

impl ScanConfig {
    /// Load configuration from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, Box<dyn Error>> {
        let mut file = File::open(path)?;
        let mut contents = String::new();
        file.read_to_string(&mut contents)?;

        let config: Self = serde_json::from_str(&contents)?;
        Ok(config)
    }
}

/// Default value for poll_interval_ms
fn default_poll_interval_ms() -> u64 {
    1200
}

/// Default container selectors, in priority order
fn default_container_selectors() -> Vec<String> {
    vec![
        r#"ytd-watch-flexy[role="main"]"#.to_string(),
        r#"ytd-browse[role="main"]"#.to_string(),
    ]
}

/// Default item selector
fn default_item_selector() -> String {
    "ytd-thumbnail".to_string()
}

/// Default link selector
fn default_link_selector() -> String {
    "a#thumbnail".to_string()
}

/// Default title selector
fn default_title_selector() -> String {
    "#video-title-link, #video-title".to_string()
}

/// Default image selector
fn default_image_selector() -> String {
    "yt-img-shadow > img".to_string()
}
