use crate::config::ScanConfig;
use crate::dom::DomQuery;
use scraper::ElementRef;
use serde::{Deserialize, Serialize};
use url::Url;

/// One media item parsed from the page
///
/// Holds parsed data only; the element it came from is dropped at
/// extraction time and never crosses the protocol boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    /// Absolute URL of the item, if one was found
    pub link: Option<String>,

    /// Rendered title text, if one was found
    pub title: Option<String>,

    /// Absolute URL of the thumbnail image, if one was found
    pub image_url: Option<String>,
}

impl Candidate {
    /// Checks whether enough data was parsed to recommend this item
    ///
    /// The image is cosmetic; link and title are required.
    pub fn is_usable(&self) -> bool {
        has_text(&self.link) && has_text(&self.title)
    }
}

fn has_text(field: &Option<String>) -> bool {
    field.as_deref().is_some_and(|s| !s.is_empty())
}

/// Parses a Candidate out of one item element
///
/// All three lookups are independently nullable: a malformed item
/// degrades to an unusable Candidate instead of failing the scan.
pub fn extract(item: ElementRef<'_>, config: &ScanConfig, base: Option<&Url>) -> Candidate {
    let link_el = first_from(Some(item), &config.link_selector);
    let link = link_el
        .and_then(|el| el.value().attr("href"))
        .and_then(|href| resolve_url(href, base));

    // Title text commonly lives outside the item element itself, in a
    // sibling container, so the lookup is rooted at the item's parent.
    let parent = item.parent().and_then(ElementRef::wrap);
    let title = first_from(parent, &config.title_selector)
        .map(element_text)
        .filter(|t| !t.is_empty());

    let image_url = first_from(link_el, &config.image_selector)
        .and_then(|el| el.value().attr("src"))
        .and_then(|src| resolve_url(src, base));

    Candidate {
        link,
        title,
        image_url,
    }
}

/// First match for a selector under an optional root, treating an
/// invalid configured selector as "no match"
fn first_from<'a>(root: Option<ElementRef<'a>>, selector: &str) -> Option<ElementRef<'a>> {
    match DomQuery::select_all_from(root, selector) {
        Ok(matches) => matches.into_iter().next(),
        Err(e) => {
            ::log::error!("Skipping lookup: {}", e);
            None
        }
    }
}

/// Collects an element's text content with normalized whitespace
fn element_text(el: ElementRef<'_>) -> String {
    el.text()
        .collect::<Vec<_>>()
        .join(" ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Resolves a raw href/src to an absolute URL
///
/// Absolute URLs pass through; relative ones are joined against the
/// configured base, or dropped when no base is available.
fn resolve_url(raw: &str, base: Option<&Url>) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    match Url::parse(raw) {
        Ok(url) => Some(url.to_string()),
        Err(url::ParseError::RelativeUrlWithoutBase) => {
            let resolved = base.and_then(|b| b.join(raw).ok());
            if resolved.is_none() {
                ::log::debug!("Cannot resolve relative URL without a base: {}", raw);
            }
            resolved.map(|u| u.to_string())
        }
        Err(e) => {
            ::log::debug!("Unparsable URL {:?}: {}", raw, e);
            None
        }
    }
}
