use scraper::{ElementRef, Html, Selector};
use thiserror::Error;

/// Error returned when a selector string cannot be parsed
#[derive(Debug, Error)]
#[error("invalid selector `{selector}`: {message}")]
pub struct QuerySyntaxError {
    /// The selector text that failed to parse
    pub selector: String,
    /// The parser's description of the failure
    pub message: String,
}

/// Exposes static methods for querying a parsed document
///
/// Pure reads only: querying never mutates the document.
pub struct DomQuery;

impl DomQuery {
    /// Returns all elements in the document matching the given selector
    pub fn select_all<'a>(
        doc: &'a Html,
        selector: &str,
    ) -> Result<Vec<ElementRef<'a>>, QuerySyntaxError> {
        let compiled = Self::compile(selector)?;
        Ok(doc.select(&compiled).collect())
    }

    /// Returns all descendants of the given root element matching the selector
    ///
    /// A missing root yields an empty sequence rather than an error, so
    /// extraction can tolerate absent structural nodes.
    pub fn select_all_from<'a>(
        root: Option<ElementRef<'a>>,
        selector: &str,
    ) -> Result<Vec<ElementRef<'a>>, QuerySyntaxError> {
        let compiled = Self::compile(selector)?;
        match root {
            Some(root) => Ok(root.select(&compiled).collect()),
            None => Ok(Vec::new()),
        }
    }

    fn compile(selector: &str) -> Result<Selector, QuerySyntaxError> {
        Selector::parse(selector).map_err(|e| QuerySyntaxError {
            selector: selector.to_string(),
            message: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = r#"
        <html><body>
            <div class="row"><a href="/a">A</a><a href="/b">B</a></div>
            <div class="empty"></div>
        </body></html>
    "#;

    #[test]
    fn test_select_all() {
        let doc = Html::parse_document(DOC);
        let links = DomQuery::select_all(&doc, "a").unwrap();
        assert_eq!(links.len(), 2);
        assert_eq!(links[0].value().attr("href"), Some("/a"));
    }

    #[test]
    fn test_select_all_from_root() {
        let doc = Html::parse_document(DOC);
        let row = DomQuery::select_all(&doc, "div.row").unwrap()[0];
        let links = DomQuery::select_all_from(Some(row), "a").unwrap();
        assert_eq!(links.len(), 2);

        let empty = DomQuery::select_all(&doc, "div.empty").unwrap()[0];
        let none = DomQuery::select_all_from(Some(empty), "a").unwrap();
        assert!(none.is_empty());
    }

    #[test]
    fn test_missing_root_yields_empty() {
        let links = DomQuery::select_all_from(None, "a").unwrap();
        assert!(links.is_empty());
    }

    #[test]
    fn test_invalid_selector() {
        let doc = Html::parse_document(DOC);
        let err = DomQuery::select_all(&doc, "li[").unwrap_err();
        assert_eq!(err.selector, "li[");
    }
}
