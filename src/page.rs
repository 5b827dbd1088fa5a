//! Pagination Links
//!
//! Parsing of the `Link` response header that drives multi-page fetches

use url::Url;

use crate::error::{Error, Result};

/// The `next`/`last` link relations of one collection response
///
/// Discarded once the collection has been fully materialized.
#[derive(Debug, Clone, Default)]
pub struct PageLinks {
    pub next: Option<Url>,
    pub last: Option<Url>,
}

impl PageLinks {
    /// Parse a `Link` header value
    ///
    /// The header is a comma-separated list of `<url>; rel="name"` entries.
    /// Relations other than `next` and `last` are ignored.
    ///
    /// # Errors
    /// Returns an error if a `next` or `last` entry carries an unparsable URL.
    pub fn parse(header: &str) -> Result<Self> {
        let mut links = PageLinks::default();

        for entry in header.split(',') {
            let mut parts = entry.split(';');
            let target = match parts.next() {
                Some(t) => t.trim(),
                None => continue,
            };
            if !(target.starts_with('<') && target.ends_with('>')) {
                continue;
            }
            let target = &target[1..target.len() - 1];

            let rel = parts
                .map(str::trim)
                .find_map(|p| p.strip_prefix("rel="))
                .map(|r| r.trim_matches('"'));

            let slot = match rel {
                Some("next") => &mut links.next,
                Some("last") => &mut links.last,
                _ => continue,
            };
            *slot = Some(
                Url::parse(target).map_err(|_| Error::PageLink(target.to_string()))?,
            );
        }

        Ok(links)
    }
}

/// Extract the `page` query parameter from a pagination URL
pub fn page_number(url: &Url) -> Result<u32> {
    url.query_pairs()
        .find(|(key, _)| key == "page")
        .and_then(|(_, value)| value.parse().ok())
        .ok_or_else(|| Error::PageLink(url.to_string()))
}

/// Rebuild a pagination URL with its `page` query parameter replaced
pub fn with_page(url: &Url, page: u32) -> Url {
    let others: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| key != "page")
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();

    let mut out = url.clone();
    {
        let mut query = out.query_pairs_mut();
        query.clear();
        for (key, value) in &others {
            query.append_pair(key, value);
        }
        query.append_pair("page", &page.to_string());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "<https://api.github.com/repositories/1/pulls?per_page=100&page=2>; \
                          rel=\"next\", \
                          <https://api.github.com/repositories/1/pulls?per_page=100&page=3>; \
                          rel=\"last\"";

    #[test]
    fn test_parse_next_and_last() {
        let links = PageLinks::parse(HEADER).unwrap();
        let next = links.next.unwrap();
        let last = links.last.unwrap();
        assert_eq!(page_number(&next).unwrap(), 2);
        assert_eq!(page_number(&last).unwrap(), 3);
    }

    #[test]
    fn test_parse_ignores_other_relations() {
        let header = "<https://example.com/?page=1>; rel=\"first\", \
                      <https://example.com/?page=5>; rel=\"prev\"";
        let links = PageLinks::parse(header).unwrap();
        assert!(links.next.is_none());
        assert!(links.last.is_none());
    }

    #[test]
    fn test_parse_single_page_header_absent_relations() {
        let links = PageLinks::parse("").unwrap();
        assert!(links.next.is_none());
        assert!(links.last.is_none());
    }

    #[test]
    fn test_parse_rejects_bad_url() {
        let header = "<not a url>; rel=\"next\"";
        assert!(matches!(
            PageLinks::parse(header),
            Err(Error::PageLink(_))
        ));
    }

    #[test]
    fn test_page_number_missing_parameter() {
        let url = Url::parse("https://example.com/pulls?per_page=100").unwrap();
        assert!(page_number(&url).is_err());
    }

    #[test]
    fn test_with_page_replaces_parameter() {
        let url = Url::parse("https://example.com/pulls?per_page=100&page=2").unwrap();
        let rebuilt = with_page(&url, 7);
        assert_eq!(page_number(&rebuilt).unwrap(), 7);
        assert!(rebuilt.query().unwrap().contains("per_page=100"));
    }

    #[test]
    fn test_with_page_adds_parameter_when_absent() {
        let url = Url::parse("https://example.com/pulls?per_page=100").unwrap();
        let rebuilt = with_page(&url, 4);
        assert_eq!(page_number(&rebuilt).unwrap(), 4);
    }
}
