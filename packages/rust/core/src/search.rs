//! Search page helpers: URL construction, readiness polling, total count.

use std::time::Duration;

use scraper::Selector;
use tracing::{debug, warn};
use url::Url;

use adlib_feed::{DocumentSnapshot, PageSnapshotProvider};
use adlib_shared::{AdLibError, Result};

/// Build the Ad Library keyword search URL.
pub fn search_url(base: &str, keyword: &str) -> Result<Url> {
    let keyword = keyword.trim();
    if keyword.is_empty() {
        return Err(AdLibError::validation("search keyword must not be empty"));
    }

    let mut url = Url::parse(base)
        .map_err(|e| AdLibError::config(format!("invalid base URL '{base}': {e}")))?;
    url.query_pairs_mut()
        .clear()
        .append_pair("active_status", "active")
        .append_pair("ad_type", "all")
        .append_pair("country", "ALL")
        .append_pair("is_targeted_country", "false")
        .append_pair("media_type", "all")
        .append_pair("q", keyword)
        .append_pair("search_type", "keyword_unordered");
    Ok(url)
}

/// Turn heading text such as `"~1,200 results"` into a count.
///
/// Only the digits are kept; anything unparseable counts as 0.
pub fn parse_total_results(text: &str) -> usize {
    let digits: String = text.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() {
        if !text.trim().is_empty() {
            warn!(text, "could not parse result count");
        }
        return 0;
    }
    digits.parse().unwrap_or_else(|_| {
        warn!(text, "result count out of range");
        0
    })
}

/// Text of the first element matching `heading` in the snapshot.
pub(crate) fn heading_text(snapshot: &DocumentSnapshot, heading: &Selector) -> Option<String> {
    let doc = snapshot.parse();
    doc.select(heading)
        .next()
        .map(|el| el.text().collect::<String>().trim().to_string())
}

/// Poll until the results heading renders.
///
/// Returns the snapshot that contained it, or `None` after `attempts` polls.
pub(crate) async fn wait_until_ready<S>(
    session: &S,
    heading: &Selector,
    attempts: u32,
    poll_interval: Duration,
) -> Result<Option<DocumentSnapshot>>
where
    S: PageSnapshotProvider + ?Sized,
{
    for attempt in 1..=attempts {
        let snapshot = session.current_snapshot().await?;
        if heading_text(&snapshot, heading).is_some() {
            debug!(attempt, "results heading rendered");
            return Ok(Some(snapshot));
        }
        if attempt < attempts {
            tokio::time::sleep(poll_interval).await;
        }
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use adlib_feed::{ReplaySession, ScrollActuator, compile_selector};

    #[test]
    fn builds_keyword_query() {
        let url = search_url("https://www.facebook.com/ads/library/", "  Nike Air ").unwrap();
        assert_eq!(url.host_str(), Some("www.facebook.com"));
        assert_eq!(url.path(), "/ads/library/");

        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert!(pairs.contains(&("q".into(), "Nike Air".into())));
        assert!(pairs.contains(&("country".into(), "ALL".into())));
        assert!(pairs.contains(&("search_type".into(), "keyword_unordered".into())));
        assert_eq!(pairs.len(), 7);
    }

    #[test]
    fn rejects_blank_keyword() {
        let err = search_url("https://www.facebook.com/ads/library/", "   ").unwrap_err();
        assert!(matches!(err, AdLibError::Validation { .. }));
    }

    #[test]
    fn rejects_bad_base_url() {
        assert!(search_url("not a url", "nike").is_err());
    }

    #[test]
    fn total_results_parsing() {
        assert_eq!(parse_total_results("~1,200 results"), 1200);
        assert_eq!(parse_total_results("48 results"), 48);
        assert_eq!(parse_total_results("No results"), 0);
        assert_eq!(parse_total_results(""), 0);
        assert_eq!(parse_total_results("99999999999999999999999999 results"), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn waits_for_heading_across_polls() {
        let heading = compile_selector("h3.count").unwrap();
        let frames = vec![
            "<html><body>loading</body></html>".to_string(),
            r#"<html><body><h3 class="count">~40 results</h3></body></html>"#.to_string(),
        ];
        let mut session = ReplaySession::loaded(frames);

        let first = wait_until_ready(&session, &heading, 1, Duration::from_secs(1))
            .await
            .unwrap();
        assert!(first.is_none());

        session.scroll_to_bottom().await.unwrap();
        let ready = wait_until_ready(&session, &heading, 3, Duration::from_secs(1))
            .await
            .unwrap()
            .expect("heading rendered");
        assert_eq!(heading_text(&ready, &heading).as_deref(), Some("~40 results"));
    }
}
