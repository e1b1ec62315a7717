//! Web-page fetching and HTML→markdown conversion.
//!
//! The URL ingestion path treats the web as an external document source:
//! fetch one page, convert its HTML to markdown, and surface the `<title>`
//! so the service layer can synthesize catalog metadata.

use std::time::Duration;

use tracing::debug;
use url::Url;

use crate::{Error, Result};

/// Rendered line width for the markdown conversion.
const RENDER_WIDTH: usize = 80;

const USER_AGENT: &str = concat!("cabinet/", env!("CARGO_PKG_VERSION"));

/// A fetched page, converted to markdown.
#[derive(Debug, Clone)]
pub struct FetchedPage {
  /// The document `<title>`, if the page has a non-empty one.
  pub title:    Option<String>,
  pub markdown: String,
}

/// HTTP client wrapper for single-page fetches.
#[derive(Debug, Clone)]
pub struct WebFetcher {
  client: reqwest::Client,
}

impl WebFetcher {
  pub fn new(timeout: Duration) -> Result<Self> {
    let client = reqwest::Client::builder()
      .timeout(timeout)
      .build()
      .map_err(|e| Error::Fetch {
        url:    String::new(),
        reason: format!("building HTTP client: {e}"),
      })?;
    Ok(Self { client })
  }

  /// Fetch `url` and convert the response body to markdown.
  ///
  /// Non-success statuses and non-HTML content types are errors; there is
  /// no retry here — the caller decides.
  pub async fn fetch(&self, url: &str) -> Result<FetchedPage> {
    let parsed = Url::parse(url).map_err(|e| Error::InvalidUrl {
      url:    url.to_string(),
      reason: e.to_string(),
    })?;
    if !matches!(parsed.scheme(), "http" | "https") {
      return Err(Error::InvalidUrl {
        url:    url.to_string(),
        reason: format!("unsupported scheme {:?}", parsed.scheme()),
      });
    }

    let response = self
      .client
      .get(parsed)
      .header("User-Agent", USER_AGENT)
      .send()
      .await
      .map_err(|e| Error::Fetch {
        url:    url.to_string(),
        reason: e.to_string(),
      })?;

    let status = response.status();
    if !status.is_success() {
      return Err(Error::Fetch {
        url:    url.to_string(),
        reason: format!("HTTP {status}"),
      });
    }

    let content_type = response
      .headers()
      .get("content-type")
      .and_then(|v| v.to_str().ok())
      .unwrap_or("")
      .to_string();
    if !content_type.contains("text/html")
      && !content_type.contains("application/xhtml")
    {
      return Err(Error::UnsupportedContentType {
        url: url.to_string(),
        content_type,
      });
    }

    let html = response.text().await.map_err(|e| Error::Fetch {
      url:    url.to_string(),
      reason: format!("reading body: {e}"),
    })?;

    debug!(url, bytes = html.len(), "converting fetched page");
    Ok(FetchedPage {
      title:    extract_title(&html),
      markdown: to_markdown(&html),
    })
  }
}

/// Pull the text of the first `<title>` element, if any.
fn extract_title(html: &str) -> Option<String> {
  let document = scraper::Html::parse_document(html);
  let selector = scraper::Selector::parse("title").expect("valid selector");
  let title = document
    .select(&selector)
    .next()?
    .text()
    .collect::<String>()
    .trim()
    .to_string();
  if title.is_empty() { None } else { Some(title) }
}

fn to_markdown(html: &str) -> String {
  html2text::from_read(html.as_bytes(), RENDER_WIDTH)
}
