use anyhow::{anyhow, Result};
use reqwest::{header, Client};
use scraper::{ElementRef, Html, Selector};
use std::path::PathBuf;
use std::time::Duration;
use url::Url;
use webidx_core::{Error, PageText};

const MAX_PAGE_BYTES: usize = 2 * 1024 * 1024;

/// Elements whose text never reaches the reader.
const HIDDEN: &[&str] = &["script", "style", "noscript", "template"];

/// Fetches pages over HTTP(S), or from disk for `file://` URLs and plain paths.
pub struct Fetcher {
    client: Client,
    extractor: Extractor,
}

impl Fetcher {
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .user_agent(user_agent)
            .redirect(reqwest::redirect::Policy::limited(5))
            .timeout(timeout)
            .build()?;
        Ok(Self { client, extractor: Extractor::new()? })
    }

    pub async fn fetch(&self, target: &str) -> Result<PageText, Error> {
        let fail = |message: String| Error::Fetch { url: target.to_string(), message };
        if let Some(path) = local_path(target) {
            let html = tokio::fs::read_to_string(&path).await.map_err(|e| fail(e.to_string()))?;
            return Ok(self.extractor.extract(&html));
        }

        let url = Url::parse(target)
            .or_else(|_| Url::parse(&format!("https://{target}")))
            .map_err(|e| fail(e.to_string()))?;
        let resp = self.client.get(url).send().await.map_err(|e| fail(e.to_string()))?;
        if !resp.status().is_success() {
            return Err(fail(format!("HTTP {}", resp.status())));
        }
        if let Some(ct) = resp.headers().get(header::CONTENT_TYPE).and_then(|v| v.to_str().ok()) {
            if !ct.starts_with("text/html") && !ct.starts_with("application/xhtml") {
                return Err(fail(format!("unsupported content type {ct}")));
            }
        }
        let bytes = resp.bytes().await.map_err(|e| fail(e.to_string()))?;
        if bytes.len() > MAX_PAGE_BYTES {
            return Err(fail(format!("page is {} bytes, limit is {MAX_PAGE_BYTES}", bytes.len())));
        }
        let html = String::from_utf8_lossy(&bytes);
        tracing::debug!(url = target, bytes = bytes.len(), "fetched page");
        Ok(self.extractor.extract(&html))
    }
}

fn local_path(target: &str) -> Option<PathBuf> {
    if target.starts_with("file://") {
        return Url::parse(target).ok()?.to_file_path().ok();
    }
    let path = PathBuf::from(target);
    if !target.contains("://") && path.is_file() { Some(path) } else { None }
}

/// Pulls title, body text and meta `content` attributes out of HTML.
pub struct Extractor {
    title: Selector,
    body: Selector,
    meta: Selector,
}

impl Extractor {
    pub fn new() -> Result<Self> {
        let parse = |s: &str| Selector::parse(s).map_err(|e| anyhow!("invalid selector `{s}`: {e:?}"));
        Ok(Self { title: parse("title")?, body: parse("body")?, meta: parse("meta")? })
    }

    pub fn extract(&self, html: &str) -> PageText {
        let doc = Html::parse_document(html);
        let title = doc.select(&self.title).next().map(|n| collapse(n.text())).unwrap_or_default();
        let body_text = doc.select(&self.body).next().map(visible_text).unwrap_or_default();
        let meta_contents = doc
            .select(&self.meta)
            .filter_map(|m| m.value().attr("content"))
            .map(str::to_string)
            .collect();
        PageText { title, body_text, meta_contents }
    }
}

fn visible_text(root: ElementRef<'_>) -> String {
    let text = root.descendants().filter_map(|node| {
        let text = node.value().as_text()?;
        let hidden = node
            .ancestors()
            .filter_map(|a| a.value().as_element())
            .any(|el| HIDDEN.contains(&el.name()));
        if hidden { None } else { Some(&**text) }
    });
    collapse(text)
}

fn collapse<'a>(text: impl Iterator<Item = &'a str>) -> String {
    text.flat_map(str::split_whitespace).collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"<html><head><title> Cats </title>
        <meta name="description" content="All about cats">
        <meta charset="utf-8">
        <meta name="keywords" content="cats, fish"></head>
        <body><h1>Cats</h1><p>Cats eat
        fish.</p><script>ignored()</script></body></html>"#;

    #[test]
    fn extracts_title_body_and_meta() {
        let page = Extractor::new().unwrap().extract(PAGE);
        assert_eq!(page.title, "Cats");
        assert_eq!(page.body_text, "Cats Cats eat fish.");
        assert_eq!(page.meta_contents, vec!["All about cats", "cats, fish"]);
    }

    #[test]
    fn script_and_style_text_is_not_body_text() {
        let html = "<html><body><p>cats</p><script>var zzsecret = 1;</script>\
            <style>p { color: red }</style><noscript>enable js</noscript></body></html>";
        let page = Extractor::new().unwrap().extract(html);
        assert_eq!(page.body_text, "cats");
    }

    #[tokio::test]
    async fn reads_local_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("page.html");
        std::fs::write(&path, PAGE).unwrap();
        let fetcher = Fetcher::new("test", Duration::from_secs(1)).unwrap();
        let page = fetcher.fetch(path.to_str().unwrap()).await.unwrap();
        assert_eq!(page.title, "Cats");
    }

    #[tokio::test]
    async fn missing_file_url_is_a_fetch_error() {
        let fetcher = Fetcher::new("test", Duration::from_secs(1)).unwrap();
        let err = fetcher.fetch("file:///definitely/not/here.html").await.unwrap_err();
        assert!(matches!(err, Error::Fetch { .. }));
    }
}
