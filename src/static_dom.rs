//! [`Dom`] over an in-memory HTML snapshot.
//!
//! There is no layout engine here, so "floating" means an inline
//! `position: fixed|sticky` declaration, and hidden elements are dropped from
//! the snapshot instead of receiving `display: none`. Injected style sheets and
//! body styles are recorded rather than applied.

use crate::dom::Dom;
use crate::error::Result;
use crate::selectors::{any_match, ElementView, Pattern};
use async_trait::async_trait;
use ego_tree::NodeId;
use scraper::{ElementRef, Html, Selector};
use std::time::Duration;

impl ElementView for scraper::node::Element {
    fn tag_name(&self) -> &str {
        self.name()
    }

    fn attr(&self, name: &str) -> Option<&str> {
        scraper::node::Element::attr(self, name)
    }
}

pub struct StaticDom {
    html: String,
    styles: Vec<String>,
    body_style: Vec<(String, String)>,
}

impl StaticDom {
    pub fn parse(html: &str) -> Self {
        Self {
            html: Html::parse_document(html).html(),
            styles: Vec::new(),
            body_style: Vec::new(),
        }
    }

    pub fn html(&self) -> &str {
        &self.html
    }

    pub fn document(&self) -> Html {
        Html::parse_document(&self.html)
    }

    pub fn injected_styles(&self) -> &[String] {
        &self.styles
    }

    pub fn body_style(&self, property: &str) -> Option<&str> {
        self.body_style
            .iter()
            .rev()
            .find(|(p, _)| p == property)
            .map(|(_, v)| v.as_str())
    }

    /// Detaches the outermost elements under `<body>` for which `matched`
    /// holds and returns how many were detached. Matches inside an already
    /// detached element are not counted, as in the live removal script.
    fn detach_where(&mut self, matched: impl Fn(&ElementRef<'_>) -> bool) -> usize {
        let mut document = self.document();
        let mut outermost: Vec<NodeId> = Vec::new();
        for el in body_elements(&document) {
            if !matched(&el) {
                continue;
            }
            let nested = el
                .ancestors()
                .filter_map(ElementRef::wrap)
                .any(|a| outermost.contains(&a.id()));
            if !nested {
                outermost.push(el.id());
            }
        }
        let detached = outermost.len();
        for id in outermost {
            if let Some(mut node) = document.tree.get_mut(id) {
                node.detach();
            }
        }
        self.html = document.html();
        detached
    }
}

/// Elements under `<body>`, in document order.
fn body_elements(document: &Html) -> Vec<ElementRef<'_>> {
    let Ok(sel) = Selector::parse("body") else {
        return Vec::new();
    };
    match document.select(&sel).next() {
        Some(body) => body
            .descendants()
            .filter_map(ElementRef::wrap)
            .skip(1)
            .collect(),
        None => Vec::new(),
    }
}

fn is_floating(el: &ElementRef<'_>) -> bool {
    let Some(style) = el.value().attr("style") else {
        return false;
    };
    let compact = style
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_ascii_lowercase();
    compact
        .split(';')
        .any(|decl| decl == "position:fixed" || decl == "position:sticky")
}

#[async_trait]
impl Dom for StaticDom {
    async fn inject_style(&mut self, css: &str) -> Result<()> {
        self.styles.push(css.to_string());
        Ok(())
    }

    async fn remove_matching(&mut self, patterns: &[Pattern]) -> Result<usize> {
        Ok(self.detach_where(|el| any_match(patterns, el.value())))
    }

    async fn set_body_style(&mut self, declarations: &[(&str, &str)]) -> Result<()> {
        self.body_style.extend(
            declarations
                .iter()
                .map(|(p, v)| (p.to_string(), v.to_string())),
        );
        Ok(())
    }

    async fn isolate(&mut self, candidates: &[Pattern]) -> Result<Option<String>> {
        let rebuilt = {
            let document = self.document();
            let elements = body_elements(&document);
            let chosen = candidates.iter().find_map(|candidate| {
                elements
                    .iter()
                    .find(|el| candidate.matches(el.value()))
                    .map(|el| (candidate.css(), el.html()))
            });
            chosen.map(|(selector, outer)| {
                let head = Selector::parse("head")
                    .ok()
                    .and_then(|sel| document.select(&sel).next().map(|h| h.inner_html()))
                    .unwrap_or_default();
                let html = Html::parse_document(&format!(
                    "<html><head>{}</head><body>{}</body></html>",
                    head, outer
                ))
                .html();
                (selector, html)
            })
        };
        match rebuilt {
            Some((selector, html)) => {
                self.html = html;
                Ok(Some(selector))
            }
            None => Ok(None),
        }
    }

    async fn hide_floating(&mut self) -> Result<usize> {
        Ok(self.detach_where(is_floating))
    }

    async fn query_first(
        &mut self,
        selector: &str,
        attribute: Option<&str>,
    ) -> Result<Option<String>> {
        let Ok(sel) = Selector::parse(selector) else {
            return Ok(None);
        };
        let document = self.document();
        let value = document.select(&sel).next().and_then(|el| match attribute {
            Some(attr) => el.value().attr(attr).map(str::to_string),
            None => Some(el.text().collect::<String>()),
        });
        Ok(value.map(|v| v.trim().to_string()))
    }

    async fn wait_for(&mut self, selector: &str, _timeout: Duration) -> Result<bool> {
        // a snapshot never changes, so one check is the whole wait
        let Ok(sel) = Selector::parse(selector) else {
            return Ok(false);
        };
        Ok(self.document().select(&sel).next().is_some())
    }

    async fn title(&mut self) -> Result<Option<String>> {
        let title = self.query_first("title", None).await?;
        Ok(title.filter(|t| !t.is_empty()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selectors::{aggressive_clutter, gentle_clutter, MAIN_CANDIDATES};

    fn count(dom: &StaticDom, selector: &str) -> usize {
        let sel = Selector::parse(selector).unwrap();
        dom.document().select(&sel).count()
    }

    #[tokio::test]
    async fn test_remove_matching_counts_outermost_only() {
        let mut dom = StaticDom::parse(
            r#"<html><body>
                <div class="popup"><div id="popup-inner">x</div></div>
                <p>keep</p>
            </body></html>"#,
        );
        let removed = dom.remove_matching(&gentle_clutter()).await.unwrap();
        assert_eq!(removed, 1);
        assert_eq!(count(&dom, "div"), 0);
        assert_eq!(count(&dom, "p"), 1);
    }

    #[tokio::test]
    async fn test_body_is_never_removed() {
        let mut dom = StaticDom::parse(
            r#"<html><body class="loaded-ad-free"><p>text</p></body></html>"#,
        );
        dom.remove_matching(&aggressive_clutter()).await.unwrap();
        assert_eq!(count(&dom, "body"), 1);
        assert_eq!(count(&dom, "p"), 1);
    }

    #[tokio::test]
    async fn test_isolate_prefers_main_over_article_class() {
        let mut dom = StaticDom::parse(
            r#"<html><head><title>T</title></head><body>
                <div class="article-teaser">teaser</div>
                <main><p>real</p></main>
            </body></html>"#,
        );
        let chosen = dom.isolate(&MAIN_CANDIDATES).await.unwrap();
        assert_eq!(chosen.as_deref(), Some("main"));
        assert_eq!(count(&dom, "body > main"), 1);
        assert_eq!(count(&dom, ".article-teaser"), 0);
        assert_eq!(dom.title().await.unwrap().as_deref(), Some("T"));
    }

    #[tokio::test]
    async fn test_isolate_miss_leaves_body() {
        let html = r#"<html><body><p>just text</p></body></html>"#;
        let mut dom = StaticDom::parse(html);
        let before = dom.html().to_string();
        assert_eq!(dom.isolate(&MAIN_CANDIDATES).await.unwrap(), None);
        assert_eq!(dom.html(), before);
    }

    #[tokio::test]
    async fn test_hide_floating_inline_positions() {
        let mut dom = StaticDom::parse(
            r#"<html><body>
                <div style="position: FIXED; top:0">bar</div>
                <div style="position:sticky">hdr</div>
                <div style="position: relative">ok</div>
            </body></html>"#,
        );
        assert_eq!(dom.hide_floating().await.unwrap(), 2);
        assert_eq!(count(&dom, "div"), 1);
    }

    #[tokio::test]
    async fn test_query_first_reads_text_and_attribute() {
        let mut dom = StaticDom::parse(
            r#"<html><head><meta name="author" content=" Jane Doe "></head>
               <body><h1> Headline </h1><h1>Second</h1></body></html>"#,
        );
        assert_eq!(
            dom.query_first("h1", None).await.unwrap().as_deref(),
            Some("Headline")
        );
        assert_eq!(
            dom.query_first(r#"meta[name="author"]"#, Some("content"))
                .await
                .unwrap()
                .as_deref(),
            Some("Jane Doe")
        );
        assert_eq!(dom.query_first("h2", None).await.unwrap(), None);
    }
}
