//! Primitive DOM mutations used by the normalizer and metadata extractor.

use crate::browser::BrowserSession;
use crate::error::Result;
use crate::selectors::{selector_list, Pattern};
use async_trait::async_trait;
use serde_json::Value;
use std::time::{Duration, Instant};

const WAIT_POLL_INTERVAL: Duration = Duration::from_millis(250);

#[async_trait]
pub trait Dom: Send {
    /// Append a `<style>` block to the document head.
    async fn inject_style(&mut self, css: &str) -> Result<()>;

    /// Remove every element matching any pattern, except `<html>` and `<body>`.
    /// Returns how many were removed; matches inside a removed element are not
    /// counted.
    async fn remove_matching(&mut self, patterns: &[Pattern]) -> Result<usize>;

    async fn set_body_style(&mut self, declarations: &[(&str, &str)]) -> Result<()>;

    /// Replace the body with a deep clone of the first candidate found, trying
    /// candidates in order. Returns the selector that matched.
    async fn isolate(&mut self, candidates: &[Pattern]) -> Result<Option<String>>;

    /// Hide every element whose position is `fixed` or `sticky`.
    async fn hide_floating(&mut self) -> Result<usize>;

    /// Text (or `attribute`) of the first element matching `selector`.
    async fn query_first(&mut self, selector: &str, attribute: Option<&str>)
        -> Result<Option<String>>;

    async fn wait_for(&mut self, selector: &str, timeout: Duration) -> Result<bool>;

    async fn title(&mut self) -> Result<Option<String>>;
}

/// [`Dom`] backed by script execution in a live browser page.
pub struct LiveDom<'a, B: BrowserSession + ?Sized> {
    session: &'a mut B,
}

impl<'a, B: BrowserSession + ?Sized> LiveDom<'a, B> {
    pub fn new(session: &'a mut B) -> Self {
        Self { session }
    }

    async fn run(&mut self, script: String) -> Result<Value> {
        self.session.execute_script(&script).await
    }
}

/// JSON-quotes a string for embedding in a script.
pub(crate) fn js_str(s: &str) -> String {
    Value::String(s.to_string()).to_string()
}

fn as_count(value: &Value) -> usize {
    value.as_u64().unwrap_or(0) as usize
}

pub fn inject_style_script(css: &str) -> String {
    format!(
        "(() => {{ const style = document.createElement('style'); \
         style.innerHTML = {}; \
         (document.head || document.documentElement).appendChild(style); }})()",
        js_str(css)
    )
}

pub fn remove_script(patterns: &[Pattern]) -> String {
    format!(
        "(() => {{ let n = 0; \
         document.querySelectorAll({}).forEach(el => {{ \
           if (el === document.body || el === document.documentElement) return; \
           if (!el.isConnected) return; \
           el.remove(); n++; }}); \
         return n; }})()",
        js_str(&selector_list(patterns))
    )
}

pub fn body_style_script(declarations: &[(&str, &str)]) -> String {
    let assignments: String = declarations
        .iter()
        .map(|(prop, value)| {
            format!(
                "document.body.style.setProperty({}, {});",
                js_str(prop),
                js_str(value)
            )
        })
        .collect();
    format!("(() => {{ if (!document.body) return; {} }})()", assignments)
}

pub fn isolate_script(candidates: &[Pattern]) -> String {
    let list = candidates
        .iter()
        .map(|p| js_str(&p.css()))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "(() => {{ for (const sel of [{}]) {{ \
           const main = document.querySelector(sel); \
           if (main) {{ \
             const clone = main.cloneNode(true); \
             document.body.innerHTML = ''; \
             document.body.appendChild(clone); \
             return sel; }} }} \
         return null; }})()",
        list
    )
}

pub const HIDE_FLOATING_SCRIPT: &str = "(() => { let n = 0; \
    document.querySelectorAll('*').forEach(el => { \
      const pos = window.getComputedStyle(el).position; \
      if (pos === 'fixed' || pos === 'sticky') { el.style.display = 'none'; n++; } }); \
    return n; })()";

pub fn query_first_script(selector: &str, attribute: Option<&str>) -> String {
    let read = match attribute {
        Some(attr) => format!("el.getAttribute({})", js_str(attr)),
        None => "el.textContent".to_string(),
    };
    format!(
        "(() => {{ const el = document.querySelector({}); \
         if (!el) return null; const v = {}; \
         return v == null ? null : String(v).trim(); }})()",
        js_str(selector),
        read
    )
}

pub fn exists_script(selector: &str) -> String {
    format!("document.querySelector({}) !== null", js_str(selector))
}

#[async_trait]
impl<B: BrowserSession + ?Sized> Dom for LiveDom<'_, B> {
    async fn inject_style(&mut self, css: &str) -> Result<()> {
        self.run(inject_style_script(css)).await?;
        Ok(())
    }

    async fn remove_matching(&mut self, patterns: &[Pattern]) -> Result<usize> {
        if patterns.is_empty() {
            return Ok(0);
        }
        let removed = self.run(remove_script(patterns)).await?;
        Ok(as_count(&removed))
    }

    async fn set_body_style(&mut self, declarations: &[(&str, &str)]) -> Result<()> {
        self.run(body_style_script(declarations)).await?;
        Ok(())
    }

    async fn isolate(&mut self, candidates: &[Pattern]) -> Result<Option<String>> {
        let chosen = self.run(isolate_script(candidates)).await?;
        Ok(chosen.as_str().map(str::to_string))
    }

    async fn hide_floating(&mut self) -> Result<usize> {
        let hidden = self.run(HIDE_FLOATING_SCRIPT.to_string()).await?;
        Ok(as_count(&hidden))
    }

    async fn query_first(
        &mut self,
        selector: &str,
        attribute: Option<&str>,
    ) -> Result<Option<String>> {
        let value = self.run(query_first_script(selector, attribute)).await?;
        Ok(value.as_str().map(str::to_string))
    }

    async fn wait_for(&mut self, selector: &str, timeout: Duration) -> Result<bool> {
        let deadline = Instant::now() + timeout;
        loop {
            let found = self.run(exists_script(selector)).await?;
            if found.as_bool().unwrap_or(false) {
                return Ok(true);
            }
            let now = Instant::now();
            if now >= deadline {
                return Ok(false);
            }
            tokio::time::sleep(WAIT_POLL_INTERVAL.min(deadline - now)).await;
        }
    }

    async fn title(&mut self) -> Result<Option<String>> {
        self.session.title().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selectors::MAIN_CANDIDATES;
    use crate::testing::FakeBrowser;

    #[test]
    fn test_js_str_escapes_quotes() {
        assert_eq!(js_str(r#"[class*="ad"]"#), r#""[class*=\"ad\"]""#);
    }

    #[test]
    fn test_remove_script_uses_selector_list() {
        let script = remove_script(&[Pattern::tag("nav"), Pattern::class_contains("popup")]);
        assert!(script.contains(r#"nav, [class*=\"popup\"]"#));
        assert!(script.contains("document.body"));
        assert!(script.contains("if (!el.isConnected) return;"));
    }

    #[test]
    fn test_isolate_script_keeps_priority_order() {
        let script = isolate_script(&MAIN_CANDIDATES);
        let main = script.find(r#""main""#).unwrap();
        let role = script.find("role").unwrap();
        let article = script.find("article").unwrap();
        let content = script.find("content").unwrap();
        assert!(main < role && role < article && article < content);
    }

    #[tokio::test]
    async fn test_wait_for_zero_timeout_checks_once() {
        let mut browser = FakeBrowser::new();
        let mut dom = LiveDom::new(&mut browser);
        let found = dom.wait_for("h1", Duration::ZERO).await.unwrap();
        assert!(!found);
        assert_eq!(
            browser
                .scripts
                .iter()
                .filter(|s| s.contains("!== null"))
                .count(),
            1
        );
    }

    #[tokio::test]
    async fn test_null_results_degrade_gracefully() {
        let mut browser = FakeBrowser::new();
        let mut dom = LiveDom::new(&mut browser);
        assert_eq!(dom.remove_matching(&[Pattern::tag("nav")]).await.unwrap(), 0);
        assert_eq!(dom.isolate(&MAIN_CANDIDATES).await.unwrap(), None);
        assert_eq!(dom.query_first("h1", None).await.unwrap(), None);
    }
}
