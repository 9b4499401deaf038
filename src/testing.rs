//! Scripted stand-ins for the browser and the terminal.

use crate::browser::BrowserSession;
use crate::dom::HIDE_FLOATING_SCRIPT;
use crate::error::{Result, ScribeError};
use crate::interactive::Prompt;
use crate::types::PdfOptions;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet, VecDeque};

/// Records every call and answers scripts from canned state. Element handles
/// are plain indices.
#[derive(Debug, Default)]
pub struct FakeBrowser {
    pub visited: Vec<String>,
    pub scripts: Vec<String>,
    pub printed: Vec<PdfOptions>,
    pub hovered: Vec<usize>,
    pub closed: bool,

    pub links: Vec<String>,
    pub title: Option<String>,
    pub scroll_height: u64,
    pub hover_targets: usize,
    /// selector -> value answered by first-match queries on every page
    pub fields: HashMap<String, String>,
    /// selector reported by the main-content isolation script
    pub isolate_match: Option<String>,
    pub fail_navigation: HashSet<String>,
    pub fail_print_on: HashSet<String>,
    pub fail_print: bool,
    pub fail_hover: bool,
}

impl FakeBrowser {
    pub const PDF_BYTES: &'static [u8] = b"%PDF-1.4 fake";

    pub fn new() -> Self {
        Self::default()
    }

    pub fn current_url(&self) -> Option<&str> {
        self.visited.last().map(String::as_str)
    }

    /// The page-cleaning steps sent so far, in order.
    pub fn cleanup_steps(&self) -> Vec<&'static str> {
        self.scripts
            .iter()
            .filter_map(|script| {
                if script == HIDE_FLOATING_SCRIPT {
                    Some("hide_floating")
                } else if script.contains("el.remove()") {
                    Some("remove")
                } else if script.contains("cloneNode(true)") {
                    Some("isolate")
                } else if script.contains("document.body.style.setProperty") {
                    Some("body_style")
                } else if script.contains("createElement('style')") {
                    Some("inject_style")
                } else {
                    None
                }
            })
            .collect()
    }

    fn field_for(&self, script: &str) -> Option<&String> {
        self.fields
            .iter()
            .find(|(selector, _)| script.contains(&Value::String((*selector).clone()).to_string()))
            .map(|(_, v)| v)
    }
}

#[async_trait]
impl BrowserSession for FakeBrowser {
    type Element = usize;

    async fn navigate(&mut self, url: &str) -> Result<()> {
        if self.fail_navigation.contains(url) {
            return Err(ScribeError::Navigation {
                url: url.to_string(),
                reason: "net::ERR_CONNECTION_RESET".to_string(),
            });
        }
        self.visited.push(url.to_string());
        Ok(())
    }

    async fn execute_script(&mut self, script: &str) -> Result<Value> {
        self.scripts.push(script.to_string());
        let value = if script.contains("cloneNode(true)") {
            json!(self.isolate_match)
        } else if script.starts_with("Array.from(") {
            json!(self.links)
        } else if script == "document.title" {
            json!(self.title)
        } else if script.contains("scrollHeight") {
            json!(self.scroll_height)
        } else if script.contains("!== null") {
            json!(self.field_for(script).is_some())
        } else if script.contains("const el = document.querySelector(") {
            json!(self.field_for(script))
        } else {
            Value::Null
        };
        Ok(value)
    }

    async fn find_elements(&mut self, _selector: &str) -> Result<Vec<usize>> {
        Ok((0..self.hover_targets).collect())
    }

    async fn hover(&mut self, element: &usize) -> Result<()> {
        if self.fail_hover {
            return Err(ScribeError::Script("element detached".into()));
        }
        self.hovered.push(*element);
        Ok(())
    }

    async fn print_to_pdf(&mut self, options: &PdfOptions) -> Result<Vec<u8>> {
        let current = self.current_url().unwrap_or_default().to_string();
        if self.fail_print || self.fail_print_on.contains(&current) {
            return Err(ScribeError::Print("renderer crashed".into()));
        }
        self.printed.push(*options);
        Ok(Self::PDF_BYTES.to_vec())
    }

    async fn close(&mut self) -> Result<()> {
        self.closed = true;
        Ok(())
    }
}

/// Replays fixed lines, then reports end of input.
#[derive(Debug, Default)]
pub struct ScriptedPrompt {
    lines: VecDeque<String>,
}

impl ScriptedPrompt {
    pub fn new(lines: &[&str]) -> Self {
        Self {
            lines: lines.iter().map(|l| l.to_string()).collect(),
        }
    }
}

impl Prompt for ScriptedPrompt {
    fn read_url(&mut self) -> Result<Option<String>> {
        Ok(self.lines.pop_front())
    }
}
