//! Rule tables for clutter removal and main-content detection.
//!
//! Each rule is a [`Pattern`]: an optional tag restriction plus one attribute
//! test. Patterns render to CSS selectors for the live page and are evaluated
//! directly by [`Pattern::matches`] for in-memory documents.

/// Attribute a pattern inspects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attribute {
    TagName,
    Class,
    Id,
    Src,
    Role,
}

impl Attribute {
    fn html_name(self) -> &'static str {
        match self {
            Attribute::TagName => "",
            Attribute::Class => "class",
            Attribute::Id => "id",
            Attribute::Src => "src",
            Attribute::Role => "role",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchKind {
    Equals,
    Contains,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pattern {
    pub tag: Option<&'static str>,
    pub attribute: Attribute,
    pub kind: MatchKind,
    pub value: &'static str,
}

/// Minimal element view the matcher needs.
pub trait ElementView {
    fn tag_name(&self) -> &str;
    fn attr(&self, name: &str) -> Option<&str>;
}

impl Pattern {
    pub const fn tag(name: &'static str) -> Self {
        Self {
            tag: None,
            attribute: Attribute::TagName,
            kind: MatchKind::Equals,
            value: name,
        }
    }

    pub const fn class_contains(needle: &'static str) -> Self {
        Self {
            tag: None,
            attribute: Attribute::Class,
            kind: MatchKind::Contains,
            value: needle,
        }
    }

    pub const fn id_contains(needle: &'static str) -> Self {
        Self {
            tag: None,
            attribute: Attribute::Id,
            kind: MatchKind::Contains,
            value: needle,
        }
    }

    pub const fn role(value: &'static str) -> Self {
        Self {
            tag: None,
            attribute: Attribute::Role,
            kind: MatchKind::Equals,
            value,
        }
    }

    pub const fn on(self, tag: &'static str) -> Self {
        Self {
            tag: Some(tag),
            ..self
        }
    }

    /// CSS selector with the same meaning, for `querySelectorAll`.
    pub fn css(&self) -> String {
        let prefix = self.tag.unwrap_or("");
        match self.attribute {
            Attribute::TagName => self.value.to_string(),
            attr => {
                let op = match self.kind {
                    MatchKind::Equals => "=",
                    MatchKind::Contains => "*=",
                };
                format!("{}[{}{}\"{}\"]", prefix, attr.html_name(), op, self.value)
            }
        }
    }

    pub fn matches<E: ElementView + ?Sized>(&self, el: &E) -> bool {
        if let Some(tag) = self.tag {
            if !el.tag_name().eq_ignore_ascii_case(tag) {
                return false;
            }
        }
        let actual = match self.attribute {
            Attribute::TagName => return el.tag_name().eq_ignore_ascii_case(self.value),
            attr => match el.attr(attr.html_name()) {
                Some(v) => v,
                None => return false,
            },
        };
        match self.kind {
            MatchKind::Equals => actual == self.value,
            // `[attr*=""]` never matches in CSS
            MatchKind::Contains => !self.value.is_empty() && actual.contains(self.value),
        }
    }
}

/// Joins patterns into a single selector list.
pub fn selector_list(patterns: &[Pattern]) -> String {
    patterns
        .iter()
        .map(Pattern::css)
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn any_match<E: ElementView + ?Sized>(patterns: &[Pattern], el: &E) -> bool {
    patterns.iter().any(|p| p.matches(el))
}

macro_rules! class_or_id {
    ($($needle:literal),* $(,)?) => {
        [$(Pattern::class_contains($needle), Pattern::id_contains($needle)),*]
    };
}

const GENTLE_NEEDLES: [Pattern; 12] =
    class_or_id!["popup", "overlay", "modal", "cookie", "subscribe", "newsletter"];

const AGGRESSIVE_NEEDLES: [Pattern; 22] = class_or_id![
    "sidebar",
    "popup",
    "overlay",
    "modal",
    "ad",
    "cookie",
    "banner",
    "subscribe",
    "newsletter",
    "StickyVideo",
    "VideoHub",
];

const CHROME_TAGS: [Pattern; 4] = [
    Pattern::tag("header"),
    Pattern::tag("footer"),
    Pattern::tag("nav"),
    Pattern::tag("aside"),
];

const VIDEO_EMBEDS: [Pattern; 5] = [
    Pattern {
        tag: Some("iframe"),
        attribute: Attribute::Src,
        kind: MatchKind::Contains,
        value: "video",
    },
    Pattern {
        tag: Some("iframe"),
        attribute: Attribute::Src,
        kind: MatchKind::Contains,
        value: "youtube",
    },
    Pattern::tag("video"),
    Pattern::class_contains("video").on("figure"),
    Pattern::class_contains("video").on("div"),
];

/// Popups, overlays, modals, cookie and subscription prompts.
pub fn gentle_clutter() -> Vec<Pattern> {
    GENTLE_NEEDLES.to_vec()
}

/// Site chrome, ads, banners and video widgets on top of the gentle set.
pub fn aggressive_clutter() -> Vec<Pattern> {
    CHROME_TAGS
        .iter()
        .chain(AGGRESSIVE_NEEDLES.iter())
        .chain(VIDEO_EMBEDS.iter())
        .copied()
        .collect()
}

/// Main-content candidates in priority order; the first that matches wins.
pub const MAIN_CANDIDATES: [Pattern; 5] = [
    Pattern::tag("main"),
    Pattern::role("main"),
    Pattern::class_contains("article"),
    Pattern::class_contains("story"),
    Pattern::class_contains("content"),
];

/// Anchors and images eligible for a hover during human emulation.
pub const HOVER_TARGETS: &str = "img, a";

pub const GENTLE_STYLE: &str = r#"
body {
    font-family: Georgia, serif;
    line-height: 1.6;
}
img, iframe, video {
    max-width: 100%;
    height: auto;
}
.caption, figcaption, [class*='caption'] {
    display: block;
    font-size: 0.9em;
    color: #555;
    text-align: center;
    margin-top: 0.3em;
}
"#;

/// Inline body styles applied once the page has been reduced to one element.
pub const ISOLATED_BODY_STYLE: [(&str, &str); 4] = [
    ("margin", "2em"),
    ("font-family", "Georgia, serif"),
    ("line-height", "1.6"),
    ("background", "white"),
];

/// Column width and media rules sized for the e-reader page.
pub const LAYOUT_FIX_STYLE: &str = r#"
* {
    box-sizing: border-box !important;
    max-width: 100% !important;
    word-wrap: break-word !important;
}
body {
    margin: 0 auto;
    padding: 2em;
    font-family: Georgia, serif;
    font-size: 16px;
    line-height: 1.6;
    background: white;
    max-width: 700px;
}
img, video, iframe {
    max-width: 100% !important;
    height: auto !important;
}
figure {
    margin-bottom: 1.5em;
}
figcaption, .caption, [class*="caption"], .MediaCaption__text {
    display: block;
    font-size: 0.9em;
    color: #555;
    margin-top: 0.3em;
    text-align: center;
}
"#;
