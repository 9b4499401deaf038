use crate::dom::Dom;
use crate::error::Result;
use crate::selectors::{
    aggressive_clutter, gentle_clutter, Pattern, GENTLE_STYLE, ISOLATED_BODY_STYLE,
    LAYOUT_FIX_STYLE, MAIN_CANDIDATES,
};
use crate::types::{CleanupMode, NormalizeReport};
use tracing::{debug, warn};

/// Turns a rendered page into a single print-safe reading column, in place.
#[derive(Debug, Clone)]
pub struct Normalizer {
    mode: CleanupMode,
    gentle: Vec<Pattern>,
    aggressive: Vec<Pattern>,
}

impl Normalizer {
    pub fn new(mode: CleanupMode) -> Self {
        Self {
            mode,
            gentle: gentle_clutter(),
            aggressive: aggressive_clutter(),
        }
    }

    pub fn mode(&self) -> CleanupMode {
        self.mode
    }

    pub async fn normalize<D: Dom + ?Sized>(&self, dom: &mut D) -> Result<NormalizeReport> {
        let report = match self.mode {
            CleanupMode::Gentle => self.gentle(dom).await?,
            CleanupMode::Aggressive => {
                let report = self.isolate(dom).await?;
                self.fix_layout(dom).await?;
                report
            }
        };
        debug!(
            "Normalized ({}): removed {}, hidden {}, isolated {:?}",
            self.mode, report.removed, report.hidden, report.isolated
        );
        Ok(report)
    }

    async fn gentle<D: Dom + ?Sized>(&self, dom: &mut D) -> Result<NormalizeReport> {
        dom.inject_style(GENTLE_STYLE).await?;
        let removed = dom.remove_matching(&self.gentle).await?;
        // release scroll locks left behind by removed modals
        dom.set_body_style(&[("overflow", "auto")]).await?;
        Ok(NormalizeReport {
            removed,
            ..Default::default()
        })
    }

    async fn isolate<D: Dom + ?Sized>(&self, dom: &mut D) -> Result<NormalizeReport> {
        let removed = dom.remove_matching(&self.aggressive).await?;
        let isolated = dom.isolate(&MAIN_CANDIDATES).await?;
        match isolated {
            Some(ref selector) => {
                debug!("Isolated main content via {}", selector);
                dom.set_body_style(&ISOLATED_BODY_STYLE).await?;
            }
            None => warn!("No main content found; keeping full page body"),
        }
        let hidden = dom.hide_floating().await?;
        Ok(NormalizeReport {
            removed,
            isolated,
            hidden,
        })
    }

    async fn fix_layout<D: Dom + ?Sized>(&self, dom: &mut D) -> Result<()> {
        dom.inject_style(LAYOUT_FIX_STYLE).await
    }
}
