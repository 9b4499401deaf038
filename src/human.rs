use crate::browser::BrowserSession;
use crate::error::Result;
use crate::pacing::{Pacer, Situation};
use crate::selectors::HOVER_TARGETS;
use tracing::{debug, warn};

const SCROLL_HEIGHT_SCRIPT: &str = "document.body ? document.body.scrollHeight : 0";

/// Scroll through the page in uneven steps, then rest the pointer on a random
/// link or image.
pub async fn act_human<B: BrowserSession + ?Sized>(session: &mut B, pacer: &Pacer) -> Result<()> {
    let height = session
        .execute_script(SCROLL_HEIGHT_SCRIPT)
        .await?
        .as_u64()
        .unwrap_or(0);

    let mut pos = 0u64;
    let mut steps = 0usize;
    while pos < height {
        session
            .execute_script(&format!("window.scrollTo(0, {});", pos))
            .await?;
        pacer.pause(Situation::ScrollPause).await;
        pos += u64::from(pacer.scroll_step());
        steps += 1;
    }
    debug!("Scrolled {}px in {} steps", height, steps);

    let targets = session.find_elements(HOVER_TARGETS).await?;
    if !targets.is_empty() {
        let target = &targets[pacer.pick(targets.len())];
        if let Err(e) = session.hover(target).await {
            warn!("Hover failed (ignored): {}", e);
        }
    }
    Ok(())
}
