//! Browser session seam and its Chrome DevTools implementation.

use crate::config::Config;
use crate::error::{Result, ScribeError};
use crate::types::PdfOptions;
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::page::PrintToPdfParams;
use chromiumoxide::element::Element;
use chromiumoxide::Page;
use futures::StreamExt;
use serde_json::Value;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, error, info, warn};

const NAVIGATION_TIMEOUT: Duration = Duration::from_secs(60);

/// Everything the pipeline needs from a remote-controlled browser.
#[async_trait]
pub trait BrowserSession: Send {
    type Element: Send + Sync;

    /// Load `url` and wait for the navigation to complete.
    async fn navigate(&mut self, url: &str) -> Result<()>;

    /// Evaluate `script` in the page and return its JSON result (`null` for undefined).
    async fn execute_script(&mut self, script: &str) -> Result<Value>;

    async fn find_elements(&mut self, selector: &str) -> Result<Vec<Self::Element>>;

    async fn hover(&mut self, element: &Self::Element) -> Result<()>;

    async fn print_to_pdf(&mut self, options: &PdfOptions) -> Result<Vec<u8>>;

    async fn title(&mut self) -> Result<Option<String>> {
        let value = self.execute_script("document.title").await?;
        Ok(value
            .as_str()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string))
    }

    async fn close(&mut self) -> Result<()>;
}

/// Close `session` whatever the run returned, then hand the result back.
pub async fn release<B: BrowserSession + ?Sized, T>(session: &mut B, outcome: Result<T>) -> Result<T> {
    if let Err(e) = session.close().await {
        error!("Failed to close browser cleanly: {}", e);
    }
    outcome
}

/// chromiumoxide's stock switches minus the ones that block extensions or
/// break a signed-in profile (`--disable-extensions`, `--enable-automation`,
/// `--disable-sync`, `--password-store=basic`, `--use-mock-keychain`).
const BASE_ARGS: [&str; 18] = [
    "--disable-background-networking",
    "--enable-features=NetworkService,NetworkServiceInProcess",
    "--disable-background-timer-throttling",
    "--disable-backgrounding-occluded-windows",
    "--disable-breakpad",
    "--disable-client-side-phishing-detection",
    "--disable-component-extensions-with-background-pages",
    "--disable-default-apps",
    "--disable-dev-shm-usage",
    "--disable-features=TranslateUI",
    "--disable-hang-monitor",
    "--disable-ipc-flooding-protection",
    "--disable-popup-blocking",
    "--disable-prompt-on-repost",
    "--disable-renderer-backgrounding",
    "--force-color-profile=srgb",
    "--metrics-recording-only",
    "--no-first-run",
];

/// Command-line switches for the browser process.
pub fn launch_args(profile_name: &str, extension: Option<&Path>) -> Vec<String> {
    let mut args: Vec<String> = BASE_ARGS.iter().map(|a| a.to_string()).collect();
    args.extend([
        format!("--profile-directory={}", profile_name),
        "--disable-blink-features=AutomationControlled".to_string(),
        "--start-maximized".to_string(),
        "--log-level=3".to_string(),
        "--disable-logging".to_string(),
        "--disable-gpu".to_string(),
    ]);
    if let Some(ext) = extension {
        args.push(format!("--load-extension={}", ext.display()));
    }
    args
}

/// A single Chrome tab driven over CDP, with a persistent user profile.
pub struct ChromeSession {
    browser: Browser,
    page: Page,
    handler_task: tokio::task::JoinHandle<()>,
}

impl ChromeSession {
    pub async fn launch(config: &Config) -> Result<Self> {
        let extension = config.extension_path.as_deref().filter(|ext| {
            let found = ext.exists();
            if !found {
                warn!("Extension path {} does not exist; ignoring", ext.display());
            }
            found
        });
        if let Some(ext) = extension {
            info!("Loading browser extension from {}", ext.display());
        }

        let mut builder = BrowserConfig::builder()
            .disable_default_args()
            .user_data_dir(&config.user_data_dir)
            .request_timeout(NAVIGATION_TIMEOUT)
            .args(launch_args(&config.profile_name, extension));

        if !config.headless {
            builder = builder.with_head();
        }

        if let Some(ref exe) = config.chrome_executable {
            builder = builder.chrome_executable(exe);
        }

        let browser_config = builder.build().map_err(ScribeError::Launch)?;

        info!(
            "Launching browser (profile {} in {})",
            config.profile_name,
            config.user_data_dir.display()
        );
        let (browser, mut handler) = Browser::launch(browser_config)
            .await
            .map_err(|e| ScribeError::Launch(e.to_string()))?;

        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!("Browser handler error: {}", e);
                }
            }
        });

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| ScribeError::Launch(format!("failed to open tab: {}", e)))?;

        Ok(Self {
            browser,
            page,
            handler_task,
        })
    }
}

#[async_trait]
impl BrowserSession for ChromeSession {
    type Element = Element;

    async fn navigate(&mut self, url: &str) -> Result<()> {
        let nav_err = |e: chromiumoxide::error::CdpError| ScribeError::Navigation {
            url: url.to_string(),
            reason: e.to_string(),
        };
        self.page.goto(url).await.map_err(nav_err)?;
        self.page.wait_for_navigation().await.map_err(nav_err)?;
        Ok(())
    }

    async fn execute_script(&mut self, script: &str) -> Result<Value> {
        let result = self
            .page
            .evaluate(script)
            .await
            .map_err(|e| ScribeError::Script(e.to_string()))?;
        Ok(result.value().cloned().unwrap_or(Value::Null))
    }

    async fn find_elements(&mut self, selector: &str) -> Result<Vec<Element>> {
        self.page
            .find_elements(selector)
            .await
            .map_err(|e| ScribeError::Script(format!("find_elements({}): {}", selector, e)))
    }

    async fn hover(&mut self, element: &Element) -> Result<()> {
        element
            .hover()
            .await
            .map_err(|e| ScribeError::Script(format!("hover failed: {}", e)))?;
        Ok(())
    }

    async fn print_to_pdf(&mut self, options: &PdfOptions) -> Result<Vec<u8>> {
        let params = PrintToPdfParams::builder()
            .paper_width(options.paper_width)
            .paper_height(options.paper_height)
            .margin_top(options.margin_top)
            .margin_bottom(options.margin_bottom)
            .margin_left(options.margin_left)
            .margin_right(options.margin_right)
            .print_background(options.print_background)
            .scale(options.scale)
            .build();

        self.page
            .pdf(params)
            .await
            .map_err(|e| ScribeError::Print(e.to_string()))
    }

    async fn close(&mut self) -> Result<()> {
        info!("Closing browser session");
        if let Err(e) = self.browser.close().await {
            warn!("Failed to close browser cleanly: {}", e);
        }
        if let Err(e) = self.browser.wait().await {
            debug!("Browser process wait failed: {}", e);
        }
        self.handler_task.abort();
        Ok(())
    }
}
