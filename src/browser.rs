use std::time::Duration;

use anyhow::Context;
use log::{debug, info, warn};
use serde::Deserialize;
use thirtyfour::ChromiumLikeCapabilities;
use thirtyfour::prelude::*;

// The Branded Web widget renders well after DOMContentLoaded; give its
// scripts a generous settle window before reading the DOM back out.
const WIDGET_RENDER_WAIT: Duration = Duration::from_secs(15);

/// One JSON/text response body recorded by the injected network hook.
#[derive(Debug, Clone, Deserialize)]
pub struct CapturedResponse {
    pub url: String,
    pub body: String,
}

/// Everything harvested from one rendered schedule page.
#[derive(Debug, Default)]
pub struct RenderedPage {
    pub main_html: String,
    pub frame_htmls: Vec<String>,
    pub captured: Vec<CapturedResponse>,
}

// Wraps fetch and XMLHttpRequest so widget traffic lands in a window
// global we can read back after the render wait.
const NETWORK_HOOK_SCRIPT: &str = r#"
if (!window.__capturedResponses) {
    window.__capturedResponses = [];
    var record = function (url, body) {
        try {
            window.__capturedResponses.push({ url: String(url), body: String(body) });
        } catch (e) {}
    };
    var origFetch = window.fetch;
    if (origFetch) {
        window.fetch = function () {
            return origFetch.apply(this, arguments).then(function (resp) {
                try {
                    resp.clone().text().then(function (text) { record(resp.url, text); });
                } catch (e) {}
                return resp;
            });
        };
    }
    var origOpen = XMLHttpRequest.prototype.open;
    XMLHttpRequest.prototype.open = function (method, url) {
        this.addEventListener('load', function () { record(url, this.responseText); });
        return origOpen.apply(this, arguments);
    };
}
"#;

const COLLECT_CAPTURED_SCRIPT: &str = "return window.__capturedResponses || [];";

/// One browser session per run, torn down at the end.
pub struct BrowserSession {
    driver: WebDriver,
}

impl BrowserSession {
    pub async fn connect(webdriver_url: &str, headless: bool) -> anyhow::Result<Self> {
        let mut caps = DesiredCapabilities::chrome();
        if headless {
            caps.add_arg("--headless=new")?;
        }
        caps.add_arg("--no-sandbox")?;
        caps.add_arg("--disable-dev-shm-usage")?;
        caps.add_arg("--disable-gpu")?;
        caps.add_arg("--window-size=1280,900")?;
        caps.add_arg("--disable-blink-features=AutomationControlled")?;

        let driver = WebDriver::new(webdriver_url, caps)
            .await
            .context("failed to connect to chromedriver")?;
        Ok(Self { driver })
    }

    /// Loads a schedule page and waits for the widget to render. Navigation
    /// failure is fatal for the run; the next scheduled invocation retries.
    pub async fn load_schedule_page(&self, url: &str) -> anyhow::Result<RenderedPage> {
        info!("Loading: {url}");
        self.driver
            .goto(url)
            .await
            .with_context(|| format!("failed to navigate to {url}"))?;

        // Hook network traffic before the widget starts fetching sessions.
        if let Err(e) = self.driver.execute(NETWORK_HOOK_SCRIPT, vec![]).await {
            warn!("  Could not install network hook: {e}");
        }

        self.driver
            .query(By::Tag("body"))
            .first()
            .await
            .context("page never produced a body element")?;
        tokio::time::sleep(WIDGET_RENDER_WAIT).await;

        let mut page = RenderedPage {
            main_html: self.driver.source().await?,
            ..Default::default()
        };

        page.captured = match self.driver.execute(COLLECT_CAPTURED_SCRIPT, vec![]).await {
            Ok(ret) => ret.convert().unwrap_or_default(),
            Err(e) => {
                debug!("  Network capture readback failed: {e}");
                vec![]
            }
        };

        // The widget usually lives in an iframe; collect every frame's HTML.
        let frame_count = self.driver.find_all(By::Tag("iframe")).await?.len();
        for i in 0..frame_count {
            // Re-query each round: handles go stale across frame switches.
            let frames = self.driver.find_all(By::Tag("iframe")).await?;
            let Some(frame) = frames.into_iter().nth(i) else {
                break;
            };
            match frame.enter_frame().await {
                Ok(()) => {
                    if let Ok(html) = self.driver.source().await {
                        page.frame_htmls.push(html);
                    }
                    self.driver.enter_default_frame().await?;
                }
                Err(e) => debug!("  Frame {i} error: {e}"),
            }
        }

        Ok(page)
    }

    pub async fn quit(self) -> anyhow::Result<()> {
        self.driver
            .quit()
            .await
            .context("failed to quit browser session")?;
        Ok(())
    }
}
