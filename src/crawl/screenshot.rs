//! Two-viewport screenshot capture
//!
//! Screenshots are captured through a backend trait so the pipeline (and its
//! tests) can run without a browser. The real backend drives a headless
//! Chromium via chromiumoxide; a page is opened per capture, sized to the
//! requested viewport, and closed again. A capture failure never fails the
//! page crawl — HTML is the primary evidence.

use async_trait::async_trait;
use chromiumoxide::cdp::browser_protocol::emulation::SetDeviceMetricsOverrideParams;
use chromiumoxide::cdp::browser_protocol::page::CaptureScreenshotFormat;
use chromiumoxide::page::ScreenshotParams;
use chromiumoxide::{Browser, BrowserConfig};
use futures::StreamExt;
use std::path::Path;
use thiserror::Error;

/// A capture viewport
#[derive(Debug, Clone, Copy)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
    /// Emulate a mobile device (touch, mobile layout hints)
    pub mobile: bool,
}

/// Screenshot capture failures
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("screenshot capture is disabled")]
    Disabled,

    #[error("failed to launch browser: {0}")]
    Launch(String),

    #[error("browser error: {0}")]
    Browser(String),
}

/// Backend capable of producing page screenshots
#[async_trait]
pub trait ScreenshotCapturer: Send + Sync {
    /// Whether this backend can produce screenshots at all
    fn enabled(&self) -> bool {
        true
    }

    /// Captures `url` at `viewport` into the PNG file at `output`
    async fn capture(
        &self,
        url: &str,
        viewport: Viewport,
        output: &Path,
    ) -> Result<(), CaptureError>;
}

/// Backend used when no browser is available; pages then carry no
/// screenshot references and the visual evaluator works from HTML alone
pub struct DisabledCapturer;

#[async_trait]
impl ScreenshotCapturer for DisabledCapturer {
    fn enabled(&self) -> bool {
        false
    }

    async fn capture(
        &self,
        _url: &str,
        _viewport: Viewport,
        _output: &Path,
    ) -> Result<(), CaptureError> {
        Err(CaptureError::Disabled)
    }
}

/// Headless-Chromium capture backend
pub struct BrowserCapturer {
    browser: Browser,
    _handler: tokio::task::JoinHandle<()>,
}

impl BrowserCapturer {
    /// Launches a headless browser for the lifetime of this capturer
    pub async fn launch() -> Result<Self, CaptureError> {
        let config = BrowserConfig::builder()
            .new_headless_mode()
            .args(vec![
                "--disable-gpu",
                "--no-sandbox",
                "--disable-dev-shm-usage",
                "--hide-scrollbars",
            ])
            .build()
            .map_err(CaptureError::Launch)?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| CaptureError::Launch(e.to_string()))?;

        // Drive browser events until the browser goes away
        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        tracing::debug!("Headless browser launched for screenshot capture");

        Ok(Self {
            browser,
            _handler: handler_task,
        })
    }
}

#[async_trait]
impl ScreenshotCapturer for BrowserCapturer {
    async fn capture(
        &self,
        url: &str,
        viewport: Viewport,
        output: &Path,
    ) -> Result<(), CaptureError> {
        let page = self
            .browser
            .new_page("about:blank")
            .await
            .map_err(|e| CaptureError::Browser(e.to_string()))?;

        let metrics = SetDeviceMetricsOverrideParams::builder()
            .width(viewport.width as i64)
            .height(viewport.height as i64)
            .device_scale_factor(1.0)
            .mobile(viewport.mobile)
            .build()
            .map_err(CaptureError::Browser)?;

        let result = async {
            page.execute(metrics)
                .await
                .map_err(|e| CaptureError::Browser(e.to_string()))?;

            page.goto(url)
                .await
                .map_err(|e| CaptureError::Browser(e.to_string()))?;

            page.wait_for_navigation()
                .await
                .map_err(|e| CaptureError::Browser(e.to_string()))?;

            page.save_screenshot(
                ScreenshotParams::builder()
                    .format(CaptureScreenshotFormat::Png)
                    .full_page(false)
                    .build(),
                output,
            )
            .await
            .map_err(|e| CaptureError::Browser(e.to_string()))?;

            Ok(())
        }
        .await;

        // Close the page regardless of the capture outcome
        let _ = page.close().await;

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_disabled_capturer() {
        let capturer = DisabledCapturer;
        assert!(!capturer.enabled());

        let viewport = Viewport {
            width: 1440,
            height: 900,
            mobile: false,
        };
        let result = capturer
            .capture("https://example.com", viewport, Path::new("/tmp/out.png"))
            .await;
        assert!(matches!(result, Err(CaptureError::Disabled)));
    }
}
