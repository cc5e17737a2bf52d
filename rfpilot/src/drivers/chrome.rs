//! Chrome DevTools Protocol implementation of [`TerminalDriver`].
//!
//! The RF terminal renders inside a nested frame of a larger WMS page, so
//! frame-scoped operations go through JS evaluation against the frame's
//! content document. Field and value strings are injected as JSON string
//! literals to survive quoting.

use std::sync::Arc;

use async_trait::async_trait;
use headless_chrome::protocol::cdp::Page::CaptureScreenshotFormatOption;
use headless_chrome::{Browser, LaunchOptions, Tab};
use serde_json::Value;
use tracing::{debug, info};

use crate::drivers::TerminalDriver;
use crate::errors::AutomationError;

/// Launch/attach configuration for the Chrome driver.
#[derive(Debug, Clone)]
pub struct ChromeConfig {
    /// Top-level WMS URL hosting the RF terminal.
    pub url: String,
    /// CSS selector of the nested frame element hosting the terminal.
    pub frame_selector: String,
    pub headless: bool,
    pub window_width: u32,
    pub window_height: u32,
}

impl Default for ChromeConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            frame_selector: "iframe#rf-terminal".into(),
            headless: true,
            window_width: 1280,
            window_height: 1024,
        }
    }
}

/// One Chrome page driving the RF terminal.
pub struct ChromeTerminal {
    // Kept alive for the tab's lifetime.
    _browser: Browser,
    tab: Arc<Tab>,
    frame_selector: String,
}

impl ChromeTerminal {
    /// Launch a browser and open the WMS page.
    pub fn launch(config: ChromeConfig) -> Result<Self, AutomationError> {
        info!(
            url = %config.url,
            headless = config.headless,
            "launching chrome for RF terminal"
        );
        let options = LaunchOptions::default_builder()
            .headless(config.headless)
            .window_size(Some((config.window_width, config.window_height)))
            .build()
            .map_err(|e| AutomationError::PlatformError(format!("browser launch options: {e}")))?;
        let browser = Browser::new(options)
            .map_err(|e| AutomationError::PlatformError(format!("browser launch: {e}")))?;
        let tab = browser
            .new_tab()
            .map_err(|e| AutomationError::PlatformError(format!("new tab: {e}")))?;
        tab.navigate_to(&config.url)
            .map_err(|e| AutomationError::PlatformError(format!("navigate: {e}")))?;
        tab.wait_until_navigated()
            .map_err(|e| AutomationError::PlatformError(format!("initial navigation: {e}")))?;
        Ok(Self {
            _browser: browser,
            tab,
            frame_selector: config.frame_selector,
        })
    }

    fn eval(&self, script: &str) -> Result<Value, AutomationError> {
        let object = self
            .tab
            .evaluate(script, false)
            .map_err(|e| AutomationError::PlatformError(format!("js evaluation: {e}")))?;
        Ok(object.value.unwrap_or(Value::Null))
    }

    /// JS expression resolving the frame's content document, or null.
    fn frame_doc_expr(&self) -> String {
        let selector = js_string(&self.frame_selector);
        format!("(document.querySelector({selector}) || {{}}).contentDocument")
    }

    fn field_expr(&self, field: &str) -> String {
        let doc = self.frame_doc_expr();
        let name = js_string(&format!("[name={field:?}]"));
        format!("(({doc}) || document).querySelector({name})")
    }
}

fn js_string(raw: &str) -> String {
    // serde_json string encoding is valid JS literal syntax.
    serde_json::to_string(raw).unwrap_or_else(|_| "\"\"".into())
}

#[async_trait]
impl TerminalDriver for ChromeTerminal {
    async fn frame_text(&self) -> Result<String, AutomationError> {
        let doc = self.frame_doc_expr();
        let script = format!(
            "(() => {{ const d = {doc}; return d && d.body ? d.body.innerText : null; }})()"
        );
        match self.eval(&script)? {
            Value::String(text) => Ok(text),
            _ => Err(AutomationError::PlatformError(
                "rf frame detached or not found".into(),
            )),
        }
    }

    async fn page_url(&self) -> Result<String, AutomationError> {
        Ok(self.tab.get_url())
    }

    async fn page_body_text(&self) -> Result<String, AutomationError> {
        match self.eval("document.body ? document.body.innerText : ''")? {
            Value::String(text) => Ok(text),
            other => Ok(other.to_string()),
        }
    }

    async fn fill_field(&self, field: &str, value: &str) -> Result<(), AutomationError> {
        let el = self.field_expr(field);
        let value_lit = js_string(value);
        let script = format!(
            "(() => {{
                const el = {el};
                if (!el) return 'NOFIELD';
                el.focus();
                el.value = {value_lit};
                el.dispatchEvent(new Event('input', {{ bubbles: true }}));
                el.dispatchEvent(new Event('change', {{ bubbles: true }}));
                return 'OK';
            }})()"
        );
        match self.eval(&script)? {
            Value::String(s) if s == "OK" => {
                debug!(field, "field filled");
                Ok(())
            }
            _ => Err(AutomationError::ElementNotFound(format!(
                "input field '{field}' not present in rf frame"
            ))),
        }
    }

    async fn submit_field(&self, field: &str) -> Result<(), AutomationError> {
        let el = self.field_expr(field);
        let script = format!(
            "(() => {{
                const el = {el};
                if (!el) return 'NOFIELD';
                const opts = {{ key: 'Enter', code: 'Enter', keyCode: 13, bubbles: true }};
                el.dispatchEvent(new KeyboardEvent('keydown', opts));
                el.dispatchEvent(new KeyboardEvent('keypress', opts));
                el.dispatchEvent(new KeyboardEvent('keyup', opts));
                if (el.form) {{
                    if (el.form.requestSubmit) el.form.requestSubmit();
                    else el.form.submit();
                }}
                return 'OK';
            }})()"
        );
        match self.eval(&script)? {
            Value::String(s) if s == "OK" => Ok(()),
            _ => Err(AutomationError::ElementNotFound(format!(
                "input field '{field}' not present in rf frame"
            ))),
        }
    }

    async fn read_field(&self, field: &str) -> Result<String, AutomationError> {
        let el = self.field_expr(field);
        let script = format!("(() => {{ const el = {el}; return el ? el.value : null; }})()");
        match self.eval(&script)? {
            Value::String(value) => Ok(value),
            _ => Err(AutomationError::ElementNotFound(format!(
                "input field '{field}' not present in rf frame"
            ))),
        }
    }

    async fn send_key(&self, combo: &str) -> Result<(), AutomationError> {
        self.tab
            .press_key(combo)
            .map_err(|e| AutomationError::PlatformError(format!("send key '{combo}': {e}")))?;
        Ok(())
    }

    async fn click_text(&self, text: &str) -> Result<(), AutomationError> {
        let doc = self.frame_doc_expr();
        let needle = js_string(text);
        let script = format!(
            "(() => {{
                const d = {doc};
                if (!d) return 'NOFRAME';
                const nodes = d.querySelectorAll('a, button, [role=menuitem], li, td');
                for (const node of nodes) {{
                    if ((node.innerText || '').trim().includes({needle})) {{
                        node.click();
                        return 'OK';
                    }}
                }}
                return 'NOTFOUND';
            }})()"
        );
        match self.eval(&script)? {
            Value::String(s) if s == "OK" => Ok(()),
            Value::String(s) if s == "NOFRAME" => Err(AutomationError::PlatformError(
                "rf frame detached or not found".into(),
            )),
            _ => Err(AutomationError::ElementNotFound(format!(
                "no clickable element with text '{text}'"
            ))),
        }
    }

    async fn screenshot_png(&self) -> Result<Vec<u8>, AutomationError> {
        self.tab
            .capture_screenshot(CaptureScreenshotFormatOption::Png, None, None, true)
            .map_err(|e| AutomationError::PlatformError(format!("page screenshot: {e}")))
    }

    async fn frame_screenshot_png(&self) -> Result<Vec<u8>, AutomationError> {
        let element = self
            .tab
            .wait_for_element(&self.frame_selector)
            .map_err(|_| {
                AutomationError::ElementNotFound(format!(
                    "rf frame '{}' not present",
                    self.frame_selector
                ))
            })?;
        element
            .capture_screenshot(CaptureScreenshotFormatOption::Png)
            .map_err(|e| AutomationError::PlatformError(format!("frame screenshot: {e}")))
    }
}
