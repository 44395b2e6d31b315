use crate::vista_browser::cookies::Cookies;
use crate::vista_browser::document::{command_error, WebDriverDocument};
use anyhow::Context;
use fantoccini::{Client, ClientBuilder};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};
use url::Url;
use vista_common::Result;
use vista_config::{BrowserKind, VistaConfig, WaitSettings, WebDriverSettings};
use vista_extract::{Node, Page, Position, Record, Selector};
use webdriver::capabilities::Capabilities;

/// Capabilities requesting the configured browser with its extra arguments.
///
/// ```
/// use vista_config::WebDriverSettings;
/// use vista_drivers::capabilities;
///
/// let settings = WebDriverSettings {
///     headless: true,
///     ..WebDriverSettings::default()
/// };
/// let caps = capabilities(&settings);
/// assert_eq!(caps["browserName"], "chrome");
/// assert!(caps["goog:chromeOptions"]["args"]
///     .as_array()
///     .unwrap()
///     .contains(&"--headless".into()));
/// ```
pub fn capabilities(settings: &WebDriverSettings) -> Capabilities {
    let mut args: Vec<Value> = settings.args.iter().map(|a| json!(a)).collect();
    let mut caps = Capabilities::new();
    match settings.browser {
        BrowserKind::Chrome => {
            if settings.headless {
                args.push(json!("--headless"));
                args.push(json!("--disable-gpu"));
            }
            caps.insert("browserName".to_string(), json!("chrome"));
            caps.insert("goog:chromeOptions".to_string(), json!({ "args": args }));
        }
        BrowserKind::Firefox => {
            if settings.headless {
                args.push(json!("-headless"));
            }
            caps.insert("browserName".to_string(), json!("firefox"));
            caps.insert("moz:firefoxOptions".to_string(), json!({ "args": args }));
        }
    }
    caps
}

/// Waiting behaviour of a [`Browser`]: the poll interval of the nodes it
/// hands out and the default bound of [`Browser::click_and_wait`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionTiming {
    pub poll_interval: Duration,
    pub detach_timeout: Duration,
}

impl SessionTiming {
    fn detach_bound(&self, timeout: Option<Duration>) -> Duration {
        timeout.unwrap_or(self.detach_timeout)
    }
}

impl Default for SessionTiming {
    fn default() -> Self {
        Self::from(&WaitSettings::default())
    }
}

impl From<&WaitSettings> for SessionTiming {
    fn from(wait: &WaitSettings) -> Self {
        Self {
            poll_interval: wait.poll_interval(),
            detach_timeout: wait.detach_timeout(),
        }
    }
}

/// A WebDriver session and the document it currently shows.
///
/// Every [`Node`] handed out by [`Browser::root`] queries whatever page the
/// session is on when the query runs.
pub struct Browser {
    client: Client,
    document: Arc<WebDriverDocument>,
    timing: SessionTiming,
}

impl Browser {
    /// Open a session on the endpoint named in `settings`.
    pub async fn connect(settings: &WebDriverSettings) -> Result<Self> {
        Url::parse(&settings.url)
            .with_context(|| format!("invalid webdriver url `{}`", settings.url))?;
        info!(
            target: "vista.browser",
            url = %settings.url,
            browser = ?settings.browser,
            headless = settings.headless,
            "connecting"
        );
        let client = ClientBuilder::native()
            .capabilities(capabilities(settings))
            .connect(&settings.url)
            .await
            .with_context(|| format!("failed to start a session on {}", settings.url))?;
        Ok(Self::from_client(client))
    }

    /// Open a session from the `webdriver` section and apply the `wait`
    /// section to it.
    pub async fn from_config(config: &VistaConfig) -> Result<Self> {
        let browser = Self::connect(&config.webdriver).await?;
        Ok(browser.with_timing(SessionTiming::from(&config.wait)))
    }

    /// Wrap an already established session.
    pub fn from_client(client: Client) -> Self {
        Self {
            document: Arc::new(WebDriverDocument::new(client.clone())),
            client,
            timing: SessionTiming::default(),
        }
    }

    pub fn with_timing(mut self, timing: SessionTiming) -> Self {
        self.timing = timing;
        self
    }

    /// Poll interval given to nodes created by [`Browser::root`].
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.timing.poll_interval = poll_interval;
        self
    }

    pub fn timing(&self) -> SessionTiming {
        self.timing
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    pub fn document(&self) -> &Arc<WebDriverDocument> {
        &self.document
    }

    /// The whole current document.
    pub fn root(&self) -> Node<WebDriverDocument> {
        Node::root(Arc::clone(&self.document)).with_poll_interval(self.timing.poll_interval)
    }

    /// Run `page` against the current document.
    pub async fn extract(&self, page: &Page) -> Result<Record<WebDriverDocument>> {
        page.get(&self.root()).await
    }

    pub async fn goto(&self, url: &str) -> Result<()> {
        info!(target: "vista.browser", %url, "navigating");
        self.client.goto(url).await.map_err(command_error)
    }

    pub async fn current_url(&self) -> Result<Url> {
        self.client.current_url().await.map_err(command_error)
    }

    pub async fn title(&self) -> Result<String> {
        self.client.title().await.map_err(command_error)
    }

    /// Serialized HTML of the current document.
    pub async fn source(&self) -> Result<String> {
        self.client.source().await.map_err(command_error)
    }

    pub async fn back(&self) -> Result<()> {
        self.client.back().await.map_err(command_error)
    }

    pub async fn forward(&self) -> Result<()> {
        self.client.forward().await.map_err(command_error)
    }

    pub async fn refresh(&self) -> Result<()> {
        self.client.refresh().await.map_err(command_error)
    }

    /// Run synchronous JavaScript in the page; `args` are available as
    /// `arguments[i]`.
    pub async fn execute(&self, script: &str, args: Vec<Value>) -> Result<Value> {
        debug!(target: "vista.browser", script_len = script.len(), "execute");
        self.client.execute(script, args).await.map_err(command_error)
    }

    pub async fn scroll_to(&self, position: Position) -> Result<()> {
        self.execute(
            "window.scrollTo(arguments[0], arguments[1]);",
            vec![json!(position.x), json!(position.y)],
        )
        .await
        .map(drop)
    }

    pub async fn scroll_top(&self) -> Result<()> {
        self.scroll_to(Position::default()).await
    }

    pub async fn scroll_bottom(&self) -> Result<()> {
        self.execute(
            "window.scrollTo(0, document.documentElement.scrollHeight);",
            Vec::new(),
        )
        .await
        .map(drop)
    }

    /// PNG of the viewport.
    pub async fn screenshot(&self) -> Result<Vec<u8>> {
        self.root().screenshot().await
    }

    pub fn cookies(&self) -> Cookies<'_> {
        Cookies::new(&self.client)
    }

    /// Click `node` and wait until the page it belonged to has been
    /// replaced.
    ///
    /// The current `<html>` element is captured before the click; the wait
    /// ends once it is detached or `timeout` expires. `None` uses the
    /// session's detach timeout.
    pub async fn click_and_wait(
        &self,
        node: &Node<WebDriverDocument>,
        timeout: impl Into<Option<Duration>>,
    ) -> Result<()> {
        let timeout = self.timing.detach_bound(timeout.into());
        let html = self
            .root()
            .find_one(Selector::Tag, "html", Duration::ZERO)
            .await?;
        node.click().await?;
        match html {
            Some(html) => html.wait_for_detachment(timeout).await,
            None => Ok(()),
        }
    }

    /// Close the underlying browser session.
    pub async fn close(self) -> Result<()> {
        info!(target: "vista.browser", "closing session");
        self.client.close().await.map_err(command_error)
    }
}
