use async_trait::async_trait;
use fantoccini::elements::Element;
use fantoccini::error::{CmdError, ErrorStatus};
use fantoccini::{Client, Locator};
use std::fmt;
use tracing::trace;
use vista_common::{Result, VistaError};
use vista_extract::{Document, Query, Rect, Selector, Strategy};

/// Element reference of a WebDriver session.
///
/// Two handles are equal when the endpoint issued the same element id.
#[derive(Clone)]
pub struct WebElement {
    element: Element,
    id: String,
}

impl WebElement {
    pub fn new(element: Element) -> Self {
        let id = element.element_id().to_string();
        Self { element, id }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn element(&self) -> &Element {
        &self.element
    }
}

impl PartialEq for WebElement {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl fmt::Debug for WebElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("WebElement").field(&self.id).finish()
    }
}

/// [`Document`] over the current page of a `fantoccini` session.
#[derive(Clone)]
pub struct WebDriverDocument {
    client: Client,
}

impl WebDriverDocument {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &Client {
        &self.client
    }
}

impl fmt::Debug for WebDriverDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WebDriverDocument").finish_non_exhaustive()
    }
}

fn locator(query: &Query) -> Locator<'_> {
    match query.strategy {
        Strategy::Css => Locator::Css(&query.expression),
        Strategy::LinkText => Locator::LinkText(&query.expression),
        Strategy::XPath => Locator::XPath(&query.expression),
    }
}

/// Sort a command error into a miss, a stale handle or a driver fault.
pub(crate) fn classify(err: CmdError, selector: Selector, value: &str) -> VistaError {
    match err {
        CmdError::Standard(ref wd) if matches!(wd.error, ErrorStatus::NoSuchElement) => {
            VistaError::not_found(selector.as_str(), value)
        }
        err => command_error(err),
    }
}

/// Errors of commands that are not lookups: only staleness is special.
pub(crate) fn command_error(err: CmdError) -> VistaError {
    match err {
        CmdError::Standard(ref wd) if matches!(wd.error, ErrorStatus::StaleElementReference) => {
            VistaError::StaleElement
        }
        err => VistaError::Driver(anyhow::Error::new(err)),
    }
}

#[async_trait]
impl Document for WebDriverDocument {
    type Handle = WebElement;

    async fn lookup_one(
        &self,
        parent: Option<&WebElement>,
        selector: Selector,
        value: &str,
    ) -> Result<WebElement> {
        let query = selector.query(value);
        trace!(
            target: "vista.node",
            strategy = query.strategy.as_str(),
            expression = %query.expression,
            "find"
        );
        let found = match parent {
            Some(parent) => parent.element.find(locator(&query)).await,
            None => self.client.find(locator(&query)).await,
        };
        found
            .map(WebElement::new)
            .map_err(|e| classify(e, selector, value))
    }

    async fn lookup_all(
        &self,
        parent: Option<&WebElement>,
        selector: Selector,
        value: &str,
    ) -> Result<Vec<WebElement>> {
        let query = selector.query(value);
        trace!(
            target: "vista.node",
            strategy = query.strategy.as_str(),
            expression = %query.expression,
            "find all"
        );
        let found = match parent {
            Some(parent) => parent.element.find_all(locator(&query)).await,
            None => self.client.find_all(locator(&query)).await,
        };
        match found {
            Ok(elements) => Ok(elements.into_iter().map(WebElement::new).collect()),
            Err(e) => match classify(e, selector, value) {
                VistaError::NotFound { .. } => Ok(Vec::new()),
                other => Err(other),
            },
        }
    }

    async fn is_stale(&self, handle: &WebElement) -> Result<bool> {
        match handle.element.is_enabled().await {
            Ok(_) => Ok(false),
            Err(e) => match command_error(e) {
                VistaError::StaleElement => Ok(true),
                other => Err(other),
            },
        }
    }

    async fn tag_name(&self, handle: &WebElement) -> Result<String> {
        handle.element.tag_name().await.map_err(command_error)
    }

    async fn attribute(&self, handle: &WebElement, name: &str) -> Result<Option<String>> {
        handle.element.attr(name).await.map_err(command_error)
    }

    async fn property(&self, handle: &WebElement, name: &str) -> Result<Option<String>> {
        handle.element.prop(name).await.map_err(command_error)
    }

    async fn is_enabled(&self, handle: &WebElement) -> Result<bool> {
        handle.element.is_enabled().await.map_err(command_error)
    }

    async fn is_displayed(&self, handle: &WebElement) -> Result<bool> {
        handle.element.is_displayed().await.map_err(command_error)
    }

    async fn is_selected(&self, handle: &WebElement) -> Result<bool> {
        handle.element.is_selected().await.map_err(command_error)
    }

    async fn rect(&self, handle: &WebElement) -> Result<Rect> {
        let (x, y, width, height) = handle.element.rectangle().await.map_err(command_error)?;
        Ok(Rect::new(x, y, width, height))
    }

    async fn click(&self, handle: &WebElement) -> Result<()> {
        handle.element.click().await.map_err(command_error)
    }

    async fn clear(&self, handle: &WebElement) -> Result<()> {
        handle.element.clear().await.map_err(command_error)
    }

    async fn send_keys(&self, handle: &WebElement, text: &str) -> Result<()> {
        handle.element.send_keys(text).await.map_err(command_error)
    }

    async fn screenshot(&self, handle: Option<&WebElement>) -> Result<Vec<u8>> {
        match handle {
            Some(handle) => handle.element.screenshot().await.map_err(command_error),
            None => self.client.screenshot().await.map_err(command_error),
        }
    }
}
