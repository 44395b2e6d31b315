//! Handles into the live document.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use futures::future::{BoxFuture, FutureExt};
use serde::Serialize;
use tracing::debug;
use vista_common::{Result, VistaError};

use crate::document::Document;
use crate::geometry::{Position, Size};
use crate::selector::Selector;
use crate::wait::{Wait, DEFAULT_POLL_INTERVAL};

/// A view onto either the whole document or one element inside it.
///
/// Nodes are cheap to clone: the document is shared and the element handle
/// is a reference the driver owns. A handle can go stale when the page
/// navigates or the element is removed; [`Node::wait_for_detachment`] is the
/// way to synchronise with that.
pub struct Node<D: Document> {
    document: Arc<D>,
    handle: Option<D::Handle>,
    poll_interval: Duration,
}

/// Structural snapshot of an element and its descendants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagTree {
    pub tag: String,
    pub children: Vec<TagTree>,
}

impl<D: Document> Node<D> {
    /// Node for the whole document.
    pub fn root(document: Arc<D>) -> Self {
        Self {
            document,
            handle: None,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    /// Node for one element of `document`.
    pub fn element(document: Arc<D>, handle: D::Handle) -> Self {
        Self {
            document,
            handle: Some(handle),
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    /// Interval between lookup attempts when a timeout is given. Nodes found
    /// from this one inherit it.
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn document(&self) -> &Arc<D> {
        &self.document
    }

    /// The wrapped element, `None` for the document root.
    pub fn handle(&self) -> Option<&D::Handle> {
        self.handle.as_ref()
    }

    pub fn is_root(&self) -> bool {
        self.handle.is_none()
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    fn wrap(&self, handle: D::Handle) -> Self {
        Self {
            document: Arc::clone(&self.document),
            handle: Some(handle),
            poll_interval: self.poll_interval,
        }
    }

    fn wait(&self, timeout: Duration) -> Wait {
        Wait::new(timeout).with_poll_interval(self.poll_interval)
    }

    fn require_element(&self, op: &'static str) -> Result<&D::Handle> {
        self.handle.as_ref().ok_or(VistaError::RootNode(op))
    }

    /// First descendant matching `selector`/`value`.
    ///
    /// A zero `timeout` makes exactly one attempt. Otherwise the lookup is
    /// retried until it succeeds or the timeout elapses. A miss is `None`;
    /// only driver faults are errors.
    pub async fn find_one(
        &self,
        selector: Selector,
        value: &str,
        timeout: Duration,
    ) -> Result<Option<Node<D>>> {
        let condition = format!("{selector} {value:?}");
        let document = &self.document;
        let parent = self.handle.as_ref();
        let found = self
            .wait(timeout)
            .until(&condition, move || async move {
                match document.lookup_one(parent, selector, value).await {
                    Ok(handle) => Ok(Some(handle)),
                    Err(VistaError::NotFound { .. }) => Ok(None),
                    Err(err) => Err(err),
                }
            })
            .await;
        match found {
            Ok(handle) => Ok(Some(self.wrap(handle))),
            Err(VistaError::Timeout { .. }) => {
                debug!(target: "vista.node", %selector, value, "no match");
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }

    /// Every descendant matching `selector`/`value`, in document order.
    ///
    /// With a timeout, waits for at least one match. A miss is an empty
    /// vector.
    pub async fn find_all(
        &self,
        selector: Selector,
        value: &str,
        timeout: Duration,
    ) -> Result<Vec<Node<D>>> {
        let condition = format!("{selector} {value:?}");
        let document = &self.document;
        let parent = self.handle.as_ref();
        let found = self
            .wait(timeout)
            .until(&condition, move || async move {
                match document.lookup_all(parent, selector, value).await {
                    Ok(handles) if !handles.is_empty() => Ok(Some(handles)),
                    Ok(_) | Err(VistaError::NotFound { .. }) => Ok(None),
                    Err(err) => Err(err),
                }
            })
            .await;
        match found {
            Ok(handles) => Ok(handles.into_iter().map(|h| self.wrap(h)).collect()),
            Err(VistaError::Timeout { .. }) => Ok(Vec::new()),
            Err(err) => Err(err),
        }
    }

    /// Block until the wrapped element leaves the document.
    ///
    /// Best-effort synchronisation with navigation triggered by an earlier
    /// action: it only observes that the old element went stale, not that the
    /// next page finished loading.
    pub async fn wait_for_detachment(&self, timeout: Duration) -> Result<()> {
        let handle = self.require_element("wait_for_detachment")?;
        let document = &self.document;
        self.wait(timeout)
            .until("element detachment", move || async move {
                match document.is_stale(handle).await {
                    Ok(true) | Err(VistaError::StaleElement) => Ok(Some(())),
                    Ok(false) => Ok(None),
                    Err(err) => Err(err),
                }
            })
            .await
    }

    /// Direct child elements.
    pub async fn children(&self) -> Result<Vec<Node<D>>> {
        self.find_all(Selector::XPath, "./*", Duration::ZERO).await
    }

    /// Tag names of the children, each with their own children, down to the
    /// leaves.
    pub fn tag_tree(&self) -> BoxFuture<'_, Result<Vec<TagTree>>> {
        async move {
            let mut tree = Vec::new();
            for child in self.children().await? {
                let tag = child.tag().await?;
                let children = child.tag_tree().await?;
                tree.push(TagTree { tag, children });
            }
            Ok(tree)
        }
        .boxed()
    }

    /// Enclosing element, `None` for `<html>`.
    pub async fn parent(&self) -> Result<Option<Node<D>>> {
        let handle = self.require_element("parent")?;
        // `..` from the root element selects the document, which drivers
        // reject as a non-element result.
        if self.document.tag_name(handle).await?.eq_ignore_ascii_case("html") {
            return Ok(None);
        }
        self.find_one(Selector::XPath, "..", Duration::ZERO).await
    }

    pub async fn tag(&self) -> Result<String> {
        let handle = self.require_element("tag")?;
        self.document.tag_name(handle).await
    }

    /// Text content with surrounding whitespace removed.
    pub async fn text(&self) -> Result<String> {
        let handle = self.require_element("text")?;
        let text = self.document.property(handle, "textContent").await?;
        Ok(text.map(|t| t.trim().to_string()).unwrap_or_default())
    }

    /// Outer HTML of the element.
    pub async fn html(&self) -> Result<String> {
        let handle = self.require_element("html")?;
        Ok(self
            .document
            .property(handle, "outerHTML")
            .await?
            .unwrap_or_default())
    }

    pub async fn attribute(&self, name: &str) -> Result<Option<String>> {
        let handle = self.require_element("attribute")?;
        self.document.attribute(handle, name).await
    }

    pub async fn property(&self, name: &str) -> Result<Option<String>> {
        let handle = self.require_element("property")?;
        self.document.property(handle, name).await
    }

    pub async fn is_enabled(&self) -> Result<bool> {
        let handle = self.require_element("is_enabled")?;
        self.document.is_enabled(handle).await
    }

    pub async fn is_displayed(&self) -> Result<bool> {
        let handle = self.require_element("is_displayed")?;
        self.document.is_displayed(handle).await
    }

    pub async fn is_selected(&self) -> Result<bool> {
        let handle = self.require_element("is_selected")?;
        self.document.is_selected(handle).await
    }

    pub async fn size(&self) -> Result<Size> {
        let handle = self.require_element("size")?;
        Ok(self.document.rect(handle).await?.size)
    }

    pub async fn position(&self) -> Result<Position> {
        let handle = self.require_element("position")?;
        Ok(self.document.rect(handle).await?.position)
    }

    pub async fn click(&self) -> Result<()> {
        let handle = self.require_element("click")?;
        self.document.click(handle).await
    }

    pub async fn clear(&self) -> Result<()> {
        let handle = self.require_element("clear")?;
        self.document.clear(handle).await
    }

    pub async fn send_keys(&self, text: &str) -> Result<()> {
        let handle = self.require_element("send_keys")?;
        self.document.send_keys(handle, text).await
    }

    /// PNG bytes of the element, or of the viewport for the root node.
    pub async fn screenshot(&self) -> Result<Vec<u8>> {
        self.document.screenshot(self.handle.as_ref()).await
    }
}

impl<D: Document> Clone for Node<D> {
    fn clone(&self) -> Self {
        Self {
            document: Arc::clone(&self.document),
            handle: self.handle.clone(),
            poll_interval: self.poll_interval,
        }
    }
}

impl<D: Document> PartialEq for Node<D> {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.document, &other.document) && self.handle == other.handle
    }
}

impl<D: Document> fmt::Debug for Node<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.handle {
            Some(handle) => f.debug_tuple("Node").field(handle).finish(),
            None => f.write_str("Node(<document>)"),
        }
    }
}
