//! The document-query capability the extraction core runs against.
//!
//! Implementations wrap a live, rendered document: `vista-drivers` provides
//! one over a WebDriver session and the test suites use an in-memory tree.
//! A `parent` of `None` always means "the whole document".

use std::fmt;

use async_trait::async_trait;
use vista_common::Result;

use crate::geometry::Rect;
use crate::selector::Selector;

#[async_trait]
pub trait Document: Send + Sync + 'static {
    /// Reference to one element of the document.
    type Handle: Clone + PartialEq + fmt::Debug + Send + Sync + 'static;

    /// Resolve the first match below `parent`.
    ///
    /// Must fail with [`VistaError::NotFound`](vista_common::VistaError::NotFound)
    /// when nothing matches, so callers can tell a miss from a fault.
    async fn lookup_one(
        &self,
        parent: Option<&Self::Handle>,
        selector: Selector,
        value: &str,
    ) -> Result<Self::Handle>;

    /// Resolve every match below `parent`, in document order. No match is an
    /// empty vector, not an error.
    async fn lookup_all(
        &self,
        parent: Option<&Self::Handle>,
        selector: Selector,
        value: &str,
    ) -> Result<Vec<Self::Handle>>;

    /// Whether `handle` no longer refers to an element attached to the
    /// current document.
    async fn is_stale(&self, handle: &Self::Handle) -> Result<bool>;

    async fn tag_name(&self, handle: &Self::Handle) -> Result<String>;

    /// Value of a markup attribute.
    async fn attribute(&self, handle: &Self::Handle, name: &str) -> Result<Option<String>>;

    /// Value of a DOM property such as `textContent` or `outerHTML`.
    async fn property(&self, handle: &Self::Handle, name: &str) -> Result<Option<String>>;

    async fn is_enabled(&self, handle: &Self::Handle) -> Result<bool>;

    async fn is_displayed(&self, handle: &Self::Handle) -> Result<bool>;

    async fn is_selected(&self, handle: &Self::Handle) -> Result<bool>;

    async fn rect(&self, handle: &Self::Handle) -> Result<Rect>;

    async fn click(&self, handle: &Self::Handle) -> Result<()>;

    async fn clear(&self, handle: &Self::Handle) -> Result<()>;

    async fn send_keys(&self, handle: &Self::Handle, text: &str) -> Result<()>;

    /// PNG screenshot of one element, or of the viewport for `None`.
    async fn screenshot(&self, handle: Option<&Self::Handle>) -> Result<Vec<u8>>;
}
