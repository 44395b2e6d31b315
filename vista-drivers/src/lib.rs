//! Driver layer binding the extraction core to a live browser.
//!
//! - [`vista_browser::driver::Browser`]: WebDriver session, navigation and
//!   page-level helpers
//! - [`vista_browser::document::WebDriverDocument`]: the [`Document`]
//!   implementation extraction runs against
//! - [`vista_browser::cookies::Cookies`]: cookie jar of the session
//!
//! [`Document`]: vista_extract::Document
pub mod vista_browser;

pub use vista_browser::cookies::{BrowserCookie, Cookies};
pub use vista_browser::document::{WebDriverDocument, WebElement};
pub use vista_browser::driver::{capabilities, Browser, SessionTiming};
