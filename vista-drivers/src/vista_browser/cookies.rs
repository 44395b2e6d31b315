use crate::vista_browser::document::command_error;
use fantoccini::cookies::Cookie;
use fantoccini::error::{CmdError, ErrorStatus};
use fantoccini::Client;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tracing::debug;
use vista_common::Result;

/// A cookie as the session reports it, detached from the driver types.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BrowserCookie {
    pub name: String,
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default)]
    pub secure: bool,
    #[serde(default)]
    pub http_only: bool,
    /// Expiry as seconds since the Unix epoch; `None` for session cookies.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry: Option<i64>,
}

impl BrowserCookie {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            ..Self::default()
        }
    }
}

impl From<&Cookie<'_>> for BrowserCookie {
    fn from(cookie: &Cookie<'_>) -> Self {
        Self {
            name: cookie.name().to_string(),
            value: cookie.value().to_string(),
            domain: cookie.domain().map(str::to_string),
            path: cookie.path().map(str::to_string),
            secure: cookie.secure().unwrap_or(false),
            http_only: cookie.http_only().unwrap_or(false),
            expiry: cookie
                .expires_datetime()
                .map(OffsetDateTime::unix_timestamp),
        }
    }
}

impl From<BrowserCookie> for Cookie<'static> {
    fn from(cookie: BrowserCookie) -> Self {
        let mut out = Cookie::new(cookie.name, cookie.value);
        if let Some(domain) = cookie.domain {
            out.set_domain(domain);
        }
        if let Some(path) = cookie.path {
            out.set_path(path);
        }
        out.set_secure(cookie.secure);
        out.set_http_only(cookie.http_only);
        if let Some(at) = cookie
            .expiry
            .and_then(|secs| OffsetDateTime::from_unix_timestamp(secs).ok())
        {
            out.set_expires(at);
        }
        out
    }
}

/// Cookie jar of the page the session is on.
pub struct Cookies<'a> {
    client: &'a Client,
}

impl<'a> Cookies<'a> {
    pub(crate) fn new(client: &'a Client) -> Self {
        Self { client }
    }

    pub async fn all(&self) -> Result<Vec<BrowserCookie>> {
        let cookies = self.client.get_all_cookies().await.map_err(command_error)?;
        Ok(cookies.iter().map(BrowserCookie::from).collect())
    }

    /// `None` when no cookie of that name is visible to the current page.
    pub async fn get(&self, name: &str) -> Result<Option<BrowserCookie>> {
        match self.client.get_named_cookie(name).await {
            Ok(cookie) => Ok(Some(BrowserCookie::from(&cookie))),
            Err(e) if is_missing_cookie(&e) => Ok(None),
            Err(e) => Err(command_error(e)),
        }
    }

    pub async fn add(&self, cookie: BrowserCookie) -> Result<()> {
        debug!(target: "vista.browser", name = %cookie.name, "add cookie");
        self.client
            .add_cookie(cookie.into())
            .await
            .map_err(command_error)
    }

    pub async fn remove(&self, name: &str) -> Result<()> {
        debug!(target: "vista.browser", %name, "remove cookie");
        self.client.delete_cookie(name).await.map_err(command_error)
    }

    pub async fn clear(&self) -> Result<()> {
        debug!(target: "vista.browser", "clear cookies");
        self.client.delete_all_cookies().await.map_err(command_error)
    }
}

fn is_missing_cookie(err: &CmdError) -> bool {
    matches!(err, CmdError::Standard(wd) if matches!(wd.error, ErrorStatus::NoSuchCookie))
}
