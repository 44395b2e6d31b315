#![allow(dead_code)]

//! In-memory document used by the integration tests.
//!
//! Elements live in an arena and are addressed by index. Each one can be
//! scheduled to appear or disappear at a given (paused) tokio instant so the
//! polling paths can be exercised deterministically. Every lookup is
//! recorded.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;
use vista_common::{Result, VistaError};
use vista_extract::{Document, Node, Rect, Selector};

#[derive(Debug, Clone, Default)]
pub struct El {
    tag: String,
    attrs: Vec<(String, String)>,
    text: String,
}

impl El {
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_string(),
            ..Self::default()
        }
    }

    pub fn id(self, id: &str) -> Self {
        self.attr("id", id)
    }

    pub fn class(self, class: &str) -> Self {
        self.attr("class", class)
    }

    pub fn name(self, name: &str) -> Self {
        self.attr("name", name)
    }

    pub fn attr(mut self, key: &str, value: &str) -> Self {
        self.attrs.push((key.to_string(), value.to_string()));
        self
    }

    pub fn text(mut self, text: &str) -> Self {
        self.text = text.to_string();
        self
    }
}

#[derive(Debug)]
struct Entry {
    el: El,
    parent: Option<usize>,
    children: Vec<usize>,
    appears_at: Option<Instant>,
    removed_at: Option<Instant>,
}

impl Entry {
    fn attr(&self, key: &str) -> Option<&str> {
        self.el
            .attrs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    fn has_class(&self, class: &str) -> bool {
        self.attr("class")
            .map_or(false, |c| c.split_whitespace().any(|c| c == class))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lookup {
    pub selector: Selector,
    pub value: String,
}

#[derive(Debug, Default)]
struct State {
    entries: Vec<Entry>,
    lookups: Vec<Lookup>,
    fault: Option<String>,
    clicks: Vec<usize>,
    typed: Vec<(usize, String)>,
}

/// Arena-backed document. Index 0 is the `<html>` element.
#[derive(Debug)]
pub struct FakeDocument {
    state: Mutex<State>,
}

impl FakeDocument {
    pub fn new() -> Self {
        let html = Entry {
            el: El::new("html"),
            parent: None,
            children: Vec::new(),
            appears_at: None,
            removed_at: None,
        };
        Self {
            state: Mutex::new(State {
                entries: vec![html],
                ..State::default()
            }),
        }
    }

    pub const HTML: usize = 0;

    pub fn add(&self, parent: usize, el: El) -> usize {
        let mut state = self.state.lock().unwrap();
        let id = state.entries.len();
        state.entries.push(Entry {
            el,
            parent: Some(parent),
            children: Vec::new(),
            appears_at: None,
            removed_at: None,
        });
        state.entries[parent].children.push(id);
        id
    }

    /// Attach `el` only once `delay` has passed.
    pub fn add_later(&self, parent: usize, el: El, delay: Duration) -> usize {
        let id = self.add(parent, el);
        self.state.lock().unwrap().entries[id].appears_at = Some(Instant::now() + delay);
        id
    }

    /// Detach `id` (and its subtree) once `delay` has passed.
    pub fn remove_after(&self, id: usize, delay: Duration) {
        self.state.lock().unwrap().entries[id].removed_at = Some(Instant::now() + delay);
    }

    /// Make every subsequent call fail as if the session had died.
    pub fn break_session(&self, message: &str) {
        self.state.lock().unwrap().fault = Some(message.to_string());
    }

    pub fn lookups(&self) -> Vec<Lookup> {
        self.state.lock().unwrap().lookups.clone()
    }

    pub fn lookup_count(&self) -> usize {
        self.state.lock().unwrap().lookups.len()
    }

    pub fn looked_up(&self, value: &str) -> bool {
        self.lookups().iter().any(|l| l.value == value)
    }

    pub fn clicks(&self) -> Vec<usize> {
        self.state.lock().unwrap().clicks.clone()
    }

    pub fn typed(&self) -> Vec<(usize, String)> {
        self.state.lock().unwrap().typed.clone()
    }

    pub fn root(self: &Arc<Self>) -> Node<FakeDocument> {
        Node::root(Arc::clone(self))
    }

    fn check(&self, state: &State) -> Result<()> {
        match &state.fault {
            Some(message) => Err(VistaError::Driver(anyhow::anyhow!(message.clone()))),
            None => Ok(()),
        }
    }
}

impl State {
    fn attached(&self, id: usize, now: Instant) -> bool {
        let mut cursor = Some(id);
        while let Some(i) = cursor {
            let entry = &self.entries[i];
            if entry.appears_at.map_or(false, |t| now < t) {
                return false;
            }
            if entry.removed_at.map_or(false, |t| now >= t) {
                return false;
            }
            cursor = entry.parent;
        }
        true
    }

    fn descendants(&self, id: usize, out: &mut Vec<usize>) {
        for &child in &self.entries[id].children {
            out.push(child);
            self.descendants(child, out);
        }
    }

    fn text_of(&self, id: usize) -> String {
        let mut text = self.entries[id].el.text.clone();
        for &child in &self.entries[id].children {
            text.push_str(&self.text_of(child));
        }
        text
    }

    fn matches(&self, id: usize, selector: Selector, value: &str) -> bool {
        let entry = &self.entries[id];
        match selector {
            Selector::Id => entry.attr("id") == Some(value),
            Selector::Class => entry.has_class(value),
            Selector::Name => entry.attr("name") == Some(value),
            Selector::Tag => entry.el.tag == value,
            Selector::Css => match value.chars().next() {
                Some('#') => entry.attr("id") == Some(&value[1..]),
                Some('.') => entry.has_class(&value[1..]),
                _ => entry.el.tag == value,
            },
            Selector::LinkText => entry.el.tag == "a" && self.text_of(id).trim() == value,
            Selector::PartialLinkText => {
                entry.el.tag == "a" && self.text_of(id).contains(value)
            }
            Selector::XPath => false,
        }
    }

    fn resolve(
        &self,
        parent: Option<usize>,
        selector: Selector,
        value: &str,
        now: Instant,
    ) -> Result<Vec<usize>> {
        if let Some(p) = parent {
            if !self.attached(p, now) {
                return Err(VistaError::StaleElement);
            }
        }
        let candidates = match (selector, value) {
            (Selector::XPath, "./*") => match parent {
                Some(p) => self.entries[p].children.clone(),
                None => vec![FakeDocument::HTML],
            },
            (Selector::XPath, "..") => parent
                .and_then(|p| self.entries[p].parent)
                .into_iter()
                .collect(),
            (Selector::XPath, other) => {
                return Err(VistaError::Driver(anyhow::anyhow!(
                    "unsupported xpath {other}"
                )))
            }
            _ => {
                let mut all = Vec::new();
                match parent {
                    Some(p) => self.descendants(p, &mut all),
                    None => {
                        all.push(FakeDocument::HTML);
                        self.descendants(FakeDocument::HTML, &mut all);
                    }
                }
                all.into_iter()
                    .filter(|&i| self.matches(i, selector, value))
                    .collect()
            }
        };
        Ok(candidates
            .into_iter()
            .filter(|&i| self.attached(i, now))
            .collect())
    }
}

#[async_trait]
impl Document for FakeDocument {
    type Handle = usize;

    async fn lookup_one(
        &self,
        parent: Option<&usize>,
        selector: Selector,
        value: &str,
    ) -> Result<usize> {
        let mut state = self.state.lock().unwrap();
        self.check(&state)?;
        state.lookups.push(Lookup {
            selector,
            value: value.to_string(),
        });
        let found = state.resolve(parent.copied(), selector, value, Instant::now())?;
        found
            .first()
            .copied()
            .ok_or_else(|| VistaError::not_found(selector.as_str(), value))
    }

    async fn lookup_all(
        &self,
        parent: Option<&usize>,
        selector: Selector,
        value: &str,
    ) -> Result<Vec<usize>> {
        let mut state = self.state.lock().unwrap();
        self.check(&state)?;
        state.lookups.push(Lookup {
            selector,
            value: value.to_string(),
        });
        state.resolve(parent.copied(), selector, value, Instant::now())
    }

    async fn is_stale(&self, handle: &usize) -> Result<bool> {
        let state = self.state.lock().unwrap();
        self.check(&state)?;
        Ok(!state.attached(*handle, Instant::now()))
    }

    async fn tag_name(&self, handle: &usize) -> Result<String> {
        let state = self.state.lock().unwrap();
        self.check(&state)?;
        Ok(state.entries[*handle].el.tag.clone())
    }

    async fn attribute(&self, handle: &usize, name: &str) -> Result<Option<String>> {
        let state = self.state.lock().unwrap();
        self.check(&state)?;
        Ok(state.entries[*handle].attr(name).map(str::to_string))
    }

    async fn property(&self, handle: &usize, name: &str) -> Result<Option<String>> {
        let state = self.state.lock().unwrap();
        self.check(&state)?;
        let entry = &state.entries[*handle];
        Ok(match name {
            "textContent" => Some(state.text_of(*handle)),
            "outerHTML" => Some(format!(
                "<{tag}>{text}</{tag}>",
                tag = entry.el.tag,
                text = state.text_of(*handle)
            )),
            "tagName" => Some(entry.el.tag.to_uppercase()),
            _ => None,
        })
    }

    async fn is_enabled(&self, handle: &usize) -> Result<bool> {
        let state = self.state.lock().unwrap();
        self.check(&state)?;
        Ok(state.entries[*handle].attr("disabled").is_none())
    }

    async fn is_displayed(&self, handle: &usize) -> Result<bool> {
        let state = self.state.lock().unwrap();
        self.check(&state)?;
        Ok(state.entries[*handle].attr("hidden").is_none())
    }

    async fn is_selected(&self, handle: &usize) -> Result<bool> {
        let state = self.state.lock().unwrap();
        self.check(&state)?;
        Ok(state.entries[*handle].attr("checked").is_some())
    }

    async fn rect(&self, handle: &usize) -> Result<Rect> {
        let state = self.state.lock().unwrap();
        self.check(&state)?;
        let n = *handle as f64;
        Ok(Rect::new(10.0 * n, 20.0 * n, 100.0, 16.0))
    }

    async fn click(&self, handle: &usize) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        self.check(&state)?;
        state.clicks.push(*handle);
        Ok(())
    }

    async fn clear(&self, handle: &usize) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        self.check(&state)?;
        state.typed.retain(|(h, _)| h != handle);
        Ok(())
    }

    async fn send_keys(&self, handle: &usize, text: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        self.check(&state)?;
        state.typed.push((*handle, text.to_string()));
        Ok(())
    }

    async fn screenshot(&self, handle: Option<&usize>) -> Result<Vec<u8>> {
        let state = self.state.lock().unwrap();
        self.check(&state)?;
        let mut png = b"\x89PNG".to_vec();
        png.push(handle.map_or(0xff, |h| *h as u8));
        Ok(png)
    }
}

/// `<body>` with the given children, returned as (document, body index).
pub fn document() -> (Arc<FakeDocument>, usize) {
    let doc = Arc::new(FakeDocument::new());
    let body = doc.add(FakeDocument::HTML, El::new("body"));
    (doc, body)
}
