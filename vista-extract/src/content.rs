//! Declarative description of what to pull out of a page.
//!
//! A [`Page`] is a list of named slots. Each slot is a [`Field`] (one
//! element), a [`Group`] (every element matching a scope) or a [`View`] (one
//! element with its own nested slots). Declarations hold no document state
//! and can be reused across any number of extractions.
//!
//! ```
//! use vista_extract::{Container, Field, Group, Page, Selector, Slots, View};
//!
//! let page = Page::new(
//!     Slots::builder()
//!         .field("title", Field::new(Selector::Id, "title").text())
//!         .group("items", Group::new(Field::new(Selector::Css, ".item")))
//!         .view(
//!             "panel",
//!             View::new(
//!                 Selector::Id,
//!                 "panel",
//!                 Slots::builder()
//!                     .field("label", Field::new(Selector::Id, "label"))
//!                     .build()?,
//!             ),
//!         )
//!         .build()?,
//! );
//! assert_eq!(page.slots().names().collect::<Vec<_>>(), ["title", "items", "panel"]);
//! # Ok::<(), vista_common::VistaError>(())
//! ```

use std::collections::HashSet;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;
use vista_common::{Result, VistaError};

use crate::document::Document;
use crate::node::Node;
use crate::selector::Selector;
use crate::value::{Record, Value};

/// Where a piece of content lives relative to its parent node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scope {
    pub selector: Selector,
    pub value: String,
    /// How long a lookup may wait for the content to appear.
    pub timeout: Duration,
}

impl Scope {
    pub fn new(selector: Selector, value: impl Into<String>) -> Self {
        Self {
            selector,
            value: value.into(),
            timeout: Duration::ZERO,
        }
    }
}

/// How a matched element becomes a value.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Parse {
    /// The element itself.
    #[default]
    Node,
    /// Trimmed text content.
    Text,
    /// Outer HTML.
    Html,
    Attribute(String),
    Property(String),
}

/// Anything that can produce a value from a node.
///
/// `None` stands for a parent that was not found.
#[async_trait]
pub trait Content: Send + Sync {
    async fn find<D: Document>(&self, node: Option<&Node<D>>) -> Result<Value<D>>;
}

/// Content located through a [`Scope`], with its own rule for turning each
/// matched element into a value.
#[async_trait]
pub trait Scoped: Content {
    fn scope(&self) -> &Scope;

    async fn parse<D: Document>(&self, node: Node<D>) -> Result<Value<D>>;
}

/// Something that declares named slots.
pub trait Container {
    fn slots(&self) -> &Slots;
}

/// A single element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    scope: Scope,
    parse: Parse,
}

impl Field {
    pub fn new(selector: Selector, value: impl Into<String>) -> Self {
        Self {
            scope: Scope::new(selector, value),
            parse: Parse::Node,
        }
    }

    /// Wait up to `timeout` for the element to appear.
    pub fn within(mut self, timeout: Duration) -> Self {
        self.scope.timeout = timeout;
        self
    }

    pub fn parse_as(mut self, parse: Parse) -> Self {
        self.parse = parse;
        self
    }

    pub fn text(self) -> Self {
        self.parse_as(Parse::Text)
    }

    pub fn html(self) -> Self {
        self.parse_as(Parse::Html)
    }

    pub fn attribute(self, name: impl Into<String>) -> Self {
        self.parse_as(Parse::Attribute(name.into()))
    }

    pub fn property(self, name: impl Into<String>) -> Self {
        self.parse_as(Parse::Property(name.into()))
    }
}

#[async_trait]
impl Content for Field {
    async fn find<D: Document>(&self, node: Option<&Node<D>>) -> Result<Value<D>> {
        let Some(node) = node else {
            return Ok(Value::Null);
        };
        debug!(
            target: "vista.content",
            kind = "field",
            selector = %self.scope.selector,
            value = %self.scope.value,
            "evaluating"
        );
        match node
            .find_one(self.scope.selector, &self.scope.value, self.scope.timeout)
            .await?
        {
            Some(found) => self.parse(found).await,
            None => Ok(Value::Null),
        }
    }
}

#[async_trait]
impl Scoped for Field {
    fn scope(&self) -> &Scope {
        &self.scope
    }

    async fn parse<D: Document>(&self, node: Node<D>) -> Result<Value<D>> {
        let value = match &self.parse {
            Parse::Node => Value::Node(node),
            Parse::Text => Value::Text(node.text().await?),
            Parse::Html => Value::Text(node.html().await?),
            Parse::Attribute(name) => node.attribute(name).await?.into(),
            Parse::Property(name) => node.property(name).await?.into(),
        };
        Ok(value)
    }
}

/// One element with its own nested slots.
///
/// When the element itself is missing the whole view is `Null` and none of
/// its slots are evaluated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct View {
    scope: Scope,
    slots: Slots,
}

impl View {
    pub fn new(selector: Selector, value: impl Into<String>, slots: Slots) -> Self {
        Self {
            scope: Scope::new(selector, value),
            slots,
        }
    }

    /// Wait up to `timeout` for the element to appear.
    pub fn within(mut self, timeout: Duration) -> Self {
        self.scope.timeout = timeout;
        self
    }
}

impl Container for View {
    fn slots(&self) -> &Slots {
        &self.slots
    }
}

#[async_trait]
impl Content for View {
    async fn find<D: Document>(&self, node: Option<&Node<D>>) -> Result<Value<D>> {
        let Some(node) = node else {
            return Ok(Value::Null);
        };
        debug!(
            target: "vista.content",
            kind = "view",
            selector = %self.scope.selector,
            value = %self.scope.value,
            "evaluating"
        );
        match node
            .find_one(self.scope.selector, &self.scope.value, self.scope.timeout)
            .await?
        {
            Some(found) => self.parse(found).await,
            None => {
                debug!(
                    target: "vista.content",
                    selector = %self.scope.selector,
                    value = %self.scope.value,
                    skipped = self.slots.len(),
                    "view absent"
                );
                Ok(Value::Null)
            }
        }
    }
}

#[async_trait]
impl Scoped for View {
    fn scope(&self) -> &Scope {
        &self.scope
    }

    async fn parse<D: Document>(&self, node: Node<D>) -> Result<Value<D>> {
        Ok(Value::Record(self.slots.evaluate(&node).await?))
    }
}

/// What a [`Group`] repeats.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Item {
    Field(Field),
    View(View),
}

impl From<Field> for Item {
    fn from(field: Field) -> Self {
        Item::Field(field)
    }
}

impl From<View> for Item {
    fn from(view: View) -> Self {
        Item::View(view)
    }
}

#[async_trait]
impl Content for Item {
    async fn find<D: Document>(&self, node: Option<&Node<D>>) -> Result<Value<D>> {
        match self {
            Item::Field(field) => field.find(node).await,
            Item::View(view) => view.find(node).await,
        }
    }
}

#[async_trait]
impl Scoped for Item {
    fn scope(&self) -> &Scope {
        match self {
            Item::Field(field) => field.scope(),
            Item::View(view) => view.scope(),
        }
    }

    async fn parse<D: Document>(&self, node: Node<D>) -> Result<Value<D>> {
        match self {
            Item::Field(field) => field.parse(node).await,
            Item::View(view) => view.parse(node).await,
        }
    }
}

/// Every element matching the item's scope, each parsed by the item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    item: Box<Item>,
}

impl Group {
    pub fn new(item: impl Into<Item>) -> Self {
        Self {
            item: Box::new(item.into()),
        }
    }

    pub fn item(&self) -> &Item {
        &self.item
    }
}

#[async_trait]
impl Content for Group {
    async fn find<D: Document>(&self, node: Option<&Node<D>>) -> Result<Value<D>> {
        let Some(node) = node else {
            return Ok(Value::List(Vec::new()));
        };
        let scope = self.item.scope();
        debug!(
            target: "vista.content",
            kind = "group",
            selector = %scope.selector,
            value = %scope.value,
            "evaluating"
        );
        let matches = node
            .find_all(scope.selector, &scope.value, scope.timeout)
            .await?;
        let mut items = Vec::with_capacity(matches.len());
        for found in matches {
            items.push(self.item.parse(found).await?);
        }
        Ok(Value::List(items))
    }
}

/// A named slot inside a [`Page`] or [`View`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Slot {
    Field(Field),
    Group(Group),
    View(View),
}

impl Slot {
    pub fn kind(&self) -> &'static str {
        match self {
            Slot::Field(_) => "field",
            Slot::Group(_) => "group",
            Slot::View(_) => "view",
        }
    }
}

impl From<Field> for Slot {
    fn from(field: Field) -> Self {
        Slot::Field(field)
    }
}

impl From<Group> for Slot {
    fn from(group: Group) -> Self {
        Slot::Group(group)
    }
}

impl From<View> for Slot {
    fn from(view: View) -> Self {
        Slot::View(view)
    }
}

#[async_trait]
impl Content for Slot {
    async fn find<D: Document>(&self, node: Option<&Node<D>>) -> Result<Value<D>> {
        match self {
            Slot::Field(field) => field.find(node).await,
            Slot::Group(group) => group.find(node).await,
            Slot::View(view) => view.find(node).await,
        }
    }
}

/// Ordered, uniquely named slots of one container.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Slots {
    entries: Vec<(String, Slot)>,
}

impl Slots {
    pub fn builder() -> SlotsBuilder {
        SlotsBuilder::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    pub fn get(&self, name: &str) -> Option<&Slot> {
        self.entries
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, slot)| slot)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Slot)> {
        self.entries.iter().map(|(name, slot)| (name.as_str(), slot))
    }

    /// Evaluate every slot against `node` and collect the results by name.
    ///
    /// Slots are independent of each other; a missing element only affects
    /// its own entry. Driver faults abort the whole evaluation.
    pub async fn evaluate<D: Document>(&self, node: &Node<D>) -> Result<Record<D>> {
        let mut record = Record::new();
        for (name, slot) in &self.entries {
            debug!(target: "vista.content", slot = %name, kind = slot.kind(), "slot");
            let value = slot.find(Some(node)).await?;
            record.insert(name.clone(), value);
        }
        Ok(record)
    }
}

/// Collects slots and rejects duplicate names on [`SlotsBuilder::build`].
#[derive(Debug, Default)]
pub struct SlotsBuilder {
    entries: Vec<(String, Slot)>,
}

impl SlotsBuilder {
    pub fn slot(mut self, name: impl Into<String>, slot: impl Into<Slot>) -> Self {
        self.entries.push((name.into(), slot.into()));
        self
    }

    pub fn field(self, name: impl Into<String>, field: Field) -> Self {
        self.slot(name, field)
    }

    pub fn group(self, name: impl Into<String>, group: Group) -> Self {
        self.slot(name, group)
    }

    pub fn view(self, name: impl Into<String>, view: View) -> Self {
        self.slot(name, view)
    }

    pub fn build(self) -> Result<Slots> {
        let mut seen = HashSet::new();
        for (name, _) in &self.entries {
            if !seen.insert(name.as_str()) {
                return Err(VistaError::DuplicateSlot(name.clone()));
            }
        }
        Ok(Slots {
            entries: self.entries,
        })
    }
}

/// Root container, evaluated directly against the node it is given
/// (normally the whole document).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Page {
    slots: Slots,
}

impl Page {
    pub fn new(slots: Slots) -> Self {
        Self { slots }
    }

    /// Extract every slot. Missing content shows up as `Null` or an empty
    /// list; only driver faults are errors.
    pub async fn get<D: Document>(&self, node: &Node<D>) -> Result<Record<D>> {
        debug!(target: "vista.content", slots = self.slots.len(), "extracting page");
        self.slots.evaluate(node).await
    }
}

impl Container for Page {
    fn slots(&self) -> &Slots {
        &self.slots
    }
}

#[async_trait]
impl Content for Page {
    async fn find<D: Document>(&self, node: Option<&Node<D>>) -> Result<Value<D>> {
        match node {
            Some(node) => Ok(Value::Record(self.get(node).await?)),
            None => Ok(Value::Null),
        }
    }
}
