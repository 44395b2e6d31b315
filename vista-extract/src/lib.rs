//! Declarative content extraction over a live, rendered document.
//!
//! Callers describe the shape of the data they want as a [`Page`] of named
//! slots, then run it against a [`Node`] bound to a [`Document`]. The result
//! is a [`Record`] mirroring the declaration. Missing content becomes
//! [`Value::Null`] or an empty list; only faults of the underlying driver
//! are returned as errors.
//!
//! - [`selector`]: lookup kinds and their WebDriver translation
//! - [`wait`]: bounded polling
//! - [`document`]: the query capability a driver provides
//! - [`node`]: lookups, detachment waits and element accessors
//! - [`content`]: `Field`, `Group`, `View`, `Page` and slot aggregation
//! - [`value`]: extraction results

pub mod content;
pub mod document;
pub mod geometry;
pub mod node;
pub mod selector;
pub mod value;
pub mod wait;

pub use content::{
    Container, Content, Field, Group, Item, Page, Parse, Scope, Scoped, Slot, Slots,
    SlotsBuilder, View,
};
pub use document::Document;
pub use geometry::{Position, Rect, Size};
pub use node::{Node, TagTree};
pub use selector::{Query, Selector, Strategy};
pub use value::{Record, Value};
pub use wait::{Wait, DEFAULT_POLL_INTERVAL};
