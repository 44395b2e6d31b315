//! Page declarations as data.
//!
//! A [`PageSpec`] mirrors the builder API of `vista-extract` so extraction
//! schemas can live in YAML next to the rest of the configuration:
//!
//! ```yaml
//! name: listing
//! slots:
//!   - { name: title, kind: field, selector: id, value: title, parse: text }
//!   - name: items
//!     kind: group
//!     item: { kind: field, selector: css, value: ".item" }
//! ```

use std::time::Duration;

use serde::Deserialize;
use vista_common::{Result, VistaError};
use vista_extract::{Field, Group, Item, Page, Parse, Selector, Slot, Slots, View};

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PageSpec {
    pub name: String,
    #[serde(default)]
    pub slots: Vec<SlotSpec>,
}

/// One named entry of a page or view.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SlotSpec {
    pub name: String,
    #[serde(flatten)]
    pub content: ContentSpec,
}

/// The tag is `kind`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ContentSpec {
    Field(FieldSpec),
    Group { item: Box<ContentSpec> },
    View(ViewSpec),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FieldSpec {
    pub selector: Selector,
    pub value: String,
    #[serde(default)]
    pub parse: Parse,
    /// Overrides the page-wide lookup timeout.
    #[serde(default)]
    pub timeout_ms: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ViewSpec {
    pub selector: Selector,
    pub value: String,
    #[serde(default)]
    pub timeout_ms: Option<u64>,
    #[serde(default)]
    pub slots: Vec<SlotSpec>,
}

impl PageSpec {
    /// Parse a standalone page declaration.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).map_err(|e| VistaError::Config(e.to_string()))
    }

    /// Build the page with single-attempt lookups wherever no timeout is
    /// declared.
    ///
    /// ```
    /// use vista_config::PageSpec;
    /// use vista_extract::Container;
    ///
    /// let spec = PageSpec::from_yaml(
    ///     r#"
    /// name: article
    /// slots:
    ///   - { name: headline, kind: field, selector: tag, value: h1, parse: text }
    ///   - name: links
    ///     kind: group
    ///     item: { kind: field, selector: css, value: "a[href]", parse: { attribute: href } }
    /// "#,
    /// )?;
    /// let page = spec.build()?;
    /// assert_eq!(page.slots().names().collect::<Vec<_>>(), ["headline", "links"]);
    /// # Ok::<(), vista_common::VistaError>(())
    /// ```
    pub fn build(&self) -> Result<Page> {
        self.build_with(Duration::ZERO)
    }

    /// Build the page, using `default_timeout` for every scope that does not
    /// set `timeout_ms` itself.
    pub fn build_with(&self, default_timeout: Duration) -> Result<Page> {
        build_slots(&self.slots, default_timeout)
            .map(Page::new)
            .map_err(|e| match e {
                VistaError::Config(msg) => {
                    VistaError::Config(format!("page `{}`: {msg}", self.name))
                }
                other => other,
            })
    }
}

fn build_slots(specs: &[SlotSpec], default_timeout: Duration) -> Result<Slots> {
    let mut builder = Slots::builder();
    for spec in specs {
        let slot = build_slot(&spec.name, &spec.content, default_timeout)?;
        builder = builder.slot(spec.name.clone(), slot);
    }
    builder.build()
}

fn build_slot(name: &str, content: &ContentSpec, default_timeout: Duration) -> Result<Slot> {
    Ok(match content {
        ContentSpec::Field(field) => field.build(default_timeout).into(),
        ContentSpec::View(view) => view.build(default_timeout)?.into(),
        ContentSpec::Group { item } => Group::new(build_item(name, item, default_timeout)?).into(),
    })
}

fn build_item(name: &str, content: &ContentSpec, default_timeout: Duration) -> Result<Item> {
    match content {
        ContentSpec::Field(field) => Ok(field.build(default_timeout).into()),
        ContentSpec::View(view) => Ok(view.build(default_timeout)?.into()),
        ContentSpec::Group { .. } => Err(VistaError::Config(format!(
            "group `{name}` repeats another group; items must be fields or views"
        ))),
    }
}

fn timeout_or(timeout_ms: Option<u64>, default_timeout: Duration) -> Duration {
    timeout_ms.map_or(default_timeout, Duration::from_millis)
}

impl FieldSpec {
    fn build(&self, default_timeout: Duration) -> Field {
        Field::new(self.selector, self.value.clone())
            .parse_as(self.parse.clone())
            .within(timeout_or(self.timeout_ms, default_timeout))
    }
}

impl ViewSpec {
    fn build(&self, default_timeout: Duration) -> Result<View> {
        let slots = build_slots(&self.slots, default_timeout)?;
        Ok(View::new(self.selector, self.value.clone(), slots)
            .within(timeout_or(self.timeout_ms, default_timeout)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vista_extract::{Container, Scoped};

    const LISTING: &str = r#"
name: listing
slots:
  - { name: title, kind: field, selector: id, value: title, parse: text }
  - name: items
    kind: group
    item: { kind: field, selector: css, value: ".item" }
  - name: panel
    kind: view
    selector: id
    value: panel
    timeout_ms: 1500
    slots:
      - { name: label, kind: field, selector: link, value: More }
"#;

    #[test]
    fn listing_schema_builds_in_declaration_order() {
        let spec = PageSpec::from_yaml(LISTING).unwrap();
        assert_eq!(spec.name, "listing");
        let page = spec.build_with(Duration::from_millis(200)).unwrap();
        let slots = page.slots();
        assert_eq!(slots.names().collect::<Vec<_>>(), ["title", "items", "panel"]);

        let Some(Slot::Field(title)) = slots.get("title") else {
            panic!("title is a field");
        };
        assert_eq!(title.scope().timeout, Duration::from_millis(200));

        let Some(Slot::View(panel)) = slots.get("panel") else {
            panic!("panel is a view");
        };
        assert_eq!(panel.scope().timeout, Duration::from_millis(1500));
        let Some(Slot::Field(label)) = panel.slots().get("label") else {
            panic!("label is a field");
        };
        assert_eq!(label.scope().selector, Selector::LinkText);
    }

    #[test]
    fn parse_rules_read_from_yaml() {
        let spec: SlotSpec = serde_yaml::from_str(
            "{ name: next, kind: field, selector: css, value: a.next, parse: { attribute: href } }",
        )
        .unwrap();
        match spec.content {
            ContentSpec::Field(field) => assert_eq!(field.parse, Parse::Attribute("href".into())),
            other => panic!("expected a field, got {other:?}"),
        }
    }

    #[test]
    fn duplicate_slots_fail_to_build() {
        let spec = PageSpec::from_yaml(
            r#"
name: dup
slots:
  - { name: a, kind: field, selector: id, value: a }
  - { name: a, kind: field, selector: id, value: b }
"#,
        )
        .unwrap();
        assert!(matches!(spec.build(), Err(VistaError::DuplicateSlot(name)) if name == "a"));
    }

    #[test]
    fn nested_groups_are_rejected() {
        let spec = PageSpec::from_yaml(
            r#"
name: nested
slots:
  - name: outer
    kind: group
    item:
      kind: group
      item: { kind: field, selector: tag, value: li }
"#,
        )
        .unwrap();
        let err = spec.build().unwrap_err();
        assert!(matches!(err, VistaError::Config(_)));
        assert!(err.to_string().contains("page `nested`"));
    }

    #[test]
    fn unknown_selector_kinds_are_schema_errors() {
        let err = PageSpec::from_yaml(
            "name: bad\nslots:\n  - { name: a, kind: field, selector: shadow, value: x }\n",
        )
        .unwrap_err();
        assert!(matches!(err, VistaError::Config(_)));
    }
}
