//! Themes produced by the built-in units.

use kbforge_core::{Theme, ThemeFamily, ThemeGroup};

#[must_use]
pub fn labels() -> ThemeFamily {
    ThemeFamily::new("labels", "Labels of entities")
}

#[must_use]
pub fn preferred_names() -> Theme {
    Theme::new("preferredNames", "The preferred name of every entity").with_group(ThemeGroup::Core)
}

#[must_use]
pub fn attribute_facts() -> ThemeFamily {
    ThemeFamily::new("attributeFacts", "Facts parsed from attribute values")
}

#[must_use]
pub fn attribute_sources() -> ThemeFamily {
    ThemeFamily::new("attributeSources", "Sources and techniques of attribute facts")
        .with_group(ThemeGroup::Meta)
}

#[must_use]
pub fn checked_attribute_facts() -> ThemeFamily {
    ThemeFamily::new(
        "attributeFactsChecked",
        "Attribute facts whose literals match their datatype",
    )
    .with_group(ThemeGroup::Core)
}
