//! The units shipped with kbforge.

use kbforge_pipeline::{UnitCatalog, UnitShape};

use crate::attributes::AttributeExtractor;
use crate::labels::LabelExtractor;
use crate::pattern_hard::PatternHardExtractor;
use crate::preferred_names::PreferredNameExtractor;

/// Every built-in unit under the name used in configuration files.
/// Follow-ups such as `LiteralTypeChecker` are reached through their parent.
#[must_use]
pub fn builtin_catalog() -> UnitCatalog {
    let mut catalog = UnitCatalog::new();
    catalog
        .register(
            "PatternHardExtractor",
            UnitShape::DataFile(PatternHardExtractor::shared),
        )
        .register(
            "LabelExtractor",
            UnitShape::MultilingualDataFile(LabelExtractor::shared),
        )
        .register(
            "PreferredNameExtractor",
            UnitShape::Plain(PreferredNameExtractor::shared),
        )
        .register(
            "AttributeExtractor",
            UnitShape::MultilingualDataFile(AttributeExtractor::shared),
        );
    catalog
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_shapes() {
        let catalog = builtin_catalog();
        let names: Vec<&str> = catalog.entries().map(|(name, _)| name).collect();
        assert_eq!(
            names,
            vec![
                "AttributeExtractor",
                "LabelExtractor",
                "PatternHardExtractor",
                "PreferredNameExtractor"
            ]
        );
        assert!(catalog
            .shape("AttributeExtractor")
            .is_some_and(|shape| shape.capabilities().requires_language));
        assert!(catalog
            .shape("PreferredNameExtractor")
            .is_some_and(|shape| !shape.capabilities().requires_data_file));
    }
}
