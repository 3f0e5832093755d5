//! Relations with a fixed meaning across the pipeline.

pub const RDF_TYPE: &str = "rdf:type";
pub const RDFS_LABEL: &str = "rdfs:label";
pub const SKOS_PREF_LABEL: &str = "skos:prefLabel";

/// Relation of pattern rules: `(pattern, <mapsTo>, replacement)`.
pub const MAPS_TO: &str = "<mapsTo>";

/// Relation of the preferred-meanings dictionary: `(class, <isPreferredMeaningOf>, "name")`.
pub const IS_PREFERRED_MEANING_OF: &str = "<isPreferredMeaningOf>";

pub const EXTRACTION_SOURCE: &str = "<extractionSource>";
pub const EXTRACTION_TECHNIQUE: &str = "<extractionTechnique>";

/// Relation of translation dictionaries kept by multilingual themes.
pub const HAS_TRANSLATION: &str = "<_hasTranslation>";
