//! Named unit constructors and the `Name(argument)` call syntax used in
//! configuration files.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::{Arc, OnceLock};

use kbforge_core::LanguageOrder;
use regex::Regex;
use tracing::debug;

use crate::error::ConfigurationError;
use crate::extractor::Extractor;

/// What a unit needs to be constructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Capabilities {
    pub requires_data_file: bool,
    pub requires_language: bool,
}

/// Construction shapes shared by all units.
#[derive(Clone, Copy)]
pub enum UnitShape {
    /// Built once. Receives the language order for units that read or
    /// write every member of a theme family.
    Plain(fn(&LanguageOrder) -> Arc<dyn Extractor>),
    /// Reads one file given as the call argument.
    DataFile(fn(PathBuf) -> Arc<dyn Extractor>),
    /// One instance per configured language.
    Multilingual(fn(&str) -> Arc<dyn Extractor>),
    /// One instance per configured language, each reading that language's
    /// source file.
    MultilingualDataFile(fn(&str, PathBuf) -> Arc<dyn Extractor>),
}

impl UnitShape {
    #[must_use]
    pub const fn capabilities(&self) -> Capabilities {
        match self {
            Self::Plain(_) => Capabilities {
                requires_data_file: false,
                requires_language: false,
            },
            Self::DataFile(_) => Capabilities {
                requires_data_file: true,
                requires_language: false,
            },
            Self::Multilingual(_) => Capabilities {
                requires_data_file: false,
                requires_language: true,
            },
            Self::MultilingualDataFile(_) => Capabilities {
                requires_data_file: true,
                requires_language: true,
            },
        }
    }

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Plain(_) => "plain",
            Self::DataFile(_) => "data file",
            Self::Multilingual(_) => "multilingual",
            Self::MultilingualDataFile(_) => "multilingual data file",
        }
    }
}

impl fmt::Debug for UnitShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[expect(clippy::expect_used, reason = "Static regex pattern validated at compile time")]
fn call_pattern() -> &'static Regex {
    static CALL: OnceLock<Regex> = OnceLock::new();
    CALL.get_or_init(|| {
        Regex::new(r"^([A-Za-z0-9\.]+)(?:\(([A-Za-z_0-9\-:/\.\\ {}]*)\))?$")
            .expect("unit call pattern")
    })
}

/// A unit reference such as `LabelExtractor` or `PatternHardExtractor(data)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitCall {
    pub name: String,
    pub argument: Option<String>,
}

impl UnitCall {
    pub fn parse(call: &str) -> Result<Self, ConfigurationError> {
        let call = call.trim();
        let captures = call_pattern()
            .captures(call)
            .ok_or_else(|| ConfigurationError::MalformedCall {
                call: call.to_string(),
                reason: "expected Name or Name(argument)".to_string(),
            })?;
        let name = captures
            .get(1)
            .map(|m| m.as_str().to_string())
            .unwrap_or_default();
        let argument = captures
            .get(2)
            .map(|m| m.as_str().trim().to_string())
            .filter(|argument| !argument.is_empty());
        Ok(Self { name, argument })
    }
}

impl FromStr for UnitCall {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for UnitCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.argument {
            Some(argument) => write!(f, "{}({argument})", self.name),
            None => f.write_str(&self.name),
        }
    }
}

/// Unit names to constructors.
#[derive(Debug, Clone, Default)]
pub struct UnitCatalog {
    shapes: BTreeMap<String, UnitShape>,
}

impl UnitCatalog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, name: impl Into<String>, shape: UnitShape) -> &mut Self {
        self.shapes.insert(name.into(), shape);
        self
    }

    #[must_use]
    pub fn shape(&self, name: &str) -> Option<UnitShape> {
        self.shapes.get(name).copied()
    }

    /// Registered names with their shapes, sorted by name.
    pub fn entries(&self) -> impl Iterator<Item = (&str, UnitShape)> {
        self.shapes.iter().map(|(name, shape)| (name.as_str(), *shape))
    }

    /// Creates the instances a call stands for: one, or one per language for
    /// multilingual shapes.
    ///
    /// Multilingual data-file units read `sources[language]`; a call argument
    /// overrides it, with `{lang}` replaced by the language code.
    pub fn instantiate(
        &self,
        call: &UnitCall,
        languages: &LanguageOrder,
        sources: &HashMap<String, PathBuf>,
    ) -> Result<Vec<Arc<dyn Extractor>>, ConfigurationError> {
        let shape = self
            .shape(&call.name)
            .ok_or_else(|| ConfigurationError::UnknownUnit(call.name.clone()))?;
        debug!("Instantiating {call} as {} unit", shape.as_str());
        let units = match shape {
            UnitShape::Plain(make) => {
                if call.argument.is_some() {
                    return Err(ConfigurationError::MalformedCall {
                        call: call.to_string(),
                        reason: format!("{} takes no argument", call.name),
                    });
                }
                vec![make(languages)]
            }
            UnitShape::DataFile(make) => {
                let path = call
                    .argument
                    .as_deref()
                    .map(PathBuf::from)
                    .ok_or_else(|| ConfigurationError::MissingDataFile(call.name.clone()))?;
                vec![make(existing(&call.name, path)?)]
            }
            UnitShape::Multilingual(make) => {
                if call.argument.is_some() {
                    return Err(ConfigurationError::MalformedCall {
                        call: call.to_string(),
                        reason: format!("{} takes no argument", call.name),
                    });
                }
                languages.iter().map(make).collect()
            }
            UnitShape::MultilingualDataFile(make) => languages
                .iter()
                .map(|language| {
                    let path = match &call.argument {
                        Some(template) => PathBuf::from(template.replace("{lang}", language)),
                        None => sources.get(language).cloned().ok_or_else(|| {
                            ConfigurationError::MissingSource {
                                unit: call.name.clone(),
                                language: language.to_string(),
                            }
                        })?,
                    };
                    Ok(make(language, existing(&call.name, path)?))
                })
                .collect::<Result<Vec<_>, ConfigurationError>>()?,
        };
        Ok(units)
    }

    /// Parses and instantiates every call, in order.
    pub fn instantiate_all<S>(
        &self,
        calls: &[S],
        languages: &LanguageOrder,
        sources: &HashMap<String, PathBuf>,
    ) -> Result<Vec<Arc<dyn Extractor>>, ConfigurationError>
    where
        S: AsRef<str>,
    {
        let mut units = Vec::new();
        for call in calls {
            let call = UnitCall::parse(call.as_ref())?;
            units.extend(self.instantiate(&call, languages, sources)?);
        }
        Ok(units)
    }
}

fn existing(unit: &str, path: PathBuf) -> Result<PathBuf, ConfigurationError> {
    if path.exists() {
        Ok(path)
    } else {
        Err(ConfigurationError::DataFileNotFound {
            unit: unit.to_string(),
            path,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::ExtractionContext;
    use kbforge_core::Theme;

    struct Named(String);

    impl Extractor for Named {
        fn name(&self) -> String {
            self.0.clone()
        }

        fn input(&self) -> Vec<Theme> {
            Vec::new()
        }

        fn output(&self) -> Vec<Theme> {
            Vec::new()
        }

        fn extract(&self, _context: &ExtractionContext<'_>) -> anyhow::Result<()> {
            Ok(())
        }
    }

    fn plain(_languages: &LanguageOrder) -> Arc<dyn Extractor> {
        Arc::new(Named("Plain".to_string()))
    }

    fn per_language(language: &str) -> Arc<dyn Extractor> {
        Arc::new(Named(format!("Labels({language})")))
    }

    fn with_file(path: PathBuf) -> Arc<dyn Extractor> {
        Arc::new(Named(format!("File({})", path.display())))
    }

    fn catalog() -> UnitCatalog {
        let mut catalog = UnitCatalog::new();
        catalog
            .register("Plain", UnitShape::Plain(plain))
            .register("Labels", UnitShape::Multilingual(per_language))
            .register("File", UnitShape::DataFile(with_file));
        catalog
    }

    #[test]
    #[expect(clippy::expect_used, reason = "Test failure should panic with context")]
    fn test_parse_calls() {
        let call = UnitCall::parse("PatternHardExtractor(./data)").expect("call");
        assert_eq!(call.name, "PatternHardExtractor");
        assert_eq!(call.argument.as_deref(), Some("./data"));
        assert_eq!(call.to_string(), "PatternHardExtractor(./data)");

        let call: UnitCall = "Plain".parse().expect("call");
        assert_eq!(call.argument, None);

        assert!(matches!(
            UnitCall::parse("Broken(("),
            Err(ConfigurationError::MalformedCall { .. })
        ));
    }

    #[test]
    #[expect(clippy::expect_used, reason = "Test failure should panic with context")]
    fn test_multilingual_expands_per_language() {
        let languages = LanguageOrder::new(["en", "de", "fr"]).expect("languages");
        let units = catalog()
            .instantiate_all(&["Plain", "Labels"], &languages, &HashMap::new())
            .expect("units");
        let names: Vec<String> = units.iter().map(|unit| unit.name()).collect();
        assert_eq!(names, vec!["Plain", "Labels(en)", "Labels(de)", "Labels(fr)"]);
    }

    #[test]
    #[expect(clippy::expect_used, reason = "Test failure should panic with context")]
    fn test_data_file_errors() {
        let catalog = catalog();
        let languages = LanguageOrder::default();
        let sources = HashMap::new();
        assert!(matches!(
            catalog.instantiate(&UnitCall::parse("File").expect("call"), &languages, &sources),
            Err(ConfigurationError::MissingDataFile(_))
        ));
        assert!(matches!(
            catalog.instantiate(
                &UnitCall::parse("File(/no/such/file)").expect("call"),
                &languages,
                &sources
            ),
            Err(ConfigurationError::DataFileNotFound { .. })
        ));
        assert!(matches!(
            catalog.instantiate(&UnitCall::parse("Nope").expect("call"), &languages, &sources),
            Err(ConfigurationError::UnknownUnit(_))
        ));
        assert!(matches!(
            catalog.instantiate(&UnitCall::parse("Plain(x)").expect("call"), &languages, &sources),
            Err(ConfigurationError::MalformedCall { .. })
        ));
    }
}
