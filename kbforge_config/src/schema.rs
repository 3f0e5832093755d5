use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use kbforge_core::LanguageOrder;
use kbforge_pipeline::{PipelineConfig, UnitCall};
use tracing::debug;

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Config {
    pub pipeline: PipelineSection,
    /// Most dominant first.
    #[serde(default = "Config::default_languages")]
    pub languages: Vec<String>,
    /// Raw source file of each language, read by multilingual data-file units.
    #[serde(default)]
    pub sources: BTreeMap<String, PathBuf>,
    /// Unit calls, `Name` or `Name(argument)`.
    #[serde(default)]
    pub units: Vec<String>,
    /// Themes to materialize. Empty means every output of every unit.
    #[serde(default)]
    pub targets: Vec<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct PipelineSection {
    pub output_folder: PathBuf,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_folder: Option<PathBuf>,
    #[serde(default = "PipelineSection::default_threads")]
    pub threads: usize,
    #[serde(default = "PipelineSection::default_reuse")]
    pub reuse: bool,
    #[serde(default = "PipelineSection::default_header")]
    pub header: String,
}

impl PipelineSection {
    const fn default_threads() -> usize {
        4
    }

    const fn default_reuse() -> bool {
        true
    }

    fn default_header() -> String {
        "Produced by kbforge".to_string()
    }
}

impl Config {
    fn default_languages() -> Vec<String> {
        vec!["en".to_string()]
    }

    /// `~/kbforge`.
    pub fn config_dir() -> anyhow::Result<PathBuf> {
        Ok(dirs::home_dir()
            .ok_or_else(|| anyhow::anyhow!("Cannot find home directory"))?
            .join("kbforge"))
    }

    pub fn default_path() -> anyhow::Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.json"))
    }

    /// Reads the config at `path`, or at the default location.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let config_path = match path {
            Some(path) => path.to_path_buf(),
            None => Self::default_path()?,
        };

        if !config_path.exists() {
            anyhow::bail!(
                "Config file not found at: {}. Please run 'kbforge init' to create config.",
                config_path.display()
            );
        }

        let content = std::fs::read_to_string(&config_path)?;
        let config = Self::from_json(&content)?;
        debug!("Loaded config from {}", config_path.display());
        Ok(config)
    }

    /// Parses and validates a config document.
    pub fn from_json(content: &str) -> anyhow::Result<Self> {
        let config: Self = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        self.language_order()?;
        if self.pipeline.threads == 0 {
            anyhow::bail!("pipeline.threads must be at least 1");
        }
        for call in &self.units {
            UnitCall::parse(call)?;
        }
        for language in self.sources.keys() {
            if !self.languages.contains(language) {
                anyhow::bail!("Source given for unconfigured language '{language}'");
            }
        }
        Ok(())
    }

    pub fn language_order(&self) -> anyhow::Result<LanguageOrder> {
        Ok(LanguageOrder::new(self.languages.iter().cloned())?)
    }

    #[must_use]
    pub fn source_map(&self) -> HashMap<String, PathBuf> {
        self.sources
            .iter()
            .map(|(language, path)| (language.clone(), path.clone()))
            .collect()
    }

    /// Scheduler settings. `run_header` is appended to the configured header.
    pub fn pipeline_config(&self, run_header: &str) -> anyhow::Result<PipelineConfig> {
        let header = if run_header.is_empty() {
            self.pipeline.header.clone()
        } else {
            format!("{} ({run_header})", self.pipeline.header)
        };
        let mut config = PipelineConfig::new(&self.pipeline.output_folder)
            .with_languages(self.language_order()?)
            .with_threads(self.pipeline.threads)
            .with_reuse(self.pipeline.reuse)
            .with_header(header);
        if let Some(cache) = &self.pipeline.cache_folder {
            config = config.with_cache_folder(cache);
        }
        Ok(config)
    }

    pub fn ensure_config_dir() -> anyhow::Result<PathBuf> {
        let config_dir = Self::config_dir()?;
        std::fs::create_dir_all(&config_dir)?;
        Ok(config_dir)
    }

    /// Writes the template to `path`, or to the default location.
    pub fn create_config(path: Option<&Path>) -> anyhow::Result<PathBuf> {
        let config_path = match path {
            Some(path) => {
                if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                    std::fs::create_dir_all(parent)?;
                }
                path.to_path_buf()
            }
            None => Self::ensure_config_dir()?.join("config.json"),
        };

        if config_path.exists() {
            anyhow::bail!(
                "Config file already exists at: {}. Please edit it directly.",
                config_path.display()
            );
        }

        std::fs::write(&config_path, TEMPLATE)?;

        println!("✅ Created config file at: {}", config_path.display());
        println!();
        println!("📝 Next steps:");
        println!("   1. Point pipeline.output_folder at an empty folder");
        println!("   2. Point PatternHardExtractor at the folder holding the rule themes");
        println!("   3. List one source file per language under 'sources'");
        println!("   4. Run 'kbforge plan' to check the schedule, then 'kbforge run'");
        println!();
        println!("🔧 Configuration options:");
        println!("   - languages: most dominant first, it decides conflicts between languages");
        println!("   - targets: themes to produce, empty for everything");
        println!("   - pipeline.reuse: keep complete theme files from an earlier run");
        println!();
        Ok(config_path)
    }
}

const TEMPLATE: &str = r#"{
  "pipeline": {
    "output_folder": "kb",
    "threads": 4,
    "reuse": true,
    "header": "Produced by kbforge"
  },
  "languages": ["en", "de"],
  "sources": {
    "en": "sources/attributes_en.tsv",
    "de": "sources/attributes_de.tsv"
  },
  "units": [
    "PatternHardExtractor(data)",
    "AttributeExtractor",
    "LabelExtractor(sources/labels_{lang}.tsv)",
    "PreferredNameExtractor"
  ],
  "targets": []
}"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[expect(clippy::expect_used, reason = "Test failure should panic with context")]
    fn test_template_is_valid() {
        let config = Config::from_json(TEMPLATE).expect("template");
        assert_eq!(config.languages, vec!["en", "de"]);
        assert_eq!(config.units.len(), 4);
        assert!(config.targets.is_empty());
        let order = config.language_order().expect("languages");
        assert_eq!(order.dominant(), "en");
    }

    #[test]
    #[expect(clippy::expect_used, reason = "Test failure should panic with context")]
    fn test_defaults() {
        let config =
            Config::from_json(r#"{"pipeline": {"output_folder": "out"}}"#).expect("config");
        assert_eq!(config.languages, vec!["en"]);
        assert_eq!(config.pipeline.threads, 4);
        assert!(config.pipeline.reuse);
        assert!(config.pipeline.cache_folder.is_none());

        let pipeline = config.pipeline_config("run 7").expect("pipeline config");
        assert_eq!(pipeline.output_folder, PathBuf::from("out"));
        assert_eq!(pipeline.header, "Produced by kbforge (run 7)");
        assert_eq!(pipeline.languages.dominant(), "en");
    }

    #[test]
    fn test_invalid_documents() {
        let duplicate = r#"{"pipeline": {"output_folder": "out"}, "languages": ["en", "en"]}"#;
        assert!(Config::from_json(duplicate).is_err());

        let no_threads = r#"{"pipeline": {"output_folder": "out", "threads": 0}}"#;
        assert!(Config::from_json(no_threads).is_err());

        let bad_call = r#"{"pipeline": {"output_folder": "out"}, "units": ["Broken("]}"#;
        assert!(Config::from_json(bad_call).is_err());

        let stray_source =
            r#"{"pipeline": {"output_folder": "out"}, "sources": {"fr": "fr.tsv"}}"#;
        assert!(Config::from_json(stray_source).is_err());
    }

    #[test]
    #[expect(clippy::expect_used, reason = "Test failure should panic with context")]
    fn test_create_then_load() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("nested").join("config.json");
        Config::create_config(Some(&path)).expect("create");
        assert!(Config::create_config(Some(&path)).is_err());

        let config = Config::load(Some(&path)).expect("load");
        assert_eq!(config.source_map().len(), 2);
        assert!(Config::load(Some(&dir.path().join("missing.json"))).is_err());
    }
}
