//! Themes and the registry that tracks their lifecycle during a run.

use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::fact::Fact;
use crate::language::LanguageOrder;
use crate::store::FactStore;
use crate::tsv::{Completion, FactReader, FactWriter, HeaderBlock};
use crate::vocab::HAS_TRANSLATION;

/// Classification of a theme, recorded in its header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ThemeGroup {
    Taxonomy,
    Simpletax,
    Core,
    Geonames,
    Meta,
    Multilingual,
    Link,
    Other,
    Internal,
    Wikipedia,
}

impl ThemeGroup {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Taxonomy => "TAXONOMY",
            Self::Simpletax => "SIMPLETAX",
            Self::Core => "CORE",
            Self::Geonames => "GEONAMES",
            Self::Meta => "META",
            Self::Multilingual => "MULTILINGUAL",
            Self::Link => "LINK",
            Self::Other => "OTHER",
            Self::Internal => "INTERNAL",
            Self::Wikipedia => "WIKIPEDIA",
        }
    }
}

impl FromStr for ThemeGroup {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "TAXONOMY" => Ok(Self::Taxonomy),
            "SIMPLETAX" => Ok(Self::Simpletax),
            "CORE" => Ok(Self::Core),
            "GEONAMES" => Ok(Self::Geonames),
            "META" => Ok(Self::Meta),
            "MULTILINGUAL" => Ok(Self::Multilingual),
            "LINK" => Ok(Self::Link),
            "OTHER" => Ok(Self::Other),
            "INTERNAL" => Ok(Self::Internal),
            "WIKIPEDIA" => Ok(Self::Wikipedia),
            other => Err(format!("unknown theme group: {other}")),
        }
    }
}

impl fmt::Display for ThemeGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named fact artifact. Identity is the name.
#[derive(Debug, Clone)]
pub struct Theme {
    name: String,
    description: String,
    group: ThemeGroup,
    language: Option<String>,
}

impl Theme {
    /// Themes whose name starts with `_` are internal, everything else
    /// defaults to [`ThemeGroup::Other`].
    #[must_use]
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        let name = name.into();
        let group = if name.starts_with('_') {
            ThemeGroup::Internal
        } else {
            ThemeGroup::Other
        };
        Self {
            name,
            description: description.into(),
            group,
            language: None,
        }
    }

    #[must_use]
    pub const fn with_group(mut self, group: ThemeGroup) -> Self {
        self.group = group;
        self
    }

    #[must_use]
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    #[must_use]
    pub const fn group(&self) -> ThemeGroup {
        self.group
    }

    #[must_use]
    pub fn language(&self) -> Option<&str> {
        self.language.as_deref()
    }

    #[must_use]
    pub fn is_internal(&self) -> bool {
        self.group == ThemeGroup::Internal
    }

    #[must_use]
    pub fn file_name(&self) -> String {
        format!("{}.tsv", self.name)
    }

    #[must_use]
    pub fn file_in(&self, folder: &Path) -> PathBuf {
        folder.join(self.file_name())
    }
}

impl PartialEq for Theme {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for Theme {}

impl Hash for Theme {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

impl PartialOrd for Theme {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Theme {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.name.cmp(&other.name)
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// A theme produced once per language, named `<base>_<lang>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThemeFamily {
    base: String,
    description: String,
    group: ThemeGroup,
}

impl ThemeFamily {
    #[must_use]
    pub fn new(base: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            base: base.into(),
            description: description.into(),
            group: ThemeGroup::Multilingual,
        }
    }

    #[must_use]
    pub const fn with_group(mut self, group: ThemeGroup) -> Self {
        self.group = group;
        self
    }

    #[must_use]
    pub fn base(&self) -> &str {
        &self.base
    }

    #[must_use]
    pub fn in_language(&self, language: &str) -> Theme {
        Theme::new(
            format!("{}_{language}", self.base),
            format!("{} ({language})", self.description),
        )
        .with_group(self.group)
        .with_language(language)
    }

    /// One member per configured language, in language order.
    #[must_use]
    pub fn in_languages(&self, languages: &LanguageOrder) -> Vec<Theme> {
        languages.iter().map(|lang| self.in_language(lang)).collect()
    }

    #[must_use]
    pub fn in_dominant_language(&self, languages: &LanguageOrder) -> Theme {
        self.in_language(languages.dominant())
    }

    #[must_use]
    pub fn contains(&self, theme: &Theme) -> bool {
        theme.language().is_some_and(|lang| {
            theme
                .name()
                .strip_prefix(self.base.as_str())
                .and_then(|rest| rest.strip_prefix('_'))
                == Some(lang)
        })
    }
}

/// Lifecycle of a theme within one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThemeState {
    /// No file assigned yet.
    Unopened,
    Writing,
    /// Closed and readable, produced now or assigned from an earlier run.
    Closed,
    /// Closed by a unit that failed. Not readable.
    Failed,
}

impl ThemeState {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unopened => "unopened",
            Self::Writing => "writing",
            Self::Closed => "closed",
            Self::Failed => "failed",
        }
    }
}

struct Slot {
    theme: Theme,
    state: ThemeState,
    file: Option<PathBuf>,
    produced: bool,
    writer: Option<FactWriter>,
    cache: Option<Arc<FactStore>>,
}

impl Slot {
    fn readable_file(&self) -> Result<&Path> {
        match (&self.file, self.state) {
            (Some(file), ThemeState::Closed) => Ok(file.as_path()),
            _ => Err(Error::NotReadable(self.theme.name.clone())),
        }
    }
}

fn lock(slot: &Mutex<Slot>) -> MutexGuard<'_, Slot> {
    slot.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Theme name to lifecycle state, owned by one pipeline.
///
/// Transitions of a single theme are serialized by a per-theme lock, so units
/// running on different workers can write their own outputs and read closed
/// inputs concurrently.
#[derive(Default)]
pub struct ThemeRegistry {
    slots: RwLock<HashMap<String, Arc<Mutex<Slot>>>>,
}

impl ThemeRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a theme. Registering a name twice keeps the first descriptor.
    pub fn register(&self, theme: &Theme) {
        let mut slots = self.slots.write().unwrap_or_else(PoisonError::into_inner);
        slots.entry(theme.name.clone()).or_insert_with(|| {
            Arc::new(Mutex::new(Slot {
                theme: theme.clone(),
                state: ThemeState::Unopened,
                file: None,
                produced: false,
                writer: None,
                cache: None,
            }))
        });
    }

    fn slot(&self, name: &str) -> Result<Arc<Mutex<Slot>>> {
        let slots = self.slots.read().unwrap_or_else(PoisonError::into_inner);
        slots
            .get(name)
            .cloned()
            .ok_or_else(|| Error::UnknownTheme(name.to_string()))
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.slot(name).is_ok()
    }

    #[must_use]
    pub fn theme(&self, name: &str) -> Option<Theme> {
        self.slot(name).ok().map(|slot| lock(&slot).theme.clone())
    }

    /// All registered themes, sorted by name.
    #[must_use]
    pub fn themes(&self) -> Vec<Theme> {
        let slots = self.slots.read().unwrap_or_else(PoisonError::into_inner);
        let mut themes: Vec<Theme> = slots.values().map(|slot| lock(slot).theme.clone()).collect();
        themes.sort();
        themes
    }

    pub fn state(&self, name: &str) -> Result<ThemeState> {
        let slot = self.slot(name)?;
        Ok(lock(&slot).state)
    }

    #[must_use]
    pub fn file(&self, name: &str) -> Option<PathBuf> {
        self.slot(name).ok().and_then(|slot| lock(&slot).file.clone())
    }

    #[must_use]
    pub fn is_available_for_reading(&self, name: &str) -> bool {
        self.slot(name)
            .is_ok_and(|slot| lock(&slot).readable_file().is_ok())
    }

    /// True if the theme was written during this run.
    #[must_use]
    pub fn was_produced(&self, name: &str) -> bool {
        self.slot(name).is_ok_and(|slot| lock(&slot).produced)
    }

    /// Marks the theme's file in `folder` as readable without producing it.
    pub fn assign_to_folder(&self, name: &str, folder: &Path) -> Result<()> {
        let slot = self.slot(name)?;
        let mut slot = lock(&slot);
        if slot.state == ThemeState::Writing {
            return Err(Error::AlreadyWriting(name.to_string()));
        }
        let file = slot.theme.file_in(folder);
        if !file.is_file() {
            return Err(Error::NotFound {
                name: name.to_string(),
                folder: folder.to_path_buf(),
            });
        }
        debug!("Assigning theme {name} to {}", file.display());
        slot.file = Some(file);
        slot.state = ThemeState::Closed;
        slot.cache = None;
        Ok(())
    }

    /// Drops the file assignment and any cached store so the theme can be
    /// produced again. A theme already written in this run stays marked as
    /// produced and cannot be reopened.
    pub fn forget(&self, name: &str) -> Result<()> {
        let slot = self.slot(name)?;
        let mut slot = lock(&slot);
        if slot.state == ThemeState::Writing {
            return Err(Error::AlreadyWriting(name.to_string()));
        }
        slot.file = None;
        slot.state = ThemeState::Unopened;
        slot.cache = None;
        Ok(())
    }

    /// Opens the theme for writing in `folder`. The header block records the
    /// run header, the description and the group.
    pub fn open_for_writing(&self, name: &str, folder: &Path, run_header: &str) -> Result<()> {
        let slot = self.slot(name)?;
        let mut slot = lock(&slot);
        if slot.state == ThemeState::Writing {
            return Err(Error::AlreadyWriting(name.to_string()));
        }
        if slot.produced {
            return Err(Error::AlreadyWritten {
                name: name.to_string(),
                path: slot.file.clone().unwrap_or_else(|| slot.theme.file_in(folder)),
            });
        }
        let path = slot.theme.file_in(folder);
        let header = HeaderBlock {
            run_header,
            description: &slot.theme.description,
            group: Some(slot.theme.group),
        };
        let writer = FactWriter::create(&path, name, &header)?;
        debug!("Opened theme {name} for writing at {}", path.display());
        slot.writer = Some(writer);
        slot.file = Some(path);
        slot.state = ThemeState::Writing;
        slot.cache = None;
        Ok(())
    }

    pub fn write(&self, name: &str, fact: &Fact) -> Result<()> {
        let slot = self.slot(name)?;
        let mut slot = lock(&slot);
        match slot.writer.as_mut() {
            Some(writer) => writer.write(fact),
            None => Err(Error::NotWritable(name.to_string())),
        }
    }

    /// Closes a theme opened for writing. Returns the number of facts written.
    pub fn close(&self, name: &str, completion: &Completion) -> Result<usize> {
        let slot = self.slot(name)?;
        let mut slot = lock(&slot);
        let writer = slot
            .writer
            .take()
            .ok_or_else(|| Error::NotWritable(name.to_string()))?;
        slot.produced = true;
        slot.state = match completion {
            Completion::Complete => ThemeState::Closed,
            Completion::Failed(_) => ThemeState::Failed,
        };
        let count = writer.finish(completion)?;
        debug!("Closed theme {name} ({}, {count} facts)", slot.state.as_str());
        Ok(count)
    }

    /// Streams the facts of a readable theme.
    pub fn reader(&self, name: &str) -> Result<FactReader> {
        let slot = self.slot(name)?;
        let slot = lock(&slot);
        FactReader::open(slot.readable_file()?)
    }

    /// The theme's facts as a frozen, shared store. Loaded on first use and
    /// cached until [`ThemeRegistry::kill_cache`].
    pub fn fact_store(&self, name: &str) -> Result<Arc<FactStore>> {
        let slot = self.slot(name)?;
        let mut slot = lock(&slot);
        if let Some(cache) = &slot.cache {
            return Ok(Arc::clone(cache));
        }
        let mut store = FactStore::new();
        store.load(FactReader::open(slot.readable_file()?)?)?;
        debug!("Cached theme {name} ({} facts)", store.len());
        let store = Arc::new(store);
        slot.cache = Some(Arc::clone(&store));
        Ok(store)
    }

    #[must_use]
    pub fn is_cached(&self, name: &str) -> bool {
        self.slot(name).is_ok_and(|slot| lock(&slot).cache.is_some())
    }

    /// Releases the cached store of a theme.
    pub fn kill_cache(&self, name: &str) {
        if let Ok(slot) = self.slot(name) {
            lock(&slot).cache = None;
        }
    }

    /// Translation dictionary of a theme: subject to object over
    /// `<_hasTranslation>` facts.
    pub fn dictionary(&self, name: &str) -> Result<HashMap<String, String>> {
        Ok(self.fact_store(name)?.dictionary(HAS_TRANSLATION))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry_with(theme: &Theme) -> ThemeRegistry {
        let registry = ThemeRegistry::new();
        registry.register(theme);
        registry
    }

    #[test]
    fn test_internal_group_from_name() {
        assert_eq!(Theme::new("_dateParser", "").group(), ThemeGroup::Internal);
        assert_eq!(Theme::new("people", "").group(), ThemeGroup::Other);
        assert_eq!("core".parse::<ThemeGroup>(), Ok(ThemeGroup::Core));
    }

    #[test]
    fn test_family_members_follow_language_order() {
        let family = ThemeFamily::new("labels", "Labels");
        let order = LanguageOrder::new(["de", "en"]).unwrap_or_default();
        let names: Vec<String> = family
            .in_languages(&order)
            .iter()
            .map(|t| t.name().to_string())
            .collect();
        assert_eq!(names, vec!["labels_de", "labels_en"]);
        assert!(family.contains(&family.in_language("fr")));
        assert!(!family.contains(&Theme::new("labels", "")));
    }

    #[test]
    #[expect(clippy::expect_used, reason = "Test failure should panic with context")]
    fn test_lifecycle() {
        let dir = tempfile::tempdir().expect("temp dir");
        let theme = Theme::new("people", "People");
        let registry = registry_with(&theme);

        assert_eq!(registry.state("people").expect("state"), ThemeState::Unopened);
        assert!(!registry.is_available_for_reading("people"));
        assert!(matches!(
            registry.write("people", &Fact::new("<A>", "<r>", "<B>")),
            Err(Error::NotWritable(_))
        ));

        registry
            .open_for_writing("people", dir.path(), "test run")
            .expect("open");
        assert!(matches!(
            registry.open_for_writing("people", dir.path(), "test run"),
            Err(Error::AlreadyWriting(_))
        ));
        assert!(!registry.is_available_for_reading("people"));
        registry
            .write("people", &Fact::new("<A>", "<r>", "<B>"))
            .expect("write");
        assert_eq!(registry.close("people", &Completion::Complete).expect("close"), 1);

        assert!(registry.is_available_for_reading("people"));
        assert!(registry.was_produced("people"));
        assert!(matches!(
            registry.open_for_writing("people", dir.path(), "test run"),
            Err(Error::AlreadyWritten { .. })
        ));

        let store = registry.fact_store("people").expect("store");
        assert_eq!(store.len(), 1);
        assert!(registry.is_cached("people"));
        registry.kill_cache("people");
        assert!(!registry.is_cached("people"));
    }

    #[test]
    #[expect(clippy::expect_used, reason = "Test failure should panic with context")]
    fn test_failed_theme_is_not_readable() {
        let dir = tempfile::tempdir().expect("temp dir");
        let registry = registry_with(&Theme::new("broken", ""));
        registry
            .open_for_writing("broken", dir.path(), "")
            .expect("open");
        registry
            .close("broken", &Completion::Failed("boom".to_string()))
            .expect("close");
        assert_eq!(registry.state("broken").expect("state"), ThemeState::Failed);
        assert!(matches!(
            registry.fact_store("broken"),
            Err(Error::NotReadable(_))
        ));
    }

    #[test]
    #[expect(clippy::expect_used, reason = "Test failure should panic with context")]
    fn test_assign_to_folder() {
        let dir = tempfile::tempdir().expect("temp dir");
        let registry = registry_with(&Theme::new("cached", ""));
        assert!(matches!(
            registry.assign_to_folder("cached", dir.path()),
            Err(Error::NotFound { .. })
        ));
        std::fs::write(dir.path().join("cached.tsv"), "<A>\t<r>\t<B>\n").expect("write");
        registry.assign_to_folder("cached", dir.path()).expect("assign");
        assert!(registry.is_available_for_reading("cached"));
        assert!(!registry.was_produced("cached"));

        registry.forget("cached").expect("forget");
        assert!(!registry.is_available_for_reading("cached"));
        assert!(matches!(
            registry.reader("cached"),
            Err(Error::NotReadable(_))
        ));
    }

    #[test]
    fn test_unknown_theme() {
        let registry = ThemeRegistry::new();
        assert!(matches!(
            registry.state("nope"),
            Err(Error::UnknownTheme(_))
        ));
    }
}
