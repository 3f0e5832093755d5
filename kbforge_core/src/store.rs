//! Indexed in-memory fact collection.

use std::collections::HashMap;
use std::path::Path;
use std::sync::OnceLock;

use crate::component::{for_string, for_uri, is_literal, strip_quotes};
use crate::error::Result;
use crate::fact::Fact;
use crate::tsv::FactReader;
use crate::vocab::{EXTRACTION_SOURCE, EXTRACTION_TECHNIQUE, IS_PREFERRED_MEANING_OF};

/// Facts with set semantics over the triple, indexed by subject and relation.
///
/// Used as a unit's working memory and, once the backing theme is closed, as a
/// frozen dictionary shared between units.
#[derive(Debug, Default)]
pub struct FactStore {
    facts: Vec<Fact>,
    by_subject: HashMap<String, HashMap<String, Vec<usize>>>,
    by_relation: HashMap<String, Vec<usize>>,
    /// Explicit ids of dropped duplicates, pointing at the kept fact.
    aliases: HashMap<String, usize>,
    preferred_meanings: OnceLock<HashMap<String, String>>,
}

impl FactStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads a theme file into a new store.
    pub fn from_file(path: &Path) -> Result<Self> {
        let mut store = Self::new();
        store.load(FactReader::open(path)?)?;
        Ok(store)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.facts.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.facts.is_empty()
    }

    /// Facts in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Fact> {
        self.facts.iter()
    }

    /// Adds a fact. Returns false if the triple was already present.
    ///
    /// The first copy of a triple is kept with its id. A later copy carrying a
    /// different explicit id is dropped, but that id is recorded as an alias,
    /// so meta-facts written against it still resolve through
    /// [`Self::fact_by_id`] and [`Self::ids_of`].
    pub fn add(&mut self, fact: Fact) -> bool {
        let indices = self
            .by_subject
            .entry(fact.subject().to_string())
            .or_default()
            .entry(fact.relation().to_string())
            .or_default();
        if let Some(&kept) = indices
            .iter()
            .find(|&&i| self.facts[i].object() == fact.object())
        {
            if let Some(id) = fact.explicit_id().filter(|id| *id != self.facts[kept].id()) {
                self.aliases.entry(id.to_string()).or_insert(kept);
            }
            return false;
        }
        let index = self.facts.len();
        indices.push(index);
        self.by_relation
            .entry(fact.relation().to_string())
            .or_default()
            .push(index);
        self.facts.push(fact);
        self.preferred_meanings = OnceLock::new();
        true
    }

    /// The fact with this id, its own or an alias left by a dropped duplicate.
    #[must_use]
    pub fn fact_by_id(&self, id: &str) -> Option<&Fact> {
        if let Some(&index) = self.aliases.get(id) {
            return self.facts.get(index);
        }
        self.facts.iter().find(|fact| fact.id() == id)
    }

    fn index_of(&self, fact: &Fact) -> Option<usize> {
        self.by_subject
            .get(fact.subject())?
            .get(fact.relation())?
            .iter()
            .copied()
            .find(|&i| self.facts[i].object() == fact.object())
    }

    /// Every id under which meta-facts about `fact` may have been written,
    /// the kept id first.
    #[must_use]
    pub fn ids_of(&self, fact: &Fact) -> Vec<String> {
        let Some(kept) = self.index_of(fact) else {
            return Vec::new();
        };
        let mut aliases: Vec<String> = self
            .aliases
            .iter()
            .filter(|&(_, &index)| index == kept)
            .map(|(id, _)| id.clone())
            .collect();
        aliases.sort();
        let mut ids = vec![self.facts[kept].id()];
        ids.extend(aliases);
        ids
    }

    /// Adds a fact together with its source and technique meta-facts.
    pub fn add_with_provenance(&mut self, fact: Fact, source: &str, technique: &str) -> bool {
        let source = fact.meta_fact(EXTRACTION_SOURCE, for_uri(source));
        let technique = fact.meta_fact(EXTRACTION_TECHNIQUE, for_string(technique));
        let added = self.add(fact);
        self.add(source);
        self.add(technique);
        added
    }

    /// Adds every fact of `other`.
    pub fn merge(&mut self, other: &Self) -> usize {
        other
            .iter()
            .filter(|fact| self.add((*fact).clone()))
            .count()
    }

    /// Streams facts into the store. Returns how many were new.
    pub fn load<I>(&mut self, facts: I) -> Result<usize>
    where
        I: IntoIterator<Item = Result<Fact>>,
    {
        let mut added = 0;
        for fact in facts {
            if self.add(fact?) {
                added += 1;
            }
        }
        Ok(added)
    }

    #[must_use]
    pub fn contains(&self, fact: &Fact) -> bool {
        self.contains_triple(fact.subject(), fact.relation(), fact.object())
    }

    #[must_use]
    pub fn contains_triple(&self, subject: &str, relation: &str, object: &str) -> bool {
        self.indices(subject, relation)
            .iter()
            .any(|&i| self.facts[i].object() == object)
    }

    fn indices(&self, subject: &str, relation: &str) -> &[usize] {
        self.by_subject
            .get(subject)
            .and_then(|relations| relations.get(relation))
            .map_or(&[][..], Vec::as_slice)
    }

    /// Objects of `(subject, relation, ?)`, in insertion order.
    #[must_use]
    pub fn collect_objects(&self, subject: &str, relation: &str) -> Vec<&str> {
        self.indices(subject, relation)
            .iter()
            .map(|&i| self.facts[i].object())
            .collect()
    }

    /// Subjects of `(?, relation, object)`, in insertion order.
    #[must_use]
    pub fn collect_subjects(&self, relation: &str, object: &str) -> Vec<&str> {
        self.facts_with_relation(relation)
            .filter(|fact| fact.object() == object)
            .map(Fact::subject)
            .collect()
    }

    /// First object of `(subject, relation, ?)`.
    #[must_use]
    pub fn object(&self, subject: &str, relation: &str) -> Option<&str> {
        self.indices(subject, relation)
            .first()
            .map(|&i| self.facts[i].object())
    }

    #[must_use]
    pub fn facts_with_subject(&self, subject: &str) -> Vec<&Fact> {
        let mut indices: Vec<usize> = self
            .by_subject
            .get(subject)
            .map(|relations| relations.values().flatten().copied().collect())
            .unwrap_or_default();
        indices.sort_unstable();
        indices.into_iter().map(|i| &self.facts[i]).collect()
    }

    pub fn facts_with_relation(&self, relation: &str) -> impl Iterator<Item = &Fact> {
        self.by_relation
            .get(relation)
            .map_or(&[][..], Vec::as_slice)
            .iter()
            .map(|&i| &self.facts[i])
    }

    pub fn subjects(&self) -> impl Iterator<Item = &str> {
        self.by_subject.keys().map(String::as_str)
    }

    /// Object to subject over `relation`.
    ///
    /// When several subjects share an object, the one loaded last wins.
    #[must_use]
    pub fn reverse_map(&self, relation: &str) -> HashMap<String, String> {
        self.facts_with_relation(relation)
            .map(|fact| (fact.object().to_string(), fact.subject().to_string()))
            .collect()
    }

    /// Subject to object over `relation`. The last object loaded wins.
    #[must_use]
    pub fn dictionary(&self, relation: &str) -> HashMap<String, String> {
        self.facts_with_relation(relation)
            .map(|fact| (fact.subject().to_string(), fact.object().to_string()))
            .collect()
    }

    /// Name to class over `<isPreferredMeaningOf>`, with names unquoted.
    /// Computed once and kept until the next mutation.
    #[must_use]
    pub fn preferred_meanings(&self) -> &HashMap<String, String> {
        self.preferred_meanings.get_or_init(|| {
            self.facts_with_relation(IS_PREFERRED_MEANING_OF)
                .map(|fact| {
                    let name = if is_literal(fact.object()) {
                        strip_quotes(fact.object())
                    } else {
                        fact.object().to_string()
                    };
                    (name, fact.subject().to_string())
                })
                .collect()
        })
    }
}

impl Extend<Fact> for FactStore {
    fn extend<T: IntoIterator<Item = Fact>>(&mut self, iter: T) {
        for fact in iter {
            self.add(fact);
        }
    }
}

impl FromIterator<Fact> for FactStore {
    fn from_iter<T: IntoIterator<Item = Fact>>(iter: T) -> Self {
        let mut store = Self::new();
        store.extend(iter);
        store
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> FactStore {
        [
            Fact::new("<Elvis>", "rdf:type", "<wordnet_singer>"),
            Fact::new("<Elvis>", "rdf:type", "<wordnet_actor>"),
            Fact::new("<Elvis>", "<livesIn>", "<Memphis>"),
            Fact::new("<Priscilla>", "<livesIn>", "<Memphis>"),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_set_semantics() {
        let mut store = sample();
        assert_eq!(store.len(), 4);
        assert!(!store.add(Fact::new("<Elvis>", "rdf:type", "<wordnet_singer>")));
        assert!(!store.add(Fact::new("<Elvis>", "rdf:type", "<wordnet_singer>").with_id("<id_9>")));
        assert_eq!(store.len(), 4);
    }

    #[test]
    fn test_duplicate_keeps_first_id_and_records_alias() {
        let mut store = FactStore::new();
        let first = Fact::new("<Elvis>", "<bornIn>", "<Tupelo>").with_id("<id_1>");
        assert!(store.add(first.clone()));
        assert!(!store.add(Fact::new("<Elvis>", "<bornIn>", "<Tupelo>").with_id("<id_2>")));
        assert!(!store.add(Fact::new("<Elvis>", "<bornIn>", "<Tupelo>")));
        assert_eq!(store.len(), 1);

        let kept = store.iter().next().map(Fact::id);
        assert_eq!(kept.as_deref(), Some("<id_1>"));
        assert_eq!(store.fact_by_id("<id_2>"), Some(&first));
        assert_eq!(store.fact_by_id("<id_1>"), Some(&first));
        assert_eq!(store.fact_by_id("<id_3>"), None);
        assert_eq!(store.ids_of(&first), vec!["<id_1>", "<id_2>"]);

        let meta = Fact::new("<id_2>", EXTRACTION_SOURCE, "<http://example.org>");
        let linked = store.fact_by_id(meta.subject()).map(Fact::object);
        assert_eq!(linked, Some("<Tupelo>"));
    }

    #[test]
    fn test_lookups() {
        let store = sample();
        assert_eq!(
            store.collect_objects("<Elvis>", "rdf:type"),
            vec!["<wordnet_singer>", "<wordnet_actor>"]
        );
        assert!(store.collect_objects("<Nobody>", "rdf:type").is_empty());
        assert_eq!(
            store.collect_subjects("<livesIn>", "<Memphis>"),
            vec!["<Elvis>", "<Priscilla>"]
        );
        assert!(store.collect_subjects("<livesIn>", "<Paris>").is_empty());
        assert_eq!(store.object("<Elvis>", "<livesIn>"), Some("<Memphis>"));
        assert_eq!(store.facts_with_subject("<Elvis>").len(), 3);
        assert!(store.contains_triple("<Priscilla>", "<livesIn>", "<Memphis>"));
    }

    #[test]
    fn test_reverse_map_keeps_last_subject() {
        // Two subjects share <Memphis>: the later one is kept.
        let store = sample();
        let reverse = store.reverse_map("<livesIn>");
        assert_eq!(reverse.len(), 1);
        assert_eq!(reverse.get("<Memphis>").map(String::as_str), Some("<Priscilla>"));
    }

    #[test]
    fn test_preferred_meanings_reset_on_add() {
        let mut store = FactStore::new();
        store.add(Fact::new("<wordnet_dog>", IS_PREFERRED_MEANING_OF, "\"dog\""));
        assert_eq!(
            store.preferred_meanings().get("dog").map(String::as_str),
            Some("<wordnet_dog>")
        );
        store.add(Fact::new("<wordnet_cat>", IS_PREFERRED_MEANING_OF, "\"cat\""));
        assert_eq!(store.preferred_meanings().len(), 2);
    }

    #[test]
    fn test_provenance_meta_facts() {
        let mut store = FactStore::new();
        let fact = Fact::new("<Elvis>", "<livesIn>", "<Memphis>");
        assert!(store.add_with_provenance(fact.clone(), "http://example.org/Elvis", "infobox"));
        assert_eq!(store.len(), 3);
        assert_eq!(
            store.object(&fact.id(), EXTRACTION_TECHNIQUE),
            Some("\"infobox\"")
        );
    }

    #[test]
    fn test_merge() {
        let mut store = sample();
        let other: FactStore = [
            Fact::new("<Elvis>", "<livesIn>", "<Memphis>"),
            Fact::new("<Lisa>", "<livesIn>", "<Memphis>"),
        ]
        .into_iter()
        .collect();
        assert_eq!(store.merge(&other), 1);
        assert_eq!(store.len(), 5);
    }
}
