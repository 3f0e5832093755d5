use std::cmp::Ordering;
use std::fmt::{self, Write as _};
use std::hash::{Hash, Hasher};

use sha2::{Digest, Sha256};

/// A subject-relation-object statement over canonical tokens.
///
/// Equality, hashing and ordering look at the triple only. The optional id is
/// carried along so that meta-facts written by another source keep pointing
/// at the same statement; when absent, [`Fact::id`] derives one from the
/// triple.
#[derive(Debug, Clone)]
pub struct Fact {
    id: Option<String>,
    subject: String,
    relation: String,
    object: String,
}

impl Fact {
    #[must_use]
    pub fn new(
        subject: impl Into<String>,
        relation: impl Into<String>,
        object: impl Into<String>,
    ) -> Self {
        Self {
            id: None,
            subject: subject.into(),
            relation: relation.into(),
            object: object.into(),
        }
    }

    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    #[must_use]
    pub fn subject(&self) -> &str {
        &self.subject
    }

    #[must_use]
    pub fn relation(&self) -> &str {
        &self.relation
    }

    #[must_use]
    pub fn object(&self) -> &str {
        &self.object
    }

    #[must_use]
    pub fn explicit_id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// The fact id, explicit or derived from the triple as `<id_…>`.
    #[must_use]
    pub fn id(&self) -> String {
        if let Some(id) = &self.id {
            return id.clone();
        }
        let mut hasher = Sha256::new();
        hasher.update(self.subject.as_bytes());
        hasher.update([0]);
        hasher.update(self.relation.as_bytes());
        hasher.update([0]);
        hasher.update(self.object.as_bytes());
        let digest = hasher.finalize();

        let mut id = String::from("<id_");
        for byte in digest.iter().take(10) {
            let _ = write!(id, "{byte:02x}");
        }
        id.push('>');
        id
    }

    /// Builds a meta-fact about this fact: `(id(self), relation, object)`.
    #[must_use]
    pub fn meta_fact(&self, relation: impl Into<String>, object: impl Into<String>) -> Self {
        Self::new(self.id(), relation, object)
    }

    /// Formats the fact as a TSV record: `id`, subject, relation, object.
    #[must_use]
    pub fn to_tsv_line(&self) -> String {
        format!(
            "{}\t{}\t{}\t{}",
            self.id.as_deref().unwrap_or(""),
            self.subject,
            self.relation,
            self.object
        )
    }

    /// Parses a TSV record with three (`s r o`) or four (`id s r o`) fields.
    pub fn from_tsv_line(line: &str) -> Result<Self, String> {
        let fields: Vec<&str> = line.split('\t').collect();
        match fields.as_slice() {
            [subject, relation, object] => Ok(Self::new(*subject, *relation, *object)),
            [id, subject, relation, object] => {
                let fact = Self::new(*subject, *relation, *object);
                Ok(if id.is_empty() { fact } else { fact.with_id(*id) })
            }
            _ => Err(format!(
                "expected 3 or 4 tab-separated fields, found {}",
                fields.len()
            )),
        }
    }

    fn key(&self) -> (&str, &str, &str) {
        (&self.subject, &self.relation, &self.object)
    }
}

impl PartialEq for Fact {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for Fact {}

impl Hash for Fact {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

impl PartialOrd for Fact {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Fact {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key().cmp(&other.key())
    }
}

impl fmt::Display for Fact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.subject, self.relation, self.object)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equality_ignores_id() {
        let a = Fact::new("<A>", "<r>", "<B>");
        let b = Fact::new("<A>", "<r>", "<B>").with_id("<id_x>");
        assert_eq!(a, b);
        assert_ne!(a, Fact::new("<A>", "<r>", "<C>"));
    }

    #[test]
    fn test_derived_id_is_stable() {
        let a = Fact::new("<A>", "<r>", "<B>");
        let b = Fact::new("<A>", "<r>", "<B>");
        assert_eq!(a.id(), b.id());
        assert!(a.id().starts_with("<id_"));
        assert_ne!(a.id(), Fact::new("<A>", "<r>", "<C>").id());
        assert_eq!(a.clone().with_id("<id_1>").id(), "<id_1>");
    }

    #[test]
    fn test_meta_fact_points_at_fact() {
        let fact = Fact::new("<A>", "<r>", "<B>");
        let meta = fact.meta_fact("<extractionSource>", "<http://x>");
        assert_eq!(meta.subject(), fact.id());
    }

    #[test]
    fn test_tsv_lines() {
        let fact = Fact::new("<A>", "<r>", "\"x y\"");
        let parsed = Fact::from_tsv_line(&fact.to_tsv_line());
        assert_eq!(parsed, Ok(fact));

        let with_id = Fact::from_tsv_line("<id_1>\t<A>\t<r>\t<B>");
        assert_eq!(
            with_id.map(|f| f.explicit_id().map(str::to_string)),
            Ok(Some("<id_1>".to_string()))
        );

        assert!(Fact::from_tsv_line("<A>\t<r>").is_err());
    }
}
