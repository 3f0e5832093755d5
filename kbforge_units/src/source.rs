//! Tab-separated raw source files.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use anyhow::Context;
use tracing::warn;

/// Calls `handle` with the line number and fields of every record in `path`
/// that has at least `fields` tab-separated fields. Blank lines and lines
/// starting with `#` are skipped, short records are logged and skipped.
/// Returns the number of records handled.
pub fn for_each_record<F>(path: &Path, fields: usize, mut handle: F) -> anyhow::Result<usize>
where
    F: FnMut(usize, &[&str]) -> anyhow::Result<()>,
{
    let file = File::open(path).with_context(|| format!("cannot open {}", path.display()))?;
    let mut handled = 0;
    for (index, line) in BufReader::new(file).lines().enumerate() {
        let line = line.with_context(|| format!("cannot read {}", path.display()))?;
        let line = line.trim_end_matches('\r');
        if line.trim().is_empty() || line.starts_with('#') {
            continue;
        }
        let record: Vec<&str> = line.splitn(fields, '\t').collect();
        if record.len() < fields {
            warn!(
                "{}:{}: expected {fields} fields, found {}",
                path.display(),
                index + 1,
                record.len()
            );
            continue;
        }
        handle(index + 1, &record)?;
        handled += 1;
    }
    Ok(handled)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[expect(clippy::expect_used, reason = "Test failure should panic with context")]
    fn test_short_records_and_comments_are_skipped() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("source.tsv");
        std::fs::write(&path, "# comment\nElvis\tsinger\n\nbroken\nPriscilla\tactress\twith tab\n")
            .expect("write");
        let mut seen = Vec::new();
        let handled = for_each_record(&path, 2, |line, record| {
            seen.push((line, record.join("|")));
            Ok(())
        })
        .expect("records");
        assert_eq!(handled, 2);
        assert_eq!(
            seen,
            vec![
                (2, "Elvis|singer".to_string()),
                (5, "Priscilla|actress\twith tab".to_string())
            ]
        );
    }
}
