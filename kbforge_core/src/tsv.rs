//! Theme artifacts on disk.
//!
//! One fact per line, tab separated (`id`, subject, relation, object). The
//! file starts with a block of `#` comment lines holding the run header, the
//! theme description and its group, and ends with a trailer line telling
//! whether the producing unit finished.

use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Lines, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::fact::Fact;
use crate::theme::ThemeGroup;

const DESCRIPTION_PREFIX: &str = "# description: ";
const GROUP_PREFIX: &str = "# group: ";
const END_PREFIX: &str = "# end of file ";
const INCOMPLETE_PREFIX: &str = "# incomplete: ";

/// How a theme file was closed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completion {
    Complete,
    Failed(String),
}

/// Header fields recorded at the top of a theme file.
#[derive(Debug, Clone, Default)]
pub struct HeaderBlock<'a> {
    pub run_header: &'a str,
    pub description: &'a str,
    pub group: Option<ThemeGroup>,
}

pub struct FactWriter {
    name: String,
    path: PathBuf,
    out: BufWriter<File>,
    count: usize,
}

impl FactWriter {
    /// Creates (or truncates) the file for theme `name` and writes the header.
    pub fn create(path: &Path, name: &str, header: &HeaderBlock<'_>) -> Result<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut out = BufWriter::new(File::create(path)?);
        for line in header.run_header.lines() {
            writeln!(out, "# {line}")?;
        }
        writeln!(out, "{DESCRIPTION_PREFIX}{}", header.description.replace('\n', " "))?;
        if let Some(group) = header.group {
            writeln!(out, "{GROUP_PREFIX}{}", group.as_str())?;
        }
        writeln!(out)?;
        Ok(Self {
            name: name.to_string(),
            path: path.to_path_buf(),
            out,
            count: 0,
        })
    }

    pub fn write(&mut self, fact: &Fact) -> Result<()> {
        writeln!(self.out, "{}", fact.to_tsv_line())?;
        self.count += 1;
        Ok(())
    }

    #[must_use]
    pub const fn count(&self) -> usize {
        self.count
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes the trailer and flushes. Returns the number of facts written.
    pub fn finish(mut self, completion: &Completion) -> Result<usize> {
        writeln!(self.out)?;
        match completion {
            Completion::Complete => writeln!(self.out, "{END_PREFIX}{}", self.name)?,
            Completion::Failed(reason) => {
                writeln!(self.out, "{INCOMPLETE_PREFIX}{}", reason.replace('\n', " "))?;
            }
        }
        self.out.flush()?;
        Ok(self.count)
    }
}

/// Sequential reader over the facts of a theme file. Comment and blank lines
/// are skipped.
pub struct FactReader {
    path: PathBuf,
    lines: Lines<BufReader<File>>,
    line: usize,
}

impl FactReader {
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            lines: BufReader::new(file).lines(),
            line: 0,
        })
    }
}

impl Iterator for FactReader {
    type Item = Result<Fact>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let line = match self.lines.next()? {
                Ok(line) => line,
                Err(e) => return Some(Err(Error::Io(e))),
            };
            self.line += 1;
            if line.trim().is_empty() || line.starts_with('#') {
                continue;
            }
            return Some(Fact::from_tsv_line(&line).map_err(|reason| Error::MalformedRecord {
                path: self.path.clone(),
                line: self.line,
                reason,
            }));
        }
    }
}

/// What [`read_header`] recovers from a theme file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ThemeHeader {
    pub run_header: Vec<String>,
    pub description: Option<String>,
    pub group: Option<ThemeGroup>,
    pub complete: bool,
}

/// Reads the header block and the trailer of a theme file.
pub fn read_header(path: &Path) -> Result<ThemeHeader> {
    let mut header = ThemeHeader::default();
    let mut file = File::open(path)?;
    for line in BufReader::new(&mut file).lines() {
        let line = line?;
        let Some(comment) = line.strip_prefix('#') else {
            break;
        };
        if let Some(description) = line.strip_prefix(DESCRIPTION_PREFIX) {
            header.description = Some(description.to_string());
        } else if let Some(group) = line.strip_prefix(GROUP_PREFIX) {
            header.group = group.parse().ok();
        } else {
            header.run_header.push(comment.trim_start().to_string());
        }
    }
    header.complete = last_line(&mut file)?.is_some_and(|line| line.starts_with(END_PREFIX));
    Ok(header)
}

fn last_line(file: &mut File) -> Result<Option<String>> {
    const TAIL: u64 = 4096;
    let len = file.metadata()?.len();
    file.seek(SeekFrom::Start(len.saturating_sub(TAIL)))?;
    let mut tail = Vec::new();
    file.read_to_end(&mut tail)?;
    let tail = String::from_utf8_lossy(&tail);
    Ok(tail
        .lines()
        .rev()
        .find(|line| !line.trim().is_empty())
        .map(str::to_string))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[expect(clippy::expect_used, reason = "Test failure should panic with context")]
    fn test_write_then_read() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("people.tsv");
        let header = HeaderBlock {
            run_header: "run 1\nstarted today",
            description: "People and their birth dates",
            group: Some(ThemeGroup::Core),
        };

        let mut writer = FactWriter::create(&path, "people", &header).expect("create");
        writer
            .write(&Fact::new("<Elvis>", "<wasBornOnDate>", "\"1935-01-08\"^^xsd:date"))
            .expect("write");
        writer
            .write(&Fact::new("<Elvis>", "rdf:type", "<wordnet_singer>").with_id("<id_1>"))
            .expect("write");
        assert_eq!(writer.finish(&Completion::Complete).expect("finish"), 2);

        let facts: Vec<Fact> = FactReader::open(&path)
            .expect("open")
            .collect::<Result<_>>()
            .expect("read");
        assert_eq!(facts.len(), 2);
        assert_eq!(facts[1].explicit_id(), Some("<id_1>"));

        let header = read_header(&path).expect("header");
        assert_eq!(header.run_header, vec!["run 1", "started today"]);
        assert_eq!(
            header.description.as_deref(),
            Some("People and their birth dates")
        );
        assert_eq!(header.group, Some(ThemeGroup::Core));
        assert!(header.complete);
    }

    #[test]
    #[expect(clippy::expect_used, reason = "Test failure should panic with context")]
    fn test_failed_file_is_not_complete() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("broken.tsv");
        let writer = FactWriter::create(&path, "broken", &HeaderBlock::default()).expect("create");
        writer
            .finish(&Completion::Failed("source missing".to_string()))
            .expect("finish");
        assert!(!read_header(&path).expect("header").complete);
    }

    #[test]
    #[expect(clippy::expect_used, reason = "Test failure should panic with context")]
    fn test_malformed_record_reports_line() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("bad.tsv");
        fs::write(&path, "# header\n<A>\t<r>\t<B>\nnot a fact\n").expect("write");
        let results: Vec<Result<Fact>> = FactReader::open(&path).expect("open").collect();
        assert!(results[0].is_ok());
        assert!(matches!(
            results[1],
            Err(Error::MalformedRecord { line: 3, .. })
        ));
    }
}
