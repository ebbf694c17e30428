//! Files staged for upload: acceptance filter, de-duplication by name, and
//! parsing of terminal drag-and-drop pastes.

use reqwest::Url;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingFile {
    pub name: String,
    pub mime: Option<String>,
    pub content: Vec<u8>,
}

impl PendingFile {
    pub fn new(name: impl Into<String>, mime: Option<&str>, content: impl Into<Vec<u8>>) -> Self {
        Self { name: name.into(), mime: mime.map(str::to_string), content: content.into() }
    }
}

/// Plain text by declared type, or anything named `*.txt`.
pub fn accepts(name: &str, mime: Option<&str>) -> bool {
    mime == Some("text/plain") || name.ends_with(".txt")
}

/// Declared type for a local file, from its extension.
pub fn mime_for(path: &Path) -> Option<&'static str> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("txt") | Some("text") => Some("text/plain"),
        _ => None,
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IntakeReport {
    pub added: Vec<String>,
    pub duplicates: Vec<String>,
    pub rejected: Vec<String>,
    /// Paths that passed the filter but could not be read.
    pub unreadable: Vec<(PathBuf, String)>,
}

/// Ordered set of pending files, unique by name. First arrival wins.
#[derive(Debug, Default)]
pub struct FileIntake {
    files: Vec<PendingFile>,
}

impl FileIntake {
    pub fn new() -> Self { Self::default() }

    pub fn files(&self) -> &[PendingFile] { &self.files }

    pub fn len(&self) -> usize { self.files.len() }

    pub fn is_empty(&self) -> bool { self.files.is_empty() }

    pub fn contains(&self, name: &str) -> bool {
        self.files.iter().any(|f| f.name == name)
    }

    fn offer_into(&mut self, file: PendingFile, report: &mut IntakeReport) {
        if !accepts(&file.name, file.mime.as_deref()) {
            report.rejected.push(file.name);
        } else if self.contains(&file.name) {
            report.duplicates.push(file.name);
        } else {
            report.added.push(file.name.clone());
            self.files.push(file);
        }
    }

    pub fn offer(&mut self, file: PendingFile) -> IntakeReport {
        let mut report = IntakeReport::default();
        self.offer_into(file, &mut report);
        report
    }

    pub fn add(&mut self, files: impl IntoIterator<Item = PendingFile>) -> IntakeReport {
        let mut report = IntakeReport::default();
        for f in files {
            self.offer_into(f, &mut report);
        }
        report
    }

    /// Stage local files. Rejected names are never read from disk.
    pub fn add_paths<P: AsRef<Path>>(&mut self, paths: &[P]) -> IntakeReport {
        let mut report = IntakeReport::default();
        for p in paths {
            let path = p.as_ref();
            let name = match path.file_name() {
                Some(n) => n.to_string_lossy().into_owned(),
                None => {
                    report.unreadable.push((path.to_path_buf(), "not a file".to_string()));
                    continue;
                }
            };
            let mime = mime_for(path);
            if !accepts(&name, mime) {
                report.rejected.push(name);
                continue;
            }
            if self.contains(&name) {
                report.duplicates.push(name);
                continue;
            }
            match fs::read(path) {
                Ok(content) => self.offer_into(PendingFile::new(name, mime, content), &mut report),
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "could not read file for upload");
                    report.unreadable.push((path.to_path_buf(), e.to_string()));
                }
            }
        }
        report
    }

    pub fn remove(&mut self, index: usize) -> Option<PendingFile> {
        (index < self.files.len()).then(|| self.files.remove(index))
    }

    pub fn clear(&mut self) { self.files.clear(); }

    pub fn upload_enabled(&self, collection_name: &str) -> bool {
        !self.files.is_empty() && !collection_name.trim().is_empty()
    }
}

/// `file://` URIs become local paths. A non-local host is dropped.
fn file_uri_path(token: &str) -> Option<PathBuf> {
    let url = Url::parse(token).ok()?;
    if let Ok(path) = url.to_file_path() {
        return Some(path);
    }
    let decoded = urlencoding::decode(url.path()).ok()?;
    Some(PathBuf::from(decoded.into_owned()))
}

fn finish_token(token: String, out: &mut Vec<PathBuf>) {
    if token.is_empty() { return; }
    if token.starts_with("file://") {
        match file_uri_path(&token) {
            Some(path) => out.push(path),
            None => tracing::warn!(uri = %token, "dropped file URI could not be parsed"),
        }
    } else {
        out.push(PathBuf::from(token));
    }
}

/// Split a pasted drop into paths.
///
/// Tokens are separated by whitespace; single or double quotes group, a
/// backslash escapes the next character, and `file://` URIs are decoded.
pub fn parse_dropped_paths(text: &str) -> Vec<PathBuf> {
    let mut out = Vec::new();
    let mut token = String::new();
    let mut quote: Option<char> = None;
    let mut started = false;
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), c) => token.push(c),
            (None, '\'') | (None, '"') => {
                quote = Some(c);
                started = true;
            }
            (None, '\\') => {
                if let Some(next) = chars.next() {
                    token.push(next);
                    started = true;
                }
            }
            (None, c) if c.is_whitespace() => {
                if started {
                    finish_token(std::mem::take(&mut token), &mut out);
                    started = false;
                }
            }
            (None, c) => {
                token.push(c);
                started = true;
            }
        }
    }
    if started {
        finish_token(token, &mut out);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(name: &str) -> PendingFile { PendingFile::new(name, Some("text/plain"), b"hello".to_vec()) }

    #[test]
    fn filter_by_type_or_extension() {
        assert!(accepts("notes.txt", None));
        assert!(accepts("notes", Some("text/plain")));
        assert!(accepts("README.md", Some("text/plain")));
        assert!(!accepts("paper.pdf", Some("application/pdf")));
        assert!(!accepts("NOTES.TXT", None));
    }

    #[test]
    fn duplicates_by_name_keep_first() {
        let mut intake = FileIntake::new();
        let first = intake.offer(text("a.txt"));
        assert_eq!(first.added, vec!["a.txt"]);
        let second = intake.offer(PendingFile::new("a.txt", None, b"other".to_vec()));
        assert_eq!(second.duplicates, vec!["a.txt"]);
        assert_eq!(intake.len(), 1);
        assert_eq!(intake.files()[0].content, b"hello");
    }

    #[test]
    fn mixed_batch_is_partitioned() {
        let mut intake = FileIntake::new();
        let report = intake.add(vec![
            text("a.txt"),
            PendingFile::new("b.pdf", Some("application/pdf"), vec![1, 2]),
            PendingFile::new("c.txt", None, vec![]),
            text("a.txt"),
        ]);
        assert_eq!(report.added, vec!["a.txt", "c.txt"]);
        assert_eq!(report.rejected, vec!["b.pdf"]);
        assert_eq!(report.duplicates, vec!["a.txt"]);
        let names: Vec<_> = intake.files().iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["a.txt", "c.txt"]);
    }

    #[test]
    fn remove_and_clear() {
        let mut intake = FileIntake::new();
        intake.add(vec![text("a.txt"), text("b.txt"), text("c.txt")]);
        assert_eq!(intake.remove(1).map(|f| f.name), Some("b.txt".to_string()));
        assert!(intake.remove(5).is_none());
        assert_eq!(intake.len(), 2);
        intake.clear();
        assert!(intake.is_empty());
    }

    #[test]
    fn upload_needs_files_and_a_name() {
        let names = ["", "   ", "\t", " \n ", "docs", " docs "];
        let mut intake = FileIntake::new();
        for name in names {
            assert!(!intake.upload_enabled(name), "no files, name {name:?}");
        }
        intake.offer(text("a.txt"));
        for name in names {
            let named = !name.trim().is_empty();
            assert_eq!(intake.upload_enabled(name), named, "one file, name {name:?}");
        }
        intake.clear();
        assert!(!intake.upload_enabled("docs"));
    }

    #[test]
    fn add_paths_reads_only_accepted_files() {
        let tmp = tempfile::tempdir().unwrap();
        let good = tmp.path().join("notes.txt");
        std::fs::write(&good, "some notes").unwrap();
        let missing_pdf = tmp.path().join("paper.pdf");
        let missing_txt = tmp.path().join("gone.txt");

        let mut intake = FileIntake::new();
        let report = intake.add_paths(&[good.clone(), missing_pdf, missing_txt.clone()]);
        assert_eq!(report.added, vec!["notes.txt"]);
        assert_eq!(report.rejected, vec!["paper.pdf"]);
        assert_eq!(report.unreadable.len(), 1);
        assert_eq!(report.unreadable[0].0, missing_txt);
        assert_eq!(intake.files()[0].mime.as_deref(), Some("text/plain"));
        assert_eq!(intake.files()[0].content, b"some notes");

        let again = intake.add_paths(&[good]);
        assert_eq!(again.duplicates, vec!["notes.txt"]);
    }

    #[test]
    fn dropped_paths_are_split_and_unescaped() {
        let paths = parse_dropped_paths("'/tmp/my notes.txt' /tmp/a\\ b.txt \"/x/y.txt\"\n");
        assert_eq!(paths, vec![
            PathBuf::from("/tmp/my notes.txt"),
            PathBuf::from("/tmp/a b.txt"),
            PathBuf::from("/x/y.txt"),
        ]);
        let uris = parse_dropped_paths("file:///home/u/My%20Doc.txt file://host/srv/x.txt");
        assert_eq!(uris, vec![PathBuf::from("/home/u/My Doc.txt"), PathBuf::from("/srv/x.txt")]);
        assert_eq!(parse_dropped_paths("file://localhost/tmp/caf%C3%A9.txt"), vec![PathBuf::from("/tmp/café.txt")]);
        assert!(parse_dropped_paths("   ").is_empty());
    }
}
