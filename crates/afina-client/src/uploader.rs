//! Collection-name field, generator choice, and per-collection upload status lines.

use afina_types::GeneratorType;

pub const UPLOADING: &str = "Uploading...";
pub const UPLOAD_FAILED: &str = "Upload failed";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct AttemptId(pub u64);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadState {
    InProgress,
    Succeeded(String),
    Failed(String),
}

impl UploadState {
    pub fn text(&self) -> &str {
        match self {
            UploadState::InProgress => UPLOADING,
            UploadState::Succeeded(m) | UploadState::Failed(m) => m,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusLine {
    pub collection: String,
    pub attempt: AttemptId,
    pub state: UploadState,
}

impl StatusLine {
    /// Quoted collection name, as shown at the start of the line.
    pub fn label(&self) -> String { format!("\"{}\"", self.collection) }
}

#[derive(Debug, Default)]
pub struct Uploader {
    collection_name: String,
    generator: GeneratorType,
    lines: Vec<StatusLine>,
    next_attempt: u64,
}

impl Uploader {
    pub fn new() -> Self { Self::default() }

    pub fn collection_name(&self) -> &str { &self.collection_name }

    pub fn set_collection_name(&mut self, name: impl Into<String>) { self.collection_name = name.into(); }

    pub fn type_char(&mut self, c: char) { self.collection_name.push(c); }

    pub fn backspace(&mut self) { self.collection_name.pop(); }

    pub fn generator(&self) -> GeneratorType { self.generator }

    pub fn toggle_generator(&mut self) { self.generator = self.generator.toggled(); }

    pub fn lines(&self) -> &[StatusLine] { &self.lines }

    pub fn line(&self, collection: &str) -> Option<&StatusLine> {
        self.lines.iter().find(|l| l.collection == collection)
    }

    /// Start a new attempt for `collection`, reusing its line if one exists.
    pub fn begin(&mut self, collection: &str) -> AttemptId {
        let attempt = AttemptId(self.next_attempt);
        self.next_attempt += 1;
        match self.lines.iter_mut().find(|l| l.collection == collection) {
            Some(line) => {
                line.attempt = attempt;
                line.state = UploadState::InProgress;
            }
            None => self.lines.push(StatusLine {
                collection: collection.to_string(),
                attempt,
                state: UploadState::InProgress,
            }),
        }
        attempt
    }

    /// Record the outcome of `attempt`. Returns `false` when a newer attempt owns the line.
    pub fn finish(&mut self, collection: &str, attempt: AttemptId, state: UploadState) -> bool {
        match self.lines.iter_mut().find(|l| l.collection == collection) {
            Some(line) if line.attempt == attempt => {
                line.state = state;
                true
            }
            _ => {
                tracing::info!(collection, attempt = attempt.0, "stale upload result ignored");
                false
            }
        }
    }
}
