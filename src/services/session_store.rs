// src/services/session_store.rs
use std::path::{Path, PathBuf};

use chrono::Local;
use log::{debug, info};
use serde::Serialize;

use crate::errors::DesignerError;

pub const ORIGINAL_DIR: &str = "original";
pub const GENERATED_DIR: &str = "generated";
pub const MARKDOWN_REPORT: &str = "report.md";
pub const PDF_REPORT: &str = "report.pdf";
const UPLOADS_DIR: &str = ".uploads";

/// Directory for one pipeline run.
#[derive(Debug, Clone)]
pub struct Session {
    pub id: String,
    pub dir: PathBuf,
}

impl Session {
    pub fn original_dir(&self) -> PathBuf {
        self.dir.join(ORIGINAL_DIR)
    }

    pub fn generated_dir(&self) -> PathBuf {
        self.dir.join(GENERATED_DIR)
    }

    pub fn markdown_path(&self) -> PathBuf {
        self.dir.join(MARKDOWN_REPORT)
    }

    pub fn pdf_path(&self) -> PathBuf {
        self.dir.join(PDF_REPORT)
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct SessionSummary {
    pub session_id: String,
    pub has_markdown: bool,
    pub has_pdf: bool,
    pub generated_images: usize,
}

pub struct SessionStore {
    root: PathBuf,
}

impl SessionStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create `<root>/<YYYYMMDD_HHMMSS>/{original,generated}`. A numeric
    /// suffix is added when a run already claimed the same second.
    pub fn create_session(&self) -> Result<Session, DesignerError> {
        std::fs::create_dir_all(&self.root)?;

        let stamp = Local::now().format("%Y%m%d_%H%M%S").to_string();
        let mut id = stamp.clone();
        let mut attempt = 1;
        let dir = loop {
            let candidate = self.root.join(&id);
            match std::fs::create_dir(&candidate) {
                Ok(()) => break candidate,
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                    attempt += 1;
                    id = format!("{}_{}", stamp, attempt);
                }
                Err(e) => return Err(e.into()),
            }
        };

        let session = Session { id, dir };
        std::fs::create_dir_all(session.original_dir())?;
        std::fs::create_dir_all(session.generated_dir())?;

        info!("Created session {} at {}", session.id, session.dir.display());
        Ok(session)
    }

    /// Copy the input images into `original/`, keeping input order. Name
    /// clashes get an index prefix so every input keeps its own copy.
    pub fn stage_originals(
        &self,
        session: &Session,
        images: &[PathBuf],
    ) -> Result<Vec<PathBuf>, DesignerError> {
        let original_dir = session.original_dir();
        let mut staged = Vec::with_capacity(images.len());

        for (index, source) in images.iter().enumerate() {
            let file_name = source
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .ok_or_else(|| {
                    DesignerError::Validation(format!("Not an image file path: {}", source.display()))
                })?;

            let mut target = original_dir.join(&file_name);
            if staged.contains(&target) {
                target = original_dir.join(format!("{}_{}", index + 1, file_name));
            }

            std::fs::copy(source, &target).map_err(|e| {
                DesignerError::Storage(format!("Failed to copy {}: {}", source.display(), e))
            })?;
            debug!("Staged {} -> {}", source.display(), target.display());
            staged.push(target);
        }

        Ok(staged)
    }

    /// Scratch directory for HTTP uploads before they join a session.
    pub fn upload_staging_dir(&self) -> Result<PathBuf, DesignerError> {
        let dir = self
            .root
            .join(UPLOADS_DIR)
            .join(uuid::Uuid::new_v4().to_string());
        std::fs::create_dir_all(&dir)?;
        Ok(dir)
    }

    /// Sessions found under the root, newest first.
    pub fn list_sessions(&self) -> Result<Vec<SessionSummary>, DesignerError> {
        let entries = match std::fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut sessions = Vec::new();
        for entry in entries {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().into_owned();
            if !entry.file_type()?.is_dir() || !is_session_id(&name) {
                continue;
            }

            let dir = entry.path();
            let generated_images = std::fs::read_dir(dir.join(GENERATED_DIR))
                .map(|it| it.filter_map(Result::ok).count())
                .unwrap_or(0);

            sessions.push(SessionSummary {
                has_markdown: dir.join(MARKDOWN_REPORT).is_file(),
                has_pdf: dir.join(PDF_REPORT).is_file(),
                generated_images,
                session_id: name,
            });
        }

        sessions.sort_by(|a, b| b.session_id.cmp(&a.session_id));
        Ok(sessions)
    }
}

/// `YYYYMMDD_HHMMSS` with an optional `_N` suffix.
fn is_session_id(name: &str) -> bool {
    let mut parts = name.split('_');
    let date = parts.next().unwrap_or_default();
    let time = parts.next().unwrap_or_default();
    let suffix_ok = parts.next().is_none_or(|s| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()));

    date.len() == 8
        && time.len() == 6
        && date.bytes().chain(time.bytes()).all(|b| b.is_ascii_digit())
        && suffix_ok
        && parts.next().is_none()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_has_expected_layout() {
        let root = tempfile::tempdir().unwrap();
        let store = SessionStore::new(root.path());
        let session = store.create_session().unwrap();

        assert!(is_session_id(&session.id), "bad id {}", session.id);
        assert!(session.original_dir().is_dir());
        assert!(session.generated_dir().is_dir());
        assert_eq!(session.markdown_path(), session.dir.join("report.md"));
    }

    #[test]
    fn sessions_in_the_same_second_get_distinct_ids() {
        let root = tempfile::tempdir().unwrap();
        let store = SessionStore::new(root.path());
        let ids: Vec<String> = (0..3).map(|_| store.create_session().unwrap().id).collect();

        assert_ne!(ids[0], ids[1]);
        assert_ne!(ids[1], ids[2]);
        assert_ne!(ids[0], ids[2]);
    }

    #[test]
    fn originals_are_copied_in_order() {
        let root = tempfile::tempdir().unwrap();
        let inputs = tempfile::tempdir().unwrap();
        let a = inputs.path().join("kitchen.jpg");
        let sub = inputs.path().join("other");
        std::fs::create_dir(&sub).unwrap();
        let b = sub.join("kitchen.jpg");
        std::fs::write(&a, b"a").unwrap();
        std::fs::write(&b, b"b").unwrap();

        let store = SessionStore::new(root.path());
        let session = store.create_session().unwrap();
        let staged = store.stage_originals(&session, &[a, b]).unwrap();

        assert_eq!(staged[0], session.original_dir().join("kitchen.jpg"));
        assert_eq!(staged[1], session.original_dir().join("2_kitchen.jpg"));
        assert_eq!(std::fs::read(&staged[1]).unwrap(), b"b");
    }

    #[test]
    fn missing_input_is_a_storage_error() {
        let root = tempfile::tempdir().unwrap();
        let store = SessionStore::new(root.path());
        let session = store.create_session().unwrap();
        let err = store
            .stage_originals(&session, &[root.path().join("nope.jpg")])
            .unwrap_err();
        assert!(matches!(err, DesignerError::Storage(_)));
    }

    #[test]
    fn listing_skips_non_session_directories() {
        let root = tempfile::tempdir().unwrap();
        let store = SessionStore::new(root.path());
        let session = store.create_session().unwrap();
        std::fs::write(session.markdown_path(), "# report").unwrap();
        let staging = store.upload_staging_dir().unwrap();
        assert!(staging.starts_with(store.root().join(UPLOADS_DIR)));
        std::fs::create_dir(root.path().join("notes")).unwrap();

        let sessions = store.list_sessions().unwrap();
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].session_id, session.id);
        assert!(sessions[0].has_markdown);
        assert!(!sessions[0].has_pdf);
    }

    #[test]
    fn listing_a_missing_root_is_empty() {
        let root = tempfile::tempdir().unwrap();
        let store = SessionStore::new(root.path().join("never-created"));
        assert!(store.list_sessions().unwrap().is_empty());
    }

    #[test]
    fn session_id_format() {
        assert!(is_session_id("20240101_120000"));
        assert!(is_session_id("20240101_120000_2"));
        assert!(!is_session_id("20240101"));
        assert!(!is_session_id("2024010a_120000"));
        assert!(!is_session_id("20240101_120000_"));
    }
}
