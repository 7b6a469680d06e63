// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! File intake: decides which candidate files may be uploaded
//!
//! Mixed batches are partially accepted. Unsupported files are dropped and
//! reported; the call only fails when nothing supported remains.

use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::error::ValidationError;
use crate::model::{FileBatch, FileKind, SelectedFile};
use crate::Result;

/// Extension → (kind, MIME type sent with the upload)
const ACCEPTED_EXTENSIONS: &[(&str, FileKind, &str)] = &[
    ("pdf", FileKind::Document, "application/pdf"),
    ("mp4", FileKind::Video, "video/mp4"),
    ("avi", FileKind::Video, "video/x-msvideo"),
    ("mov", FileKind::Video, "video/quicktime"),
    ("mkv", FileKind::Video, "video/x-matroska"),
    ("webm", FileKind::Video, "video/webm"),
    ("mp3", FileKind::Audio, "audio/mpeg"),
    ("wav", FileKind::Audio, "audio/wav"),
    ("m4a", FileKind::Audio, "audio/mp4"),
    ("aac", FileKind::Audio, "audio/aac"),
    ("ogg", FileKind::Audio, "audio/ogg"),
    ("txt", FileKind::Text, "text/plain"),
];

/// A file offered by the user, not yet validated
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateFile {
    pub name: String,
    pub path: PathBuf,
    pub size: u64,
    /// MIME type declared by whoever offered the file, if any
    pub mime: Option<String>,
}

impl CandidateFile {
    pub fn new(path: impl Into<PathBuf>, size: u64, mime: Option<String>) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.to_string_lossy().into_owned());
        Self { name, path, size, mime }
    }

    /// Build a candidate from a file on disk
    pub fn from_path(path: &Path) -> Result<Self> {
        let metadata = std::fs::metadata(path)?;
        Ok(Self::new(path, metadata.len(), None))
    }
}

/// Outcome of a successful validation
#[derive(Debug, Clone, PartialEq)]
pub struct Intake {
    pub batch: FileBatch,
    /// One `UnsupportedType` per dropped file, in input order
    pub rejected: Vec<ValidationError>,
}

/// Work out the kind and upload MIME type of a file, if it is accepted
pub fn classify(name: &str, declared_mime: Option<&str>) -> Option<(FileKind, String)> {
    let declared = declared_mime
        .map(|m| m.trim().to_ascii_lowercase())
        .filter(|m| !m.is_empty());

    let extension = Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    if let Some(ext) = extension {
        if let Some((_, kind, mime)) = ACCEPTED_EXTENSIONS.iter().find(|(e, _, _)| *e == ext) {
            let mime = match declared {
                Some(d) if kind_for_mime(&d) == Some(*kind) => d,
                _ => mime.to_string(),
            };
            return Some((*kind, mime));
        }
    }

    let declared = declared?;
    kind_for_mime(&declared).map(|kind| (kind, declared))
}

fn kind_for_mime(mime: &str) -> Option<FileKind> {
    if mime == "application/pdf" {
        Some(FileKind::Document)
    } else if mime.starts_with("video/") {
        Some(FileKind::Video)
    } else if mime.starts_with("audio/") {
        Some(FileKind::Audio)
    } else if mime.starts_with("text/") {
        Some(FileKind::Text)
    } else {
        None
    }
}

/// Validate a set of candidates into an uploadable batch
pub fn validate<I>(candidates: I) -> std::result::Result<Intake, ValidationError>
where
    I: IntoIterator<Item = CandidateFile>,
{
    let mut accepted = Vec::new();
    let mut rejected = Vec::new();

    for candidate in candidates {
        match classify(&candidate.name, candidate.mime.as_deref()) {
            Some((kind, mime)) => {
                debug!("Accepted {} as {:?} ({})", candidate.name, kind, mime);
                accepted.push(SelectedFile {
                    name: candidate.name,
                    path: candidate.path,
                    size: candidate.size,
                    kind,
                    mime,
                });
            }
            None => {
                warn!("Skipping unsupported file: {}", candidate.name);
                rejected.push(ValidationError::UnsupportedType {
                    file_name: candidate.name,
                });
            }
        }
    }

    let batch = FileBatch::new(accepted).ok_or(ValidationError::EmptyBatch)?;
    Ok(Intake { batch, rejected })
}

/// OS bookkeeping files that are never news
const JUNK_NAMES: &[&str] = &["desktop.ini", "thumbs.db"];

/// Extensions of downloads or copies still in progress
const PARTIAL_EXTENSIONS: &[&str] = &["tmp", "part", "partial", "crdownload", "download"];

/// Whether a path is worth offering at all.
///
/// Hidden entries, office lock files (`~$report.docx`), partial downloads
/// and OS junk are not.
pub fn should_consider(path: &Path) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    let name = name.to_ascii_lowercase();

    let partial = Path::new(&name)
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| PARTIAL_EXTENSIONS.contains(&e));

    !(name.starts_with('.') || name.starts_with("~$") || partial || JUNK_NAMES.contains(&name.as_str()))
}

/// Expand command-line arguments (files, directories, glob patterns) into candidates.
///
/// Order follows the arguments; within a directory or pattern, paths are
/// sorted so repeated runs upload in the same order. A file reached twice,
/// through a repeated argument or a symlink, is uploaded once.
pub fn expand_paths(args: &[String], recursive: bool) -> Result<Vec<CandidateFile>> {
    let mut paths: Vec<PathBuf> = Vec::new();

    for arg in args {
        let literal = PathBuf::from(arg);

        // `report [final].pdf` is a file name, not a pattern
        if !literal.exists() && arg.contains(['*', '?', '[']) {
            let mut matched: Vec<PathBuf> = glob::glob(arg)?.filter_map(|p| p.ok()).collect();
            matched.sort();
            if matched.is_empty() {
                warn!("Pattern matched no files: {}", arg);
            }
            for path in matched {
                collect(&path, recursive, &mut paths);
            }
        } else if literal.exists() {
            collect(&literal, recursive, &mut paths);
        } else {
            return Err(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("{} does not exist", literal.display()),
            )
            .into());
        }
    }

    let mut seen = std::collections::HashSet::new();
    paths.retain(|p| seen.insert(std::fs::canonicalize(p).unwrap_or_else(|_| p.clone())));

    paths.iter().map(|p| CandidateFile::from_path(p)).collect()
}

/// Add a file, or the files under a directory. Directory symlinks are not
/// descended, so a link back to an ancestor cannot loop.
fn collect(path: &Path, recursive: bool, out: &mut Vec<PathBuf>) {
    if path.is_file() {
        if should_consider(path) {
            out.push(path.to_path_buf());
        } else {
            debug!("Ignoring {:?}", path);
        }
        return;
    }

    let walker = WalkDir::new(path)
        .follow_links(false)
        .min_depth(1)
        .max_depth(if recursive { usize::MAX } else { 1 })
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || should_consider(e.path()));

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Skipping unreadable entry: {}", e);
                continue;
            }
        };

        // A symlink to a file counts as that file
        let is_file = entry.file_type().is_file() || (entry.path_is_symlink() && entry.path().is_file());
        if is_file {
            out.push(entry.into_path());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn candidate(name: &str) -> CandidateFile {
        CandidateFile::new(name, 1024, None)
    }

    #[test]
    fn test_classify_by_extension() {
        assert_eq!(classify("report.PDF", None), Some((FileKind::Document, "application/pdf".into())));
        assert_eq!(classify("clip.mkv", None), Some((FileKind::Video, "video/x-matroska".into())));
        assert_eq!(classify("memo.m4a", None), Some((FileKind::Audio, "audio/mp4".into())));
        assert_eq!(classify("notes.txt", None), Some((FileKind::Text, "text/plain".into())));
        assert_eq!(classify("photo.jpg", None), None);
        assert_eq!(classify("README", None), None);
    }

    #[test]
    fn test_classify_falls_back_to_declared_mime() {
        assert_eq!(
            classify("stream.bin", Some("Video/MP2T")),
            Some((FileKind::Video, "video/mp2t".into()))
        );
        assert_eq!(classify("blob", Some("application/octet-stream")), None);
        // A declared type that contradicts the extension is ignored
        assert_eq!(
            classify("paper.pdf", Some("text/html")),
            Some((FileKind::Document, "application/pdf".into()))
        );
    }

    #[test]
    fn test_mixed_batch_drops_only_unsupported() {
        let intake = validate(vec![
            candidate("a.pdf"),
            candidate("b.exe"),
            candidate("c.mp3"),
            candidate("d.png"),
        ])
        .unwrap();

        let names: Vec<&str> = intake.batch.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["a.pdf", "c.mp3"]);
        assert_eq!(
            intake.rejected,
            vec![
                ValidationError::UnsupportedType { file_name: "b.exe".into() },
                ValidationError::UnsupportedType { file_name: "d.png".into() },
            ]
        );
    }

    #[test]
    fn test_only_unsupported_is_empty_batch() {
        let err = validate(vec![candidate("x.docx"), candidate("y.zip")]).unwrap_err();
        assert_eq!(err, ValidationError::EmptyBatch);
        assert_eq!(validate(Vec::new()).unwrap_err(), ValidationError::EmptyBatch);
    }

    #[test]
    fn test_should_consider() {
        assert!(should_consider(Path::new("/tmp/news.pdf")));
        assert!(!should_consider(Path::new("/tmp/.hidden.pdf")));
        assert!(!should_consider(Path::new("/tmp/video.mp4.part")));
        assert!(!should_consider(Path::new("/tmp/Thumbs.db")));
        assert!(!should_consider(Path::new("/tmp/clip.MP4.Part")));
        assert!(!should_consider(Path::new("/tmp/~$brief.pdf")));
        assert!(should_consider(Path::new("/tmp/partial-results.pdf")));
    }

    #[test]
    fn test_expand_paths_directory_and_glob() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        std::fs::write(root.join("b.txt"), "beta").unwrap();
        std::fs::write(root.join("a.pdf"), "%PDF").unwrap();
        std::fs::write(root.join(".secret.txt"), "x").unwrap();
        std::fs::create_dir(root.join("nested")).unwrap();
        std::fs::write(root.join("nested/c.mp3"), "id3").unwrap();

        let flat = expand_paths(&[root.to_string_lossy().into_owned()], false).unwrap();
        let names: Vec<&str> = flat.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["a.pdf", "b.txt"]);
        assert_eq!(flat[1].size, 4);

        let deep = expand_paths(&[root.to_string_lossy().into_owned()], true).unwrap();
        assert_eq!(deep.len(), 3);

        let pattern = format!("{}/*.txt", root.display());
        let globbed = expand_paths(&[pattern.clone(), pattern], false).unwrap();
        assert_eq!(globbed.len(), 1);
        assert_eq!(globbed[0].name, "b.txt");
    }

    #[cfg(unix)]
    #[test]
    fn test_recursive_expansion_survives_symlink_loop() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("root");
        std::fs::create_dir(&root).unwrap();
        std::fs::write(root.join("a.pdf"), "%PDF").unwrap();
        std::os::unix::fs::symlink(&root, root.join("loop")).unwrap();

        let found = expand_paths(&[root.to_string_lossy().into_owned()], true).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "a.pdf");
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinked_file_uploaded_once() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("root");
        std::fs::create_dir(&root).unwrap();
        std::fs::write(root.join("a.pdf"), "%PDF").unwrap();
        std::os::unix::fs::symlink(root.join("a.pdf"), root.join("b.pdf")).unwrap();

        let found = expand_paths(&[root.to_string_lossy().into_owned()], false).unwrap();
        assert_eq!(found.len(), 1);
    }

    #[test]
    fn test_literal_name_with_pattern_characters() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("report [final].pdf");
        std::fs::write(&path, "%PDF").unwrap();

        let found = expand_paths(&[path.to_string_lossy().into_owned()], false).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "report [final].pdf");
    }

    #[test]
    fn test_expand_paths_missing_file() {
        assert!(expand_paths(&["/definitely/not/here.pdf".to_string()], false).is_err());
    }
}
