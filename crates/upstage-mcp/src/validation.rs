//! Input file validation.
//!
//! Every tool call validates its input file before anything touches the
//! network: the path must exist, denote a regular file, carry an extension in
//! the purpose-specific allow-list, and stay under the size ceiling. The
//! checks have no side effects and are safe to repeat.

use std::path::Path;

use crate::error::{Result, UpstageError};

/// Upper bound on input file size (50 MiB).
pub const MAX_FILE_SIZE_BYTES: u64 = 50 * 1024 * 1024;

const PARSING_EXTENSIONS: &[&str] = &[
    ".pdf", ".jpg", ".jpeg", ".png", ".bmp", ".tif", ".tiff", ".heic", ".docx", ".pptx", ".xlsx",
];

const EXTRACTION_EXTENSIONS: &[&str] = &[
    ".pdf", ".jpg", ".jpeg", ".png", ".bmp", ".tif", ".tiff", ".heic", ".docx", ".pptx", ".xlsx",
    ".hwp", ".hwpx",
];

/// What the validated file will be used for.
///
/// The extraction endpoints accept a superset of the parsing formats (they
/// additionally handle HWP word-processor documents).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilePurpose {
    Parsing,
    Extraction,
}

impl FilePurpose {
    /// Lower-cased extensions (with leading dot) accepted for this purpose.
    pub fn allowed_extensions(&self) -> &'static [&'static str] {
        match self {
            FilePurpose::Parsing => PARSING_EXTENSIONS,
            FilePurpose::Extraction => EXTRACTION_EXTENSIONS,
        }
    }

    fn label(&self) -> &'static str {
        match self {
            FilePurpose::Parsing => "parsing",
            FilePurpose::Extraction => "extraction",
        }
    }
}

/// Validate an input file for the given purpose.
///
/// Checks run in order: existence, regular-file, extension allow-list, size
/// ceiling. The first violated check determines the error, each carrying the
/// offending value for diagnostics.
pub fn validate_file(path: &Path, purpose: FilePurpose) -> Result<()> {
    if !path.exists() {
        return Err(UpstageError::FileNotFound {
            path: path.display().to_string(),
        });
    }

    if !path.is_file() {
        return Err(UpstageError::NotAFile {
            path: path.display().to_string(),
        });
    }

    let extension = path
        .extension()
        .map(|ext| format!(".{}", ext.to_string_lossy().to_lowercase()))
        .unwrap_or_default();

    if !purpose.allowed_extensions().contains(&extension.as_str()) {
        return Err(UpstageError::UnsupportedFormat {
            extension: if extension.is_empty() {
                "<none>".to_string()
            } else {
                extension
            },
            purpose: purpose.label().to_string(),
            allowed: purpose.allowed_extensions().join(", "),
        });
    }

    let size = path.metadata()?.len();
    if size > MAX_FILE_SIZE_BYTES {
        return Err(UpstageError::FileTooLarge {
            actual_bytes: size,
            max_bytes: MAX_FILE_SIZE_BYTES,
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use tempfile::TempDir;

    fn write_file(dir: &TempDir, name: &str, contents: &[u8]) -> std::path::PathBuf {
        let path = dir.path().join(name);
        let mut file = File::create(&path).unwrap();
        file.write_all(contents).unwrap();
        path
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ghost.pdf");
        let err = validate_file(&path, FilePurpose::Parsing).unwrap_err();
        assert!(matches!(err, UpstageError::FileNotFound { .. }));
        assert!(err.to_string().contains("ghost.pdf"));
    }

    #[test]
    fn test_directory_is_not_a_file() {
        let dir = TempDir::new().unwrap();
        let sub = dir.path().join("nested.pdf");
        std::fs::create_dir(&sub).unwrap();
        let err = validate_file(&sub, FilePurpose::Parsing).unwrap_err();
        assert!(matches!(err, UpstageError::NotAFile { .. }));
    }

    #[test]
    fn test_unsupported_extension() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "notes.txt", b"hello");
        let err = validate_file(&path, FilePurpose::Parsing).unwrap_err();
        match err {
            UpstageError::UnsupportedFormat { extension, allowed, .. } => {
                assert_eq!(extension, ".txt");
                assert!(allowed.contains(".pdf"));
            }
            other => panic!("expected UnsupportedFormat, got {:?}", other),
        }
    }

    #[test]
    fn test_extension_check_is_case_insensitive() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "scan.PDF", b"%PDF-1.4");
        assert!(validate_file(&path, FilePurpose::Parsing).is_ok());
    }

    #[test]
    fn test_missing_extension_is_unsupported() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "document", b"data");
        let err = validate_file(&path, FilePurpose::Extraction).unwrap_err();
        match err {
            UpstageError::UnsupportedFormat { extension, .. } => assert_eq!(extension, "<none>"),
            other => panic!("expected UnsupportedFormat, got {:?}", other),
        }
    }

    #[test]
    fn test_oversized_file_reports_both_sizes() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("huge.pdf");
        let file = File::create(&path).unwrap();
        // Sparse file: sets the length without writing 50 MiB of data.
        file.set_len(MAX_FILE_SIZE_BYTES + 1).unwrap();
        let err = validate_file(&path, FilePurpose::Parsing).unwrap_err();
        match err {
            UpstageError::FileTooLarge { actual_bytes, max_bytes } => {
                assert_eq!(actual_bytes, MAX_FILE_SIZE_BYTES + 1);
                assert_eq!(max_bytes, MAX_FILE_SIZE_BYTES);
            }
            other => panic!("expected FileTooLarge, got {:?}", other),
        }
    }

    #[test]
    fn test_hwp_only_valid_for_extraction() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "doc.hwp", b"data");
        assert!(validate_file(&path, FilePurpose::Extraction).is_ok());
        assert!(matches!(
            validate_file(&path, FilePurpose::Parsing),
            Err(UpstageError::UnsupportedFormat { .. })
        ));
    }

    #[test]
    fn test_validation_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "a.png", b"\x89PNG");
        assert!(validate_file(&path, FilePurpose::Parsing).is_ok());
        assert!(validate_file(&path, FilePurpose::Parsing).is_ok());
    }
}
