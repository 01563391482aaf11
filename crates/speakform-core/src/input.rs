//! Submission input — the form's fields and the rules that flatten them into
//! a payload string.
//!
//! Reading a file from disk is async and lives in speakform-lib; everything
//! here operates on bytes already in hand.

use std::path::{Path, PathBuf};

use crate::error::SubmissionError;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Where an attached file's content comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileData {
    /// Bytes already received, e.g. from a multipart upload.
    Loaded(Vec<u8>),
    /// A file to be read when the submission resolves.
    OnDisk(PathBuf),
}

/// An attached `.txt` file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRef {
    pub name: String,
    pub data: FileData,
}

impl FileRef {
    pub fn from_bytes(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            data: FileData::Loaded(bytes),
        }
    }

    pub fn from_path(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Self {
            name,
            data: FileData::OnDisk(path.to_path_buf()),
        }
    }
}

/// The input for one submission. Exactly one source is used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionInput {
    Text(String),
    File(FileRef),
}

impl SubmissionInput {
    /// Synchronous validation done before a submission starts loading.
    ///
    /// Only typed text can be checked up front; a file's content is unknown
    /// until it is read.
    pub fn precheck(&self) -> Result<(), SubmissionError> {
        match self {
            Self::Text(text) if text.trim().is_empty() => Err(SubmissionError::EmptyInput),
            _ => Ok(()),
        }
    }
}

/// The two form fields. Both may be filled; the file wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubmissionForm {
    pub text: String,
    pub file: Option<FileRef>,
}

impl SubmissionForm {
    pub fn new(text: impl Into<String>, file: Option<FileRef>) -> Self {
        Self {
            text: text.into(),
            file,
        }
    }

    /// Input to submit, checking the file first.
    pub fn input(&self) -> SubmissionInput {
        match &self.file {
            Some(file) => SubmissionInput::File(file.clone()),
            None => SubmissionInput::Text(self.text.clone()),
        }
    }
}

/// Trim typed text into a payload.
pub fn normalize_text(text: &str) -> Result<String, SubmissionError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(SubmissionError::EmptyInput);
    }
    Ok(trimmed.to_string())
}

/// Decode file bytes as UTF-8 text. A leading byte order mark is dropped.
///
/// The content is sent as-is; an attached file is never empty input.
pub fn decode_file(name: &str, bytes: Vec<u8>) -> Result<String, SubmissionError> {
    let bytes = if bytes.starts_with(UTF8_BOM) {
        bytes[UTF8_BOM.len()..].to_vec()
    } else {
        bytes
    };
    let text = String::from_utf8(bytes).map_err(|e| SubmissionError::FileRead {
        name: name.to_string(),
        reason: e.utf8_error().to_string(),
    })?;
    Ok(text)
}
