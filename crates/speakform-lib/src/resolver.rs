//! Input source resolver — flattens a [`SubmissionInput`] into the payload
//! string sent to the backend.

use std::path::Path;

use tracing::debug;

use speakform_core::error::SubmissionError;
use speakform_core::input::{decode_file, normalize_text, FileData, FileRef, SubmissionInput};

/// Resolves typed text or an attached file into a payload.
#[derive(Debug, Clone)]
pub struct Resolver {
    max_file_bytes: u64,
}

impl Resolver {
    pub fn new(max_file_bytes: u64) -> Self {
        Self { max_file_bytes }
    }

    pub fn max_file_bytes(&self) -> u64 {
        self.max_file_bytes
    }

    /// Produce the payload for one submission. Files are read here, never
    /// earlier.
    pub async fn resolve(&self, input: SubmissionInput) -> Result<String, SubmissionError> {
        match input {
            SubmissionInput::Text(text) => normalize_text(&text),
            SubmissionInput::File(file) => self.read_file(file).await,
        }
    }

    async fn read_file(&self, file: FileRef) -> Result<String, SubmissionError> {
        let FileRef { name, data } = file;
        let bytes = match data {
            FileData::Loaded(bytes) => {
                self.check_size(&name, bytes.len() as u64)?;
                bytes
            }
            FileData::OnDisk(path) => self.read_from_disk(&name, &path).await?,
        };
        debug!("resolved {name}: {} bytes", bytes.len());
        decode_file(&name, bytes)
    }

    async fn read_from_disk(&self, name: &str, path: &Path) -> Result<Vec<u8>, SubmissionError> {
        let read_error = |e: std::io::Error| SubmissionError::FileRead {
            name: name.to_string(),
            reason: e.to_string(),
        };

        let meta = tokio::fs::metadata(path).await.map_err(read_error)?;
        if !meta.is_file() {
            return Err(SubmissionError::FileRead {
                name: name.to_string(),
                reason: "not a regular file".into(),
            });
        }
        self.check_size(name, meta.len())?;

        let bytes = tokio::fs::read(path).await.map_err(read_error)?;
        // The file may have grown between stat and read.
        self.check_size(name, bytes.len() as u64)?;
        Ok(bytes)
    }

    fn check_size(&self, name: &str, size: u64) -> Result<(), SubmissionError> {
        if size > self.max_file_bytes {
            return Err(SubmissionError::FileTooLarge {
                name: name.to_string(),
                size,
                limit: self.max_file_bytes,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn resolver() -> Resolver {
        Resolver::new(1024)
    }

    #[tokio::test]
    async fn text_is_trimmed() {
        let payload = resolver()
            .resolve(SubmissionInput::Text("  Hello world  ".into()))
            .await
            .unwrap();
        assert_eq!(payload, "Hello world");
    }

    #[tokio::test]
    async fn empty_text() {
        let err = resolver()
            .resolve(SubmissionInput::Text("\n".into()))
            .await
            .unwrap_err();
        assert_eq!(err, SubmissionError::EmptyInput);
    }

    #[tokio::test]
    async fn uploaded_bytes() {
        let input = SubmissionInput::File(FileRef::from_bytes("notes.txt", b"Read me".to_vec()));
        assert_eq!(resolver().resolve(input).await.unwrap(), "Read me");
    }

    #[tokio::test]
    async fn file_on_disk() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        write!(tmp, "Speaker 1: hello\nSpeaker 2: hi").unwrap();

        let input = SubmissionInput::File(FileRef::from_path(tmp.path()));
        let payload = resolver().resolve(input).await.unwrap();
        assert_eq!(payload, "Speaker 1: hello\nSpeaker 2: hi");
    }

    #[tokio::test]
    async fn missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let input = SubmissionInput::File(FileRef::from_path(dir.path().join("gone.txt")));
        match resolver().resolve(input).await.unwrap_err() {
            SubmissionError::FileRead { name, .. } => assert_eq!(name, "gone.txt"),
            other => panic!("expected FileRead, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn directory_is_not_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let input = SubmissionInput::File(FileRef::from_path(dir.path()));
        assert!(matches!(
            resolver().resolve(input).await,
            Err(SubmissionError::FileRead { .. })
        ));
    }

    #[tokio::test]
    async fn oversize_file_on_disk() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        tmp.write_all(&vec![b'a'; 2048]).unwrap();

        let input = SubmissionInput::File(FileRef::from_path(tmp.path()));
        match resolver().resolve(input).await.unwrap_err() {
            SubmissionError::FileTooLarge { size, limit, .. } => {
                assert_eq!(size, 2048);
                assert_eq!(limit, 1024);
            }
            other => panic!("expected FileTooLarge, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn oversize_upload() {
        let input = SubmissionInput::File(FileRef::from_bytes("big.txt", vec![b'a'; 1025]));
        assert!(matches!(
            resolver().resolve(input).await,
            Err(SubmissionError::FileTooLarge { .. })
        ));
    }
}
