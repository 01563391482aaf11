//! Audio downloader with progress reporting via callback

use std::path::{Path, PathBuf};

use futures_util::StreamExt;
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tracing::info;

use speakform_core::types::DownloadProgress;

#[derive(Error, Debug)]
pub enum DownloadError {
    #[error("download request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("download failed with status {0}")]
    Status(reqwest::StatusCode),

    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Download `url` to `dest`.
///
/// Bytes are written to `<dest>.partial` and renamed once complete, so an
/// interrupted download never leaves a truncated file under the final name.
/// The partial file is removed if any step after its creation fails.
pub async fn download_audio(
    url: &str,
    dest: &Path,
    on_progress: impl Fn(DownloadProgress),
) -> Result<PathBuf, DownloadError> {
    if let Some(parent) = dest.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(io_error(parent))?;
    }

    let resp = reqwest::Client::new().get(url).send().await?;
    if !resp.status().is_success() {
        return Err(DownloadError::Status(resp.status()));
    }

    let mut partial_name = dest.as_os_str().to_owned();
    partial_name.push(".partial");
    let partial = PathBuf::from(partial_name);

    let bytes_done = match write_and_finalize(resp, &partial, dest, &on_progress).await {
        Ok(n) => n,
        Err(e) => {
            let _ = tokio::fs::remove_file(&partial).await;
            return Err(e);
        }
    };

    on_progress(DownloadProgress {
        percent: 100.0,
        bytes_done,
        bytes_total: Some(bytes_done),
        status: "complete".to_string(),
    });
    info!("saved {bytes_done} bytes to {}", dest.display());

    Ok(dest.to_path_buf())
}

/// Stream the body into `partial`, then move it to `dest`.
async fn write_and_finalize(
    resp: reqwest::Response,
    partial: &Path,
    dest: &Path,
    on_progress: &impl Fn(DownloadProgress),
) -> Result<u64, DownloadError> {
    let total_size = resp.content_length();
    let mut file = tokio::fs::File::create(partial)
        .await
        .map_err(io_error(partial))?;

    let mut bytes_done = 0u64;
    let mut stream = resp.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        file.write_all(&chunk).await.map_err(io_error(partial))?;

        bytes_done += chunk.len() as u64;
        let percent = match total_size {
            Some(total) if total > 0 => (bytes_done as f32 / total as f32 * 100.0).min(100.0),
            _ => 0.0,
        };

        on_progress(DownloadProgress {
            percent,
            bytes_done,
            bytes_total: total_size,
            status: "downloading".to_string(),
        });
    }

    file.flush().await.map_err(io_error(partial))?;
    drop(file);

    tokio::fs::rename(partial, dest)
        .await
        .map_err(io_error(dest))?;
    Ok(bytes_done)
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> DownloadError {
    let path = path.to_path_buf();
    move |source| DownloadError::Io { path, source }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn saves_audio_and_reports_completion() {
        let server = MockServer::start().await;
        let audio = vec![0x49u8, 0x44, 0x33, 0x04, 0x00, 0x00, 0x00];
        Mock::given(method("GET"))
            .and(path("/output/final.mp3"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(audio.clone()))
            .expect(1)
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("out").join("final.mp3");
        let statuses = Mutex::new(Vec::new());

        let saved = download_audio(
            &format!("{}/output/final.mp3", server.uri()),
            &dest,
            |p| statuses.lock().unwrap().push(p.status),
        )
        .await
        .unwrap();

        assert_eq!(saved, dest);
        assert_eq!(std::fs::read(&dest).unwrap(), audio);
        assert!(!dir.path().join("out").join("final.mp3.partial").exists());
        assert_eq!(statuses.lock().unwrap().last().map(String::as_str), Some("complete"));
    }

    #[tokio::test]
    async fn missing_audio_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("final.mp3");
        let err = download_audio(&format!("{}/nope.mp3", server.uri()), &dest, |_| {})
            .await
            .unwrap_err();

        assert!(matches!(err, DownloadError::Status(s) if s.as_u16() == 404));
        assert!(!dest.exists());
    }

    #[tokio::test]
    async fn failed_rename_removes_partial_file() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![1u8; 32]))
            .mount(&server)
            .await;

        // A non-empty directory under the target name makes the rename fail.
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("final.mp3");
        std::fs::create_dir(&dest).unwrap();
        std::fs::write(dest.join("keep"), b"x").unwrap();

        let err = download_audio(&format!("{}/a.mp3", server.uri()), &dest, |_| {})
            .await
            .unwrap_err();

        assert!(matches!(err, DownloadError::Io { ref path, .. } if path == &dest), "{err:?}");
        assert!(!dir.path().join("final.mp3.partial").exists());
    }
}
