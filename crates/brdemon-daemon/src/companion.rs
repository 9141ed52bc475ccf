//! Companion helper binary used to deliver Ctrl+C on Windows
//!
//! Windows has no `kill -INT`; a console process can only be interrupted by a
//! process attached to its console. A small published helper does exactly
//! that. It is downloaded on first use into a storage directory and reused
//! afterwards.

use std::path::{Path, PathBuf};

use futures_util::StreamExt;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use brdemon_core::prelude::*;

/// Release asset of the helper
pub const DEFAULT_COMPANION_URL: &str =
    "https://github.com/gaetschwartz/SigintSender/releases/download/ci-deploy-8/SigintSender-x64-8.exe";

/// File name of the cached helper
pub const COMPANION_FILENAME: &str = "SigintSender.exe";

const MAX_REDIRECTS: usize = 10;

/// Download-once handle to the helper binary
#[derive(Debug, Clone)]
pub struct CompanionBinary {
    url: String,
    storage_dir: PathBuf,
    file_path: PathBuf,
}

impl CompanionBinary {
    pub fn new(url: impl Into<String>, storage_dir: impl Into<PathBuf>) -> Self {
        let storage_dir = storage_dir.into();
        let file_path = storage_dir.join(COMPANION_FILENAME);
        Self {
            url: url.into(),
            storage_dir,
            file_path,
        }
    }

    /// Default cache location: `<data dir>/bin`
    pub fn default_storage_dir() -> PathBuf {
        brdemon_core::logging::data_directory().join("bin")
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn file_path(&self) -> &Path {
        &self.file_path
    }

    pub fn is_cached(&self) -> bool {
        self.file_path.is_file()
    }

    /// Make sure the helper exists locally, downloading it if needed
    pub async fn ensure_fetched(&self) -> Result<PathBuf> {
        if self.is_cached() {
            trace!("Companion already cached at {}", self.file_path.display());
            return Ok(self.file_path.clone());
        }

        info!(
            "Downloading companion from {} to {}",
            self.url,
            self.file_path.display()
        );
        tokio::fs::create_dir_all(&self.storage_dir).await?;
        self.download().await?;
        info!("Companion saved to {}", self.file_path.display());
        Ok(self.file_path.clone())
    }

    /// Stream the body into a temp file beside the target, then persist it
    ///
    /// On any error the temp file is dropped (and deleted), so the target path
    /// only ever holds a complete download.
    async fn download(&self) -> Result<()> {
        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .build()
            .map_err(|e| Error::companion_fetch(&self.url, e.to_string()))?;

        let response = client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| Error::companion_fetch(&self.url, describe(&e)))?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            return Err(Error::companion_fetch(
                &self.url,
                format!("unexpected status {}", status),
            ));
        }

        let partial = tempfile::Builder::new()
            .prefix(".companion")
            .suffix(".part")
            .tempfile_in(&self.storage_dir)?;

        // Writes go through a tokio handle on the same file; the NamedTempFile
        // only owns cleanup and the final rename
        let mut file = tokio::fs::File::from_std(partial.reopen()?);
        let mut received: u64 = 0;
        let mut body = response.bytes_stream();
        while let Some(chunk) = body.next().await {
            let chunk = chunk.map_err(|e| Error::companion_fetch(&self.url, describe(&e)))?;
            received += chunk.len() as u64;
            file.write_all(&chunk).await?;
        }
        file.flush().await?;
        file.sync_all().await?;
        drop(file);
        debug!("Companion download complete: {} bytes", received);

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            tokio::fs::set_permissions(partial.path(), std::fs::Permissions::from_mode(0o755))
                .await?;
        }

        partial
            .persist(&self.file_path)
            .map_err(|e| Error::Io(e.error))?;
        Ok(())
    }

    /// Interrupt `pid` through the helper
    pub async fn send(&self, pid: u32) -> Result<()> {
        let helper = self.ensure_fetched().await?;

        info!("Running {} {}", helper.display(), pid);
        let output = Command::new(&helper)
            .arg(pid.to_string())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| {
                Error::signal_delivery(format!("failed to run {}: {}", helper.display(), e))
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);
        if !stdout.trim().is_empty() {
            debug!("companion stdout: {}", stdout.trim());
        }
        if !stderr.trim().is_empty() {
            debug!("companion stderr: {}", stderr.trim());
        }

        if output.status.success() {
            Ok(())
        } else {
            Err(Error::signal_delivery(format!(
                "{} {} exited with {}",
                COMPANION_FILENAME, pid, output.status
            )))
        }
    }
}

fn describe(e: &reqwest::Error) -> String {
    if e.is_redirect() {
        format!("too many redirects: {}", e)
    } else if e.is_timeout() {
        format!("timed out: {}", e)
    } else {
        e.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serve canned raw HTTP responses, one per connection, in order
    async fn serve(responses: Vec<Vec<u8>>) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            for response in responses {
                let Ok((mut socket, _)) = listener.accept().await else {
                    return;
                };
                let mut buf = [0u8; 4096];
                let _ = socket.read(&mut buf).await;
                let _ = socket.write_all(&response).await;
                let _ = socket.shutdown().await;
            }
        });
        format!("http://{}", addr)
    }

    fn ok_response(body: &[u8]) -> Vec<u8> {
        let mut response = format!(
            "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
            body.len()
        )
        .into_bytes();
        response.extend_from_slice(body);
        response
    }

    fn redirect_response(location: &str) -> Vec<u8> {
        format!(
            "HTTP/1.1 302 Found\r\nLocation: {}\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
            location
        )
        .into_bytes()
    }

    fn dir_is_empty(dir: &Path) -> bool {
        std::fs::read_dir(dir).unwrap().next().is_none()
    }

    #[tokio::test]
    async fn test_download_and_cache() {
        let temp = TempDir::new().unwrap();
        let base = serve(vec![ok_response(b"MZ-helper")]).await;
        let binary = CompanionBinary::new(format!("{}/helper.exe", base), temp.path());
        assert!(!binary.is_cached());

        let path = binary.ensure_fetched().await.unwrap();
        assert_eq!(path, temp.path().join(COMPANION_FILENAME));
        assert_eq!(std::fs::read(&path).unwrap(), b"MZ-helper");

        // Second call must not hit the network; the server has no responses left
        let again = binary.ensure_fetched().await.unwrap();
        assert_eq!(again, path);
    }

    #[tokio::test]
    async fn test_multi_chunk_body_is_written_completely() {
        let temp = TempDir::new().unwrap();
        let payload: Vec<u8> = (0..512 * 1024).map(|i| (i % 251) as u8).collect();
        let base = serve(vec![ok_response(&payload)]).await;
        let binary = CompanionBinary::new(format!("{}/helper.exe", base), temp.path());

        let path = binary.ensure_fetched().await.unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), payload);
        // Only the helper is left; the temp file was renamed into place
        assert_eq!(std::fs::read_dir(temp.path()).unwrap().count(), 1);
    }

    #[tokio::test]
    async fn test_follows_redirect() {
        let temp = TempDir::new().unwrap();
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let final_url = format!("http://{}/final", addr);
        let responses = vec![redirect_response(&final_url), ok_response(b"payload")];
        tokio::spawn(async move {
            for response in responses {
                let Ok((mut socket, _)) = listener.accept().await else {
                    return;
                };
                let mut buf = [0u8; 4096];
                let _ = socket.read(&mut buf).await;
                let _ = socket.write_all(&response).await;
                let _ = socket.shutdown().await;
            }
        });

        let binary = CompanionBinary::new(format!("http://{}/start", addr), temp.path());
        binary.ensure_fetched().await.unwrap();
        assert_eq!(std::fs::read(binary.file_path()).unwrap(), b"payload");
    }

    #[tokio::test]
    async fn test_non_200_leaves_nothing_behind() {
        let temp = TempDir::new().unwrap();
        let storage = temp.path().join("bin");
        let base = serve(vec![
            b"HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\nConnection: close\r\n\r\n".to_vec(),
        ])
        .await;
        let binary = CompanionBinary::new(format!("{}/missing.exe", base), &storage);

        let result = binary.ensure_fetched().await;
        assert!(matches!(result, Err(Error::CompanionFetch { .. })));
        assert!(!binary.file_path().exists());
        assert!(dir_is_empty(&storage));
    }

    #[tokio::test]
    async fn test_truncated_body_leaves_nothing_behind() {
        let temp = TempDir::new().unwrap();
        let mut response =
            b"HTTP/1.1 200 OK\r\nContent-Length: 1000\r\nConnection: close\r\n\r\n".to_vec();
        response.extend_from_slice(b"only-a-few-bytes");
        let base = serve(vec![response]).await;
        let binary = CompanionBinary::new(format!("{}/helper.exe", base), temp.path());

        let result = binary.ensure_fetched().await;
        assert!(matches!(result, Err(Error::CompanionFetch { .. })));
        assert!(!binary.file_path().exists());
        assert!(dir_is_empty(temp.path()));
    }

    #[tokio::test]
    async fn test_unreachable_server() {
        let temp = TempDir::new().unwrap();
        // Bind then drop to get a port nobody listens on
        let port = {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            listener.local_addr().unwrap().port()
        };
        let binary = CompanionBinary::new(format!("http://127.0.0.1:{}/x", port), temp.path());

        let result = binary.ensure_fetched().await;
        assert!(matches!(result, Err(Error::CompanionFetch { .. })));
        assert!(!binary.is_cached());
    }
}
