use async_trait::async_trait;
use std::io;
use std::path::{Path, PathBuf};

use crate::static_files::StaticFiles;

/// Reason phrase for the statuses the pipeline produces
pub fn status_reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        201 => "Created",
        204 => "No Content",
        400 => "Bad Request",
        401 => "Unauthorized",
        403 => "Forbidden",
        404 => "Not Found",
        405 => "Method Not Allowed",
        499 => "Client Closed Request",
        500 => "Internal Server Error",
        _ => "OK",
    }
}

/// Output side of the transport layer.
///
/// Handlers write through it directly; resource routes hand it a file path.
#[async_trait]
pub trait ResponseSink: Send {
    async fn write_headers(&mut self, status: u16, headers: &[(String, String)]) -> io::Result<()>;

    async fn write(&mut self, chunk: &[u8]) -> io::Result<()>;

    async fn end(&mut self) -> io::Result<()>;

    /// Send the file at `path` as the complete response.
    async fn serve_file(&mut self, path: &Path) -> io::Result<()>;
}

/// In-memory sink that buffers the whole response.
///
/// Used by tests and by embedders that serialise the response themselves.
#[derive(Debug, Default, Clone)]
pub struct BufferedResponse {
    pub status: Option<u16>,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
    pub ended: bool,
    /// Last file handed to [`ResponseSink::serve_file`]
    pub served: Option<PathBuf>,
}

impl BufferedResponse {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn body_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.body).ok()
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

#[async_trait]
impl ResponseSink for BufferedResponse {
    async fn write_headers(&mut self, status: u16, headers: &[(String, String)]) -> io::Result<()> {
        self.status = Some(status);
        self.headers.extend_from_slice(headers);
        Ok(())
    }

    async fn write(&mut self, chunk: &[u8]) -> io::Result<()> {
        if self.ended {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "response already ended"));
        }
        self.body.extend_from_slice(chunk);
        Ok(())
    }

    async fn end(&mut self) -> io::Result<()> {
        self.ended = true;
        Ok(())
    }

    async fn serve_file(&mut self, path: &Path) -> io::Result<()> {
        let bytes = tokio::fs::read(path).await?;
        let content_type = StaticFiles::content_type(path);
        self.write_headers(200, &[("content-type".to_string(), content_type.to_string())])
            .await?;
        self.write(&bytes).await?;
        self.served = Some(path.to_path_buf());
        self.end().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_reason() {
        assert_eq!(status_reason(200), "OK");
        assert_eq!(status_reason(404), "Not Found");
        assert_eq!(status_reason(405), "Method Not Allowed");
    }

    #[tokio::test]
    async fn test_serve_file_sets_content_type() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.css");
        std::fs::write(&path, "body{}").unwrap();

        let mut res = BufferedResponse::new();
        res.serve_file(&path).await.unwrap();
        assert_eq!(res.status, Some(200));
        assert_eq!(res.header("Content-Type"), Some("text/css"));
        assert_eq!(res.body_str(), Some("body{}"));
        assert!(res.ended);
    }

    #[tokio::test]
    async fn test_write_after_end_fails() {
        let mut res = BufferedResponse::new();
        res.end().await.unwrap();
        assert!(res.write(b"late").await.is_err());
    }
}
