//! Authenticated session against one Pi-hole admin portal
//!
//! A session logs in with the host's password, keeps the portal's cookies
//! and the scraped token, and uses both for teleporter exports and imports.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use reqwest::blocking::{multipart, Client, Response};
use reqwest::cookie::Jar;
use reqwest::header::{HeaderMap, CONTENT_DISPOSITION};
use tempfile::NamedTempFile;
use tracing::{debug, info};

use super::token::{HtmlTokenExtractor, TokenExtractor};
use crate::config::HostRecord;
use crate::error::{SyncError, SyncResult};

/// Teleporter import flags: restore every table, flushing existing data first
pub const IMPORT_FLAGS: [(&str, &str); 13] = [
    ("whitelist", "true"),
    ("regex_whitelist", "true"),
    ("blacklist", "true"),
    ("regex_blacklist", "true"),
    ("group", "true"),
    ("client", "true"),
    ("adlist", "true"),
    ("auditlog", "true"),
    ("staticdhcpleases", "true"),
    ("localdnsrecords", "true"),
    ("localcnamerecords", "true"),
    ("flushtables", "true"),
    ("action", "in"),
];

/// Multipart field carrying the archive on import
const ARCHIVE_FIELD: &str = "zip_file";

/// Admin portal endpoints for one host
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortalUrls {
    pub login: String,
    pub teleporter: String,
}

impl PortalUrls {
    /// Build the endpoint URLs from a base address
    pub fn new(base_address: &str) -> Self {
        let base = base_address.trim_end_matches('/');
        Self {
            login: format!("{}/admin/login.php", base),
            teleporter: format!("{}/admin/scripts/pi-hole/php/teleporter.php", base),
        }
    }
}

/// Logged-in session for one host
pub struct PortalSession {
    host_name: String,
    urls: PortalUrls,
    client: Client,
    token: String,
}

impl std::fmt::Debug for PortalSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PortalSession")
            .field("host_name", &self.host_name)
            .field("urls", &self.urls)
            .finish_non_exhaustive()
    }
}

impl PortalSession {
    /// Log in using the default HTML token extractor
    pub fn authenticate(host: &HostRecord) -> SyncResult<Self> {
        Self::with_extractor(host, &HtmlTokenExtractor)
    }

    /// Log in, scraping the token with the given extractor
    pub fn with_extractor(host: &HostRecord, extractor: &dyn TokenExtractor) -> SyncResult<Self> {
        let urls = PortalUrls::new(&host.base_address());
        let client = Client::builder()
            .cookie_provider(Arc::new(Jar::default()))
            .build()
            .map_err(|e| SyncError::Transfer(format!("Failed to build HTTP client: {}", e)))?;

        info!("[{}] Logging in to {}", host.name, urls.login);
        let response = client
            .post(&urls.login)
            .form(&[("pw", host.password.as_str())])
            .send()
            .map_err(|e| SyncError::Transfer(format!("[{}] Login request failed: {}", host.name, e)))?;
        let response = check_status(response, &host.name, "Login")?;

        let body = response.text().map_err(|e| {
            SyncError::Transfer(format!("[{}] Failed to read login response: {}", host.name, e))
        })?;

        let token = extractor.extract(&body).ok_or_else(|| {
            SyncError::Authentication(format!(
                "[{}] No session token found in the login response, check the password",
                host.name
            ))
        })?;
        debug!("[{}] Session token acquired", host.name);

        Ok(Self {
            host_name: host.name.clone(),
            urls,
            client,
            token,
        })
    }

    /// Name of the host section this session belongs to
    pub fn host_name(&self) -> &str {
        &self.host_name
    }

    /// Session token scraped at login
    pub fn token(&self) -> &str {
        &self.token
    }

    /// Export a teleporter archive into `dir`
    ///
    /// Without an explicit `filename` the name is taken from the response's
    /// `Content-Disposition` header. The directory is created if absent.
    /// The body is streamed into a temporary file in `dir` that only takes
    /// the archive name once the transfer completes. Returns the path of the
    /// written archive.
    pub fn download(&self, dir: &Path, filename: Option<&str>) -> SyncResult<PathBuf> {
        info!("[{}] Downloading backup", self.host_name);
        let mut response = self
            .client
            .post(&self.urls.teleporter)
            .form(&[("token", self.token.as_str())])
            .send()
            .map_err(|e| {
                SyncError::Transfer(format!("[{}] Export request failed: {}", self.host_name, e))
            })?;
        response = check_status(response, &self.host_name, "Export")?;

        let filename = match filename {
            Some(name) => name.to_string(),
            None => filename_from_headers(response.headers())?,
        };
        if !is_plain_filename(&filename) {
            return Err(SyncError::Transfer(format!(
                "[{}] Refusing to write archive with unsafe name '{}'",
                self.host_name, filename
            )));
        }

        fs::create_dir_all(dir).map_err(|e| {
            SyncError::Transfer(format!(
                "Failed to create backup directory {}: {}",
                dir.display(),
                e
            ))
        })?;

        let path = dir.join(&filename);
        let mut partial = NamedTempFile::new_in(dir).map_err(|e| {
            SyncError::Transfer(format!(
                "Failed to create a temporary file in {}: {}",
                dir.display(),
                e
            ))
        })?;
        let written = response.copy_to(&mut partial).map_err(|e| {
            SyncError::Transfer(format!(
                "[{}] Failed to download {}: {}",
                self.host_name, filename, e
            ))
        })?;
        partial.persist(&path).map_err(|e| {
            SyncError::Transfer(format!("Failed to save {}: {}", path.display(), e))
        })?;

        info!(
            bytes = written,
            "[{}] Saved backup to {}",
            self.host_name,
            path.display()
        );
        Ok(path)
    }

    /// Import an archive, replacing the host's lists and settings
    ///
    /// Returns the portal's response body as-is; it is not parsed for
    /// success or failure.
    pub fn upload(&self, archive: &Path) -> SyncResult<String> {
        if !archive.is_file() {
            return Err(SyncError::archive_not_found(archive.display().to_string()));
        }

        info!("[{}] Uploading backup {}", self.host_name, archive.display());
        let mut form = multipart::Form::new().text("token", self.token.clone());
        for (name, value) in IMPORT_FLAGS {
            form = form.text(name, value);
        }
        let form = form.file(ARCHIVE_FIELD, archive).map_err(|e| {
            SyncError::Transfer(format!("Failed to read {}: {}", archive.display(), e))
        })?;

        let response = self
            .client
            .post(&self.urls.teleporter)
            .multipart(form)
            .send()
            .map_err(|e| {
                SyncError::Transfer(format!("[{}] Import request failed: {}", self.host_name, e))
            })?;
        let response = check_status(response, &self.host_name, "Import")?;

        response.text().map_err(|e| {
            SyncError::Transfer(format!(
                "[{}] Failed to read import response: {}",
                self.host_name, e
            ))
        })
    }
}

fn check_status(response: Response, host_name: &str, what: &str) -> SyncResult<Response> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(SyncError::Transfer(format!(
            "[{}] {} request returned {}",
            host_name, what, status
        )))
    }
}

/// Read the archive name from `Content-Disposition: attachment; filename=...`
fn filename_from_headers(headers: &HeaderMap) -> SyncResult<String> {
    let value = headers
        .get(CONTENT_DISPOSITION)
        .ok_or_else(|| {
            SyncError::Transfer("Export response has no Content-Disposition header".into())
        })?
        .to_str()
        .map_err(|_| SyncError::Transfer("Content-Disposition header is not valid text".into()))?;

    parse_content_disposition(value).ok_or_else(|| {
        SyncError::Transfer(format!(
            "Content-Disposition header carries no filename: {}",
            value
        ))
    })
}

fn parse_content_disposition(value: &str) -> Option<String> {
    value
        .split(';')
        .map(str::trim)
        .find_map(|part| {
            let (key, name) = part.split_once('=')?;
            key.trim()
                .eq_ignore_ascii_case("filename")
                .then(|| name.trim().trim_matches('"').to_string())
        })
        .filter(|name| !name.is_empty())
}

fn is_plain_filename(name: &str) -> bool {
    !name.is_empty() && name != "." && name != ".." && !name.contains(['/', '\\'])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backup::BackupManager;
    use crate::config::Protocol;
    use mockito::{Matcher, Server};
    use std::io::{BufRead, BufReader, Read, Write};
    use std::net::{TcpListener, TcpStream};
    use std::thread;
    use tempfile::TempDir;

    const LOGIN_PAGE: &str = r#"<html><div id="token" hidden>tok+en/123=</div></html>"#;
    const ARCHIVE: &[u8] = b"\x1f\x8b\x08\x00teleporter-bytes\x00\xff";

    fn host_for(server: &Server) -> HostRecord {
        let address = server.host_with_port();
        let (host, port) = address.rsplit_once(':').unwrap();
        HostRecord {
            name: "pihole1".into(),
            protocol: Protocol::Http,
            host: host.to_string(),
            port: port.parse().unwrap(),
            password: "s3cret".into(),
        }
    }

    /// Answer each accepted connection with the next canned response
    fn serve_raw(responses: Vec<Vec<u8>>) -> (HostRecord, thread::JoinHandle<()>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let handle = thread::spawn(move || {
            for response in responses {
                let (mut stream, _) = listener.accept().unwrap();
                read_request(&stream);
                stream.write_all(&response).unwrap();
            }
        });

        let host = HostRecord {
            name: "pihole1".into(),
            protocol: Protocol::Http,
            host: "127.0.0.1".into(),
            port,
            password: "s3cret".into(),
        };
        (host, handle)
    }

    fn read_request(stream: &TcpStream) {
        let mut reader = BufReader::new(stream);
        let mut content_length = 0;
        loop {
            let mut line = String::new();
            reader.read_line(&mut line).unwrap();
            if line.trim().is_empty() {
                break;
            }
            if let Some((name, value)) = line.split_once(':') {
                if name.eq_ignore_ascii_case("content-length") {
                    content_length = value.trim().parse().unwrap();
                }
            }
        }
        let mut body = vec![0; content_length];
        reader.read_exact(&mut body).unwrap();
    }

    fn mock_login(server: &mut Server) -> mockito::Mock {
        server
            .mock("POST", "/admin/login.php")
            .match_body(Matcher::UrlEncoded("pw".into(), "s3cret".into()))
            .with_status(200)
            .with_header("set-cookie", "PHPSESSID=abc; path=/")
            .with_body(LOGIN_PAGE)
            .create()
    }

    #[test]
    fn test_portal_urls() {
        let urls = PortalUrls::new("http://pi.hole:8080/");
        assert_eq!(urls.login, "http://pi.hole:8080/admin/login.php");
        assert_eq!(
            urls.teleporter,
            "http://pi.hole:8080/admin/scripts/pi-hole/php/teleporter.php"
        );
    }

    #[test]
    fn test_authenticate_extracts_token() {
        let mut server = Server::new();
        let login = mock_login(&mut server);

        let session = PortalSession::authenticate(&host_for(&server)).unwrap();
        assert_eq!(session.token(), "tok+en/123=");
        assert_eq!(session.host_name(), "pihole1");
        login.assert();
    }

    #[test]
    fn test_authenticate_without_token_fails() {
        let mut server = Server::new();
        let _login = server
            .mock("POST", "/admin/login.php")
            .with_status(200)
            .with_body("<html>Wrong password!</html>")
            .create();

        let err = PortalSession::authenticate(&host_for(&server)).unwrap_err();
        assert!(matches!(err, SyncError::Authentication(_)));
    }

    #[test]
    fn test_authenticate_http_error() {
        let mut server = Server::new();
        let _login = server
            .mock("POST", "/admin/login.php")
            .with_status(500)
            .create();

        let err = PortalSession::authenticate(&host_for(&server)).unwrap_err();
        assert!(matches!(err, SyncError::Transfer(_)));
    }

    #[test]
    fn test_download_uses_content_disposition() {
        let mut server = Server::new();
        let _login = mock_login(&mut server);
        let export = server
            .mock("POST", "/admin/scripts/pi-hole/php/teleporter.php")
            .match_header("cookie", Matcher::Regex("PHPSESSID=abc".into()))
            .match_body(Matcher::UrlEncoded("token".into(), "tok+en/123=".into()))
            .with_status(200)
            .with_header(
                "content-disposition",
                "attachment; filename=pi-hole-teleporter_2024-01-01.tar.gz",
            )
            .with_body(ARCHIVE)
            .create();

        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("backups");
        let session = PortalSession::authenticate(&host_for(&server)).unwrap();
        let path = session.download(&dir, None).unwrap();

        assert_eq!(path, dir.join("pi-hole-teleporter_2024-01-01.tar.gz"));
        assert_eq!(fs::read(&path).unwrap(), ARCHIVE);
        assert_eq!(BackupManager::new(&dir).latest().unwrap().path, path);
        export.assert();
    }

    #[test]
    fn test_download_with_explicit_filename() {
        let mut server = Server::new();
        let _login = mock_login(&mut server);
        let _export = server
            .mock("POST", "/admin/scripts/pi-hole/php/teleporter.php")
            .with_status(200)
            .with_body(ARCHIVE)
            .create();

        let temp = TempDir::new().unwrap();
        let session = PortalSession::authenticate(&host_for(&server)).unwrap();
        let path = session.download(temp.path(), Some("manual.tar.gz")).unwrap();

        assert_eq!(path, temp.path().join("manual.tar.gz"));
    }

    #[test]
    fn test_download_without_header_fails() {
        let mut server = Server::new();
        let _login = mock_login(&mut server);
        let _export = server
            .mock("POST", "/admin/scripts/pi-hole/php/teleporter.php")
            .with_status(200)
            .with_body(ARCHIVE)
            .create();

        let temp = TempDir::new().unwrap();
        let session = PortalSession::authenticate(&host_for(&server)).unwrap();
        let err = session.download(temp.path(), None).unwrap_err();

        assert!(matches!(err, SyncError::Transfer(_)));
        assert!(fs::read_dir(temp.path()).unwrap().next().is_none());
    }

    #[test]
    fn test_truncated_download_leaves_no_archive() {
        let login = format!(
            "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            LOGIN_PAGE.len(),
            LOGIN_PAGE
        );
        let export = "HTTP/1.1 200 OK\r\n\
                      Content-Disposition: attachment; filename=partial.tar.gz\r\n\
                      Content-Length: 100000\r\n\
                      Connection: close\r\n\r\n\
                      0123456789";
        let (host, server) = serve_raw(vec![login.into_bytes(), export.as_bytes().to_vec()]);

        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("backups");
        let session = PortalSession::authenticate(&host).unwrap();
        let err = session.download(&dir, None).unwrap_err();
        server.join().unwrap();

        assert!(matches!(err, SyncError::Transfer(_)));
        assert!(!dir.join("partial.tar.gz").exists());
        assert!(fs::read_dir(&dir).unwrap().next().is_none());
        assert!(BackupManager::new(&dir).latest().unwrap_err().is_not_found());
    }

    #[test]
    fn test_upload_sends_archive_and_flags() {
        let mut server = Server::new();
        let _login = mock_login(&mut server);
        let import = server
            .mock("POST", "/admin/scripts/pi-hole/php/teleporter.php")
            .match_header(
                "content-type",
                Matcher::Regex("^multipart/form-data".into()),
            )
            .match_body(Matcher::AllOf(vec![
                Matcher::Regex(r#"name="token"\r\n\r\ntok\+en/123="#.into()),
                Matcher::Regex(r#"name="flushtables"\r\n\r\ntrue"#.into()),
                Matcher::Regex(r#"name="action"\r\n\r\nin"#.into()),
                Matcher::Regex(r#"name="zip_file"; filename="backup.tar.gz""#.into()),
            ]))
            .with_status(200)
            .with_body("OK")
            .create();

        let temp = TempDir::new().unwrap();
        let archive = temp.path().join("backup.tar.gz");
        fs::write(&archive, b"teleporter").unwrap();

        let session = PortalSession::authenticate(&host_for(&server)).unwrap();
        let body = session.upload(&archive).unwrap();

        assert_eq!(body, "OK");
        import.assert();
    }

    #[test]
    fn test_upload_missing_archive() {
        let mut server = Server::new();
        let _login = mock_login(&mut server);

        let temp = TempDir::new().unwrap();
        let session = PortalSession::authenticate(&host_for(&server)).unwrap();
        let err = session.upload(&temp.path().join("missing.tar.gz")).unwrap_err();

        assert!(err.is_not_found());
    }

    #[test]
    fn test_parse_content_disposition() {
        assert_eq!(
            parse_content_disposition("attachment; filename=a.tar.gz").as_deref(),
            Some("a.tar.gz")
        );
        assert_eq!(
            parse_content_disposition("attachment; FILENAME=\"b.tar.gz\"").as_deref(),
            Some("b.tar.gz")
        );
        assert!(parse_content_disposition("attachment").is_none());
        assert!(parse_content_disposition("attachment; filename=").is_none());
    }

    #[test]
    fn test_is_plain_filename() {
        assert!(is_plain_filename("pi-hole.tar.gz"));
        assert!(!is_plain_filename("../etc/passwd"));
        assert!(!is_plain_filename(".."));
        assert!(!is_plain_filename(""));
    }
}
