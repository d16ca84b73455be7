// Session parameters: everything derived from the username, token and
// region the user typed in. Built once, never mutated afterwards.

use std::fmt;
use std::path::{Component, Path};

/// The two PythonAnywhere hosting zones.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Region {
    Eu,
    Www,
}

impl Region {
    /// Accepts exactly `eu` or `www`. Anything else (including surrounding
    /// whitespace or different casing) is rejected.
    pub fn parse(input: &str) -> Option<Self> {
        match input {
            "eu" => Some(Region::Eu),
            "www" => Some(Region::Www),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Region::Eu => "eu",
            Region::Www => "www",
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable, request-scoped parameters for one provisioning run.
#[derive(Clone)]
pub struct Session {
    username: String,
    token: String,
    region: Region,
    base_api_url: String,
    site_hostname: String,
    project_home: String,
}

impl Session {
    pub fn new(username: &str, token: &str, region: Region) -> Self {
        let base_api_url = format!(
            "https://{}.pythonanywhere.com/api/v0/user/{}/",
            region, username
        );
        let site_hostname = match region {
            Region::Eu => format!("{}.eu.pythonanywhere.com", username),
            Region::Www => format!("{}.pythonanywhere.com", username),
        };
        Session {
            username: username.to_string(),
            token: token.to_string(),
            region,
            base_api_url,
            site_hostname,
            project_home: format!("/home/{}/mysite/", username),
        }
    }

    /// Point the session at a different API root (staging, a local stub).
    /// Hostname and home directory are unaffected.
    pub fn with_api_base_url(mut self, url: &str) -> Self {
        self.base_api_url = if url.ends_with('/') {
            url.to_string()
        } else {
            format!("{}/", url)
        };
        self
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn base_api_url(&self) -> &str {
        &self.base_api_url
    }

    pub fn site_hostname(&self) -> &str {
        &self.site_hostname
    }

    /// Remote home directory, always with a trailing slash.
    pub fn project_home(&self) -> &str {
        &self.project_home
    }

    pub fn webapps_url(&self) -> String {
        format!("{}webapps/", self.base_api_url)
    }

    /// Upload endpoint prefix; the absolute remote path is appended as-is.
    pub fn file_upload_url(&self) -> String {
        format!("{}files/path", self.base_api_url)
    }

    pub fn upload_url_for(&self, remote_path: &str) -> String {
        format!("{}{}", self.file_upload_url(), remote_path)
    }

    pub fn webapp_url(&self) -> String {
        format!("{}{}/", self.webapps_url(), self.site_hostname)
    }

    pub fn static_files_url(&self) -> String {
        format!("{}static_files/", self.webapp_url())
    }

    pub fn reload_url(&self) -> String {
        format!("{}reload/", self.webapp_url())
    }

    pub fn site_url(&self) -> String {
        format!("https://{}/", self.site_hostname)
    }

    /// Map a manifest path such as `src/static/style.css` to its remote
    /// location. The first segment is dropped and the rest is joined to the
    /// home directory with a literal `/`, which yields a double slash
    /// (`/home/alice/mysite//static/style.css`). Kept as the API has always
    /// received it.
    pub fn remote_path_for(&self, local: &str) -> String {
        let relative = Path::new(local)
            .components()
            .filter(|c| matches!(c, Component::Normal(_)))
            .skip(1)
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect::<Vec<_>>()
            .join("/");
        format!("{}/{}", self.project_home, relative)
    }

    /// Where the hosting platform looks for this site's WSGI file.
    pub fn wsgi_remote_path(&self) -> String {
        let file_name = format!(
            "{}_wsgi.py",
            self.site_hostname.replace('.', "_").to_lowercase()
        );
        format!("/var/www/{}", file_name)
    }

    pub fn static_route_path(&self) -> String {
        format!("{}/static", self.project_home)
    }

    /// Render the WSGI bootstrap that puts the project home on `sys.path`
    /// and exposes the Flask app as `application`.
    pub fn wsgi_file_content(&self) -> String {
        WSGI_FILE_TEMPLATE.replace("{project_home}", &python_str_literal(&self.project_home))
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("username", &self.username)
            .field("token", &"<redacted>")
            .field("region", &self.region)
            .field("base_api_url", &self.base_api_url)
            .field("site_hostname", &self.site_hostname)
            .field("project_home", &self.project_home)
            .finish()
    }
}

const WSGI_FILE_TEMPLATE: &str = "
import sys

project_home = {project_home}
if project_home not in sys.path:
    sys.path = [project_home] + sys.path

from flask_app import app as application  # noqa
";

/// Quote `s` the way Python's `repr()` quotes a str: single quotes unless
/// the text holds a single quote and no double quote.
fn python_str_literal(s: &str) -> String {
    let quote = if s.contains('\'') && !s.contains('"') { '"' } else { '\'' };
    let mut out = String::with_capacity(s.len() + 2);
    out.push(quote);
    for ch in s.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c == quote => {
                out.push('\\');
                out.push(c);
            }
            c => out.push(c),
        }
    }
    out.push(quote);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn region_accepts_only_exact_values() {
        assert_eq!(Region::parse("eu"), Some(Region::Eu));
        assert_eq!(Region::parse("www"), Some(Region::Www));
        assert_eq!(Region::parse("EU"), None);
        assert_eq!(Region::parse(" eu"), None);
        assert_eq!(Region::parse("us"), None);
        assert_eq!(Region::parse(""), None);
    }

    #[test]
    fn hostname_follows_region() {
        let eu = Session::new("alice", "t", Region::Eu);
        assert_eq!(eu.site_hostname(), "alice.eu.pythonanywhere.com");

        let www = Session::new("alice", "t", Region::Www);
        assert_eq!(www.site_hostname(), "alice.pythonanywhere.com");
    }

    #[test]
    fn endpoints_derive_from_region_base() {
        let s = Session::new("alice", "t", Region::Eu);
        assert_eq!(
            s.base_api_url(),
            "https://eu.pythonanywhere.com/api/v0/user/alice/"
        );
        assert_eq!(
            s.webapps_url(),
            "https://eu.pythonanywhere.com/api/v0/user/alice/webapps/"
        );
        assert_eq!(
            s.static_files_url(),
            "https://eu.pythonanywhere.com/api/v0/user/alice/webapps/\
             alice.eu.pythonanywhere.com/static_files/"
        );
        assert_eq!(
            s.reload_url(),
            "https://eu.pythonanywhere.com/api/v0/user/alice/webapps/\
             alice.eu.pythonanywhere.com/reload/"
        );
        assert_eq!(s.site_url(), "https://alice.eu.pythonanywhere.com/");
    }

    #[test]
    fn remote_path_keeps_double_slash() {
        let s = Session::new("alice", "t", Region::Www);
        assert_eq!(s.project_home(), "/home/alice/mysite/");
        assert_eq!(
            s.remote_path_for("src/static/style.css"),
            "/home/alice/mysite//static/style.css"
        );
        assert_eq!(
            s.remote_path_for("src/flask_app.py"),
            "/home/alice/mysite//flask_app.py"
        );
        assert_eq!(
            s.upload_url_for(&s.remote_path_for("src/templates/index.html")),
            "https://www.pythonanywhere.com/api/v0/user/alice/files/path\
             /home/alice/mysite//templates/index.html"
        );
    }

    #[test]
    fn wsgi_path_is_lowercased_hostname() {
        let s = Session::new("Alice", "t", Region::Eu);
        assert_eq!(
            s.wsgi_remote_path(),
            "/var/www/alice_eu_pythonanywhere_com_wsgi.py"
        );
    }

    #[test]
    fn wsgi_content_embeds_project_home() {
        let s = Session::new("alice", "t", Region::Www);
        let expected = concat!(
            "\n",
            "import sys\n",
            "\n",
            "project_home = '/home/alice/mysite/'\n",
            "if project_home not in sys.path:\n",
            "    sys.path = [project_home] + sys.path\n",
            "\n",
            "from flask_app import app as application  # noqa\n",
        );
        assert_eq!(s.wsgi_file_content(), expected);
    }

    #[test]
    fn python_literal_switches_quotes() {
        assert_eq!(python_str_literal("a'b"), "\"a'b\"");
        assert_eq!(python_str_literal("a'b\""), "'a\\'b\"'");
        assert_eq!(python_str_literal("c:\\x"), "'c:\\\\x'");
    }

    #[test]
    fn base_url_override_gets_trailing_slash() {
        let s = Session::new("alice", "t", Region::Www)
            .with_api_base_url("http://127.0.0.1:9000/api");
        assert_eq!(s.webapps_url(), "http://127.0.0.1:9000/api/webapps/");
        assert_eq!(s.site_hostname(), "alice.pythonanywhere.com");
    }

    #[test]
    fn debug_hides_token() {
        let s = Session::new("alice", "secret-token", Region::Www);
        assert!(!format!("{:?}", s).contains("secret-token"));
    }
}
