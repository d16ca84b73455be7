// Provisioning run: list sites, create if missing, upload sources and the
// WSGI file, add the static route, reload. Strictly in that order, and the
// first step that gets an unexpected status ends the run.

use anyhow::{Context, Result};
use indicatif::ProgressBar;
use reqwest::StatusCode;
use serde::Deserialize;
use std::cell::RefCell;
use std::io::{self, Stdout, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

use crate::api::{Reply, Transport};
use crate::session::Session;

/// Local application files uploaded on every run, relative to the source
/// directory. The leading `src` segment is not part of the remote path.
pub const SOURCE_FILES: [&str; 3] = [
    "src/flask_app.py",
    "src/static/style.css",
    "src/templates/index.html",
];

pub const PYTHON_VERSION: &str = "python37";
pub const STATIC_URL: &str = "/static";

/// Multipart field the files endpoint reads the upload from.
const UPLOAD_FIELD: &str = "content";

const OK_OR_CREATED: [StatusCode; 2] = [StatusCode::OK, StatusCode::CREATED];

#[derive(Debug, Error)]
pub enum ProvisionError {
    #[error("Error {action}: status was {status}\n{body}")]
    UnexpectedStatus {
        action: String,
        status: u16,
        body: String,
    },

    #[error("Error reading website list: {0}")]
    SiteList(#[from] serde_json::Error),
}

/// One entry of the `webapps/` listing. Other fields are ignored.
#[derive(Debug, Deserialize)]
struct SiteRecord {
    domain_name: String,
}

/// What a completed run did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub site_created: bool,
    /// Remote paths written, in upload order (WSGI file last).
    pub uploaded: Vec<String>,
    pub site_url: String,
}

/// Runs the steps against `transport`, narrating each one to `out`
/// (stdout unless replaced with `with_output`).
pub struct Provisioner<'a, T: Transport, W: Write = Stdout> {
    transport: &'a T,
    session: &'a Session,
    source_dir: PathBuf,
    progress: ProgressBar,
    out: RefCell<W>,
}

impl<'a, T: Transport> Provisioner<'a, T, Stdout> {
    pub fn new(
        transport: &'a T,
        session: &'a Session,
        source_dir: impl Into<PathBuf>,
        progress: ProgressBar,
    ) -> Self {
        Provisioner {
            transport,
            session,
            source_dir: source_dir.into(),
            progress,
            out: RefCell::new(io::stdout()),
        }
    }
}

impl<'a, T: Transport, W: Write> Provisioner<'a, T, W> {
    /// Send status lines somewhere other than stdout.
    pub fn with_output<O: Write>(self, out: O) -> Provisioner<'a, T, O> {
        Provisioner {
            transport: self.transport,
            session: self.session,
            source_dir: self.source_dir,
            progress: self.progress,
            out: RefCell::new(out),
        }
    }

    /// Run every step. Returns at the first failure; nothing already done
    /// remotely is undone.
    pub fn run(&self) -> Result<Outcome> {
        let site_created = self.ensure_site()?;

        let mut uploaded = Vec::with_capacity(SOURCE_FILES.len() + 1);
        for path in SOURCE_FILES {
            uploaded.push(self.upload_source(path)?);
        }
        uploaded.push(self.upload_wsgi_file()?);

        self.configure_static_route()?;
        self.reload()?;

        let site_url = self.session.site_url();
        self.say(&format!("All done!  The site is now live at {}", site_url))?;

        Ok(Outcome {
            site_created,
            uploaded,
            site_url,
        })
    }

    /// Hostnames of every site on the account.
    pub fn list_sites(&self) -> Result<Vec<String>> {
        let url = self.session.webapps_url();
        self.say(&format!("Checking if website already exists with GET from {}", url))?;
        self.progress.set_message("Listing websites...");
        let reply = self.transport.get(&url)?;
        expect_status(&reply, &[StatusCode::OK], "getting website list")?;

        let sites: Vec<SiteRecord> =
            serde_json::from_str(&reply.body).map_err(ProvisionError::SiteList)?;
        let names: Vec<String> = sites.into_iter().map(|s| s.domain_name).collect();
        self.say(&format!("Found these sites: {:?}", names))?;
        Ok(names)
    }

    /// Create the site unless the listing already has it. Returns whether
    /// a create call was made.
    pub fn ensure_site(&self) -> Result<bool> {
        let hostname = self.session.site_hostname();
        if self.list_sites()?.iter().any(|s| s == hostname) {
            debug!(hostname, "site already exists");
            return Ok(false);
        }

        let url = self.session.webapps_url();
        self.say(&format!("Creating website at {} with POST to {}", hostname, url))?;
        self.progress.set_message("Creating website...");
        let reply = self.transport.post_form(
            &url,
            &[("domain_name", hostname), ("python_version", PYTHON_VERSION)],
        )?;
        expect_status(&reply, &OK_OR_CREATED, "creating site")?;
        Ok(true)
    }

    /// Read one manifest file and upload it. Returns the remote path.
    pub fn upload_source(&self, path: &str) -> Result<String> {
        self.say(&format!("Reading {}", path))?;
        let content = read_source_text(&self.source_dir.join(path))?;

        let remote_path = self.session.remote_path_for(path);
        let url = self.session.upload_url_for(&remote_path);
        self.say(&format!("Uploading {} via {}", path, url))?;
        self.progress.set_message(format!("Uploading {}...", path));
        let reply = self.transport.post_file(&url, UPLOAD_FIELD, content.into_bytes())?;
        expect_status(&reply, &OK_OR_CREATED, &format!("uploading {}", path))?;
        Ok(remote_path)
    }

    pub fn upload_wsgi_file(&self) -> Result<String> {
        let remote_path = self.session.wsgi_remote_path();
        let url = self.session.upload_url_for(&remote_path);
        let content = self.session.wsgi_file_content();
        self.say(&format!("Uploading WSGI file via {}", url))?;
        self.progress.set_message("Uploading WSGI file...");
        let reply = self.transport.post_file(&url, UPLOAD_FIELD, content.into_bytes())?;
        expect_status(&reply, &OK_OR_CREATED, "uploading WSGI file")?;
        Ok(remote_path)
    }

    pub fn configure_static_route(&self) -> Result<()> {
        let url = self.session.static_files_url();
        let path = self.session.static_route_path();
        self.say(&format!("Configuring static file route with post to {}", url))?;
        self.progress.set_message("Configuring static files...");
        let reply = self
            .transport
            .post_form(&url, &[("url", STATIC_URL), ("path", path.as_str())])?;
        expect_status(&reply, &OK_OR_CREATED, "creating static file route")?;
        Ok(())
    }

    pub fn reload(&self) -> Result<()> {
        let url = self.session.reload_url();
        self.say(&format!("Reloading website with post to {}", url))?;
        self.progress.set_message("Reloading website...");
        let reply = self.transport.post_empty(&url)?;
        expect_status(&reply, &OK_OR_CREATED, "reloading website")?;
        Ok(())
    }

    /// Status lines are printed above the spinner.
    fn say(&self, line: &str) -> Result<()> {
        self.progress
            .suspend(|| writeln!(self.out.borrow_mut(), "{}", line))
            .context("Failed to write status output")
    }
}

/// Sources are uploaded as text: UTF-8 only, with `\r\n` and lone `\r`
/// line endings turned into `\n`.
fn read_source_text(path: &Path) -> Result<String> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    Ok(text.replace("\r\n", "\n").replace('\r', "\n"))
}

fn expect_status(
    reply: &Reply,
    accepted: &[StatusCode],
    action: &str,
) -> Result<(), ProvisionError> {
    if accepted.contains(&reply.status) {
        return Ok(());
    }
    Err(ProvisionError::UnexpectedStatus {
        action: action.to_string(),
        status: reply.status.as_u16(),
        body: reply.body.clone(),
    })
}
