// UI layer: prompts for the account details with `dialoguer`, then runs the
// provisioning steps behind an `indicatif` spinner.

use crate::api::ApiClient;
use crate::config::Settings;
use crate::provision::{Outcome, Provisioner};
use crate::session::{Region, Session};
use anyhow::Result;
use dialoguer::{Input, Password};
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

const USERNAME_PROMPT: &str = "Please enter the PythonAnywhere username";
const TOKEN_PROMPT: &str = "Please enter the API token";
const REGION_PROMPT: &str = "Please enter the region (eu or www)";

/// Prompt for everything, then provision. Blocks until the site has been
/// reloaded or a step fails.
pub fn run(settings: &Settings) -> Result<Outcome> {
    let mut session = prompt_session()?;
    if let Some(url) = &settings.api_base_url {
        session = session.with_api_base_url(url);
    }

    let api = ApiClient::new(session.token(), settings.http_timeout)?;

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::with_template("{spinner} {msg}")?);
    spinner.enable_steady_tick(Duration::from_millis(100));

    let source_dir = settings.source_dir.clone();
    let result = Provisioner::new(&api, &session, source_dir, spinner.clone()).run();
    spinner.finish_and_clear();
    result
}

/// Ask for username, API token and region on the terminal.
pub fn prompt_session() -> Result<Session> {
    read_session(
        |prompt| {
            Ok(Input::<String>::new()
                .with_prompt(prompt)
                .allow_empty(true)
                .interact_text()?)
        },
        // `Password` keeps the token off the screen.
        |prompt| {
            Ok(Password::new()
                .with_prompt(prompt)
                .allow_empty_password(true)
                .interact()?)
        },
    )
}

/// Collect username, token and region, in that order. Username and token
/// are taken as typed, empty or not; a bad value shows up later as a
/// rejected request.
pub fn read_session<A, S>(mut ask: A, mut ask_secret: S) -> Result<Session>
where
    A: FnMut(&str) -> Result<String>,
    S: FnMut(&str) -> Result<String>,
{
    let username = ask(USERNAME_PROMPT)?;
    let token = ask_secret(TOKEN_PROMPT)?;
    let region = read_region(|| ask(REGION_PROMPT))?;
    Ok(Session::new(&username, &token, region))
}

/// Keep asking until the answer is exactly `eu` or `www`.
pub fn read_region<F>(mut ask: F) -> Result<Region>
where
    F: FnMut() -> Result<String>,
{
    loop {
        if let Some(region) = Region::parse(&ask()?) {
            return Ok(region);
        }
    }
}
