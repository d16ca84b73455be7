// Library root
// -----------
// Provisioning for a PythonAnywhere account. The binary (`main.rs`) reads
// settings and hands off to `ui::run`.
//
// Module responsibilities:
// - `session`: region, derived hostnames, API URLs, remote paths and the
//   generated WSGI file.
// - `api`: the `Transport` seam and its blocking reqwest implementation.
// - `provision`: the ordered provisioning steps and their status checks.
// - `config`: optional environment overrides.
// - `ui`: terminal prompts and the spinner around a run.
pub mod api;
pub mod config;
pub mod provision;
pub mod session;
pub mod ui;
