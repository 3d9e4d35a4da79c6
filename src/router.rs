use crate::errors::ServerError;
use crate::places::Registry;
use crate::report::render_report;
use crate::responses::{html_response, json_response, ResultResp};
use crate::store::load_snapshot;
use astra::Request;
use std::path::PathBuf;

/// Files the server reads on every request, so a running scan shows up on refresh.
#[derive(Debug, Clone)]
pub struct AppState {
    pub registry_path: PathBuf,
    pub snapshot_path: PathBuf,
}

pub fn handle(req: Request, state: &AppState) -> ResultResp {
    let method = req.method().as_str();
    let path = req.uri().path();

    match (method, path) {
        ("GET", "/") => {
            let registry = Registry::load(&state.registry_path)?;
            let listings = load_snapshot(&state.snapshot_path)?;
            html_response(render_report(&listings, &registry))
        }
        ("GET", "/listings.json") => {
            let listings = load_snapshot(&state.snapshot_path)?;
            json_response(&listings)
        }
        _ => Err(ServerError::NotFound),
    }
}
