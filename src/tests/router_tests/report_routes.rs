use crate::domain::{Listing, NearbyMatch};
use crate::errors::ServerError;
use crate::geo::Coordinate;
use crate::router::{handle, AppState};
use crate::store::save_snapshot;
use crate::tests::utils::{record, two_masjids, write_registry};
use astra::Body;
use http::{Method, Request};
use std::io::Read;
use tempfile::TempDir;

fn setup(listings: &[Listing]) -> (TempDir, AppState) {
    let dir = tempfile::tempdir().unwrap();
    let registry_path = write_registry(dir.path(), &two_masjids());
    let snapshot_path = dir.path().join("listings.json");
    save_snapshot(&snapshot_path, listings).unwrap();

    (
        dir,
        AppState {
            registry_path,
            snapshot_path,
        },
    )
}

fn get(path: &str) -> astra::Request {
    Request::builder()
        .method(Method::GET)
        .uri(path)
        .body(Body::empty())
        .unwrap()
}

fn body_of(resp: astra::Response) -> String {
    let mut body = String::new();
    resp.into_body().reader().read_to_string(&mut body).unwrap();
    body
}

fn main_st() -> Listing {
    Listing {
        record: record("100 Main St, Phoenix", "https://fsbo.example/1", "Phoenix"),
        coordinate: Coordinate::new(33.46, -112.06),
        nearby: vec![NearbyMatch {
            name: "Masjid A".into(),
            distance_miles: 0.89,
        }],
    }
}

#[test]
fn home_page_renders_report_from_snapshot() {
    let (_dir, state) = setup(&[main_st()]);

    let resp = handle(get("/"), &state).expect("Handler failed");

    assert_eq!(resp.status(), 200);
    assert_eq!(
        resp.headers().get("Content-Type").unwrap().to_str().unwrap(),
        "text/html; charset=utf-8"
    );
    let body = body_of(resp);
    assert!(body.contains("Masjid A"));
    assert!(body.contains("100 Main St, Phoenix"));
    assert!(body.contains("https://fsbo.example/1"));
    assert!(!body.contains("Masjid B ·"), "empty groups are not rendered");
}

#[test]
fn home_page_without_snapshot_shows_notice() {
    let (_dir, state) = setup(&[]);
    std::fs::remove_file(&state.snapshot_path).unwrap();

    let body = body_of(handle(get("/"), &state).expect("Handler failed"));

    assert!(body.contains("No matching houses found"));
}

#[test]
fn listings_json_returns_snapshot() {
    let (_dir, state) = setup(&[main_st()]);

    let resp = handle(get("/listings.json"), &state).expect("Handler failed");

    assert_eq!(resp.status(), 200);
    assert_eq!(
        resp.headers().get("Content-Type").unwrap().to_str().unwrap(),
        "application/json"
    );
    let listings: Vec<Listing> = serde_json::from_str(&body_of(resp)).unwrap();
    assert_eq!(listings, vec![main_st()]);
}

#[test]
fn missing_registry_is_a_server_error() {
    let (_dir, mut state) = setup(&[]);
    state.registry_path = state.registry_path.with_file_name("nope.json");

    assert!(matches!(handle(get("/"), &state), Err(ServerError::Registry(_))));
}

#[test]
fn unknown_route_is_not_found() {
    let (_dir, state) = setup(&[]);

    let req = Request::builder()
        .method(Method::POST)
        .uri("/")
        .body(Body::empty())
        .unwrap();
    assert!(matches!(handle(req, &state), Err(ServerError::NotFound)));
    assert!(matches!(handle(get("/admin"), &state), Err(ServerError::NotFound)));
}

#[test]
fn error_page_carries_status() {
    let resp = crate::templates::html_error_response(ServerError::NotFound);
    assert_eq!(resp.status(), 404);
    assert!(body_of(resp).contains("Error 404"));
}
