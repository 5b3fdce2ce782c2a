mod common;

use common::{mount_json, mount_status, TOKEN};
use deck_core::{Connection, HarvestConfig, HarvestRequest, ModuleSelection, OutputMode};
use deck_engine::{run, FetchSettings, OutputArtifact, Session};
use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::MockServer;

/// The session drives its own runtime, so the mock server lives on a separate one.
fn serve<F, Fut>(setup: F) -> (tokio::runtime::Runtime, MockServer)
where
    F: FnOnce(MockServer) -> Fut,
    Fut: std::future::Future<Output = MockServer>,
{
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(1)
        .enable_all()
        .build()
        .unwrap();
    let server = runtime.block_on(async { setup(MockServer::start().await).await });
    (runtime, server)
}

#[test]
fn lists_courses_and_modules_without_an_outer_runtime() {
    let (_runtime, server) = serve(|server| async move {
        mount_json(
            &server,
            "/api/v1/courses",
            json!([{"id": 1, "name": "Algebra"}, {"id": 2}, {"id": 3, "name": "Geometry"}]),
        )
        .await;
        mount_json(
            &server,
            "/api/v1/courses/1/modules",
            json!([{"id": 10, "name": "Intro", "position": 1}]),
        )
        .await;
        server
    });

    let connection = Connection::new(&server.uri(), TOKEN).unwrap();
    let session = Session::new(&connection, FetchSettings::default()).unwrap();

    let names: Vec<String> = session
        .courses()
        .unwrap()
        .into_iter()
        .map(|course| course.name)
        .collect();
    assert_eq!(names, vec!["Algebra".to_string(), "Geometry".to_string()]);

    let modules = session.modules(1).unwrap();
    assert_eq!(modules.len(), 1);
    assert_eq!(modules[0].name, "Intro");
    assert_eq!(modules[0].position, Some(1));
}

#[test]
fn run_produces_archive_for_empty_course() {
    let (_runtime, server) = serve(|server| async move {
        mount_json(&server, "/api/v1/courses/8", json!({"id": 8, "name": "Empty"})).await;
        mount_json(&server, "/api/v1/courses/8/modules", json!([])).await;
        server
    });

    let config = HarvestConfig {
        connection: Connection::new(&server.uri(), TOKEN).unwrap(),
        request: HarvestRequest {
            course_id: 8,
            modules: ModuleSelection::All,
            output: OutputMode::Archive,
            collision: Default::default(),
        },
    };
    let summary = run(&config, None).unwrap();

    assert_eq!(summary.course.name, "Empty");
    assert_eq!(summary.files_retrieved, 0);
    let OutputArtifact::Archive(bytes) = summary.artifact else {
        panic!("expected archive");
    };
    let archive = zip::ZipArchive::new(std::io::Cursor::new(bytes)).unwrap();
    assert_eq!(archive.len(), 0);
}

#[test]
fn rejected_token_surfaces_as_unauthorized() {
    let (_runtime, server) = serve(|server| async move {
        mount_status(&server, "/api/v1/courses", 401).await;
        server
    });

    let connection = Connection::new(&server.uri(), TOKEN).unwrap();
    let session = Session::new(&connection, FetchSettings::default()).unwrap();
    let err = session.courses().unwrap_err();
    assert!(err.is_unauthorized());
}
