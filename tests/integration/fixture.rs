use std::path::{Path, PathBuf};
use std::sync::Arc;

use models_repository::{
    dtmi_to_path, ClientOptions, DependencyResolution, ModelQuery, RemoteModelFetcher,
    RepositoryLocation, ResolvedModels, ResolverClient, Url,
};
use serde_json::{json, Value};
use tempfile::TempDir;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

pub(crate) const THERMOSTAT: &str = "dtmi:com:example:Thermostat;1";
pub(crate) const DEVICE_INFO_1: &str = "dtmi:azure:DeviceManagement:DeviceInformation;1";
pub(crate) const DEVICE_INFO_2: &str = "dtmi:azure:DeviceManagement:DeviceInformation;2";
pub(crate) const CONTROLLER: &str = "dtmi:com:example:TemperatureController;1";
pub(crate) const CAMERA: &str = "dtmi:com:example:Camera;3";
pub(crate) const PHONE: &str = "dtmi:com:example:Phone;2";
pub(crate) const ROOM: &str = "dtmi:com:example:Room;1";
pub(crate) const FREEZER: &str = "dtmi:com:example:Freezer;1";
pub(crate) const COLD_STORAGE: &str = "dtmi:com:example:ColdStorage;1";
pub(crate) const CONFERENCE_ROOM: &str = "dtmi:com:example:ConferenceRoom;1";
pub(crate) const BASE_1: &str = "dtmi:com:example:base;1";
pub(crate) const BASE_2: &str = "dtmi:com:example:base;2";
pub(crate) const INVALID_MODEL: &str = "dtmi:com:example:invalidmodel;1";
pub(crate) const MISSING_DEPENDENCY: &str =
    "dtmi:azure:fakeDeviceManagement:FakeDeviceInformation;2";
pub(crate) const CYCLE_A: &str = "dtmi:com:example:CycleA;1";
pub(crate) const CYCLE_B: &str = "dtmi:com:example:CycleB;1";
pub(crate) const UNAVAILABLE: &str = "dtmi:com:example:Unavailable;1";
pub(crate) const NOT_UTF8: &str = "dtmi:com:example:Latin1;1";

fn interface(id: &str, extends: Value, contents: Value) -> Value {
    json!({
        "@context": "dtmi:dtdl:context;2",
        "@id": id,
        "@type": "Interface",
        "displayName": id.rsplit(':').next().unwrap_or(id),
        "extends": extends,
        "contents": contents,
    })
}

fn component(name: &str, schema: Value) -> Value {
    json!({ "@type": "Component", "name": name, "schema": schema })
}

fn telemetry(name: &str) -> Value {
    json!({ "@type": "Telemetry", "name": name, "schema": "double" })
}

fn models() -> Vec<Value> {
    vec![
        interface(THERMOSTAT, json!([]), json!([telemetry("temperature")])),
        interface(DEVICE_INFO_1, json!([]), json!([telemetry("uptime")])),
        interface(DEVICE_INFO_2, json!([]), json!([telemetry("uptime")])),
        interface(
            CONTROLLER,
            json!([]),
            json!([
                component("thermostat1", json!(THERMOSTAT)),
                component("thermostat2", json!(THERMOSTAT)),
                component("deviceInformation", json!(DEVICE_INFO_1)),
            ]),
        ),
        interface(
            CAMERA,
            json!([]),
            json!([component("deviceInformation", json!(DEVICE_INFO_2))]),
        ),
        interface(
            PHONE,
            json!([]),
            json!([
                component("frontCamera", json!(CAMERA)),
                component("backCamera", json!(CAMERA)),
                component("deviceInformation", json!(DEVICE_INFO_2)),
            ]),
        ),
        interface(ROOM, json!([]), json!([telemetry("occupancy")])),
        interface(FREEZER, json!([]), json!([telemetry("temperature")])),
        interface(COLD_STORAGE, json!([ROOM, FREEZER]), json!([])),
        interface(CONFERENCE_ROOM, json!(ROOM), json!([])),
        interface(
            BASE_1,
            json!([interface("dtmi:com:example:inlinebase;1", json!([]), json!([telemetry("t")]))]),
            json!([]),
        ),
        interface(
            BASE_2,
            json!([interface("dtmi:com:example:inlinebase;2", json!(FREEZER), json!([]))]),
            json!([component("thermostat", json!(THERMOSTAT))]),
        ),
        interface(
            INVALID_MODEL,
            json!([]),
            json!([
                component("thermostat", json!(THERMOSTAT)),
                component("deviceInformation", json!(MISSING_DEPENDENCY)),
            ]),
        ),
        interface(CYCLE_A, json!(CYCLE_B), json!([])),
        interface(CYCLE_B, json!(CYCLE_A), json!([])),
    ]
}

fn write_file(root: &Path, relative: &str, content: &str) {
    let path = relative
        .split('/')
        .fold(root.to_path_buf(), |acc, segment| acc.join(segment));
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("Failed to create model directory");
    }
    std::fs::write(path, content).expect("Failed to write model");
}

/// A models repository on disk, optionally served over HTTP.
pub(crate) struct Repository {
    dir: TempDir,
}

impl Repository {
    pub(crate) fn new() -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");

        let all = models();
        for model in &all {
            let id = model["@id"].as_str().unwrap();
            write_file(
                dir.path(),
                &dtmi_to_path(id, false).unwrap(),
                &serde_json::to_string_pretty(model).unwrap(),
            );
        }

        // Only the controller publishes an expanded document
        let expanded: Vec<&Value> = all
            .iter()
            .filter(|m| {
                let id = m["@id"].as_str().unwrap();
                id == CONTROLLER || id == THERMOSTAT || id == DEVICE_INFO_1
            })
            .collect();
        write_file(
            dir.path(),
            &dtmi_to_path(CONTROLLER, true).unwrap(),
            &serde_json::to_string_pretty(&expanded).unwrap(),
        );

        // Stored where the unavailable model would be, but not readable as a file
        let unavailable = dtmi_to_path(UNAVAILABLE, false).unwrap();
        std::fs::create_dir_all(
            unavailable
                .split('/')
                .fold(dir.path().to_path_buf(), |acc, segment| acc.join(segment)),
        )
        .unwrap();

        let not_utf8 = dtmi_to_path(NOT_UTF8, false)
            .unwrap()
            .split('/')
            .fold(dir.path().to_path_buf(), |acc, segment| acc.join(segment));
        std::fs::create_dir_all(not_utf8.parent().unwrap()).unwrap();
        std::fs::write(&not_utf8, b"{\"@id\": \"dtmi:com:example:Latin1;1\", \"displayName\": \"caf\xe9\"}")
            .unwrap();

        Self { dir }
    }

    pub(crate) fn root(&self) -> PathBuf {
        self.dir.path().to_path_buf()
    }

    pub(crate) fn local_client(&self, resolution: DependencyResolution) -> ResolverClient {
        let options = ClientOptions::default().with_dependency_resolution(resolution);
        ResolverClient::with_repository(RepositoryLocation::Local(self.root()), options)
            .expect("Failed to create local client")
    }

    pub(crate) async fn serve(&self) -> ModelServer {
        ModelServer::start(self.root()).await
    }
}

/// Minimal HTTP server exposing a repository directory.
pub(crate) struct ModelServer {
    base: Url,
    handle: JoinHandle<()>,
}

impl ModelServer {
    async fn start(root: PathBuf) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test server");
        let addr = listener.local_addr().unwrap();

        let handle = tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                let root = root.clone();
                tokio::spawn(async move {
                    let _ = handle_connection(stream, &root).await;
                });
            }
        });

        Self {
            base: Url::parse(&format!("http://{}/", addr)).unwrap(),
            handle,
        }
    }

    pub(crate) fn base(&self) -> Url {
        self.base.clone()
    }

    pub(crate) fn client(&self, resolution: DependencyResolution) -> ResolverClient {
        let http = reqwest::Client::builder()
            .no_proxy()
            .build()
            .expect("Failed to build HTTP client");
        let fetcher = Arc::new(RemoteModelFetcher::with_client(self.base(), http));
        let options = ClientOptions::default().with_dependency_resolution(resolution);
        ResolverClient::with_fetcher(RepositoryLocation::Remote(self.base()), fetcher, options)
            .expect("Failed to create remote client")
    }
}

impl Drop for ModelServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn handle_connection(mut stream: TcpStream, root: &Path) -> std::io::Result<()> {
    let (read_half, mut write_half) = stream.split();
    let mut reader = BufReader::new(read_half);

    let mut request_line = String::new();
    reader.read_line(&mut request_line).await?;
    loop {
        let mut header = String::new();
        let read = reader.read_line(&mut header).await?;
        if read == 0 || header == "\r\n" || header == "\n" {
            break;
        }
    }

    let path = request_line.split_whitespace().nth(1).unwrap_or("/");
    let file = path
        .split('/')
        .filter(|segment| !segment.is_empty())
        .fold(root.to_path_buf(), |acc, segment| acc.join(segment));

    let (status, body) = match tokio::fs::read(&file).await {
        Ok(body) => ("200 OK", body),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => ("404 Not Found", Vec::new()),
        Err(_) => ("500 Internal Server Error", Vec::new()),
    };

    let head = format!(
        "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        status,
        body.len()
    );
    write_half.write_all(head.as_bytes()).await?;
    write_half.write_all(&body).await?;
    write_half.shutdown().await
}

/// Every expected key is present and its content declares that key.
pub(crate) fn assert_resolved(results: &ResolvedModels, expected: &[&str]) {
    assert_eq!(
        results.len(),
        expected.len(),
        "Unexpected keys: {:?}",
        results.keys().collect::<Vec<_>>()
    );
    for id in expected {
        let content = results
            .get(*id)
            .unwrap_or_else(|| panic!("Missing {} in results", id));
        let declared = ModelQuery::new(content, id)
            .parse_id()
            .unwrap_or_else(|e| panic!("Content of {} does not parse: {}", id, e));
        assert_eq!(&declared, id);
    }
}
