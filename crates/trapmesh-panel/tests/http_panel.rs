use std::io::Read;
use std::net::TcpListener;
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tiny_http::{Response, Server};
use trapmesh_panel::endpoint::Endpoint;
use trapmesh_panel::form::{DebugMessage, SettingsUpdate, TrapMode};
use trapmesh_panel::notify::NotificationKind;
use trapmesh_panel::{ControlPanel, HttpTransport, PanelError, Transport, TransportError};
use trapmesh_topology::{GraphRenderer, NodeId, RebuildOutcome};

#[derive(Debug, Clone, PartialEq, Eq)]
struct Recorded {
    method: String,
    url: String,
    content_type: Option<String>,
    body: String,
}

type Route = dyn Fn(&str) -> (u16, String) + Send + Sync;

/// Fake module web server answering from `route(path)`.
struct ModuleServer {
    server: Arc<Server>,
    base: String,
    requests: Arc<Mutex<Vec<Recorded>>>,
    handle: Option<JoinHandle<()>>,
}

impl ModuleServer {
    fn start(route: impl Fn(&str) -> (u16, String) + Send + Sync + 'static) -> Self {
        let server = Arc::new(Server::http("127.0.0.1:0").expect("bind module server"));
        let addr = server.server_addr().to_ip().expect("tcp listener");
        let requests = Arc::new(Mutex::new(Vec::new()));
        let route: Box<Route> = Box::new(route);
        let handle = {
            let server = server.clone();
            let requests = requests.clone();
            thread::spawn(move || {
                for mut request in server.incoming_requests() {
                    let mut body = String::new();
                    let _ = request.as_reader().read_to_string(&mut body);
                    let content_type = request
                        .headers()
                        .iter()
                        .find(|header| header.field.equiv("Content-Type"))
                        .map(|header| header.value.as_str().to_string());
                    requests.lock().expect("requests").push(Recorded {
                        method: request.method().to_string(),
                        url: request.url().to_string(),
                        content_type,
                        body,
                    });
                    let (status, payload) = route(request.url());
                    let response = Response::from_string(payload).with_status_code(status);
                    let _ = request.respond(response);
                }
            })
        };
        Self {
            server,
            base: format!("http://{addr}"),
            requests,
            handle: Some(handle),
        }
    }

    fn panel(&self) -> ControlPanel<HttpTransport> {
        ControlPanel::new(HttpTransport::new(&self.base, Duration::from_secs(2)))
    }

    fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().expect("requests").clone()
    }
}

impl Drop for ModuleServer {
    fn drop(&mut self) {
        self.server.unblock();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn module_routes(path: &str) -> (u16, String) {
    match path {
        "/getModuleInfo" => (
            200,
            r#"{"NodeId":2733010421,"TrapMode":0,"TrapFire":false,"NodeList":[11,12],"GpsLat":"","GpsLon":""}"#
                .to_string(),
        ),
        "/getMeshGraph" => (
            200,
            r#"[{"nodeId":11,"subs":[{"nodeId":21}]},{"nodeId":12,"subs":[{"nodeId":21}]}]"#
                .to_string(),
        ),
        "/setConfig" => (200, r#"{"WorkTime":30,"TrapMode":1}"#.to_string()),
        "/sendMessage" => (200, String::new()),
        _ => (404, "not found".to_string()),
    }
}

#[test]
fn refresh_builds_graph_from_module_server() {
    let server = ModuleServer::start(module_routes);
    let mut panel = server.panel();
    let report = panel.refresh().expect("refresh");
    assert_eq!(report.embedded, None);
    assert_eq!(report.graph, RebuildOutcome::Rebuilt { nodes: 4, edges: 4 });

    let graph = panel.renderer().graph();
    assert_eq!(graph.in_degree(NodeId(21)), 2);
    assert_eq!(graph.node(NodeId::ROOT).expect("root").label, "Node 2733010421");
    assert_eq!(panel.status().trap_mode.as_deref(), Some("Set Mode"));
    assert_eq!(panel.status().node_list, vec!["11", "12"]);
    assert_eq!(panel.status().map_link, None);

    let requests = server.requests();
    let calls: Vec<_> = requests
        .iter()
        .map(|request| (request.method.as_str(), request.url.as_str()))
        .collect();
    assert_eq!(calls, vec![("GET", "/getModuleInfo"), ("GET", "/getMeshGraph")]);
}

#[test]
fn settings_are_posted_as_form() {
    let server = ModuleServer::start(module_routes);
    let mut panel = server.panel();
    panel
        .apply_settings(SettingsUpdate {
            work_time: Some(30),
            trap_mode: Some(TrapMode::Trap),
            active: None,
        })
        .expect("settings");
    panel
        .send_message(&DebugMessage {
            content: "hello trap".into(),
            target: Some(12),
        })
        .expect("message");

    let requests = server.requests();
    assert_eq!(requests[0].method, "POST");
    assert_eq!(requests[0].url, "/setConfig");
    assert_eq!(requests[0].body, "WorkTime=30&TrapMode=1");
    assert_eq!(
        requests[0].content_type.as_deref(),
        Some("application/x-www-form-urlencoded")
    );
    assert_eq!(requests[1].body, "messageContent=hello+trap&messageSendNodeId=12");
    assert_eq!(panel.status().trap_mode.as_deref(), Some("Trap Mode"));
}

#[test]
fn failure_status_is_reported_without_retry() {
    let server = ModuleServer::start(|_| (500, "busy".to_string()));
    let mut panel = server.panel();
    let err = panel.refresh().expect_err("server error");
    assert_eq!(
        err,
        PanelError::Transport(TransportError::Status(500, Endpoint::GetModuleInfo))
    );
    assert!(panel.notifications().is_visible(NotificationKind::Failure));
    assert_eq!(server.requests().len(), 1);
}

#[test]
fn unreachable_module_is_an_io_error() {
    let port = {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
        listener.local_addr().expect("addr").port()
    };
    let mut transport =
        HttpTransport::new(&format!("http://127.0.0.1:{port}"), Duration::from_millis(500));
    let err = transport.fetch(Endpoint::GetModuleInfo).expect_err("refused");
    assert!(matches!(err, TransportError::Io(_)), "{err:?}");
}
