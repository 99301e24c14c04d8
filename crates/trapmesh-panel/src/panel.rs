//! Control panel coordinator.
//!
//! Every operation is one request/response exchange followed by a direct
//! continuation; the result also raises a success or failure popup.

#![allow(missing_docs)]

use std::fmt;
use std::time::Duration;

use time::UtcOffset;
use tracing::{info, warn};
use trapmesh_topology::{
    LayoutRenderer, RebuildOutcome, TopologyIngestor, TopologyPayload, DEFAULT_SETTLE,
};

use crate::clock::{local_epoch_now, local_offset, ClockDisplay};
use crate::config::PanelConfig;
use crate::endpoint::Endpoint;
use crate::error::PanelError;
use crate::form::{DebugMessage, FormPayload, SettingsUpdate, SnapshotRequest, TimeSync};
use crate::notify::Notifications;
use crate::status::{ClockSource, ModuleStatus, StatusDisplay};
use crate::transport::Transport;

/// Outcome of [`ControlPanel::refresh`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshReport {
    /// Rebuild triggered by a `MeshGraph` field inside the status, if any.
    pub embedded: Option<RebuildOutcome>,
    /// Rebuild from the dedicated `getMeshGraph` call.
    pub graph: RebuildOutcome,
}

/// Panel state for one module plus the transport to reach it.
pub struct ControlPanel<T: Transport> {
    transport: T,
    status: StatusDisplay,
    clock: ClockDisplay,
    ingestor: TopologyIngestor,
    renderer: LayoutRenderer,
    notifications: Notifications,
    offset: UtcOffset,
}

impl<T: Transport> ControlPanel<T> {
    pub fn new(transport: T) -> Self {
        Self::with_offset(transport, local_offset(None), DEFAULT_SETTLE)
    }

    /// Panel using the settle time and UTC offset from `config`.
    pub fn from_config(transport: T, config: &PanelConfig) -> Self {
        Self::with_offset(
            transport,
            local_offset(config.utc_offset_minutes),
            config.settle,
        )
    }

    fn with_offset(transport: T, offset: UtcOffset, settle: Duration) -> Self {
        Self {
            transport,
            status: StatusDisplay::new(),
            clock: ClockDisplay::new(offset),
            ingestor: TopologyIngestor::new().with_settle(settle),
            renderer: LayoutRenderer::new(),
            notifications: Notifications::new(),
            offset,
        }
    }

    /// Replaces the ingestor, for deterministic positions in tests.
    #[must_use]
    pub fn with_ingestor(mut self, ingestor: TopologyIngestor) -> Self {
        self.ingestor = ingestor;
        self
    }

    pub fn status(&self) -> &StatusDisplay {
        &self.status
    }

    pub fn clock(&self) -> &ClockDisplay {
        &self.clock
    }

    pub fn renderer(&self) -> &LayoutRenderer {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut LayoutRenderer {
        &mut self.renderer
    }

    pub fn notifications(&self) -> &Notifications {
        &self.notifications
    }

    pub fn notifications_mut(&mut self) -> &mut Notifications {
        &mut self.notifications
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// `getModuleInfo` followed by `getMeshGraph`.
    pub fn refresh(&mut self) -> Result<RefreshReport, PanelError> {
        let embedded = self.load_module_info()?;
        let graph = self.load_mesh_graph()?;
        Ok(RefreshReport { embedded, graph })
    }

    /// Fetches and applies the module status. Returns the rebuild caused by
    /// an embedded `MeshGraph`.
    pub fn load_module_info(&mut self) -> Result<Option<RebuildOutcome>, PanelError> {
        let result = self
            .fetch(Endpoint::GetModuleInfo)
            .and_then(|body| self.apply_status(&body));
        self.notify(Endpoint::GetModuleInfo, result)
    }

    pub fn load_mesh_graph(&mut self) -> Result<RebuildOutcome, PanelError> {
        let result = self.fetch(Endpoint::GetMeshGraph).and_then(|body| {
            let root = self.status.root_identifier().map(str::to_string);
            let outcome =
                self.ingestor
                    .rebuild_graph(&mut self.renderer, root.as_deref(), &body)?;
            Ok(outcome)
        });
        self.notify(Endpoint::GetMeshGraph, result)
    }

    /// Sends the host wall clock and restarts the clock from the module's
    /// answer.
    pub fn sync_time(&mut self) -> Result<ClockSource, PanelError> {
        let form = TimeSync {
            current_time: local_epoch_now(self.offset),
        }
        .to_form();
        let result = self
            .submit(Endpoint::SetCurrentTime, &form)
            .and_then(|body| {
                let source = parse_clock_body(&body)?;
                self.clock.sync(source);
                Ok(source)
            });
        self.notify(Endpoint::SetCurrentTime, result)
    }

    /// Posts new settings; the answer is a status object and is applied.
    pub fn apply_settings(&mut self, update: SettingsUpdate) -> Result<(), PanelError> {
        let result = update
            .to_form()
            .and_then(|form| self.submit(Endpoint::SetConfig, &form))
            .and_then(|body| self.apply_status(&body).map(|_| ()));
        self.notify(Endpoint::SetConfig, result)
    }

    pub fn send_message(&mut self, message: &DebugMessage) -> Result<(), PanelError> {
        let result = message
            .to_form()
            .and_then(|form| self.submit(Endpoint::SendMessage, &form))
            .map(|_| ());
        self.notify(Endpoint::SendMessage, result)
    }

    /// Requests a picture. Returns whether the displayed picture changed.
    pub fn snapshot(&mut self, request: SnapshotRequest) -> Result<bool, PanelError> {
        let result = self
            .submit(Endpoint::SnapShot, &request.to_form())
            .map(|body| self.status.set_picture(&body));
        self.notify(Endpoint::SnapShot, result)
    }

    /// Resets the module's GPS fix and forgets the displayed location.
    pub fn init_gps(&mut self) -> Result<(), PanelError> {
        let result = self
            .submit(Endpoint::InitGps, &FormPayload::new())
            .map(|_| self.status.clear_gps());
        self.notify(Endpoint::InitGps, result)
    }

    /// Asks the module to acquire a fix; the location arrives with the next
    /// status refresh.
    pub fn request_gps(&mut self) -> Result<(), PanelError> {
        let result = self.fetch(Endpoint::GetGps).map(|_| ());
        self.notify(Endpoint::GetGps, result)
    }

    fn apply_status(&mut self, body: &str) -> Result<Option<RebuildOutcome>, PanelError> {
        let status = ModuleStatus::parse(body)
            .map_err(|err| PanelError::InvalidResponse(format!("status: {err}").into()))?;
        let update = self.status.apply(status);
        if let Some(source) = update.clock {
            self.clock.sync(source);
        }
        let Some(raw) = update.topology else {
            return Ok(None);
        };
        let root = self.status.root_identifier().map(str::to_string);
        let outcome = match TopologyPayload::from_json(raw)? {
            TopologyPayload::Encoded(raw) if raw.trim().is_empty() => return Ok(None),
            TopologyPayload::Encoded(raw) => {
                self.ingestor
                    .rebuild_graph(&mut self.renderer, root.as_deref(), &raw)?
            }
            TopologyPayload::Peers(peers) => self.ingestor.rebuild_from_descriptors(
                &mut self.renderer,
                root.as_deref(),
                &peers,
            )?,
        };
        Ok(Some(outcome))
    }

    fn fetch(&mut self, endpoint: Endpoint) -> Result<String, PanelError> {
        Ok(self.transport.fetch(endpoint)?)
    }

    fn submit(&mut self, endpoint: Endpoint, form: &FormPayload) -> Result<String, PanelError> {
        Ok(self.transport.submit(endpoint, form)?)
    }

    fn notify<V>(
        &mut self,
        endpoint: Endpoint,
        result: Result<V, PanelError>,
    ) -> Result<V, PanelError> {
        match &result {
            Ok(_) => {
                info!("{endpoint} ok");
                self.notifications.success(Completed(endpoint).to_string());
            }
            Err(err) => {
                warn!("{endpoint} failed: {err}");
                self.notifications.failure(format!("{}: {err}", endpoint.path()));
            }
        }
        result
    }
}

struct Completed(Endpoint);

impl fmt::Display for Completed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self.0 {
            Endpoint::GetModuleInfo => "module info updated",
            Endpoint::GetMeshGraph => "mesh graph updated",
            Endpoint::SetCurrentTime => "module time synchronized",
            Endpoint::SetConfig => "settings applied",
            Endpoint::SendMessage => "message sent",
            Endpoint::SnapShot => "snapshot taken",
            Endpoint::InitGps => "GPS reset",
            Endpoint::GetGps => "GPS fix requested",
        };
        f.write_str(text)
    }
}

/// `setCurrentTime` answers with the module epoch as plain text; an empty
/// body means the module has no time yet.
fn parse_clock_body(body: &str) -> Result<ClockSource, PanelError> {
    let body = body.trim().trim_matches('"').trim();
    if body.is_empty() {
        return Ok(ClockSource::Host);
    }
    body.parse::<i64>()
        .map(ClockSource::Module)
        .map_err(|_| PanelError::InvalidResponse(format!("current time '{body}'").into()))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use trapmesh_topology::{GraphRenderer, Jitter, NodeId};

    use super::*;
    use crate::form::TrapMode;
    use crate::notify::NotificationKind;
    use crate::transport::TransportError;

    #[derive(Default)]
    struct FakeTransport {
        responses: HashMap<Endpoint, Result<String, TransportError>>,
        calls: Vec<(Endpoint, String)>,
    }

    impl FakeTransport {
        fn answer(mut self, endpoint: Endpoint, body: &str) -> Self {
            self.responses.insert(endpoint, Ok(body.to_string()));
            self
        }

        fn fail(mut self, endpoint: Endpoint, status: u16) -> Self {
            self.responses
                .insert(endpoint, Err(TransportError::Status(status, endpoint)));
            self
        }

        fn respond(&mut self, endpoint: Endpoint, body: String) -> Result<String, TransportError> {
            self.calls.push((endpoint, body));
            self.responses
                .get(&endpoint)
                .cloned()
                .unwrap_or(Err(TransportError::Status(404, endpoint)))
        }
    }

    impl Transport for FakeTransport {
        fn fetch(&mut self, endpoint: Endpoint) -> Result<String, TransportError> {
            self.respond(endpoint, String::new())
        }

        fn submit(
            &mut self,
            endpoint: Endpoint,
            form: &FormPayload,
        ) -> Result<String, TransportError> {
            self.respond(endpoint, form.encode())
        }
    }

    struct Fixed;

    impl Jitter for Fixed {
        fn coordinate(&mut self) -> f64 {
            0.5
        }
    }

    fn panel(transport: FakeTransport) -> ControlPanel<FakeTransport> {
        ControlPanel::new(transport).with_ingestor(TopologyIngestor::with_jitter(Fixed))
    }

    #[test]
    fn refresh_applies_status_then_rebuilds_graph() {
        let transport = FakeTransport::default()
            .answer(
                Endpoint::GetModuleInfo,
                r#"{"NodeId":100,"TrapMode":1,"WorkTime":180,"MeshGraph":"[{\"nodeId\":1}]"}"#,
            )
            .answer(
                Endpoint::GetMeshGraph,
                r#"[{"nodeId":1,"subs":[{"nodeId":2}]},{"nodeId":3,"subs":[{"nodeId":2}]}]"#,
            );
        let mut panel = panel(transport);
        let report = panel.refresh().unwrap();
        assert_eq!(
            report.embedded,
            Some(RebuildOutcome::Rebuilt { nodes: 2, edges: 1 })
        );
        assert_eq!(report.graph, RebuildOutcome::Rebuilt { nodes: 4, edges: 4 });
        assert_eq!(panel.status().trap_mode.as_deref(), Some("Trap Mode"));
        let graph = panel.renderer().graph();
        assert_eq!(graph.in_degree(NodeId(2)), 2);
        assert_eq!(graph.node(NodeId::ROOT).unwrap().label, "Node 100");
        assert!(panel.renderer().is_layout_running());
        let calls: Vec<_> = panel.transport().calls.iter().map(|(e, _)| *e).collect();
        assert_eq!(calls, vec![Endpoint::GetModuleInfo, Endpoint::GetMeshGraph]);
        assert!(panel.notifications().is_visible(NotificationKind::Success));
    }

    #[test]
    fn graph_is_skipped_without_module_id() {
        let transport = FakeTransport::default().answer(Endpoint::GetMeshGraph, "[]");
        let mut panel = panel(transport);
        assert_eq!(panel.load_mesh_graph().unwrap(), RebuildOutcome::Skipped);
        assert!(panel.renderer().graph().is_empty());
    }

    #[test]
    fn transport_failure_raises_failure_popup() {
        let transport = FakeTransport::default().fail(Endpoint::GetModuleInfo, 500);
        let mut panel = panel(transport);
        let err = panel.refresh().unwrap_err();
        assert_eq!(
            err,
            PanelError::Transport(TransportError::Status(500, Endpoint::GetModuleInfo))
        );
        assert!(panel.notifications().is_visible(NotificationKind::Failure));
        assert!(!panel.notifications().is_visible(NotificationKind::Success));
        assert_eq!(panel.transport().calls.len(), 1);
    }

    #[test]
    fn malformed_mesh_graph_is_a_topology_error() {
        let transport = FakeTransport::default()
            .answer(Endpoint::GetModuleInfo, r#"{"NodeId":"7"}"#)
            .answer(Endpoint::GetMeshGraph, "[{\"nodeId\":");
        let mut panel = panel(transport);
        panel.load_module_info().unwrap();
        let err = panel.load_mesh_graph().unwrap_err();
        assert!(matches!(err, PanelError::Topology(_)));
        assert!(panel.renderer().graph().is_empty());
    }

    #[test]
    fn bad_inline_mesh_graph_keeps_other_status_fields() {
        let transport = FakeTransport::default().answer(
            Endpoint::GetModuleInfo,
            r#"{"NodeId":7,"TrapMode":"1","MeshGraph":[{"nodeId":"x"}]}"#,
        );
        let mut panel = panel(transport);
        let err = panel.load_module_info().unwrap_err();
        assert!(matches!(err, PanelError::Topology(_)));
        assert_eq!(panel.status().root_identifier(), Some("7"));
        assert_eq!(panel.status().trap_mode.as_deref(), Some("Trap Mode"));
    }

    #[test]
    fn settings_post_only_given_fields_and_apply_answer() {
        let transport = FakeTransport::default()
            .answer(Endpoint::SetConfig, r#"{"WorkTime":60,"TrapMode":0}"#);
        let mut panel = panel(transport);
        panel
            .apply_settings(SettingsUpdate {
                work_time: Some(60),
                trap_mode: Some(TrapMode::Set),
                active: None,
            })
            .unwrap();
        assert_eq!(
            panel.transport().calls[0],
            (Endpoint::SetConfig, "WorkTime=60&TrapMode=0".to_string())
        );
        assert_eq!(panel.status().work_time.as_deref(), Some("60"));
        assert_eq!(panel.status().trap_mode.as_deref(), Some("Set Mode"));
    }

    #[test]
    fn invalid_settings_are_not_sent() {
        let mut panel = panel(FakeTransport::default());
        let err = panel.apply_settings(SettingsUpdate::default()).unwrap_err();
        assert!(matches!(err, PanelError::InvalidForm(_)));
        assert!(panel.transport().calls.is_empty());
        assert!(panel.notifications().is_visible(NotificationKind::Failure));
    }

    #[test]
    fn time_sync_restarts_single_clock() {
        let transport = FakeTransport::default().answer(Endpoint::SetCurrentTime, "1700000000");
        let mut panel = panel(transport);
        for _ in 0..3 {
            assert_eq!(panel.sync_time().unwrap(), ClockSource::Module(1_700_000_000));
        }
        assert_eq!(panel.clock().active_tickers(), 1);
        let (endpoint, body) = &panel.transport().calls[0];
        assert_eq!(*endpoint, Endpoint::SetCurrentTime);
        assert!(body.starts_with("CurrentTime="));
    }

    #[test]
    fn snapshot_and_gps_update_display() {
        let transport = FakeTransport::default()
            .answer(Endpoint::GetModuleInfo, r#"{"GpsLat":"35.1","GpsLon":"139.2"}"#)
            .answer(Endpoint::SnapShot, "/pictures/0001.jpg")
            .answer(Endpoint::InitGps, "")
            .answer(Endpoint::GetGps, "");
        let mut panel = panel(transport);
        panel.load_module_info().unwrap();
        assert!(panel.status().map_link.is_some());
        assert!(panel.snapshot(SnapshotRequest { format: Some(2) }).unwrap());
        assert_eq!(panel.status().picture.as_deref(), Some("/pictures/0001.jpg"));
        panel.init_gps().unwrap();
        assert_eq!(panel.status().map_link, None);
        panel.request_gps().unwrap();
        let calls: Vec<_> = panel.transport().calls.iter().map(|(e, b)| (*e, b.as_str())).collect();
        assert_eq!(calls[1], (Endpoint::SnapShot, "PictureFormat=2"));
        assert_eq!(calls[2], (Endpoint::InitGps, ""));
        assert_eq!(calls[3], (Endpoint::GetGps, ""));
    }

    #[test]
    fn broadcast_message_is_sent() {
        let transport = FakeTransport::default().answer(Endpoint::SendMessage, "");
        let mut panel = panel(transport);
        panel
            .send_message(&DebugMessage {
                content: "hello all".into(),
                target: None,
            })
            .unwrap();
        assert_eq!(
            panel.transport().calls[0].1,
            "messageContent=hello+all".to_string()
        );
    }

    #[test]
    fn clock_body_parsing() {
        assert_eq!(parse_clock_body(" 42\n").unwrap(), ClockSource::Module(42));
        assert_eq!(parse_clock_body("").unwrap(), ClockSource::Host);
        assert!(parse_clock_body("noon").is_err());
    }
}
