//! One-shot subcommands against a module.

use trapmesh_panel::form::{DebugMessage, SettingsUpdate, SnapshotRequest};
use trapmesh_panel::status::{ClockSource, StatusDisplay};
use trapmesh_panel::{ControlPanel, HttpTransport, PanelConfig};
use trapmesh_topology::{GraphRenderer, NodeId, RebuildOutcome};

use crate::cli::GpsAction;
use crate::output::{field, optional_field, paint, Tone};

pub fn connect(config: &PanelConfig) -> ControlPanel<HttpTransport> {
    let transport = HttpTransport::new(&config.url, config.timeout);
    ControlPanel::from_config(transport, config)
}

pub fn run_ui(config: &PanelConfig, refresh_ms: Option<u64>) -> anyhow::Result<()> {
    let refresh = refresh_ms
        .map(std::time::Duration::from_millis)
        .unwrap_or(config.refresh);
    let mut panel = connect(config);
    trapmesh_panel::ui::run_ui(&mut panel, refresh)
}

pub fn run_status(config: &PanelConfig) -> anyhow::Result<()> {
    let mut panel = connect(config);
    panel.load_module_info()?;
    print_status(panel.status(), &panel.clock().text());
    Ok(())
}

fn print_status(status: &StatusDisplay, clock: &str) {
    let value = |value: &Option<String>| value.clone().unwrap_or_else(|| "-".to_string());
    println!("{}", optional_field("Node ID", status.node_id.as_deref()));
    println!("{}", optional_field("Parent", status.parent_node_id.as_deref()));
    println!("{}", optional_field("Is parent", status.is_parent.as_deref()));
    println!("{}", optional_field("Mode", status.trap_mode.as_deref()));
    println!("{}", optional_field("Trap", status.trap_fire.as_deref()));
    if let Some(message) = status.trap_fire_message.as_deref() {
        println!("{}", field("Fire message", message));
    }
    println!("{}", optional_field("Battery dead", status.battery_dead.as_deref()));
    println!("{}", optional_field("Work time", status.work_time.as_deref()));
    println!(
        "{}",
        field(
            "Active",
            &format!("{} - {}", value(&status.active_start), value(&status.active_end))
        )
    );
    if !clock.is_empty() {
        println!("{}", field("Module time", clock));
    }
    println!(
        "{}",
        field(
            "GPS",
            &format!("{}, {}", value(&status.gps_lat), value(&status.gps_lon))
        )
    );
    if let Some(link) = status.map_link.as_deref() {
        println!("{}", field("Map", link));
    }
    let camera = if status.camera_visible { "enabled" } else { "disabled" };
    println!("{}", field("Camera", camera));
    if let Some(picture) = status.picture.as_deref() {
        println!("{}", field("Picture", picture));
    }
    if !status.node_list.is_empty() {
        println!("{}", field("Nodes", &status.node_list.join(", ")));
    }
}

pub fn run_graph(config: &PanelConfig) -> anyhow::Result<()> {
    let mut panel = connect(config);
    let report = panel.refresh()?;
    if report.graph == RebuildOutcome::Skipped {
        println!("{}", paint(Tone::Quiet, "Module did not report its node id; no graph."));
        return Ok(());
    }
    let graph = panel.renderer().graph();
    let heading = format!(
        "Mesh graph: {} nodes, {} edges",
        graph.node_count(),
        graph.edge_count()
    );
    println!("{}", paint(Tone::Label, heading));
    for node in graph.nodes() {
        let marker = if node.id.is_root() { " (this module)" } else { "" };
        println!("  {}{}", node.label, paint(Tone::Quiet, marker));
    }
    for edge in graph.edges() {
        println!(
            "  #{:<4} {} -> {}",
            edge.id.0,
            node_name(edge.source, panel.status()),
            node_name(edge.target, panel.status())
        );
    }
    Ok(())
}

fn node_name(id: NodeId, status: &StatusDisplay) -> String {
    if id.is_root() {
        return status.root_identifier().unwrap_or("root").to_string();
    }
    id.to_string()
}

pub fn run_time_sync(config: &PanelConfig) -> anyhow::Result<()> {
    let mut panel = connect(config);
    match panel.sync_time()? {
        ClockSource::Module(_) => println!(
            "{}",
            paint(Tone::Done, format!("Module time set: {}", panel.clock().text()))
        ),
        ClockSource::Host => {
            println!("{}", paint(Tone::Done, "Time sent; module reported no time."));
        }
    }
    Ok(())
}

pub fn run_config(
    config: &PanelConfig,
    work: Option<u32>,
    mode: Option<String>,
    start: Option<u8>,
    end: Option<u8>,
) -> anyhow::Result<()> {
    let mut args = Vec::new();
    if let Some(work) = work {
        args.push(format!("work={work}"));
    }
    if let Some(mode) = mode {
        args.push(format!("mode={mode}"));
    }
    if let Some(start) = start {
        args.push(format!("start={start}"));
    }
    if let Some(end) = end {
        args.push(format!("end={end}"));
    }
    let update = SettingsUpdate::parse_args(args.iter().map(String::as_str))?;
    let mut panel = connect(config);
    panel.apply_settings(update)?;
    println!("{}", paint(Tone::Done, "Settings applied."));
    print_status(panel.status(), &panel.clock().text());
    Ok(())
}

pub fn run_message(
    config: &PanelConfig,
    content: String,
    node: Option<u32>,
) -> anyhow::Result<()> {
    let mut panel = connect(config);
    let target = node.map_or_else(|| "all nodes".to_string(), |node| format!("node {node}"));
    panel.send_message(&DebugMessage {
        content,
        target: node,
    })?;
    println!("{}", paint(Tone::Done, format!("Message sent to {target}.")));
    Ok(())
}

pub fn run_snapshot(config: &PanelConfig, format: Option<u8>) -> anyhow::Result<()> {
    let mut panel = connect(config);
    if panel.snapshot(SnapshotRequest { format })? {
        let picture = panel.status().picture.clone().unwrap_or_default();
        println!("{}", paint(Tone::Done, format!("Snapshot: {picture}")));
    } else {
        println!("{}", paint(Tone::Quiet, "Module returned no picture."));
    }
    Ok(())
}

pub fn run_gps(config: &PanelConfig, action: GpsAction) -> anyhow::Result<()> {
    let mut panel = connect(config);
    match action {
        GpsAction::Init => {
            panel.init_gps()?;
            println!("{}", paint(Tone::Done, "GPS fix reset."));
        }
        GpsAction::Get => {
            panel.request_gps()?;
            println!(
                "{}",
                paint(Tone::Done, "GPS fix requested; the location shows up in `status`.")
            );
        }
    }
    Ok(())
}
