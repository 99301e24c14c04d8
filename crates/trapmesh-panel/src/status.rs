//! Module status model and the panel's display state.

#![allow(missing_docs)]

use serde::{Deserialize, Deserializer};
use serde_json::Value as JsonValue;
use trapmesh_topology::parse_json_unbounded;

const MAP_BASE: &str = "http://maps.google.com/maps?q=";

/// Switch reported by the module, read with JavaScript truthiness so any
/// JSON value is accepted: `false`, `0` and `""` are off, anything else on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Flag(pub bool);

impl Flag {
    #[must_use]
    pub fn is_set(self) -> bool {
        self.0
    }
}

impl<'de> Deserialize<'de> for Flag {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = JsonValue::deserialize(deserializer)?;
        Ok(Flag(truthy(&value)))
    }
}

fn truthy(value: &JsonValue) -> bool {
    match value {
        JsonValue::Null => false,
        JsonValue::Bool(value) => *value,
        JsonValue::Number(number) => number.as_f64().is_some_and(|n| n != 0.0),
        JsonValue::String(text) => !text.is_empty(),
        JsonValue::Array(_) | JsonValue::Object(_) => true,
    }
}

/// `getModuleInfo` (and `setConfig`) response. `null` or missing fields
/// leave the display unchanged. Every field accepts any JSON value so one
/// odd field never rejects the rest.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct ModuleStatus {
    pub work_time: Option<JsonValue>,
    pub trap_mode: Option<Flag>,
    pub node_id: Option<JsonValue>,
    pub node_list: Option<JsonValue>,
    pub trap_fire_message: Option<JsonValue>,
    pub battery_dead: Option<JsonValue>,
    pub parent_node_id: Option<JsonValue>,
    pub camera_image: Option<JsonValue>,
    pub camera_enable: Option<Flag>,
    pub trap_fire: Option<Flag>,
    pub gps_lat: Option<JsonValue>,
    pub gps_lon: Option<JsonValue>,
    pub mesh_graph: Option<JsonValue>,
    pub active_start: Option<JsonValue>,
    pub active_end: Option<JsonValue>,
    pub current_time: Option<JsonValue>,
    pub is_parent: Option<JsonValue>,
}

impl ModuleStatus {
    pub fn parse(raw: &str) -> Result<Self, serde_json::Error> {
        parse_json_unbounded(raw)
    }
}

/// What the clock should show after a status update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockSource {
    /// Module epoch seconds (local time stored as UTC).
    Module(i64),
    /// The module sent an empty time; show the host clock.
    Host,
}

/// Follow-up work a status update asks of the coordinator.
#[derive(Debug, Clone, Default)]
pub struct StatusUpdate {
    /// Raw `MeshGraph` value, resolved by the coordinator.
    pub topology: Option<JsonValue>,
    pub clock: Option<ClockSource>,
}

/// Last rendered module status.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusDisplay {
    pub node_id: Option<String>,
    pub parent_node_id: Option<String>,
    pub is_parent: Option<String>,
    pub trap_mode: Option<String>,
    pub trap_fire: Option<String>,
    pub trap_fire_message: Option<String>,
    pub battery_dead: Option<String>,
    pub work_time: Option<String>,
    pub active_start: Option<String>,
    pub active_end: Option<String>,
    pub gps_lat: Option<String>,
    pub gps_lon: Option<String>,
    pub map_link: Option<String>,
    pub camera_visible: bool,
    pub node_list: Vec<String>,
    pub picture: Option<String>,
}

impl StatusDisplay {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Identifier of the module currently displayed.
    #[must_use]
    pub fn root_identifier(&self) -> Option<&str> {
        self.node_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
    }

    /// Merges a status snapshot into the display.
    pub fn apply(&mut self, status: ModuleStatus) -> StatusUpdate {
        set_text(&mut self.node_id, status.node_id.as_ref());
        set_text(&mut self.parent_node_id, status.parent_node_id.as_ref());
        set_text(&mut self.is_parent, status.is_parent.as_ref());
        set_text(&mut self.trap_fire_message, status.trap_fire_message.as_ref());
        set_text(&mut self.battery_dead, status.battery_dead.as_ref());
        set_text(&mut self.work_time, status.work_time.as_ref());
        set_text(&mut self.active_start, status.active_start.as_ref());
        set_text(&mut self.active_end, status.active_end.as_ref());
        set_text(&mut self.gps_lat, status.gps_lat.as_ref());
        set_text(&mut self.gps_lon, status.gps_lon.as_ref());
        set_text(&mut self.picture, status.camera_image.as_ref());
        if let Some(mode) = status.trap_mode {
            let label = if mode.is_set() { "Trap Mode" } else { "Set Mode" };
            self.trap_mode = Some(label.to_string());
        }
        if let Some(fire) = status.trap_fire {
            let label = if fire.is_set() { "Fired" } else { "Not Fired" };
            self.trap_fire = Some(label.to_string());
        }
        if let Some(camera) = status.camera_enable {
            self.camera_visible = camera.is_set();
        }
        if let Some(JsonValue::Array(list)) = status.node_list.as_ref() {
            self.node_list = list.iter().map(display_value).collect();
        }
        if status.gps_lat.is_some() && status.gps_lon.is_some() {
            self.map_link = map_link(self.gps_lat.as_deref(), self.gps_lon.as_deref());
        }
        StatusUpdate {
            topology: status.mesh_graph,
            clock: status.current_time.as_ref().and_then(clock_source),
        }
    }

    /// Forgets the location after the module reset its GPS fix.
    pub fn clear_gps(&mut self) {
        self.gps_lat = Some(String::new());
        self.gps_lon = Some(String::new());
        self.map_link = None;
    }

    /// Shows a new snapshot; an empty reference keeps the current one.
    pub fn set_picture(&mut self, src: &str) -> bool {
        let src = src.trim();
        if src.is_empty() {
            return false;
        }
        self.picture = Some(src.to_string());
        true
    }
}

fn set_text(slot: &mut Option<String>, value: Option<&JsonValue>) {
    match value {
        None | Some(JsonValue::Null) => {}
        Some(value) => *slot = Some(display_value(value)),
    }
}

/// Renders a JSON scalar the way it reads on screen (strings unquoted).
#[must_use]
pub fn display_value(value: &JsonValue) -> String {
    match value {
        JsonValue::String(text) => text.clone(),
        JsonValue::Null => String::new(),
        other => other.to_string(),
    }
}

fn map_link(lat: Option<&str>, lon: Option<&str>) -> Option<String> {
    let lat = lat?.trim();
    let lon = lon?.trim();
    if lat.is_empty() || lon.is_empty() {
        return None;
    }
    Some(format!("{MAP_BASE}{lat},{lon}"))
}

fn clock_source(value: &JsonValue) -> Option<ClockSource> {
    match value {
        JsonValue::Number(number) => number.as_i64().map(ClockSource::Module),
        JsonValue::String(text) if text.trim().is_empty() => Some(ClockSource::Host),
        JsonValue::String(text) => text.trim().parse().ok().map(ClockSource::Module),
        _ => None,
    }
}
