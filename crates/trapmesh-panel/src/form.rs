//! Form payloads posted to the module.
//!
//! The module reads `application/x-www-form-urlencoded` bodies and treats a
//! missing key as "unchanged", so empty values are never sent.

#![allow(missing_docs)]

use std::fmt;

use smol_str::SmolStr;

use crate::error::PanelError;

pub const KEY_CURRENT_TIME: &str = "CurrentTime";
pub const KEY_WORK_TIME: &str = "WorkTime";
pub const KEY_TRAP_MODE: &str = "TrapMode";
pub const KEY_ACTIVE_START: &str = "ActiveStart";
pub const KEY_ACTIVE_END: &str = "ActiveEnd";
pub const KEY_MESSAGE_CONTENT: &str = "messageContent";
pub const KEY_MESSAGE_NODE_ID: &str = "messageSendNodeId";
pub const KEY_PICTURE_FORMAT: &str = "PictureFormat";

/// Last hour selectable for the active window.
pub const MAX_ACTIVE_HOUR: u8 = 24;

/// Ordered key/value pairs for a form post.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormPayload {
    fields: Vec<(SmolStr, String)>,
}

impl FormPayload {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a field; empty values are dropped.
    pub fn push(&mut self, key: &str, value: impl ToString) -> &mut Self {
        let value = value.to_string();
        if !value.is_empty() {
            self.fields.push((SmolStr::new(key), value));
        }
        self
    }

    /// Adds a field only when a value is present.
    pub fn push_opt<V: ToString>(&mut self, key: &str, value: Option<V>) -> &mut Self {
        if let Some(value) = value {
            self.push(key, value);
        }
        self
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, value)| value.as_str())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }

    /// `key=value&...` with spaces as `+`. Keys and values are escaped like
    /// `encodeURIComponent`, which leaves `!'()*` alone.
    #[must_use]
    pub fn encode(&self) -> String {
        self.fields
            .iter()
            .map(|(name, value)| format!("{}={}", encode_component(name), encode_component(value)))
            .collect::<Vec<_>>()
            .join("&")
    }
}

const UNESCAPED: [(&str, &str); 6] = [
    ("%20", "+"),
    ("%21", "!"),
    ("%27", "'"),
    ("%28", "("),
    ("%29", ")"),
    ("%2A", "*"),
];

fn encode_component(text: &str) -> String {
    let mut encoded = urlencoding::encode(text).into_owned();
    for (escaped, plain) in UNESCAPED {
        if encoded.contains(escaped) {
            encoded = encoded.replace(escaped, plain);
        }
    }
    encoded
}

/// Trap mode as the module stores it (`TrapMode=0|1`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrapMode {
    /// Installation mode; the module stays awake for setup.
    Set,
    /// Armed; the module sleeps between work windows.
    Trap,
}

impl TrapMode {
    pub fn parse(text: &str) -> Result<Self, PanelError> {
        match text.trim().to_ascii_lowercase().as_str() {
            "set" | "0" => Ok(Self::Set),
            "trap" | "1" => Ok(Self::Trap),
            _ => Err(PanelError::InvalidForm(
                format!("invalid trap mode '{text}' (expected set or trap)").into(),
            )),
        }
    }

    #[must_use]
    pub fn form_value(self) -> u8 {
        match self {
            Self::Set => 0,
            Self::Trap => 1,
        }
    }
}

impl fmt::Display for TrapMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Set => write!(f, "Set Mode"),
            Self::Trap => write!(f, "Trap Mode"),
        }
    }
}

/// Hours of the day the module is active, `start..end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActiveWindow {
    pub start: u8,
    pub end: u8,
}

impl ActiveWindow {
    pub fn validate(self) -> Result<Self, PanelError> {
        if self.start > MAX_ACTIVE_HOUR || self.end > MAX_ACTIVE_HOUR {
            return Err(PanelError::InvalidForm(
                format!(
                    "active window {}-{} outside 0-{MAX_ACTIVE_HOUR}",
                    self.start, self.end
                )
                .into(),
            ));
        }
        if self.start == self.end {
            return Err(PanelError::InvalidForm(
                format!("active window start and end are both {}", self.start).into(),
            ));
        }
        Ok(self)
    }
}

/// `setCurrentTime` body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeSync {
    pub current_time: i64,
}

impl TimeSync {
    #[must_use]
    pub fn to_form(self) -> FormPayload {
        let mut form = FormPayload::new();
        form.push(KEY_CURRENT_TIME, self.current_time);
        form
    }
}

/// `setConfig` body. Fields left `None` keep the module's current value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SettingsUpdate {
    pub work_time: Option<u32>,
    pub trap_mode: Option<TrapMode>,
    pub active: Option<ActiveWindow>,
}

impl SettingsUpdate {
    pub fn validate(&self) -> Result<(), PanelError> {
        if self.work_time == Some(0) {
            return Err(PanelError::InvalidForm("work time must be positive".into()));
        }
        if let Some(active) = self.active {
            active.validate()?;
        }
        Ok(())
    }

    /// Validated form; nothing to send is an error too.
    pub fn to_form(&self) -> Result<FormPayload, PanelError> {
        self.validate()?;
        let mut form = FormPayload::new();
        form.push_opt(KEY_WORK_TIME, self.work_time)
            .push_opt(KEY_TRAP_MODE, self.trap_mode.map(TrapMode::form_value))
            .push_opt(KEY_ACTIVE_START, self.active.map(|active| active.start))
            .push_opt(KEY_ACTIVE_END, self.active.map(|active| active.end));
        if form.is_empty() {
            return Err(PanelError::InvalidForm("no settings to send".into()));
        }
        Ok(form)
    }

    /// Parses `work=<min> mode=<set|trap> start=<h> end=<h>` arguments.
    pub fn parse_args<'a>(args: impl IntoIterator<Item = &'a str>) -> Result<Self, PanelError> {
        let mut update = SettingsUpdate::default();
        let mut start = None;
        let mut end = None;
        for arg in args {
            let Some((key, value)) = arg.split_once('=') else {
                return Err(PanelError::InvalidForm(
                    format!("expected key=value, got '{arg}'").into(),
                ));
            };
            match key.trim().to_ascii_lowercase().as_str() {
                "work" | "worktime" => update.work_time = Some(parse_number(key, value)?),
                "mode" | "trapmode" => update.trap_mode = Some(TrapMode::parse(value)?),
                "start" => start = Some(parse_number(key, value)?),
                "end" => end = Some(parse_number(key, value)?),
                _ => {
                    return Err(PanelError::InvalidForm(
                        format!("unknown setting '{key}'").into(),
                    ))
                }
            }
        }
        update.active = match (start, end) {
            (Some(start), Some(end)) => Some(ActiveWindow { start, end }),
            (None, None) => None,
            _ => {
                return Err(PanelError::InvalidForm(
                    "start and end must be given together".into(),
                ))
            }
        };
        update.validate()?;
        Ok(update)
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, PanelError> {
    value
        .trim()
        .parse::<T>()
        .map_err(|_| PanelError::InvalidForm(format!("invalid {key} '{value}'").into()))
}

/// `sendMessage` body. Without a target the module broadcasts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DebugMessage {
    pub content: String,
    pub target: Option<u32>,
}

impl DebugMessage {
    pub fn to_form(&self) -> Result<FormPayload, PanelError> {
        if self.content.trim().is_empty() {
            return Err(PanelError::InvalidForm("message content is empty".into()));
        }
        let mut form = FormPayload::new();
        form.push(KEY_MESSAGE_CONTENT, &self.content)
            .push_opt(KEY_MESSAGE_NODE_ID, self.target);
        Ok(form)
    }
}

/// `snapShot` body. The module picks its default format when none is given.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SnapshotRequest {
    pub format: Option<u8>,
}

impl SnapshotRequest {
    #[must_use]
    pub fn to_form(self) -> FormPayload {
        let mut form = FormPayload::new();
        form.push_opt(KEY_PICTURE_FORMAT, self.format);
        form
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_values_are_omitted_and_spaces_become_plus() {
        let mut form = FormPayload::new();
        form.push("messageContent", "hello trap world")
            .push("messageSendNodeId", "")
            .push("note", "a&b=c");
        assert_eq!(form.encode(), "messageContent=hello+trap+world&note=a%26b%3Dc");
        assert_eq!(form.get("messageSendNodeId"), None);
    }

    #[test]
    fn marks_stay_readable_like_the_browser_sends_them() {
        let mut form = FormPayload::new();
        form.push("messageContent", "trap (north) fired! don't*")
            .push("note", "100% 20");
        assert_eq!(
            form.encode(),
            "messageContent=trap+(north)+fired!+don't*&note=100%25+20"
        );
    }

    #[test]
    fn settings_form_carries_only_given_fields() {
        let update = SettingsUpdate {
            work_time: Some(180),
            trap_mode: Some(TrapMode::Trap),
            active: None,
        };
        assert_eq!(update.to_form().unwrap().encode(), "WorkTime=180&TrapMode=1");
    }

    #[test]
    fn active_window_rules() {
        assert!(ActiveWindow { start: 6, end: 18 }.validate().is_ok());
        assert!(ActiveWindow { start: 22, end: 4 }.validate().is_ok());
        assert!(ActiveWindow { start: 7, end: 7 }.validate().is_err());
        assert!(ActiveWindow { start: 0, end: 25 }.validate().is_err());
    }

    #[test]
    fn settings_args_parse() {
        let update =
            SettingsUpdate::parse_args(["work=120", "mode=set", "start=5", "end=20"]).unwrap();
        assert_eq!(update.work_time, Some(120));
        assert_eq!(update.trap_mode, Some(TrapMode::Set));
        assert_eq!(update.active, Some(ActiveWindow { start: 5, end: 20 }));
        assert_eq!(
            update.to_form().unwrap().encode(),
            "WorkTime=120&TrapMode=0&ActiveStart=5&ActiveEnd=20"
        );

        assert!(SettingsUpdate::parse_args(["start=5"]).is_err());
        assert!(SettingsUpdate::parse_args(["start=5", "end=5"]).is_err());
        assert!(SettingsUpdate::parse_args(["sleep=5"]).is_err());
        assert!(SettingsUpdate::parse_args(["work=0"]).is_err());
        assert!(SettingsUpdate::default().to_form().is_err());
    }

    #[test]
    fn broadcast_message_omits_target() {
        let message = DebugMessage {
            content: "ping".into(),
            target: None,
        };
        assert_eq!(message.to_form().unwrap().encode(), "messageContent=ping");
        let single = DebugMessage {
            content: "ping".into(),
            target: Some(2_733_010_421),
        };
        assert_eq!(
            single.to_form().unwrap().encode(),
            "messageContent=ping&messageSendNodeId=2733010421"
        );
    }

    #[test]
    fn snapshot_without_format_is_empty() {
        assert!(SnapshotRequest::default().to_form().is_empty());
        assert_eq!(
            SnapshotRequest { format: Some(3) }.to_form().encode(),
            "PictureFormat=3"
        );
    }
}
