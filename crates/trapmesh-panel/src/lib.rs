//! `trapmesh-panel` - Control panel for battery-powered mesh trap modules.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![allow(clippy::module_name_repetitions)]

/// Live module clock display.
pub mod clock;
/// Panel configuration (`panel.toml`).
pub mod config;
/// Device endpoint table.
pub mod endpoint;
/// Panel errors.
pub mod error;
/// Form payloads posted to the module.
pub mod form;
/// Success and failure notifications.
pub mod notify;
/// Control panel coordinator.
pub mod panel;
/// Module status model and display state.
pub mod status;
/// HTTP transport to the module.
pub mod transport;
/// Terminal UI.
pub mod ui;

pub use config::PanelConfig;
pub use error::PanelError;
pub use panel::ControlPanel;
pub use transport::{HttpTransport, Transport, TransportError};
