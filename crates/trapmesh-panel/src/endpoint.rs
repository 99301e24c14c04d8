//! Device endpoint table.

#![allow(missing_docs)]

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

impl Method {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
        }
    }
}

/// Request handlers served by the module's web server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    GetModuleInfo,
    GetMeshGraph,
    SetCurrentTime,
    SetConfig,
    SendMessage,
    SnapShot,
    InitGps,
    GetGps,
}

impl Endpoint {
    pub const ALL: [Endpoint; 8] = [
        Endpoint::GetModuleInfo,
        Endpoint::GetMeshGraph,
        Endpoint::SetCurrentTime,
        Endpoint::SetConfig,
        Endpoint::SendMessage,
        Endpoint::SnapShot,
        Endpoint::InitGps,
        Endpoint::GetGps,
    ];

    #[must_use]
    pub fn method(self) -> Method {
        match self {
            Endpoint::GetModuleInfo | Endpoint::GetMeshGraph | Endpoint::GetGps => Method::Get,
            Endpoint::SetCurrentTime
            | Endpoint::SetConfig
            | Endpoint::SendMessage
            | Endpoint::SnapShot
            | Endpoint::InitGps => Method::Post,
        }
    }

    #[must_use]
    pub fn path(self) -> &'static str {
        match self {
            Endpoint::GetModuleInfo => "/getModuleInfo",
            Endpoint::GetMeshGraph => "/getMeshGraph",
            Endpoint::SetCurrentTime => "/setCurrentTime",
            Endpoint::SetConfig => "/setConfig",
            Endpoint::SendMessage => "/sendMessage",
            Endpoint::SnapShot => "/snapShot",
            Endpoint::InitGps => "/initGps",
            Endpoint::GetGps => "/getGps",
        }
    }

    /// Looks an endpoint up by its path, with or without the leading slash.
    #[must_use]
    pub fn from_path(path: &str) -> Option<Self> {
        let path = path.trim();
        let path = path.strip_prefix('/').unwrap_or(path);
        Self::ALL
            .into_iter()
            .find(|endpoint| &endpoint.path()[1..] == path)
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method().as_str(), self.path())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_resolve_back_to_endpoints() {
        for endpoint in Endpoint::ALL {
            assert_eq!(Endpoint::from_path(endpoint.path()), Some(endpoint));
        }
        assert_eq!(Endpoint::from_path("snapShot"), Some(Endpoint::SnapShot));
        assert_eq!(Endpoint::from_path("/updateModuleInfo"), None);
    }

    #[test]
    fn reads_are_get_and_writes_are_post() {
        assert_eq!(Endpoint::GetMeshGraph.method(), Method::Get);
        assert_eq!(Endpoint::InitGps.method(), Method::Post);
        assert_eq!(Endpoint::SetConfig.to_string(), "POST /setConfig");
    }
}
