//! Reported topology descriptors.
//!
//! The module reports its mesh as a JSON sequence of peer trees:
//!
//! ```json
//! [{"nodeId": 2733, "subs": [{"nodeId": 918, "subs": null}]}]
//! ```
//!
//! Each entry is a peer reachable one hop from its parent. `subs` may be
//! `null`, an empty list or missing altogether for a leaf.
//!
//! Nesting depth is not limited. Parsing grows the stack on the heap as it
//! descends and descriptor trees are freed iteratively.

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value as JsonValue;

use crate::error::TopologyError;
use crate::graph::NodeId;

/// One peer and the peers reachable through it.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PeerDescriptor {
    /// Device identifier of the peer.
    #[serde(rename = "nodeId")]
    pub node_id: NodeId,
    /// Peers one hop further away, `None` for a leaf.
    #[serde(default)]
    pub subs: Option<Vec<PeerDescriptor>>,
}

impl PeerDescriptor {
    /// Leaf descriptor.
    #[must_use]
    pub fn leaf(id: u32) -> Self {
        Self {
            node_id: NodeId(id),
            subs: None,
        }
    }

    /// Descriptor with sub-peers.
    #[must_use]
    pub fn branch(id: u32, subs: Vec<PeerDescriptor>) -> Self {
        Self {
            node_id: NodeId(id),
            subs: Some(subs),
        }
    }

    /// Sub-peers, empty for a leaf.
    #[must_use]
    pub fn children(&self) -> &[PeerDescriptor] {
        self.subs.as_deref().unwrap_or(&[])
    }
}

impl Drop for PeerDescriptor {
    fn drop(&mut self) {
        let Some(mut pending) = self.subs.take() else {
            return;
        };
        while let Some(mut peer) = pending.pop() {
            if let Some(subs) = peer.subs.take() {
                pending.extend(subs);
            }
        }
    }
}

/// Topology as it arrives from the device.
///
/// `getMeshGraph` answers with the sequence itself while `getModuleInfo`
/// embeds it as a JSON-encoded string under `MeshGraph`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TopologyPayload {
    /// Sequence carried as a JSON string.
    Encoded(String),
    /// Sequence carried inline.
    Peers(Vec<PeerDescriptor>),
}

impl TopologyPayload {
    /// Reads an embedded `MeshGraph` value: a string holding the sequence,
    /// or the sequence itself.
    pub fn from_json(value: JsonValue) -> Result<Self, TopologyError> {
        match value {
            JsonValue::String(raw) => Ok(Self::Encoded(raw)),
            value @ JsonValue::Array(_) => {
                let peers =
                    Vec::<PeerDescriptor>::deserialize(serde_stacker::Deserializer::new(value))?;
                Ok(Self::Peers(peers))
            }
            other => Err(TopologyError::Parse(format!(
                "expected a descriptor sequence, got {other}"
            ))),
        }
    }

    /// Resolves the payload to a descriptor sequence.
    pub fn into_peers(self) -> Result<Vec<PeerDescriptor>, TopologyError> {
        match self {
            Self::Encoded(raw) => parse_topology(&raw),
            Self::Peers(peers) => Ok(peers),
        }
    }
}

/// Parses a JSON-encoded descriptor sequence of any nesting depth.
pub fn parse_topology(raw: &str) -> Result<Vec<PeerDescriptor>, TopologyError> {
    let peers = parse_json_unbounded::<Vec<PeerDescriptor>>(raw)?;
    Ok(peers)
}

/// `serde_json::from_str` without the recursion limit. The stack is grown
/// on demand instead, so deeply nested device payloads cannot overflow it.
pub fn parse_json_unbounded<T: DeserializeOwned>(raw: &str) -> Result<T, serde_json::Error> {
    let mut json = serde_json::Deserializer::from_str(raw);
    json.disable_recursion_limit();
    let value = T::deserialize(serde_stacker::Deserializer::new(&mut json))?;
    json.end()?;
    Ok(value)
}

/// Finds the first descriptor carrying the reserved root identifier.
pub(crate) fn find_reserved(peers: &[PeerDescriptor]) -> Option<NodeId> {
    let mut stack: Vec<&PeerDescriptor> = peers.iter().collect();
    while let Some(peer) = stack.pop() {
        if peer.node_id.is_root() {
            return Some(peer.node_id);
        }
        stack.extend(peer.children());
    }
    None
}
