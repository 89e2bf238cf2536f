//! Declarative mesh route specification

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Mesh route for a model endpoint.
///
/// Maps are ordered so two specs built from the same inputs serialize identically.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteSpec {
    /// Resource name (the model name)
    pub name: String,
    /// Namespace the route lives in (the project name)
    pub namespace: String,
    pub labels: BTreeMap<String, String>,
    /// Public host of the model endpoint
    pub host: String,
    pub gateway: String,
    /// Request path prefix matched by the route
    pub match_prefix: String,
    /// Path the matched request is rewritten to
    pub rewrite_path: String,
    pub routes: Vec<WeightedRoute>,
    pub mirror: Option<MirrorRoute>,
}

/// One weighted destination of a route
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeightedRoute {
    /// Target host
    pub host: String,
    /// Request headers set before forwarding
    pub set_headers: BTreeMap<String, String>,
    pub weight: i32,
}

/// Destination receiving mirrored traffic
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MirrorRoute {
    pub host: String,
}
