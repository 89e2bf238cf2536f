//! Route spec synthesis for model endpoints

use deckhand_core::{
    MirrorRoute, Model, ModelEndpoint, RouteError, RouteSpec, VersionEndpoint,
    VersionEndpointStatus, WeightedRoute,
};
use std::collections::BTreeMap;
use url::Url;

/// Gateway the model endpoint route is bound to
pub const DEFAULT_GATEWAY: &str = "knative-ingress-gateway.knative-serving";
/// In-mesh gateway every weighted destination is sent through
pub const MESH_GATEWAY_HOST: &str = "istio-ingressgateway.istio-system.svc.cluster.local";
/// Path prefix clients call on the model endpoint
pub const DEFAULT_MATCH_PREFIX: &str = "/v1/predict";
/// Suffix of the version endpoint predict path
pub const PREDICT_PATH_SUFFIX: &str = ":predict";
/// Header carrying the version endpoint service name through the gateway
pub const ROUTING_HEADER: &str = "Host";

pub const LABEL_TEAM: &str = "deckhand.dev/team";
pub const LABEL_STREAM: &str = "deckhand.dev/stream";
pub const LABEL_APP: &str = "deckhand.dev/app";
pub const LABEL_ENVIRONMENT: &str = "deckhand.dev/environment";
pub const LABEL_ORCHESTRATOR: &str = "deckhand.dev/orchestrator";
pub const LABEL_USER_PREFIX: &str = "deckhand.dev/user-labels/";
pub const ORCHESTRATOR_NAME: &str = "deckhand";

/// Builds mesh route specs from model endpoint rules.
///
/// Pure: the same model and endpoint always produce the same spec.
#[derive(Debug, Clone)]
pub struct RouteSpecBuilder {
    environment_label: String,
}

impl RouteSpecBuilder {
    /// Create a builder stamping routes with an environment label
    pub fn new(environment_label: impl Into<String>) -> Self {
        Self {
            environment_label: environment_label.into(),
        }
    }

    /// Build the route spec for an endpoint.
    ///
    /// Every destination must be running. Weights are copied as given; the
    /// host and path come from the last destination.
    pub fn build(&self, model: &Model, endpoint: &ModelEndpoint) -> Result<RouteSpec, RouteError> {
        let project_name = &model.project.name;
        let mut host = None;
        let mut path = String::new();
        let mut routes = Vec::with_capacity(endpoint.rule.destinations.len());

        for destination in &endpoint.rule.destinations {
            let version_endpoint = &destination.version_endpoint;
            if version_endpoint.status != VersionEndpointStatus::Running {
                return Err(RouteError::DestinationNotReady {
                    id: version_endpoint.id,
                    status: version_endpoint.status,
                });
            }

            let url = parse_url(version_endpoint)?;
            let domain = domain_suffix(&url, project_name, version_endpoint)?;
            host = Some(format!("{}.{}.{}", model.name, project_name, domain));
            path = request_path(&url, &version_endpoint.url);

            routes.push(WeightedRoute {
                host: MESH_GATEWAY_HOST.to_string(),
                set_headers: BTreeMap::from([(
                    ROUTING_HEADER.to_string(),
                    version_endpoint.service_name.clone(),
                )]),
                weight: destination.weight,
            });
        }

        let host = host.ok_or(RouteError::NoDestinations)?;

        if !path.ends_with(PREDICT_PATH_SUFFIX) {
            path.push_str(PREDICT_PATH_SUFFIX);
        }

        let mirror = endpoint.rule.mirror.as_ref().map(|mirror| MirrorRoute {
            host: mirror.service_name.clone(),
        });

        Ok(RouteSpec {
            name: model.name.clone(),
            namespace: project_name.clone(),
            labels: self.labels(model),
            host,
            gateway: DEFAULT_GATEWAY.to_string(),
            match_prefix: DEFAULT_MATCH_PREFIX.to_string(),
            rewrite_path: path,
            routes,
            mirror,
        })
    }

    fn labels(&self, model: &Model) -> BTreeMap<String, String> {
        let project = &model.project;
        let mut labels = BTreeMap::from([
            (LABEL_TEAM.to_string(), project.team.clone()),
            (LABEL_STREAM.to_string(), project.stream.clone()),
            (LABEL_APP.to_string(), model.name.clone()),
            (LABEL_ENVIRONMENT.to_string(), self.environment_label.clone()),
            (LABEL_ORCHESTRATOR.to_string(), ORCHESTRATOR_NAME.to_string()),
        ]);

        for label in &project.labels {
            labels.insert(
                format!("{}{}", LABEL_USER_PREFIX, label.key),
                label.value.clone(),
            );
        }

        labels
    }
}

fn parse_url(version_endpoint: &VersionEndpoint) -> Result<Url, RouteError> {
    Url::parse(&version_endpoint.url).map_err(|_| RouteError::InvalidHost {
        url: version_endpoint.url.clone(),
    })
}

/// Path of the version endpoint URL, empty when the URL names none.
///
/// `Url` reports `/` for a bare authority, which would turn the rewrite
/// into `/:predict`.
fn request_path(url: &Url, raw: &str) -> String {
    let after_scheme = raw.split_once("://").map_or(raw, |(_, rest)| rest);
    let authority_and_path = after_scheme.split(['?', '#']).next().unwrap_or_default();
    if url.path() == "/" && !authority_and_path.contains('/') {
        String::new()
    } else {
        url.path().to_string()
    }
}

/// Domain shared by the project's services: whatever follows `.<project>.` in the host
fn domain_suffix(
    url: &Url,
    project_name: &str,
    version_endpoint: &VersionEndpoint,
) -> Result<String, RouteError> {
    let invalid = || RouteError::InvalidHost {
        url: version_endpoint.url.clone(),
    };

    let hostname = url.host_str().ok_or_else(invalid)?;
    let separator = format!(".{}.", project_name);
    let segments: Vec<&str> = hostname.split(separator.as_str()).collect();

    match segments.as_slice() {
        [_, domain] => Ok(domain.to_string()),
        _ => Err(invalid()),
    }
}
