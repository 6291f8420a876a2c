//! Security group ingress rule

use infra_draft_core::{FieldSpec, Identity, Merge, Operation, ResourceSchema, Scalar, ValidationError};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt;
use std::net::IpAddr;

use super::{group_operations, Built, Resource, ResourceKind, StepError};
use crate::registry::{BuiltResource, Registry};

/// Port selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Ports {
    All,
    Single(u16),
    Range { from: u16, to: u16 },
}

impl fmt::Display for Ports {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ports::All => write!(f, "all"),
            Ports::Single(port) => write!(f, "{}", port),
            Ports::Range { from, to } => write!(f, "{}-{}", from, to),
        }
    }
}

/// IP protocol
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Protocol {
    Tcp,
    Udp,
    All,
}

pub struct IngressRule;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct IngressFields {
    pub peer: Scalar<String>,
    pub ports: Scalar<Ports>,
    pub protocol: Scalar<Protocol>,
    pub description: Scalar<String>,
}

impl Merge for IngressFields {
    fn merge(self, later: Self) -> Self {
        Self {
            peer: self.peer.merge(later.peer),
            ports: self.ports.merge(later.ports),
            protocol: self.protocol.merge(later.protocol),
            description: self.description.merge(later.description),
        }
    }
}

#[derive(Debug, Clone)]
pub enum IngressScalar {
    Peer(String),
    Ports(Ports),
    Protocol(Protocol),
    Description(String),
}

/// Ingress rules have no accumulating fields.
#[derive(Debug, Clone)]
pub enum IngressList {}

#[derive(Debug, Clone, PartialEq)]
pub struct IngressConfig {
    pub name: String,
    pub peer: String,
    pub ports: Ports,
    pub protocol: Protocol,
    pub description: String,
}

impl IngressConfig {
    /// Whether the peer matches every address: `any` or any `/0` block
    pub fn is_wildcard_peer(&self) -> bool {
        matches!(parse_peer(&self.peer), Ok(None) | Ok(Some((_, 0))))
    }
}

/// Parse a peer into its CIDR block; `None` for `any`.
fn parse_peer(peer: &str) -> Result<Option<(IpAddr, u8)>, ValidationError> {
    if peer == "any" {
        return Ok(None);
    }
    let invalid = || ValidationError::invalid("peer", format!("'{}' is not 'any' or a CIDR block", peer));

    let (addr, prefix) = peer.split_once('/').ok_or_else(invalid)?;
    let addr: IpAddr = addr.parse().map_err(|_| invalid())?;
    let prefix: u8 = prefix.parse().map_err(|_| invalid())?;
    let max_prefix = if addr.is_ipv4() { 32 } else { 128 };
    if prefix > max_prefix {
        return Err(invalid());
    }
    Ok(Some((addr, prefix)))
}

impl ResourceSchema for IngressRule {
    const KIND: &'static str = "ingress_rule";
    const FIELDS: &'static [FieldSpec] = &[
        FieldSpec::required("peer", "CIDR block or 'any'"),
        FieldSpec::optional("ports", "all", "'all', a port, or { from, to }"),
        FieldSpec::optional("protocol", "tcp", "tcp | udp | all"),
        FieldSpec::optional("description", "\"\"", "Free-form description"),
    ];

    type Fields = IngressFields;
    type Scalar = IngressScalar;
    type List = IngressList;
    type Config = IngressConfig;
    type Handle = String;

    fn set_scalar(fields: &mut IngressFields, op: IngressScalar) {
        match op {
            IngressScalar::Peer(p) => fields.peer.set(p),
            IngressScalar::Ports(p) => fields.ports.set(p),
            IngressScalar::Protocol(p) => fields.protocol.set(p),
            IngressScalar::Description(d) => fields.description.set(d),
        }
    }

    fn append_list(_fields: &mut IngressFields, op: IngressList) {
        match op {}
    }

    fn resolve(identity: &Identity, fields: &IngressFields) -> Result<IngressConfig, ValidationError> {
        let peer = fields.peer.require("peer")?;
        parse_peer(peer)?;

        Ok(IngressConfig {
            name: identity.to_string(),
            peer: peer.clone(),
            ports: fields.ports.get_or(Ports::All),
            protocol: fields.protocol.get_or(Protocol::Tcp),
            description: fields.description.get_or(String::new()),
        })
    }

    fn check(config: &IngressConfig) -> Result<(), ValidationError> {
        if let Ports::Range { from, to } = config.ports {
            if from > to {
                return Err(ValidationError::invalid(
                    "ports",
                    format!("range start {} is after end {}", from, to),
                ));
            }
        }
        if config.is_wildcard_peer() && config.ports == Ports::All {
            return Err(ValidationError::combination(format!(
                "peer '{}' and ports 'all' must not both be wildcards",
                config.peer
            )));
        }
        Ok(())
    }
}

/// Manifest form of `ports`: `"all"`, `443`, or `{ from = 8000, to = 8080 }`
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum PortsStep {
    Keyword(String),
    Single(u16),
    Range { from: u16, to: u16 },
}

impl PortsStep {
    fn into_ports(self) -> Result<Ports, StepError> {
        match self {
            PortsStep::Keyword(k) if k == "all" => Ok(Ports::All),
            PortsStep::Keyword(k) => Err(StepError::Invalid(format!(
                "unknown ports keyword '{}' (expected 'all')",
                k
            ))),
            PortsStep::Single(port) => Ok(Ports::Single(port)),
            PortsStep::Range { from, to } => Ok(Ports::Range { from, to }),
        }
    }
}

/// Manifest step for an ingress rule
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IngressStep {
    pub peer: Option<String>,
    pub ports: Option<PortsStep>,
    pub protocol: Option<Protocol>,
    pub description: Option<String>,
    pub group: Option<Vec<IngressStep>>,
}

impl Resource for IngressRule {
    const RESOURCE_KIND: ResourceKind = ResourceKind::IngressRule;

    type Step = IngressStep;

    fn operations(step: IngressStep, registry: &Registry) -> Result<Vec<Operation<IngressRule>>, StepError> {
        let mut ops = Vec::new();
        if let Some(peer) = step.peer {
            ops.push(Operation::set(IngressScalar::Peer(peer)));
        }
        if let Some(ports) = step.ports {
            ops.push(Operation::set(IngressScalar::Ports(ports.into_ports()?)));
        }
        if let Some(protocol) = step.protocol {
            ops.push(Operation::set(IngressScalar::Protocol(protocol)));
        }
        if let Some(description) = step.description {
            ops.push(Operation::set(IngressScalar::Description(description)));
        }
        ops.extend(group_operations::<IngressRule>(step.group, registry)?);
        Ok(ops)
    }

    fn synthesize(identity: &Identity, config: &IngressConfig) -> Value {
        let (from_port, to_port) = match config.ports {
            Ports::All => (None, None),
            Ports::Single(port) => (Some(port), Some(port)),
            Ports::Range { from, to } => (Some(from), Some(to)),
        };

        json!({
            "ruleName": identity.as_str(),
            "peer": config.peer,
            "protocol": config.protocol,
            "fromPort": from_port,
            "toPort": to_port,
            "description": config.description,
        })
    }

    fn into_built(built: Built<IngressRule>) -> BuiltResource {
        BuiltResource::IngressRule(built)
    }

    fn from_built(resource: &BuiltResource) -> Option<&Built<IngressRule>> {
        match resource {
            BuiltResource::IngressRule(rule) => Some(rule),
            _ => None,
        }
    }
}
