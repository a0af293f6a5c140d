//! Endpoint registration with the hosting environment
//!
//! The gate exposes two endpoints: `data_in` accepts samples and `data_out`
//! lists the window. `GateModule::init` registers both or neither; teardown
//! unregisters them and emits the final latency report.

use crate::config::GateConfig;
use crate::error::{GateError, HostError, Result};
use crate::latency::LatencyReport;
use crate::observability::GateLogger;
use crate::service::GateService;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Permission bits that let callers write to an endpoint
pub const MODE_WRITE: u32 = 0o222;

/// Permission bits that let callers read from an endpoint
pub const MODE_READ: u32 = 0o444;

/// Endpoints the gate registers with its host
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Endpoint {
    /// Ingestion, write-only for callers
    Ingest,
    /// Inspection, read-only
    Inspect,
}

impl Endpoint {
    pub const ALL: [Endpoint; 2] = [Endpoint::Ingest, Endpoint::Inspect];

    pub fn name(&self) -> &'static str {
        match self {
            Endpoint::Ingest => "data_in",
            Endpoint::Inspect => "data_out",
        }
    }

    /// Unix-style permission bits requested from the host
    pub fn mode(&self) -> u32 {
        match self {
            Endpoint::Ingest => 0o666,
            Endpoint::Inspect => 0o444,
        }
    }
}

/// Hosting environment that can expose endpoints to callers
pub trait EndpointHost {
    /// Expose `endpoint` to callers with the given permission bits
    fn register(&mut self, endpoint: Endpoint, mode: u32) -> std::result::Result<(), HostError>;

    fn unregister(&mut self, endpoint: Endpoint);
}

/// In-process endpoint table
///
/// Tracks which endpoints are live and their permission bits; a server
/// mounts routes for exactly the registered set.
#[derive(Debug, Clone, Default)]
pub struct EndpointTable {
    registered: BTreeMap<Endpoint, u32>,
}

impl EndpointTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_registered(&self, endpoint: Endpoint) -> bool {
        self.registered.contains_key(&endpoint)
    }

    /// Permission bits of a registered endpoint
    pub fn mode(&self, endpoint: Endpoint) -> Option<u32> {
        self.registered.get(&endpoint).copied()
    }

    /// Registered endpoints with their permission bits
    pub fn registered(&self) -> impl Iterator<Item = (Endpoint, u32)> + '_ {
        self.registered.iter().map(|(endpoint, mode)| (*endpoint, *mode))
    }

    pub fn is_empty(&self) -> bool {
        self.registered.is_empty()
    }
}

impl EndpointHost for EndpointTable {
    fn register(&mut self, endpoint: Endpoint, mode: u32) -> std::result::Result<(), HostError> {
        if self.registered.contains_key(&endpoint) {
            return Err(HostError::AlreadyRegistered(endpoint.name()));
        }
        self.registered.insert(endpoint, mode);
        Ok(())
    }

    fn unregister(&mut self, endpoint: Endpoint) {
        self.registered.remove(&endpoint);
    }
}

/// A gate service bound to its host endpoints
#[derive(Debug)]
pub struct GateModule {
    service: Arc<GateService>,
    endpoints: Vec<Endpoint>,
}

impl GateModule {
    /// Build the service and register both endpoints as a unit
    ///
    /// If any registration fails, endpoints registered so far are removed
    /// again and the error is returned.
    pub fn init<H: EndpointHost>(
        host: &mut H,
        config: GateConfig,
        logger: GateLogger,
    ) -> Result<Self> {
        let service = Arc::new(GateService::with_logger(config, logger)?);
        let logger = service.logger();
        let mut endpoints = Vec::with_capacity(Endpoint::ALL.len());

        for endpoint in Endpoint::ALL {
            if let Err(e) = host.register(endpoint, endpoint.mode()) {
                logger.log_registration_failed(endpoint.name(), &e);
                for registered in endpoints.iter().rev() {
                    host.unregister(*registered);
                }
                return Err(GateError::Init(e));
            }
            logger.log_endpoint_registered(endpoint.name());
            endpoints.push(endpoint);
        }

        Ok(Self { service, endpoints })
    }

    /// Shared handle for endpoint handlers
    pub fn service(&self) -> &Arc<GateService> {
        &self.service
    }

    pub fn endpoints(&self) -> &[Endpoint] {
        &self.endpoints
    }

    /// Unregister the endpoints and emit the final latency report
    pub fn teardown<H: EndpointHost>(self, host: &mut H) -> Option<LatencyReport> {
        for endpoint in self.endpoints.iter().rev() {
            host.unregister(*endpoint);
        }
        self.service.finalize()
    }
}
