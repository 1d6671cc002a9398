//! Static route table

use std::collections::HashMap;
use std::net::SocketAddr;

use ricxapp_common::RmrConfig;

/// Message type to endpoint mapping with an optional default route
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteTable {
    routes: HashMap<i32, SocketAddr>,
    default_route: Option<SocketAddr>,
}

impl RouteTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the table from configuration. Later entries win for repeated types.
    pub fn from_config(config: &RmrConfig) -> Self {
        let mut table = Self::new();
        for route in &config.routes {
            table.add_route(route.message_type, route.endpoint);
        }
        table.default_route = config.default_route;
        table
    }

    /// Adds or replaces the route for a message type.
    pub fn add_route(&mut self, mtype: i32, endpoint: SocketAddr) {
        self.routes.insert(mtype, endpoint);
    }

    /// Sets the fallback endpoint.
    pub fn set_default_route(&mut self, endpoint: Option<SocketAddr>) {
        self.default_route = endpoint;
    }

    /// Endpoint for a message type.
    pub fn lookup(&self, mtype: i32) -> Option<SocketAddr> {
        self.routes.get(&mtype).copied().or(self.default_route)
    }

    /// Number of explicit routes.
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// True when there are no explicit routes.
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}
