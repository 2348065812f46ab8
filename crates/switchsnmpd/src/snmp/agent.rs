//! UDP SNMP v2c agent built on `async_snmp::Agent`.

use super::handler::{subtree, PortTableHandler};
use crate::error::{GatewayError, Result};
use async_snmp::Agent;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// SNMP agent bound to its UDP socket
pub struct SnmpAgent {
    agent: Agent,
    addr: SocketAddr,
}

impl SnmpAgent {
    /// Bind the agent socket. Failure is fatal for the daemon.
    ///
    /// Requests carrying another community are dropped without a reply.
    pub async fn bind(
        addr: SocketAddr,
        community: &str,
        handler: PortTableHandler,
    ) -> Result<Self> {
        let listen = addr.to_string();
        let agent = Agent::builder()
            .bind(listen.as_str())
            .community(community.as_bytes())
            .handler(subtree(), Arc::new(handler))
            .build()
            .await
            .map_err(|e| GatewayError::Bind {
                what: "SNMP agent",
                addr: listen.clone(),
                source: Box::new(e),
            })?;

        Ok(Self { agent, addr })
    }

    /// Configured listen address
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Serve until `shutdown` is cancelled
    pub async fn run(self, shutdown: CancellationToken) {
        let Self { agent, addr } = self;
        info!(addr = %addr, "SNMP agent listening");

        tokio::select! {
            _ = shutdown.cancelled() => {}
            result = agent.run() => {
                if let Err(e) = result {
                    error!(addr = %addr, error = %e, "SNMP agent failed");
                }
            }
        }

        info!("SNMP agent stopped");
    }
}
