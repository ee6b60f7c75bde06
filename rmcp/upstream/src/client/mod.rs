//! MCP client sessions against upstream servers launched over stdio.

use crate::{error::Error, registry::ServerDescriptor};
use rmcp::{RoleClient, ServiceExt, service::RunningService, transport::TokioChildProcess};
use tokio::process::Command;

mod invoke;

pub use invoke::{Upstream, call_params};

/// Build the launch command for a descriptor.
///
/// The child inherits this process's environment with the descriptor's own
/// variables applied on top, so descriptor entries win on conflict.
pub fn command(descriptor: &ServerDescriptor) -> Command {
    let mut cmd = Command::new(&descriptor.command);
    cmd.args(&descriptor.args).envs(&descriptor.env);
    cmd
}

/// Spawn the server described by `descriptor` and complete the MCP
/// initialization handshake.
pub async fn connect(
    descriptor: &ServerDescriptor,
) -> Result<RunningService<RoleClient, ()>, Error> {
    let transport = TokioChildProcess::new(command(descriptor)).map_err(|source| Error::Spawn {
        command: descriptor.command.clone(),
        source,
    })?;
    let service = ().serve(transport).await.map_err(Box::new)?;
    Ok(service)
}
