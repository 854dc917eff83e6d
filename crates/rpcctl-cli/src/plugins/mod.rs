//! Builtin command plugins.
//!
//! The catalog order is the order commands appear in `--help`.

use rpcctl_client::Outcome;
use rpcctl_plugins::{CommandError, Invocation, Param, ParamObject, PluginCatalog};

mod app;
mod bdev;
mod nvmf;
mod scheduler;

pub(crate) use self::app::AppPlugin;
pub(crate) use self::bdev::BdevPlugin;
pub(crate) use self::nvmf::NvmfPlugin;
pub(crate) use self::scheduler::SchedulerPlugin;

/// Every plugin the driver knows, with `scheduler` loaded only on request.
pub(crate) fn catalog() -> PluginCatalog {
    PluginCatalog::new()
        .with(AppPlugin, true)
        .with(BdevPlugin, true)
        .with(NvmfPlugin, true)
        .with(SchedulerPlugin, false)
}

/// Sends `params` to `method` through the invocation's client.
fn call(
    invocation: &mut Invocation<'_>,
    method: &str,
    params: ParamObject,
) -> Result<Outcome, CommandError> {
    Ok(invocation.client.call(method, params.into_wire())?)
}

/// The namespace with driver keys and unsupplied arguments removed.
fn supplied(invocation: &Invocation<'_>) -> ParamObject {
    invocation.args.clone().strip_globals().remove_null()
}

/// One namespace entry, absent when the argument was not declared.
fn arg(args: &ParamObject, key: &str) -> Param {
    args.get(key).cloned().unwrap_or(Param::Absent)
}

#[cfg(test)]
mod tests;
