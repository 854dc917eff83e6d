//! Thread scheduler commands. Loaded only when requested.

use rpcctl_plugins::output::print_dict;
use rpcctl_plugins::{ArgKind, ArgSpec, CommandError, CommandSpec, Invocation, ParamObject, Plugin};

use super::{call, supplied};

pub(crate) struct SchedulerPlugin;

impl Plugin for SchedulerPlugin {
    fn name(&self) -> &str {
        "scheduler"
    }

    fn commands(&self) -> Vec<CommandSpec> {
        vec![
            CommandSpec::new(
                "framework_get_scheduler",
                "Display the current scheduler and its settings",
                framework_get_scheduler,
            ),
            CommandSpec::new(
                "framework_set_scheduler",
                "Select the thread scheduler",
                framework_set_scheduler,
            )
            .arg(ArgSpec::positional("name", ArgKind::String).help("Name of the scheduler"))
            .arg(
                ArgSpec::option("period", ArgKind::Integer)
                    .short('p')
                    .help("Scheduler period in microseconds"),
            ),
        ]
    }
}

fn framework_get_scheduler(mut invocation: Invocation<'_>) -> Result<(), CommandError> {
    let scheduler = call(&mut invocation, "framework_get_scheduler", ParamObject::new())?.into_value();
    print_dict(invocation.output, &scheduler)?;
    Ok(())
}

fn framework_set_scheduler(mut invocation: Invocation<'_>) -> Result<(), CommandError> {
    let params = supplied(&invocation);
    call(&mut invocation, "framework_set_scheduler", params)?;
    Ok(())
}
