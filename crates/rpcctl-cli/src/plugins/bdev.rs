//! Block device commands.

use rpcctl_plugins::output::{print_dict, print_json};
use rpcctl_plugins::{ArgKind, ArgSpec, CommandError, CommandSpec, Invocation, ParamObject, Plugin};
use serde_json::Value;

use super::{arg, call, supplied};

const MIB: f64 = 1024.0 * 1024.0;

pub(crate) struct BdevPlugin;

impl Plugin for BdevPlugin {
    fn name(&self) -> &str {
        "bdev"
    }

    fn commands(&self) -> Vec<CommandSpec> {
        vec![
            CommandSpec::new(
                "bdev_malloc_create",
                "Create a bdev backed by memory",
                bdev_malloc_create,
            )
            .arg(ArgSpec::positional("total_size", ArgKind::Float).help("Size in MiB"))
            .arg(ArgSpec::positional("block_size", ArgKind::Integer).help("Block size in bytes"))
            .arg(ArgSpec::option("name", ArgKind::String).short('b').help("Name of the bdev"))
            .arg(ArgSpec::option("uuid", ArgKind::String).short('u').help("UUID of the bdev")),
            CommandSpec::new(
                "bdev_null_create",
                "Create a bdev that discards writes and reads zeroes",
                bdev_null_create,
            )
            .arg(ArgSpec::positional("name", ArgKind::String).help("Name of the bdev"))
            .arg(ArgSpec::positional("total_size", ArgKind::Float).help("Size in MiB"))
            .arg(ArgSpec::positional("block_size", ArgKind::Integer).help("Block size in bytes"))
            .arg(ArgSpec::option("uuid", ArgKind::String).short('u').help("UUID of the bdev")),
            CommandSpec::new(
                "bdev_get_bdevs",
                "Display the current bdev list or one bdev",
                bdev_get_bdevs,
            )
            .arg(ArgSpec::option("name", ArgKind::String).short('b').help("Name of the bdev"))
            .arg(
                ArgSpec::option("timeout_ms", ArgKind::Integer)
                    .short('t')
                    .help("Milliseconds to wait for the named bdev to appear"),
            ),
            CommandSpec::new(
                "bdev_malloc_delete",
                "Delete a memory-backed bdev",
                bdev_malloc_delete,
            )
            .arg(ArgSpec::positional("name", ArgKind::String).help("Name of the bdev")),
        ]
    }
}

/// Number of `block_size` blocks in `total_size` MiB.
fn num_blocks(args: &ParamObject) -> Result<i64, CommandError> {
    let total_size = args
        .value("total_size")
        .and_then(Value::as_f64)
        .ok_or_else(|| CommandError::MissingArgument {
            argument: String::from("total_size"),
        })?;
    let block_size = args.require_i64("block_size")?;
    if block_size <= 0 {
        return Err(CommandError::invalid("block_size", "must be positive"));
    }
    if !total_size.is_finite() || total_size <= 0.0 {
        return Err(CommandError::invalid("total_size", "must be positive"));
    }
    let blocks = (total_size * MIB / block_size as f64).floor() as i64;
    if blocks == 0 {
        return Err(CommandError::invalid("total_size", "smaller than one block"));
    }
    Ok(blocks)
}

fn bdev_malloc_create(mut invocation: Invocation<'_>) -> Result<(), CommandError> {
    let params = ParamObject::new()
        .with("num_blocks", Value::from(num_blocks(invocation.args)?))
        .with("block_size", Value::from(invocation.args.require_i64("block_size")?))
        .with("name", arg(invocation.args, "name"))
        .with("uuid", arg(invocation.args, "uuid"))
        .remove_null();
    let name = call(&mut invocation, "bdev_malloc_create", params)?.into_value();
    print_json(invocation.output, &name)?;
    Ok(())
}

fn bdev_null_create(mut invocation: Invocation<'_>) -> Result<(), CommandError> {
    let params = ParamObject::new()
        .with("name", Value::from(invocation.args.require_str("name")?))
        .with("num_blocks", Value::from(num_blocks(invocation.args)?))
        .with("block_size", Value::from(invocation.args.require_i64("block_size")?))
        .with("uuid", arg(invocation.args, "uuid"))
        .remove_null();
    let name = call(&mut invocation, "bdev_null_create", params)?.into_value();
    print_json(invocation.output, &name)?;
    Ok(())
}

fn bdev_get_bdevs(mut invocation: Invocation<'_>) -> Result<(), CommandError> {
    let params = supplied(&invocation);
    let bdevs = call(&mut invocation, "bdev_get_bdevs", params)?.into_value();
    print_dict(invocation.output, &bdevs)?;
    Ok(())
}

fn bdev_malloc_delete(mut invocation: Invocation<'_>) -> Result<(), CommandError> {
    let params = supplied(&invocation);
    call(&mut invocation, "bdev_malloc_delete", params)?;
    Ok(())
}
