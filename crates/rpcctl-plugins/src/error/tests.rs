//! Unit tests for error rendering.

use rstest::rstest;

use super::*;

#[rstest]
#[case(
    ConfigurationError::DuplicateCommand {
        name: String::from("bdev_malloc_create"),
        existing: String::from("bdev"),
        plugin: String::from("extra"),
    },
    "command 'bdev_malloc_create' from plugin 'extra' is already registered by plugin 'bdev'"
)]
#[case(
    ConfigurationError::ConflictingShort {
        command: String::from("bdev_get_bdevs"),
        short: 'b',
    },
    "command 'bdev_get_bdevs' uses short flag '-b' more than once"
)]
#[case(
    ConfigurationError::UnknownPlugin { name: String::from("iostat") },
    "unknown plugin 'iostat'"
)]
fn configuration_errors_name_the_culprit(
    #[case] error: ConfigurationError,
    #[case] expected: &str,
) {
    assert_eq!(error.to_string(), expected);
}

#[test]
fn io_errors_convert_to_output_errors() {
    let error = CommandError::from(io::Error::from(io::ErrorKind::BrokenPipe));
    assert!(matches!(error, CommandError::Output(_)));
    assert!(error.to_string().starts_with("failed to write command output"));
}

#[test]
fn invalid_helper_builds_invalid_argument() {
    let error = CommandError::invalid("block_size", "must be positive");
    assert_eq!(
        error.to_string(),
        "invalid value for 'block_size': must be positive"
    );
}
