use anyhow::{Result, bail};
use clap::{ArgMatches, CommandFactory, FromArgMatches, parser::ValueSource};

use crate::app_config::{FileConfig, VerbositySetting};
use crate::cli::{Args, MAX_CHUNK_SIZE};

/// Prefix accepted when neither the command line nor the config file names one.
pub(crate) const DEFAULT_ALLOWED_PREFIX: &str =
    "https://github.com/biomejs/biome/releases/download";

#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct CliValueSources {
    pub(crate) timeout_secs: bool,
    pub(crate) connect_timeout_secs: bool,
    pub(crate) chunk_size: bool,
    pub(crate) verbose: bool,
    pub(crate) quiet: bool,
}

pub(crate) fn parse_cli_with_sources() -> (Args, CliValueSources) {
    let command = Args::command();
    let matches = command.get_matches();
    let args = Args::from_arg_matches(&matches).unwrap_or_else(|err| err.exit());
    (args, value_sources(&matches))
}

fn value_sources(matches: &ArgMatches) -> CliValueSources {
    CliValueSources {
        timeout_secs: is_commandline_value(matches, "timeout_secs"),
        connect_timeout_secs: is_commandline_value(matches, "connect_timeout_secs"),
        chunk_size: is_commandline_value(matches, "chunk_size"),
        verbose: is_commandline_value(matches, "verbose"),
        quiet: is_commandline_value(matches, "quiet"),
    }
}

fn is_commandline_value(matches: &ArgMatches, id: &str) -> bool {
    matches.value_source(id) == Some(ValueSource::CommandLine)
}

/// Fills values the user did not pass explicitly from the config file.
pub(crate) fn apply_config_defaults(
    mut args: Args,
    cli_sources: &CliValueSources,
    file_config: Option<&FileConfig>,
) -> Result<Args> {
    if let Some(file_config) = file_config {
        if !cli_sources.timeout_secs
            && let Some(timeout_secs) = file_config.timeout_secs
        {
            args.timeout_secs = timeout_secs;
        }

        if !cli_sources.connect_timeout_secs
            && let Some(connect_timeout_secs) = file_config.connect_timeout_secs
        {
            args.connect_timeout_secs = connect_timeout_secs;
        }

        if !cli_sources.chunk_size
            && let Some(chunk_size) = file_config.chunk_size
        {
            args.chunk_size = chunk_size;
        }

        if !cli_sources.verbose
            && !cli_sources.quiet
            && let Some(verbosity) = file_config.verbosity
        {
            apply_config_verbosity(&mut args, verbosity);
        }
    }

    if !(1..=MAX_CHUNK_SIZE).contains(&args.chunk_size) {
        bail!(
            "Invalid effective chunk_size value: {}. Expected range: 1..={MAX_CHUNK_SIZE}",
            args.chunk_size
        );
    }

    Ok(args)
}

fn apply_config_verbosity(args: &mut Args, verbosity: VerbositySetting) {
    match verbosity {
        VerbositySetting::Default => {
            args.quiet = false;
            args.verbose = 0;
        }
        VerbositySetting::Verbose => {
            args.quiet = false;
            args.verbose = 1;
        }
        VerbositySetting::Quiet => {
            args.quiet = true;
            args.verbose = 0;
        }
        VerbositySetting::Debug => {
            args.quiet = false;
            args.verbose = 2;
        }
    }
}

/// Command-line prefixes win; otherwise the config file's, otherwise the built-in one.
pub(crate) fn resolve_allowed_prefixes(args: &Args, file_config: Option<&FileConfig>) -> Vec<String> {
    if !args.allow_prefix.is_empty() {
        return args.allow_prefix.clone();
    }
    file_config
        .and_then(|cfg| cfg.allowed_prefix.clone())
        .map_or_else(|| vec![DEFAULT_ALLOWED_PREFIX.to_string()], |prefix| vec![prefix])
}

pub(crate) fn resolve_default_log_level(args: &Args) -> &'static str {
    if args.quiet {
        "error"
    } else {
        match args.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    }
}

pub(crate) fn should_force_cli_log_level(cli_sources: &CliValueSources) -> bool {
    cli_sources.verbose || cli_sources.quiet
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    const URL: &str = "https://github.com/biomejs/biome/releases/download/cli/biome.zip";

    fn parse(argv: &[&str]) -> (Args, CliValueSources) {
        let matches = Args::command().try_get_matches_from(argv).unwrap();
        let args = Args::from_arg_matches(&matches).unwrap();
        (args, value_sources(&matches))
    }

    #[test]
    fn test_config_fills_values_not_given_on_command_line() {
        let (args, sources) = parse(&["streamget", URL, "out.zip"]);
        let cfg = FileConfig {
            timeout_secs: Some(60),
            connect_timeout_secs: Some(5),
            chunk_size: Some(4096),
            verbosity: Some(VerbositySetting::Verbose),
            ..FileConfig::default()
        };

        let args = apply_config_defaults(args, &sources, Some(&cfg)).unwrap();

        assert_eq!(args.timeout_secs, 60);
        assert_eq!(args.connect_timeout_secs, 5);
        assert_eq!(args.chunk_size, 4096);
        assert_eq!(args.verbose, 1);
    }

    #[test]
    fn test_command_line_values_beat_config() {
        let (args, sources) = parse(&["streamget", "-t", "90", "--chunk-size", "1024", "-q", URL, "out.zip"]);
        let cfg = FileConfig {
            timeout_secs: Some(60),
            chunk_size: Some(4096),
            verbosity: Some(VerbositySetting::Debug),
            ..FileConfig::default()
        };

        let args = apply_config_defaults(args, &sources, Some(&cfg)).unwrap();

        assert_eq!(args.timeout_secs, 90);
        assert_eq!(args.chunk_size, 1024);
        assert!(args.quiet);
        assert_eq!(args.verbose, 0);
    }

    #[test]
    fn test_no_config_keeps_cli_defaults() {
        let (args, sources) = parse(&["streamget", URL, "out.zip"]);
        let args = apply_config_defaults(args, &sources, None).unwrap();
        assert_eq!(args.timeout_secs, crate::cli::DEFAULT_TIMEOUT_SECS);
    }

    #[test]
    fn test_allowed_prefixes_precedence() {
        let (args, _) = parse(&["streamget", URL, "out.zip"]);
        assert_eq!(
            resolve_allowed_prefixes(&args, None),
            vec![DEFAULT_ALLOWED_PREFIX.to_string()]
        );

        let cfg = FileConfig {
            allowed_prefix: Some("https://mirror.example/".to_string()),
            ..FileConfig::default()
        };
        assert_eq!(
            resolve_allowed_prefixes(&args, Some(&cfg)),
            vec!["https://mirror.example/".to_string()]
        );

        let (args, _) = parse(&["streamget", "-a", "http://127.0.0.1", URL, "out.zip"]);
        assert_eq!(
            resolve_allowed_prefixes(&args, Some(&cfg)),
            vec!["http://127.0.0.1".to_string()]
        );
    }

    #[test]
    fn test_log_level_resolution() {
        let (args, sources) = parse(&["streamget", URL, "out.zip"]);
        assert_eq!(resolve_default_log_level(&args), "info");
        assert!(!should_force_cli_log_level(&sources));

        let (args, sources) = parse(&["streamget", "-v", URL, "out.zip"]);
        assert_eq!(resolve_default_log_level(&args), "debug");
        assert!(should_force_cli_log_level(&sources));

        let (args, _) = parse(&["streamget", "-q", URL, "out.zip"]);
        assert_eq!(resolve_default_log_level(&args), "error");
    }

    #[test]
    fn test_parse_helper_matches_derive_parser() {
        let derived = Args::try_parse_from(["streamget", URL, "out.zip"]).unwrap();
        let (args, _) = parse(&["streamget", URL, "out.zip"]);
        assert_eq!(derived.url, args.url);
    }
}
