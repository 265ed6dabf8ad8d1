#![deny(unsafe_code)]
#![deny(missing_docs)]

//! Command-line front end for the file-selection core.
//!
//! Exposes the CLI surface spec.md §6 names — `--include`, `--exclude`,
//! `--include-regexp`, `--exclude-regexp`, `--include-filelist`,
//! `--exclude-filelist`, `--exclude-other-filesystems`,
//! `--exclude-device-files`, `--exclude-if-present`, `--null-separator` —
//! plus a positional backup root and `-v`/`--verbose`. Directive order
//! is reconstructed from `clap`'s argument indices (spec.md §4.4: rules
//! are evaluated "in the order given on the command line"), the same
//! technique the corpus uses for its own order-sensitive flag pairs.

use std::ffi::OsString;
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode as ProcessExitCode;

use clap::{Arg, ArgAction, ArgMatches, Command};

use core::error::{HasExitCode, SelectionError};
use core::exit_code::ExitCode;
use logging::Verbosity;
use path::Path;
use selection::chain::{Directive, RuleChainBuilder};
use selection::config::SelectionConfig;
use walk::Selector;

const INCLUDE: &str = "include";
const EXCLUDE: &str = "exclude";
const INCLUDE_REGEXP: &str = "include-regexp";
const EXCLUDE_REGEXP: &str = "exclude-regexp";
const INCLUDE_FILELIST: &str = "include-filelist";
const EXCLUDE_FILELIST: &str = "exclude-filelist";
const EXCLUDE_IF_PRESENT: &str = "exclude-if-present";

fn command() -> Command {
    Command::new("duplicity-select")
        .about("Decides, for every path under a backup root, whether it is included or excluded")
        .arg(
            Arg::new("root")
                .value_name("ROOT")
                .required(true)
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .action(ArgAction::Count)
                .help("Increase logging verbosity; may be repeated."),
        )
        .arg(
            Arg::new("null-separator")
                .long("null-separator")
                .action(ArgAction::SetTrue)
                .help("Filelists use NUL instead of newline as the record separator."),
        )
        .arg(
            Arg::new("ignorecase")
                .long("ignorecase")
                .action(ArgAction::SetTrue)
                .help("Match globs and regexps case-insensitively by default."),
        )
        .arg(
            Arg::new("follow-symlinks")
                .long("follow-symlinks")
                .action(ArgAction::SetTrue)
                .help("Follow symbolic links while walking instead of reporting them as leaves."),
        )
        .arg(
            Arg::new(INCLUDE)
                .long(INCLUDE)
                .value_name("GLOB")
                .action(ArgAction::Append)
                .help("Include paths matching GLOB."),
        )
        .arg(
            Arg::new(EXCLUDE)
                .long(EXCLUDE)
                .value_name("GLOB")
                .action(ArgAction::Append)
                .help("Exclude paths matching GLOB."),
        )
        .arg(
            Arg::new(INCLUDE_REGEXP)
                .long(INCLUDE_REGEXP)
                .value_name("REGEXP")
                .action(ArgAction::Append)
                .help("Include paths whose absolute form matches REGEXP."),
        )
        .arg(
            Arg::new(EXCLUDE_REGEXP)
                .long(EXCLUDE_REGEXP)
                .value_name("REGEXP")
                .action(ArgAction::Append)
                .help("Exclude paths whose absolute form matches REGEXP."),
        )
        .arg(
            Arg::new(INCLUDE_FILELIST)
                .long(INCLUDE_FILELIST)
                .value_name("PATH")
                .action(ArgAction::Append)
                .value_parser(clap::value_parser!(PathBuf))
                .help("Read include/exclude patterns, one per line, defaulting to include."),
        )
        .arg(
            Arg::new(EXCLUDE_FILELIST)
                .long(EXCLUDE_FILELIST)
                .value_name("PATH")
                .action(ArgAction::Append)
                .value_parser(clap::value_parser!(PathBuf))
                .help("Read include/exclude patterns, one per line, defaulting to exclude."),
        )
        .arg(
            Arg::new("exclude-other-filesystems")
                .long("exclude-other-filesystems")
                .action(ArgAction::SetTrue)
                .help("Exclude anything not on the backup root's filesystem."),
        )
        .arg(
            Arg::new("exclude-device-files")
                .long("exclude-device-files")
                .action(ArgAction::SetTrue)
                .help("Exclude block and character device nodes."),
        )
        .arg(
            Arg::new(EXCLUDE_IF_PRESENT)
                .long(EXCLUDE_IF_PRESENT)
                .value_name("FILENAME")
                .action(ArgAction::Append)
                .help("Exclude a directory if it directly contains a file named FILENAME."),
        )
}

/// One parsed rule-affecting argument, in the order it was given, before
/// resolution against filesystem state (filelist reads, device stat).
enum OrderedDirective {
    Glob(Directive),
    Filelist(Directive),
    ExcludeOtherFilesystems,
    ExcludeDeviceFiles,
    ExcludeIfPresent(String),
}

fn ordered_directives(matches: &ArgMatches) -> Vec<OrderedDirective> {
    let mut indexed: Vec<(usize, OrderedDirective)> = Vec::new();

    let mut collect_strings = |id: &str, wrap: fn(String) -> Directive| {
        if let (Some(values), Some(indices)) =
            (matches.get_many::<String>(id), matches.indices_of(id))
        {
            for (index, value) in indices.zip(values) {
                indexed.push((index, OrderedDirective::Glob(wrap(value.clone()))));
            }
        }
    };
    collect_strings(INCLUDE, Directive::Include);
    collect_strings(EXCLUDE, Directive::Exclude);
    collect_strings(INCLUDE_REGEXP, Directive::IncludeRegexp);
    collect_strings(EXCLUDE_REGEXP, Directive::ExcludeRegexp);

    let mut collect_paths = |id: &str, wrap: fn(PathBuf) -> Directive| {
        if let (Some(values), Some(indices)) =
            (matches.get_many::<PathBuf>(id), matches.indices_of(id))
        {
            for (index, value) in indices.zip(values) {
                indexed.push((index, OrderedDirective::Filelist(wrap(value.clone()))));
            }
        }
    };
    collect_paths(INCLUDE_FILELIST, Directive::IncludeFilelist);
    collect_paths(EXCLUDE_FILELIST, Directive::ExcludeFilelist);

    if let Some(index) = matches
        .indices_of("exclude-other-filesystems")
        .and_then(|mut indices| indices.next())
    {
        indexed.push((index, OrderedDirective::ExcludeOtherFilesystems));
    }
    if let Some(index) = matches
        .indices_of("exclude-device-files")
        .and_then(|mut indices| indices.next())
    {
        indexed.push((index, OrderedDirective::ExcludeDeviceFiles));
    }
    if let (Some(values), Some(indices)) = (
        matches.get_many::<String>(EXCLUDE_IF_PRESENT),
        matches.indices_of(EXCLUDE_IF_PRESENT),
    ) {
        for (index, value) in indices.zip(values) {
            indexed.push((index, OrderedDirective::ExcludeIfPresent(value.clone())));
        }
    }

    indexed.sort_by_key(|(index, _)| *index);
    indexed.into_iter().map(|(_, directive)| directive).collect()
}

/// Runs the selection CLI against `arguments`, writing selected paths to
/// `stdout` (one per line, NUL-terminated instead if `--null-separator`
/// was given) and diagnostics to `stderr`.
///
/// Returns the process exit code the caller should use.
pub fn run<I, S, Out, Err>(arguments: I, stdout: &mut Out, stderr: &mut Err) -> ExitCode
where
    I: IntoIterator<Item = S>,
    S: Into<OsString>,
    Out: Write,
    Err: Write,
{
    let matches = match command().try_get_matches_from(arguments) {
        Ok(matches) => matches,
        Err(error) => {
            let _ = write!(stderr, "{error}");
            return ExitCode::SelectionSetup;
        }
    };

    match run_matches(&matches, stdout) {
        Ok(code) => code,
        Err(error) => {
            let _ = writeln!(stderr, "duplicity-select: {error}");
            error.exit_code()
        }
    }
}

fn run_matches<Out: Write>(matches: &ArgMatches, stdout: &mut Out) -> Result<ExitCode, SelectionError> {
    let verbosity = Verbosity::from_count(matches.get_count("verbose"));
    logging::init(verbosity);

    let root_path = matches
        .get_one::<PathBuf>("root")
        .expect("root is required")
        .clone();
    let null_separator = matches.get_flag("null-separator");
    let ignorecase = matches.get_flag("ignorecase");
    let follow_symlinks = matches.get_flag("follow-symlinks");

    let root_segments = path::split_index(&root_path.to_string_lossy())
        .iter()
        .map(|c| String::from_utf8_lossy(c).into_owned())
        .collect();
    let config = SelectionConfig {
        root: root_segments,
        ignorecase,
        null_separator,
    };

    let mut root = Path::root(root_path);
    root.stat(follow_symlinks)
        .map_err(|source| SelectionError::FilelistIo {
            path: root.absolute_std_path(),
            source,
        })?;

    let mut builder = RuleChainBuilder::new(config);
    if let Some(device_inode) = root.device_inode() {
        builder = builder.with_root_device(device_inode.0);
    }

    for directive in ordered_directives(matches) {
        match directive {
            OrderedDirective::Glob(d) | OrderedDirective::Filelist(d) => builder.push(d)?,
            OrderedDirective::ExcludeOtherFilesystems => {
                builder.push(Directive::ExcludeOtherFilesystems)?;
            }
            OrderedDirective::ExcludeDeviceFiles => {
                builder.push(Directive::ExcludeDeviceFiles)?;
            }
            OrderedDirective::ExcludeIfPresent(name) => {
                builder.push(Directive::ExcludeIfPresent(name))?;
            }
        }
    }

    let compiled = builder.build();
    let selector = Selector::new(root, &compiled.chain, &compiled.exclude_if_present, follow_symlinks);

    let separator: &[u8] = if null_separator { b"\0" } else { b"\n" };
    for entry in selector {
        let rendered = entry.path.to_absolute_string();
        let _ = stdout.write_all(rendered.as_bytes());
        let _ = stdout.write_all(separator);
    }

    Ok(ExitCode::Ok)
}

/// Converts an [`ExitCode`] into a [`std::process::ExitCode`].
#[must_use]
pub fn exit_code_from(code: ExitCode) -> ProcessExitCode {
    code.into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn build_tree() -> TempDir {
        let dir = TempDir::new().unwrap();
        for top in ["1", "2"] {
            for mid in ["1", "2"] {
                let path = dir.path().join(top).join(mid);
                fs::create_dir_all(&path).unwrap();
                fs::write(path.join("leaf"), b"x").unwrap();
            }
        }
        dir
    }

    #[test]
    fn scenario_single_include_global_exclude() {
        let dir = build_tree();
        let root = dir.path().to_string_lossy().into_owned();
        let mut stdout = Vec::new();
        let mut stderr = Vec::new();
        let code = run(
            [
                "duplicity-select".to_owned(),
                root.clone(),
                "--include".to_owned(),
                format!("{root}/1/1"),
                "--exclude".to_owned(),
                "**".to_owned(),
            ],
            &mut stdout,
            &mut stderr,
        );
        assert_eq!(code, ExitCode::Ok);
        let output = String::from_utf8(stdout).unwrap();
        assert!(output.contains(&format!("{root}/1/1")));
        assert!(output.contains(&format!("{root}/1/1/leaf")));
        assert!(!output.contains(&format!("{root}/2")));
    }

    #[test]
    fn missing_root_is_selection_setup_error() {
        let mut stdout = Vec::new();
        let mut stderr = Vec::new();
        let code = run(
            ["duplicity-select".to_owned(), "/no/such/directory/at/all".to_owned()],
            &mut stdout,
            &mut stderr,
        );
        assert_eq!(code, ExitCode::SelectionSetup);
    }

    #[test]
    fn directive_order_is_preserved_across_flag_kinds() {
        let dir = build_tree();
        let root = dir.path().to_string_lossy().into_owned();
        let mut stdout = Vec::new();
        let mut stderr = Vec::new();
        let code = run(
            [
                "duplicity-select".to_owned(),
                root.clone(),
                "--exclude".to_owned(),
                format!("{root}/1/1"),
                "--include".to_owned(),
                format!("{root}/1"),
                "--exclude".to_owned(),
                "**".to_owned(),
            ],
            &mut stdout,
            &mut stderr,
        );
        assert_eq!(code, ExitCode::Ok);
        let output = String::from_utf8(stdout).unwrap();
        assert!(output.contains(&format!("{root}/1/2")));
        assert!(!output.contains(&format!("{root}/1/1/leaf")));
    }
}
