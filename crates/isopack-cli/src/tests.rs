use std::collections::BTreeSet;

use clap::Parser;
use isopack_core::Requirement;
use isopack_sandbox::{Entry, Options};

use crate::dispatch::{build_options, format_entry_lines, shellenv_lines};
use crate::render::{render_status_line, OutputStyle};
use crate::Cli;

fn entry(name: &str, requirement: &str, environments: &[&str]) -> Entry {
    Entry {
        name: name.to_string(),
        requirement: Requirement::parse(requirement).expect("valid requirement"),
        environments: environments
            .iter()
            .map(|environment| environment.to_string())
            .collect::<BTreeSet<_>>(),
    }
}

#[test]
fn build_options_maps_global_flags() {
    let cli = Cli::try_parse_from([
        "isopack", "--path", "/srv/iso", "--source", "/srv/pkgs", "--quiet", "status",
    ])
    .expect("cli must parse");
    assert_eq!(
        build_options(&cli),
        Options::new()
            .path("/srv/iso")
            .source("/srv/pkgs")
            .verbose(false)
    );

    let cli = Cli::try_parse_from(["isopack", "--file", "custom.toml", "list"])
        .expect("cli must parse");
    assert_eq!(build_options(&cli), Options::new().file("custom.toml"));
}

#[test]
fn format_entry_lines_shows_requirement_and_scope() {
    let entries = vec![
        entry("rack", "^2.2", &[]),
        entry("minitest", ">=5.0", &["test"]),
        entry("reporter", "*", &["ci", "test"]),
    ];

    let lines = format_entry_lines(&entries);
    assert_eq!(
        lines,
        vec![
            "rack (^2.2)",
            "minitest (>=5.0) [test]",
            "reporter (*) [ci, test]",
        ]
    );
}

#[cfg(unix)]
#[test]
fn shellenv_exports_every_isolation_variable() {
    let options = Options::new().path("/srv/project/.isopack").multiruntime(false);
    let lines = shellenv_lines(&options);

    assert_eq!(
        lines,
        vec![
            "export ISOPACK_HOME=\"/srv/project/.isopack\"",
            "export ISOPACK_PATH=\"/srv/project/.isopack\"",
            "export ISOPACK_SANDBOX=\"/srv/project/.isopack\"",
            "export PATH=\"/srv/project/.isopack/bin:$PATH\"",
        ]
    );
}

#[test]
fn render_status_line_plain_mode_has_no_escape_codes() {
    let line = render_status_line(OutputStyle::Plain, "step", "isolation: /tmp/iso");
    assert_eq!(line, "step: isolation: /tmp/iso");
}

#[test]
fn render_status_line_rich_mode_wraps_the_status_token() {
    let line = render_status_line(OutputStyle::Rich, "ok", "activated");
    assert!(line.contains("[ok]"));
    assert!(line.ends_with("activated"));
}

#[test]
fn completions_script_renders_for_bash() {
    let mut out = Vec::new();
    crate::completion::write_completions_script(clap_complete::Shell::Bash, &mut out);
    let script = String::from_utf8(out).expect("script must be utf-8");
    assert!(script.contains("isopack"));
}
