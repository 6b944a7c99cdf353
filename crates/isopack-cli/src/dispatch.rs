use anyhow::Result;
use isopack_sandbox::{
    Entry, Options, Sandbox, PACKAGE_HOME_VAR, PACKAGE_PATH_VAR, SANDBOX_MARKER_VAR,
};
use isopack_store::StoreLayout;

use crate::completion::write_completions_script;
use crate::render::{current_output_style, render_status_line};
use crate::{Cli, Commands};

pub(crate) fn run_cli(cli: Cli) -> Result<()> {
    let options = build_options(&cli);

    match cli.command {
        Commands::Status => {
            let mut sandbox = Sandbox::new(options);
            sandbox.initialize()?;
            let style = current_output_style();
            println!(
                "{}",
                render_status_line(
                    style,
                    "step",
                    &format!(
                        "isolation: {}",
                        sandbox.options().isolation_path().display()
                    )
                )
            );
            for file in sandbox.files() {
                println!(
                    "{}",
                    render_status_line(
                        style,
                        "step",
                        &format!("declarations: {}", file.display())
                    )
                );
            }
            println!(
                "{}",
                render_status_line(
                    style,
                    "step",
                    &format!("declared: {} packages", sandbox.entries().len())
                )
            );
            let installed = sandbox.installed()?;
            println!(
                "{}",
                render_status_line(
                    style,
                    "step",
                    &format!("installed: {} packages", installed.len())
                )
            );
        }
        Commands::List => {
            let mut sandbox = Sandbox::new(options);
            sandbox.initialize()?;
            if sandbox.entries().is_empty() {
                println!("No declared packages");
            } else {
                for line in format_entry_lines(sandbox.entries()) {
                    println!("{line}");
                }
            }
        }
        Commands::Activate {
            env,
            no_install,
            no_cleanup,
        } => {
            let options = options.install(!no_install).cleanup(!no_cleanup);
            let mut sandbox = Sandbox::new(options);
            sandbox.initialize()?;
            sandbox.activate(env.as_deref())?;
            let style = current_output_style();
            println!(
                "{}",
                render_status_line(
                    style,
                    "ok",
                    &format!(
                        "activated sandbox at {}",
                        sandbox.options().isolation_path().display()
                    )
                )
            );
            println!(
                "{}",
                render_status_line(
                    style,
                    "step",
                    "run 'isopack shellenv' to export the isolation variables"
                )
            );
        }
        Commands::Clean => {
            let mut sandbox = Sandbox::new(options);
            sandbox.initialize()?;
            let removed = sandbox.cleanup()?;
            if removed.is_empty() {
                println!("Nothing to remove");
            } else {
                for spec in removed {
                    println!("removed {}", spec.full_name());
                }
            }
        }
        Commands::Shellenv => {
            for line in shellenv_lines(&options) {
                println!("{line}");
            }
        }
        Commands::Completions { shell } => {
            let mut stdout = std::io::stdout();
            write_completions_script(shell, &mut stdout);
        }
        Commands::Version => {
            println!("{}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}

pub(crate) fn build_options(cli: &Cli) -> Options {
    let mut options = Options::new().verbose(!cli.quiet);
    if let Some(path) = &cli.path {
        options = options.path(path);
    }
    if let Some(source) = &cli.source {
        options = options.source(source);
    }
    if let Some(file) = &cli.file {
        options = options.file(file);
    }
    options
}

pub(crate) fn format_entry_lines(entries: &[Entry]) -> Vec<String> {
    entries
        .iter()
        .map(|entry| {
            let scope = if entry.environments.is_empty() {
                String::new()
            } else {
                let environments = entry
                    .environments
                    .iter()
                    .cloned()
                    .collect::<Vec<_>>()
                    .join(", ");
                format!(" [{environments}]")
            };
            format!("{} ({}){}", entry.name, entry.requirement, scope)
        })
        .collect()
}

pub(crate) fn shellenv_lines(options: &Options) -> Vec<String> {
    let isolation = options.isolation_path();
    let bin = StoreLayout::new(&isolation).bin_dir();

    if cfg!(windows) {
        return vec![
            format!("set {PACKAGE_HOME_VAR}={}", isolation.display()),
            format!("set {PACKAGE_PATH_VAR}={}", isolation.display()),
            format!("set {SANDBOX_MARKER_VAR}={}", isolation.display()),
            format!("set PATH={};%PATH%", bin.display()),
        ];
    }

    vec![
        format!("export {PACKAGE_HOME_VAR}=\"{}\"", isolation.display()),
        format!("export {PACKAGE_PATH_VAR}=\"{}\"", isolation.display()),
        format!("export {SANDBOX_MARKER_VAR}=\"{}\"", isolation.display()),
        format!("export PATH=\"{}:$PATH\"", bin.display()),
    ]
}
