use {
    anyhow::{Context, Result},
    clap::{Parser, Subcommand},
    std::path::PathBuf,
    tracing::info,
};

mod collaborators;
mod commands;
mod config;

use collaborators::script_host::{self, Env};

#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    /// rasterkit.yaml lives next to the invocation by default; point elsewhere with this flag.
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    #[command(flatten)]
    run: RunArgs,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(clap::Args, Default)]
struct RunArgs {
    /// run the script in this file
    #[arg(short = 'f', long, conflicts_with_all = ["eval", "interactive"])]
    file: Option<PathBuf>,

    /// run this snippet directly
    #[arg(short = 'e', long, conflicts_with_all = ["file", "interactive"])]
    eval: Option<String>,

    /// drop into an interactive read-eval-print loop
    #[arg(short = 'i', long, conflicts_with_all = ["file", "eval"])]
    interactive: bool,

    /// prompt string shown in interactive mode
    #[arg(short = 'p', long, default_value = "rasterkit> ")]
    prompt: String,

    /// everything after `--` becomes the script's positional arguments (arg1, arg2, ...)
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    script_args: Vec<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// prints the default config; save it to rasterkit.yaml and modify to your liking
    PrintDefaultConfig,
}

fn setup_logging() {
    use tracing_subscriber::EnvFilter;
    tracing_subscriber::fmt().with_env_filter(EnvFilter::from_default_env()).init();
}

fn main() -> Result<()> {
    setup_logging();
    let Cli { config: config_arg, run, command } = Cli::parse();

    if let Some(Commands::PrintDefaultConfig) = command {
        return config::RasterkitConfig::write_default().map(|yaml| println!("{yaml}"));
    }

    let (config_path, _config) = config::RasterkitConfig::find(&config_arg).context("reading rasterkit config")?;
    if let Some(path) = &config_path {
        info!("found config at [{}]", path.display());
    }

    let mut env = Env::new(&run.script_args);

    if run.interactive {
        return run_interactive(&run.prompt, &mut env);
    }

    if let Some(path) = &run.file {
        let src = std::fs::read_to_string(path).with_context(|| format!("reading script '{}'", path.display()))?;
        return run_snippet(&src, &mut env);
    }

    if let Some(src) = &run.eval {
        return run_snippet(src, &mut env);
    }

    bail_no_script()
}

fn bail_no_script() -> Result<()> {
    anyhow::bail!("nothing to do: pass -f <file>, -e <snippet>, -i for a REPL, or a subcommand (see --help)")
}

fn run_snippet(src: &str, env: &mut Env) -> Result<()> {
    match script_host::eval_snippet(src, env).context("running script")? {
        Some(value) => {
            println!("{value}");
            Ok(())
        }
        None => Ok(()),
    }
}

fn run_interactive(prompt: &str, env: &mut Env) -> Result<()> {
    use std::io::Write;
    let stdin = std::io::stdin();
    loop {
        print!("{prompt}");
        std::io::stdout().flush().ok();
        let mut line = String::new();
        if stdin.read_line(&mut line).context("reading from stdin")? == 0 {
            break;
        }
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if matches!(line, "exit" | "quit") {
            break;
        }
        match script_host::eval_snippet(line, env) {
            Ok(Some(value)) => println!("{value}"),
            Ok(None) => {}
            Err(err) => eprintln!("error: {err:?}"),
        }
    }
    Ok(())
}
