use std::{path::PathBuf, process::ExitCode};

use clap::{Parser, ValueEnum};
use log::{error, info};

use lobster_rust::{
    config::{Config, TaskProcess},
    Result,
};

#[derive(Parser)]
#[command(
    name = "lobster-rust",
    about = "COHP, DOS and PES scan analysis of LOBSTER output",
    version
)]
struct Cli {
    /// Task file in TOML
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Run only this task of the config file
    #[arg(short, long, value_name = "TASK")]
    task: Option<TaskName>,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum TaskName {
    Cohp,
    Dos,
    Scan,
}

fn selected(only: Option<TaskName>, name: TaskName) -> bool {
    only.map_or(true, |t| t == name)
}

fn run(cli: &Cli) -> Result<()> {
    let config = Config::from_file(&cli.config)?;
    info!("Running {}", config.title());
    let tasks = config.tasks();
    if let Some(task) = tasks.cohp().filter(|_| selected(cli.task, TaskName::Cohp)) {
        let summary = task.task_execute()?;
        println!(
            "ICOHP({}) at E_F = {:.5}",
            summary.interaction(),
            summary.icohp_at_fermi()
        );
    }
    if let Some(task) = tasks.dos().filter(|_| selected(cli.task, TaskName::Dos)) {
        let dos = task.task_execute()?;
        for label in dos.sigma_labels().iter().chain(dos.pi_labels()) {
            println!("{:>4} at {:8.3} eV", label.text(), label.energy());
        }
    }
    if let Some(task) = tasks.scan().filter(|_| selected(cli.task, TaskName::Scan)) {
        let steps = task.task_execute()?;
        info!("Processed {} scan steps", steps.len());
    }
    Ok(())
}

fn main() -> ExitCode {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .target(env_logger::Target::Stdout)
        .format_timestamp_millis()
        .init();

    let cli = Cli::parse();
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}
