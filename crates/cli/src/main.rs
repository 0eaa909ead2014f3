use std::path::{Path, PathBuf};
use std::process;
use std::time::Duration;

use clap::{CommandFactory, FromArgMatches, Parser};

use audio_degrader_core::degradation::domain::grammar::SpecGrammar;
use audio_degrader_core::degradation::domain::usage_doc::DegradationUsageDocGenerator;
use audio_degrader_core::degradation::infrastructure::degradation_factory::{
    builtin_registry, create_env,
};
use audio_degrader_core::pipeline::degrade_audio_use_case::DegradeAudioUseCase;
use audio_degrader_core::pipeline::pipeline_executor::PipelineExecutor;
use audio_degrader_core::pipeline::pipeline_logger::LogPipelineLogger;
use audio_degrader_core::shared::config::DegraderConfig;
use audio_degrader_core::shared::constants::{
    DEFAULT_SOX_PROGRAM, DEFAULT_TOOL_TIMEOUT_SECS, PARAMETERS_SEP, RESOURCES_ENV_VAR,
};
use audio_degrader_core::shared::resource_resolver::ResourceResolver;

/// Apply a chain of degradations to an audio file.
#[derive(Parser)]
#[command(
    name = "audio-degrader",
    override_usage = "audio-degrader [OPTIONS] <INPUT> [DEGRADATION]... <OUTPUT>"
)]
struct Cli {
    /// Input file, degradations to apply in order, output file.
    #[arg(
        value_name = "INPUT [DEGRADATION]... OUTPUT",
        required_unless_present_any = ["list_degradations", "list_resources"]
    )]
    args: Vec<String>,

    /// Print the available degradations and exit.
    #[arg(short = 'l', long)]
    list_degradations: bool,

    /// Print the files found under the resources directory and exit.
    #[arg(long)]
    list_resources: bool,

    /// Root for relative noise and impulse-response paths.
    #[arg(long, env = RESOURCES_ENV_VAR)]
    resources_dir: Option<PathBuf>,

    /// Parent directory for temporary files.
    #[arg(long)]
    tmp_dir: Option<PathBuf>,

    /// Seconds to wait for an external tool before killing it.
    #[arg(long, default_value_t = DEFAULT_TOOL_TIMEOUT_SECS)]
    tool_timeout: u64,

    /// SoX executable used by mp3 and dr_compression.
    #[arg(long, default_value = DEFAULT_SOX_PROGRAM)]
    sox: String,

    /// Separator between a degradation's parameter values.
    #[arg(long, default_value = PARAMETERS_SEP)]
    parameters_sep: String,
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let registry = builtin_registry();
    let help = format!(
        "Degradations:\n{}",
        DegradationUsageDocGenerator::all_help(&registry)
    );
    let matches = Cli::command().after_help(help.clone()).get_matches();
    let cli = Cli::from_arg_matches(&matches)?;

    if cli.list_degradations {
        println!("{help}");
        return Ok(());
    }

    let config = build_config(&cli)?;

    if cli.list_resources {
        let resolver = ResourceResolver::new(config.resources_dir.clone(), config.cache_dir.clone());
        log::info!("Resources in {}", config.resources_dir.display());
        for path in resolver.list()? {
            println!("{}", path.display());
        }
        return Ok(());
    }

    let (input, specs, output) = split_args(&cli.args)?;
    validate(input)?;

    let executor = PipelineExecutor::new(registry, create_env(&config))
        .with_grammar(SpecGrammar::with_parameters_sep(cli.parameters_sep.as_str()))
        .with_logger(Box::new(LogPipelineLogger::new()));
    let mut use_case = DegradeAudioUseCase::new(executor);
    use_case.run(input, specs, output)?;
    log::info!("Output written to {}", output.display());
    Ok(())
}

fn build_config(cli: &Cli) -> Result<DegraderConfig, Box<dyn std::error::Error>> {
    let mut config = DegraderConfig::from_platform_dirs()?
        .with_tool_timeout(Duration::from_secs(cli.tool_timeout))
        .with_sox_program(cli.sox.as_str());
    if let Some(dir) = &cli.resources_dir {
        config = config.with_resources_dir(dir.clone());
    }
    if let Some(dir) = &cli.tmp_dir {
        config = config.with_tmp_dir(dir.clone());
    }
    Ok(config)
}

/// First argument is the input, last is the output, the rest are specs.
fn split_args(args: &[String]) -> Result<(&Path, &[String], &Path), Box<dyn std::error::Error>> {
    match args {
        [input, specs @ .., output] => Ok((Path::new(input), specs, Path::new(output))),
        _ => Err("expected an input file and an output file".into()),
    }
}

fn validate(input: &Path) -> Result<(), Box<dyn std::error::Error>> {
    if !input.exists() {
        return Err(format!("Input file not found: {}", input.display()).into());
    }
    Ok(())
}
