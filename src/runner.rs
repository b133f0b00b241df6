use std::path::{Path, PathBuf};

use clap::{Args, Command, FromArgMatches as _};
use log::LevelFilter;

use crate::log::{parse_module_filter, set_log_level, set_module_filters};
use crate::model::Model;
use crate::parameters::Parameters;
use crate::report::{write_counts, COUNTS_FILE_NAME};

/// Command line arguments for the gridsir runner
#[derive(Args, Debug)]
pub struct BaseArgs {
    /// Random seed, overriding the one in the parameters file
    #[arg(short, long)]
    pub random_seed: Option<u64>,

    /// Optional path for a JSON parameters file
    #[arg(short, long, default_value = "")]
    pub config: String,

    /// Optional directory for the counts report
    #[arg(short, long, default_value = "")]
    pub output_dir: String,

    /// Enable logging at the given level (error, warn, info, debug, trace)
    #[arg(short, long)]
    pub log_level: Option<LevelFilter>,

    /// Per-module log level as <module>=<level>, e.g. gridsir::movement=trace. Repeatable
    #[arg(long, value_parser = parse_module_filter)]
    pub log_filter: Vec<(String, LevelFilter)>,

    /// Number of steps, overriding the one in the parameters file
    #[arg(short, long)]
    pub steps: Option<usize>,
}

fn create_gridsir_cli() -> Command {
    let cli = Command::new("gridsir").about("SIR epidemic on a toroidal grid");
    BaseArgs::augment_args(cli)
}

/// Parses the command line and runs a model with it.
///
/// # Errors
/// Returns an error if argument parsing, setup, or writing the report fails
#[allow(clippy::missing_errors_doc)]
pub fn run_with_args() -> Result<Model, Box<dyn std::error::Error>> {
    let cli = create_gridsir_cli();
    let matches = cli.get_matches();

    let base_args_matches = BaseArgs::from_arg_matches(&matches)?;
    run_with_args_internal(base_args_matches)
}

/// Builds the parameters described by `args`: the config file if given, then the overrides.
///
/// # Errors
/// Returns an error if the config file cannot be read or parsed
pub fn load_parameters(args: &BaseArgs) -> Result<Parameters, Box<dyn std::error::Error>> {
    let mut parameters = if args.config.is_empty() {
        Parameters::default()
    } else {
        Parameters::from_json_file(Path::new(&args.config))?
    };
    if let Some(seed) = args.random_seed {
        parameters.seed = seed;
    }
    if let Some(steps) = args.steps {
        parameters.num_steps = steps;
    }
    Ok(parameters)
}

pub(crate) fn run_with_args_internal(
    args: BaseArgs,
) -> Result<Model, Box<dyn std::error::Error>> {
    if let Some(level) = args.log_level {
        set_log_level(level);
    }
    if !args.log_filter.is_empty() {
        let filters: Vec<(&str, LevelFilter)> = args
            .log_filter
            .iter()
            .map(|(module, level)| (module.as_str(), *level))
            .collect();
        set_module_filters(&filters);
    }

    let parameters = load_parameters(&args)?;
    let mut model = Model::new(parameters)?;
    model.run();

    // Optionally write the per-step counts
    if !args.output_dir.is_empty() {
        let path = PathBuf::from(&args.output_dir).join(COUNTS_FILE_NAME);
        write_counts(&path, model.counts())?;
    }
    Ok(model)
}
