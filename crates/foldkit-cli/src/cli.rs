use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    author = "Tony Kan, Ted Yu",
    version,
    about = "FoldKit CLI - Structure prediction pipelines, design loops and structural alignment from the command line.",
    help_template = HELP_TEMPLATE,
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output except for errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Set the number of threads for parallel computation.
    /// Defaults to the number of available logical cores.
    #[arg(short = 'j', long, global = true, value_name = "NUM")]
    pub threads: Option<usize>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Superpose a structure onto the best-matching chain of a reference structure.
    Align(AlignArgs),
    /// Convert an mmCIF file to PDB format.
    Convert(ConvertArgs),
    /// Create, submit and track two-stage fold runs on the remote workspace.
    Fold(FoldArgs),
    /// Run the predict, in-paint, design and align loop for a masked sequence.
    Design(DesignArgs),
    /// Send a one-off request to a structure prediction endpoint.
    Predict(PredictArgs),
    /// Inspect the effective configuration.
    Config(ConfigArgs),
}

/// Location of the configuration file and ad-hoc overrides, shared by every
/// command that reads configuration.
#[derive(Args, Debug, Clone, Default)]
pub struct ConfigOverrides {
    /// Path to the configuration file in TOML format.
    /// Defaults to the per-user configuration directory.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Set a specific configuration value, overriding the config file.
    /// Can be used multiple times. Example: -S design.num-backbones=4
    #[arg(short = 'S', long = "set", value_name = "KEY=VALUE")]
    pub set_values: Vec<String>,
}

/// Arguments for the `align` subcommand.
#[derive(Args, Debug)]
pub struct AlignArgs {
    /// Reference structure (PDB or mmCIF); it is reduced to the matching chain.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub reference: PathBuf,

    /// Structure to move onto the reference (PDB or mmCIF).
    #[arg(short = 'm', long, required = true, value_name = "PATH")]
    pub candidate: PathBuf,

    /// Output path for the superposed candidate.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub output: PathBuf,

    /// Output path for the reference reduced to the matching chain.
    #[arg(long, value_name = "PATH")]
    pub reference_output: Option<PathBuf>,

    #[command(flatten)]
    pub overrides: ConfigOverrides,
}

/// Arguments for the `convert` subcommand.
#[derive(Args, Debug)]
pub struct ConvertArgs {
    /// Path to the input mmCIF file.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub input: PathBuf,

    /// Path for the output PDB file.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub output: PathBuf,

    /// Prefix the output with header records naming the structure.
    #[arg(long, value_name = "NAME")]
    pub header: Option<String>,
}

/// Arguments for the `fold` subcommand.
#[derive(Args, Debug)]
pub struct FoldArgs {
    #[command(subcommand)]
    pub command: FoldCommands,

    #[command(flatten)]
    pub overrides: ConfigOverrides,
}

/// Available commands for fold runs.
#[derive(Subcommand, Debug)]
pub enum FoldCommands {
    /// Register the two-stage workflow with the scheduler.
    Create,
    /// Start a run for a sequence; returns as soon as the run is accepted.
    Submit {
        /// Name of the run; letters, digits, '_', '-' and '.' only.
        #[arg(required = true)]
        name: String,
        /// Protein sequence; separate the chains of a complex with ':'.
        #[arg(required = true)]
        sequence: String,
    },
    /// Refresh and show the state of tracked runs.
    Status {
        /// Run to show. Shows every tracked run when omitted.
        name: Option<String>,
        /// Keep polling until the shown runs are finished.
        #[arg(short, long)]
        watch: bool,
        /// Seconds between polls in watch mode.
        #[arg(long, value_name = "SECS", default_value_t = 30)]
        interval: u64,
    },
    /// Ask the scheduler to stop a run.
    Cancel {
        #[arg(required = true)]
        name: String,
    },
    /// Download the top-ranked prediction of a finished run.
    Fetch {
        #[arg(required = true)]
        name: String,
        /// Output path. Defaults to '<name>.pdb'.
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
    /// Superpose a run's prediction onto a deposited entry.
    Compare {
        #[arg(required = true)]
        name: String,
        /// Four-character entry code, e.g. 1CRN.
        #[arg(required = true)]
        pdb_code: String,
        /// Directory receiving the prediction, reference and aligned files.
        #[arg(short, long, value_name = "DIR", default_value = ".")]
        output_dir: PathBuf,
    },
}

/// Arguments for the `design` subcommand.
#[derive(Args, Debug)]
pub struct DesignArgs {
    /// Sequence with the region to redesign in brackets, e.g. 'CASRRSG[FTYPGF]FFEQYF'.
    #[arg(required = true, value_name = "SEQUENCE")]
    pub sequence: String,

    /// Directory for the initial prediction and the aligned designs.
    #[arg(short, long, required = true, value_name = "DIR")]
    pub output_dir: PathBuf,

    /// Override the number of backbones generated.
    #[arg(short = 'n', long, value_name = "INT")]
    pub num_backbones: Option<usize>,

    /// Override the chain of the initial prediction used as template.
    #[arg(long, value_name = "CHAIN")]
    pub design_chain: Option<char>,

    #[command(flatten)]
    pub overrides: ConfigOverrides,
}

/// Arguments for the `predict` subcommand.
#[derive(Args, Debug)]
pub struct PredictArgs {
    #[command(subcommand)]
    pub command: PredictCommands,

    #[command(flatten)]
    pub overrides: ConfigOverrides,
}

#[derive(Subcommand, Debug)]
pub enum PredictCommands {
    /// Fold a single protein sequence with the structure endpoint.
    Structure {
        #[arg(required = true)]
        sequence: String,
        #[arg(short, long, required = true, value_name = "PATH")]
        output: PathBuf,
    },
    /// Predict a complex with the multi-entity endpoint.
    Complex {
        /// Entities as 'kind_chains:sequence' records separated by ';',
        /// e.g. 'protein_A:MKV...;rna_B:ACGU...'.
        #[arg(required = true)]
        input: String,
        #[arg(short, long, required = true, value_name = "PATH")]
        output: PathBuf,
        /// Multiple sequence alignment mode.
        #[arg(long, value_enum, default_value_t = MsaArg::None)]
        msa: MsaArg,
        /// Let the endpoint query a remote MSA server.
        #[arg(long)]
        use_msa_server: bool,
    },
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MsaArg {
    None,
    Jackhmmer,
}

/// Arguments for the `config` subcommand.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommands,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Print the merged configuration as TOML. The token is redacted.
    Show {
        #[command(flatten)]
        overrides: ConfigOverrides,
    },
    /// Print where the configuration file and the run registry live.
    Path,
}
