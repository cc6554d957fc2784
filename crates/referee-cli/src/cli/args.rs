use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use referee_core::judge::DEFAULT_PARALLEL;
use referee_core::oracle::openai::DEFAULT_JUDGE_MODEL;

#[derive(Parser)]
#[command(
    name = "referee",
    version,
    about = "Judge stored LLM answers to ambiguous-referent questions and aggregate the verdicts"
)]
pub struct Cli {
    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Judge raw model outputs with live oracle calls
    Judge(JudgeArgs),
    /// Asynchronous judging through the batch API
    Batch(BatchArgs),
    /// Per-model aggregation report (JSON)
    Analyze(AnalyzeArgs),
    /// Positional-bias ablation report (JSON)
    Ablate(AblateArgs),
    Version,
}

#[derive(Args, Debug)]
pub struct CommonArgs {
    /// Data root holding outputs/ and judged_outputs/
    #[arg(long, env = "REFEREE_DATA_ROOT")]
    pub data_root: PathBuf,

    /// Dataset variant: clear_ref or shared_ref
    #[arg(long)]
    pub variant: String,

    /// Evaluation-matrix YAML; built-in defaults when omitted
    #[arg(long)]
    pub matrix: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct JudgeArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Responding model whose outputs to judge
    #[arg(long)]
    pub model: String,

    /// Languages to cover (default: every matrix language)
    #[arg(long, value_delimiter = ',')]
    pub langs: Vec<String>,

    /// Prompt modes to cover (default: every matrix mode)
    #[arg(long, value_delimiter = ',')]
    pub modes: Vec<String>,

    /// Also judge the shuffled-order files (English only)
    #[arg(long)]
    pub all_orders: bool,

    /// Judge model id
    #[arg(long, default_value = DEFAULT_JUDGE_MODEL)]
    pub judge_model: String,

    /// Bound on in-flight oracle calls
    #[arg(long, default_value_t = DEFAULT_PARALLEL)]
    pub parallel: usize,

    /// OpenAI API key
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub api_key: String,
}

#[derive(Args, Debug)]
pub struct BatchArgs {
    #[command(subcommand)]
    pub cmd: BatchCommand,
}

#[derive(Subcommand, Debug)]
pub enum BatchCommand {
    /// Build batch task files and create judging jobs
    Submit(BatchSubmitArgs),
    /// Poll a job, optionally downloading its output file
    Status(BatchStatusArgs),
    /// Correlate downloaded batch results into judged outputs
    Parse(BatchParseArgs),
    /// Re-run entity extraction live for failed correlation ids
    Repair(BatchRepairArgs),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum TaskKind {
    Coarse,
    Entity,
    Both,
}

impl TaskKind {
    pub fn wants_coarse(self) -> bool {
        matches!(self, TaskKind::Coarse | TaskKind::Both)
    }

    pub fn wants_entity(self) -> bool {
        matches!(self, TaskKind::Entity | TaskKind::Both)
    }
}

#[derive(Args, Debug)]
pub struct BatchSubmitArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Responding models to cover (default: every matrix model)
    #[arg(long, value_delimiter = ',')]
    pub models: Vec<String>,

    /// Languages to cover (default: every matrix language)
    #[arg(long, value_delimiter = ',')]
    pub langs: Vec<String>,

    /// Prompt modes to cover (default: every matrix mode)
    #[arg(long, value_delimiter = ',')]
    pub modes: Vec<String>,

    /// Which task files to build
    #[arg(long, value_enum, default_value = "both")]
    pub kind: TaskKind,

    /// Judge model id
    #[arg(long, default_value = DEFAULT_JUDGE_MODEL)]
    pub judge_model: String,

    /// Write the task files without uploading or creating jobs
    #[arg(long)]
    pub build_only: bool,

    /// OpenAI API key (required unless --build-only)
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,
}

#[derive(Args, Debug)]
pub struct BatchStatusArgs {
    /// Batch job id
    #[arg(long)]
    pub job_id: String,

    /// Write the completed job's output file here
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// OpenAI API key
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub api_key: String,
}

#[derive(Args, Debug)]
pub struct BatchParseArgs {
    /// Data root holding outputs/ and judged_outputs/
    #[arg(long, env = "REFEREE_DATA_ROOT")]
    pub data_root: PathBuf,

    /// Dataset variant: clear_ref or shared_ref
    #[arg(long)]
    pub variant: String,

    /// Downloaded coarse-judge result file
    #[arg(long)]
    pub coarse: PathBuf,

    /// Downloaded entity-judge result file (repeatable; repaired files stack)
    #[arg(long, required = true)]
    pub entity: Vec<PathBuf>,
}

#[derive(Args, Debug)]
pub struct BatchRepairArgs {
    /// Data root holding outputs/ and judged_outputs/
    #[arg(long, env = "REFEREE_DATA_ROOT")]
    pub data_root: PathBuf,

    /// Correlation ids to re-run (task-{file key}-{index})
    #[arg(required = true)]
    pub ids: Vec<String>,

    /// Repaired-result file to append to (default: under raw_judge_outputs/)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Judge model id
    #[arg(long, default_value = DEFAULT_JUDGE_MODEL)]
    pub judge_model: String,

    /// OpenAI API key
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub api_key: String,
}

#[derive(Args, Debug)]
pub struct AnalyzeArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Responding models to report on (default: every matrix model)
    #[arg(long, value_delimiter = ',')]
    pub models: Vec<String>,

    /// Languages to aggregate over (default: every matrix language)
    #[arg(long, value_delimiter = ',')]
    pub langs: Vec<String>,

    /// Prompt modes to aggregate over (default: every matrix mode)
    #[arg(long, value_delimiter = ',')]
    pub modes: Vec<String>,

    /// Report file (default: stdout)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct AblateArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Responding model
    #[arg(long)]
    pub model: String,

    /// Language with shuffled-order outputs
    #[arg(long, default_value = "en")]
    pub lang: String,

    /// Prompt modes to cover (default: every matrix mode)
    #[arg(long, value_delimiter = ',')]
    pub modes: Vec<String>,

    /// Report file (default: stdout)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}
