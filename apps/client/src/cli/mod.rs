use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::models::Mode;

pub mod dispatch;

pub use dispatch::run;

/// Top-level CLI parser for the `resume-client` binary.
#[derive(Debug, Parser)]
#[command(
    name = "resume-client",
    version,
    about = "Upload, enhance and export resumes from the terminal"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output style: json (pretty) or raw (single line)
    #[arg(short, long, global = true, default_value = "json")]
    pub output: OutputFormat,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Raw,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Create an account and sign in.
    Register(RegisterArgs),
    /// Sign in with email and password.
    Login(LoginArgs),
    /// Forget the stored session.
    Logout,
    /// Show who is signed in.
    Status,
    /// Upload a PDF, TXT or MD resume (max 5MB).
    Upload {
        file: PathBuf,
    },
    /// Submit a resume as plain text read from a file.
    SubmitText {
        file: PathBuf,
    },
    /// List your resumes.
    List,
    /// Show one resume and its lifecycle state.
    Show {
        id: i64,
    },
    /// Poll a resume until parsing finishes or fails.
    Watch {
        id: i64,
    },
    /// List the enhanced versions of a resume, or show one of them.
    Versions(VersionsArgs),
    /// Rewrite a resume.
    Enhance(EnhanceArgs),
    /// Score a resume, optionally against a job description.
    Analyze(TargetArgs),
    /// Ask for improvement suggestions.
    Suggest(TargetArgs),
    /// Translate a resume.
    Translate(TranslateArgs),
    /// Export an enhanced version.
    Export(ExportArgs),
    /// Show remaining usage quota.
    Usage,
    /// Reset usage counters (development backends only).
    UsageReset,
}

impl Commands {
    /// Everything except the account commands needs a stored session.
    pub fn needs_session(&self) -> bool {
        !matches!(
            self,
            Commands::Register(_) | Commands::Login(_) | Commands::Logout | Commands::Status
        )
    }
}

#[derive(Debug, Args)]
pub struct LoginArgs {
    #[arg(long)]
    pub email: String,
    #[arg(long, env = "RESUME_PASSWORD", hide_env_values = true)]
    pub password: String,
}

#[derive(Debug, Args)]
pub struct RegisterArgs {
    #[command(flatten)]
    pub credentials: LoginArgs,
    #[arg(long)]
    pub full_name: Option<String>,
}

#[derive(Debug, Args)]
pub struct VersionsArgs {
    /// Resume id
    pub id: i64,
    /// Show only this enhanced version
    #[arg(long)]
    pub select: Option<i64>,
}

#[derive(Debug, Args)]
pub struct TargetArgs {
    /// Resume id
    pub id: i64,
    /// Job description to tailor against
    #[arg(long)]
    pub job_description: Option<String>,
    #[arg(long, value_enum, default_value = "local")]
    pub mode: ModeArg,
    /// Export the produced version right away
    #[arg(long, value_enum)]
    pub export: Option<ExportFormatArg>,
}

#[derive(Debug, Args)]
pub struct EnhanceArgs {
    #[command(flatten)]
    pub target: TargetArgs,
    /// Language code for the rewritten text
    #[arg(long)]
    pub output_language: Option<String>,
}

#[derive(Debug, Args)]
pub struct TranslateArgs {
    /// Resume id
    pub id: i64,
    /// Target language code, e.g. en or zh
    #[arg(long)]
    pub lang: String,
    #[arg(long, value_enum, default_value = "gpt")]
    pub mode: ModeArg,
    /// Export the translation right away
    #[arg(long, value_enum)]
    pub export: Option<ExportFormatArg>,
}

#[derive(Debug, Args)]
pub struct ExportArgs {
    /// Enhanced resume id
    pub enhanced_id: i64,
    #[arg(long, value_enum, default_value = "markdown")]
    pub format: ExportFormatArg,
    /// Request markdown through the export envelope instead of downloading it
    #[arg(long)]
    pub envelope: bool,
    /// File name for envelope exports
    #[arg(long)]
    pub filename: Option<String>,
    /// Where direct downloads are written (defaults to RESUME_DOWNLOAD_DIR)
    #[arg(long)]
    pub out_dir: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum ModeArg {
    Local,
    Gpt,
}

impl From<ModeArg> for Mode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Local => Mode::Local,
            ModeArg::Gpt => Mode::Gpt,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum ExportFormatArg {
    Markdown,
    Html,
    Compare,
    Pdf,
}
