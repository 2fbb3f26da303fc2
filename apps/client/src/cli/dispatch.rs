//! Command handlers. Results go to stdout as JSON; logs go to stderr.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use serde::Serialize;
use serde_json::json;
use tracing::{info, warn};

use crate::api_client::ApiClient;
use crate::auth;
use crate::cli::{
    Cli, Commands, EnhanceArgs, ExportFormatArg, OutputFormat, TargetArgs,
    VersionsArgs,
};
use crate::config::Config;
use crate::export::Exporter;
use crate::lifecycle::{
    EnhancementOptions, LifecycleState, ResumeBackend, ResumeTracker, ResumeWatcher, VersionKey,
};
use crate::models::{DirectFormat, ExportFormat, Mode};
use crate::validation::validate_resume_text;

pub async fn run(cli: Cli, config: &Config, api: ApiClient) -> Result<()> {
    let out = cli.output;
    if cli.command.needs_session() {
        require_session(&api)?;
    }

    match cli.command {
        Commands::Register(args) => {
            let session = auth::register(
                &api,
                &args.credentials.email,
                &args.credentials.password,
                args.full_name.as_deref(),
            )
            .await?;
            emit(&session.user(), out)
        }
        Commands::Login(args) => {
            let session = auth::login(&api, &args.email, &args.password).await?;
            emit(&session.user(), out)
        }
        Commands::Logout => {
            auth::logout(&api);
            emit(&json!({"authenticated": false}), out)
        }
        Commands::Status => match api.session().current() {
            Some(session) => emit(
                &json!({"authenticated": true, "user": session.user()}),
                out,
            ),
            None => emit(&json!({"authenticated": false}), out),
        },
        Commands::Upload { file } => {
            let resume = api.upload_resume(&file).await?;
            info!("Uploaded {} as resume {}", file.display(), resume.id);
            emit(&resume, out)
        }
        Commands::SubmitText { file } => {
            let text = tokio::fs::read_to_string(&file)
                .await
                .with_context(|| format!("Failed to read {}", file.display()))?;
            validate_resume_text(&text)?;
            let resume = api.create_text_resume(text.trim()).await?;
            emit(&resume, out)
        }
        Commands::List => emit(&api.list_resumes().await?, out),
        Commands::Show { id } => {
            let resume = api.get_resume(id).await?;
            let state = LifecycleState::of(&resume);
            emit(
                &json!({"state": state, "parsed": resume.parsed(), "resume": resume}),
                out,
            )
        }
        Commands::Watch { id } => watch(id, out, config.poll_interval, api).await,
        Commands::Versions(args) => versions(args, out, &api).await,
        Commands::Enhance(args) => enhance(args, out, config, &api).await,
        Commands::Analyze(args) => {
            let tracker = ready_tracker(&api, args.id).await?;
            let options = options(&api, &args, None).await;
            emit(&tracker.analyze(&options).await?, out)?;
            export_selected(&tracker, args.export, out, config, &api).await
        }
        Commands::Suggest(args) => {
            let tracker = ready_tracker(&api, args.id).await?;
            let options = options(&api, &args, None).await;
            emit(&tracker.suggest(&options).await?, out)?;
            export_selected(&tracker, args.export, out, config, &api).await
        }
        Commands::Translate(args) => {
            let tracker = ready_tracker(&api, args.id).await?;
            let mode = Mode::from(args.mode);
            warn_if_gpt_exhausted(&api, mode).await;
            emit(&tracker.translate(&args.lang, mode).await?, out)?;
            export_selected(&tracker, args.export, out, config, &api).await
        }
        Commands::Export(args) => {
            let dir = args.out_dir.unwrap_or_else(|| config.download_dir.clone());
            let exporter = Exporter::new(api, dir);
            export_version(
                &exporter,
                args.enhanced_id,
                args.format,
                args.envelope,
                args.filename,
                out,
            )
            .await
        }
        Commands::Usage => emit(&api.usage_limits().await?, out),
        Commands::UsageReset => emit(&api.reset_usage().await?, out),
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Lifecycle commands
// ────────────────────────────────────────────────────────────────────────────

/// Polls until the resume settles, printing every observed state.
async fn watch(id: i64, out: OutputFormat, interval: Duration, api: ApiClient) -> Result<()> {
    let backend: Arc<dyn ResumeBackend> = Arc::new(api);
    let mut watcher = ResumeWatcher::new(backend, interval);
    let tracker = watcher.watch(id);

    follow_states(&tracker, &watcher, interval, |state| {
        emit(&json!({"resumeId": id, "state": state}), out)
    })
    .await?;
    watcher.stop();

    let snapshot = tracker.snapshot().await;
    emit(&snapshot, out)?;
    if !snapshot.state.is_terminal() {
        if let Some(error) = snapshot.last_error {
            bail!("Stopped watching resume {id}: {error}");
        }
    }
    Ok(())
}

/// Hands every published state to `on_state` until the resume settles, the
/// poller exits on its own, or the user interrupts.
async fn follow_states<F>(
    tracker: &ResumeTracker,
    watcher: &ResumeWatcher,
    interval: Duration,
    mut on_state: F,
) -> Result<LifecycleState>
where
    F: FnMut(LifecycleState) -> Result<()>,
{
    let mut states = tracker.subscribe();
    // The poller may have published before this subscription existed.
    let mut state = *states.borrow_and_update();
    if state != LifecycleState::Loading {
        on_state(state)?;
    }

    while !state.is_terminal() {
        tokio::select! {
            changed = states.changed() => {
                if changed.is_err() {
                    break;
                }
                state = *states.borrow_and_update();
                on_state(state)?;
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted; stopping poller for resume {}", tracker.resume_id());
                break;
            }
            _ = tokio::time::sleep(interval) => {
                if !watcher.is_polling() {
                    break;
                }
            }
        }
    }
    Ok(state)
}

async fn enhance(
    args: EnhanceArgs,
    out: OutputFormat,
    config: &Config,
    api: &ApiClient,
) -> Result<()> {
    let tracker = ready_tracker(api, args.target.id).await?;
    let options = options(api, &args.target, args.output_language).await;
    emit(&tracker.enhance(&options).await?, out)?;
    export_selected(&tracker, args.target.export, out, config, api).await
}

async fn versions(args: VersionsArgs, out: OutputFormat, api: &ApiClient) -> Result<()> {
    let Some(enhanced_id) = args.select else {
        return emit(&api.get_enhanced_versions(args.id).await?, out);
    };
    let tracker = ready_tracker(api, args.id).await?;
    if !tracker.select_version(VersionKey::Stored(enhanced_id)).await {
        bail!("Resume {} has no enhanced version {enhanced_id}", args.id);
    }
    match tracker.selected().await {
        Some(version) => emit(
            &json!({"version": version, "text": version.text()}),
            out,
        ),
        None => bail!("Resume {} has no enhanced version {enhanced_id}", args.id),
    }
}

/// One fetch; enhancement is only offered once parsing has finished.
async fn ready_tracker(api: &ApiClient, id: i64) -> Result<ResumeTracker> {
    let tracker = ResumeTracker::new(Arc::new(api.clone()), id);
    let state = tracker.refresh().await?;
    if state != LifecycleState::Ready {
        bail!(
            "Resume {id} is not ready for enhancement ({}). Run `resume-client watch {id}` first",
            state.label()
        );
    }
    Ok(tracker)
}

async fn options(
    api: &ApiClient,
    args: &TargetArgs,
    output_language: Option<String>,
) -> EnhancementOptions {
    let mode = Mode::from(args.mode);
    warn_if_gpt_exhausted(api, mode).await;
    EnhancementOptions {
        job_description: args.job_description.clone(),
        output_language,
        mode,
    }
}

/// The server falls back to local mode on its own; this only tells the user.
async fn warn_if_gpt_exhausted(api: &ApiClient, mode: Mode) {
    if mode != Mode::Gpt {
        return;
    }
    match api.usage_limits().await {
        Ok(limits) if !limits.allows_gpt() => warn!(
            "GPT quota exhausted{}; the server may answer in local mode",
            limits
                .reset_time_formatted
                .map(|t| format!(" (resets {t})"))
                .unwrap_or_default()
        ),
        Ok(_) => {}
        Err(e) => warn!("Could not check usage limits: {e}"),
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Export
// ────────────────────────────────────────────────────────────────────────────

/// Exports whatever the last enhancement request selected. Suggestion drafts
/// exist only locally and are rejected as unavailable.
async fn export_selected(
    tracker: &ResumeTracker,
    format: Option<ExportFormatArg>,
    out: OutputFormat,
    config: &Config,
    api: &ApiClient,
) -> Result<()> {
    let Some(format) = format else {
        return Ok(());
    };
    let enhanced_id = tracker.selected_export_id().await?;
    let exporter = Exporter::new(api.clone(), config.download_dir.clone());
    export_version(&exporter, enhanced_id, format, false, None, out).await
}

async fn export_version(
    exporter: &Exporter,
    enhanced_id: i64,
    format: ExportFormatArg,
    envelope: bool,
    filename: Option<String>,
    out: OutputFormat,
) -> Result<()> {
    let direct = match (format, envelope) {
        (ExportFormatArg::Markdown, false) => Some(DirectFormat::Markdown),
        (ExportFormatArg::Html, _) => Some(DirectFormat::Html),
        (ExportFormatArg::Compare, _) => Some(DirectFormat::Compare),
        (ExportFormatArg::Markdown, true) | (ExportFormatArg::Pdf, _) => None,
    };

    match direct {
        Some(direct) => {
            let path = exporter.download(enhanced_id, direct).await?;
            emit(&json!({"status": "saved", "path": path}), out)
        }
        None => {
            let format = match format {
                ExportFormatArg::Pdf => ExportFormat::Pdf,
                _ => ExportFormat::Markdown,
            };
            let outcome = exporter.export(enhanced_id, format, filename).await?;
            emit(&outcome, out)
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Helpers
// ────────────────────────────────────────────────────────────────────────────

fn require_session(api: &ApiClient) -> Result<()> {
    if !api.session().is_authenticated() {
        bail!("Not signed in. Run `resume-client login --email <email>` first");
    }
    Ok(())
}

fn emit<T: Serialize + ?Sized>(value: &T, out: OutputFormat) -> Result<()> {
    let rendered = match out {
        OutputFormat::Json => serde_json::to_string_pretty(value)?,
        OutputFormat::Raw => serde_json::to_string(value)?,
    };
    println!("{rendered}");
    Ok(())
}
