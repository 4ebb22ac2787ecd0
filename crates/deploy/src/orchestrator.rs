//! Fan-out of copy jobs and per-job execution.

use std::sync::Arc;

use fleetdeploy_protocol::{AppExecutableSpec, DeploymentSelection, ProgressEvent, SpecSet};
use fleetdeploy_inventory::layout::{StagingLayout, TargetLayout, dest_dir};
use fleetdeploy_shortcut::ShortcutPublisher;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{error, info, warn};

use crate::sync::{FileOutcome, collect_files, sync_file};
use crate::types::{CopyError, CopyReport, CopyRequest, JobOutcome};

/// Packaged artifacts land in one fixed subfolder per app.
const PACKAGE_SUBFOLDER: &str = "packages";

/// Orchestrates concurrent copy jobs across (host × selection) pairs.
pub struct CopyOrchestrator {
    staging: StagingLayout,
    specs: SpecSet,
    target: Arc<dyn TargetLayout>,
    publisher: Arc<ShortcutPublisher>,
    events_tx: mpsc::Sender<ProgressEvent>,
    events_rx: Option<mpsc::Receiver<ProgressEvent>>,
}

/// One unit of concurrent work.
struct CopyJob {
    host: String,
    spec: AppExecutableSpec,
    build: String,
    environment: Option<String>,
    connection_id: String,
}

impl CopyOrchestrator {
    pub fn new(
        staging: StagingLayout,
        specs: SpecSet,
        target: Arc<dyn TargetLayout>,
        publisher: Arc<ShortcutPublisher>,
    ) -> Self {
        let (events_tx, events_rx) = mpsc::channel(256);
        Self {
            staging,
            specs,
            target,
            publisher,
            events_tx,
            events_rx: Some(events_rx),
        }
    }

    /// Takes the event receiver. Can only be called once.
    pub fn take_events(&mut self) -> Option<mpsc::Receiver<ProgressEvent>> {
        self.events_rx.take()
    }

    /// Runs one copy batch to completion.
    ///
    /// Jobs run fully concurrent and isolated; the network path, not local
    /// CPU, is the bottleneck, so fan-out is unbounded. A job failure never
    /// cancels siblings. An unexpected task failure (panic) is reported once
    /// and surfaces as [`CopyError::Batch`].
    pub async fn run(&self, request: CopyRequest) -> Result<CopyReport, CopyError> {
        if request.hosts.is_empty() {
            return Err(CopyError::NoHosts);
        }
        if request.selections.is_empty() {
            return Err(CopyError::NoSelections);
        }

        let triples = self.expand(&request.selections, &request.environments);
        if triples.is_empty() {
            warn!("no valid build sources after selection expansion");
            return Err(CopyError::NoValidSources);
        }

        let total_jobs = request.hosts.len() * triples.len();
        info!(
            jobs = total_jobs,
            hosts = request.hosts.len(),
            "starting copy batch"
        );

        let mut set: JoinSet<JobOutcome> = JoinSet::new();
        for host in &request.hosts {
            for (spec, build, environment) in &triples {
                let job = CopyJob {
                    host: host.clone(),
                    spec: spec.clone(),
                    build: build.clone(),
                    environment: environment.clone(),
                    connection_id: request.connection_id.clone(),
                };
                let staging = self.staging.clone();
                let target = Arc::clone(&self.target);
                let publisher = Arc::clone(&self.publisher);
                let events = self.events_tx.clone();
                set.spawn(async move { run_job(job, staging, target, publisher, events).await });
            }
        }

        let mut outcomes = Vec::with_capacity(total_jobs);
        let mut batch_error = None;
        while let Some(joined) = set.join_next().await {
            match joined {
                Ok(outcome) => outcomes.push(outcome),
                Err(e) => {
                    error!(error = %e, "copy job task failed unexpectedly");
                    let _ = self
                        .events_tx
                        .send(ProgressEvent::error(
                            &request.connection_id,
                            format!("unexpected failure: {e}"),
                        ))
                        .await;
                    batch_error = Some(e.to_string());
                }
            }
        }

        if let Some(e) = batch_error {
            return Err(CopyError::Batch(e));
        }
        Ok(CopyReport {
            total_jobs,
            outcomes,
        })
    }

    /// Expands selections against the caller's environment list and drops
    /// triples whose source does not exist.
    ///
    /// An env-less selection for an app that does not embed the environment
    /// in its shortcut becomes one triple per caller environment; everything
    /// else passes through unchanged. Selections without a configured spec
    /// and triples without an on-disk source are dropped silently.
    fn expand(
        &self,
        selections: &[DeploymentSelection],
        environments: &[String],
    ) -> Vec<(AppExecutableSpec, String, Option<String>)> {
        let mut triples = Vec::new();
        for selection in selections {
            let Some(spec) = self.specs.get(&selection.app) else {
                warn!(app = %selection.app, "no spec configured, dropping selection");
                continue;
            };
            if selection.environment.is_none() && !spec.env_in_shortcut {
                for env in environments {
                    triples.push((spec.clone(), selection.build.clone(), Some(env.clone())));
                }
            } else {
                triples.push((
                    spec.clone(),
                    selection.build.clone(),
                    selection.environment.clone(),
                ));
            }
        }
        triples.retain(|(spec, build, env)| self.staging.source_exists(spec, build, env.as_deref()));
        triples
    }
}

async fn run_job(
    job: CopyJob,
    staging: StagingLayout,
    target: Arc<dyn TargetLayout>,
    publisher: Arc<ShortcutPublisher>,
    events: mpsc::Sender<ProgressEvent>,
) -> JobOutcome {
    let selection = DeploymentSelection {
        app: job.spec.name.clone(),
        build: job.build.clone(),
        environment: job.environment.clone(),
    };
    let mut outcome = JobOutcome::new(&job.host, selection);
    let conn = job.connection_id.clone();
    let label = job_label(&job);

    let Some(source) = staging.source_path(&job.spec, &job.build, job.environment.as_deref())
    else {
        outcome.error = Some("source path could not be resolved".into());
        let _ = events
            .send(ProgressEvent::error(&conn, format!("source not found for {label}")))
            .await;
        return outcome;
    };

    // Packaged artifact: a single file, no tree walk.
    if job.spec.requires_environment {
        let dest = target
            .dest_root(&job.host)
            .join(&job.spec.product_group)
            .join(&job.spec.name)
            .join(PACKAGE_SUBFOLDER);
        if let Err(e) = std::fs::create_dir_all(&dest) {
            outcome.error = Some(e.to_string());
            let _ = events
                .send(ProgressEvent::error(
                    &conn,
                    format!("cannot create destination {}: {e}", dest.display()),
                ))
                .await;
            return outcome;
        }
        let file_name = source.file_name().unwrap_or_default();
        match sync_file(&source, &dest.join(file_name)) {
            FileOutcome::Copied => outcome.copied += 1,
            FileOutcome::Skipped => outcome.skipped += 1,
            FileOutcome::Failed(msg) => {
                outcome.failed += 1;
                let _ = events
                    .send(ProgressEvent::error(&conn, format!("{label}: {msg}")))
                    .await;
                return outcome;
            }
        }
        let _ = events.send(ProgressEvent::progress(&conn, 100)).await;
        let _ = events
            .send(ProgressEvent::message(&conn, format!("package copied for {label}")))
            .await;
        return outcome;
    }

    let dest = dest_dir(
        &target.dest_root(&job.host),
        &job.spec,
        &job.build,
        job.environment.as_deref(),
    );
    if let Err(e) = std::fs::create_dir_all(&dest) {
        outcome.error = Some(e.to_string());
        let _ = events
            .send(ProgressEvent::error(
                &conn,
                format!("cannot create destination {}: {e}", dest.display()),
            ))
            .await;
        return outcome;
    }

    let files = match collect_files(&source) {
        Ok(files) => files,
        Err(e) => {
            outcome.error = Some(e.to_string());
            let _ = events
                .send(ProgressEvent::error(
                    &conn,
                    format!("source not readable {}: {e}", source.display()),
                ))
                .await;
            return outcome;
        }
    };

    let total = files.len();
    for file in &files {
        let rel = file.strip_prefix(&source).unwrap_or(file.as_path());
        match sync_file(file, &dest.join(rel)) {
            FileOutcome::Copied => outcome.copied += 1,
            FileOutcome::Skipped => outcome.skipped += 1,
            FileOutcome::Failed(msg) => {
                outcome.failed += 1;
                let _ = events
                    .send(ProgressEvent::error(
                        &conn,
                        format!("{label}: {} {msg}", rel.display()),
                    ))
                    .await;
            }
        }
        let percent = (outcome.processed() * 100 / total) as u8;
        let _ = events.send(ProgressEvent::progress(&conn, percent)).await;
    }
    if total == 0 {
        let _ = events.send(ProgressEvent::progress(&conn, 100)).await;
    }

    let _ = events
        .send(ProgressEvent::message(
            &conn,
            format!(
                "copy complete for {label}: ok:{} failed:{}",
                outcome.copied + outcome.skipped,
                outcome.failed
            ),
        ))
        .await;

    if outcome.failed == 0 {
        publish_shortcut(&job, &publisher, &events, &mut outcome).await;
    } else {
        let _ = events
            .send(ProgressEvent::message(
                &conn,
                format!("shortcut skipped due to copy errors for {label}"),
            ))
            .await;
    }

    outcome
}

async fn publish_shortcut(
    job: &CopyJob,
    publisher: &ShortcutPublisher,
    events: &mpsc::Sender<ProgressEvent>,
    outcome: &mut JobOutcome,
) {
    let conn = &job.connection_id;
    let label = job_label(job);
    match publisher.publish(&job.host, &job.spec, &job.build, job.environment.as_deref()) {
        Ok(Some(path)) => {
            let _ = events
                .send(ProgressEvent::message(
                    conn,
                    format!("shortcut created: {}", path.display()),
                ))
                .await;
            outcome.shortcut = Some(path);
        }
        Ok(None) => {
            let _ = events
                .send(ProgressEvent::message(
                    conn,
                    format!("shortcut folder unavailable on {}", job.host),
                ))
                .await;
        }
        Err(e) => {
            // Shortcut trouble never fails a job that copied cleanly.
            warn!(host = %job.host, error = %e, "shortcut creation failed");
            let _ = events
                .send(ProgressEvent::message(
                    conn,
                    format!("shortcut failed for {label}: {e}"),
                ))
                .await;
        }
    }
}

fn job_label(job: &CopyJob) -> String {
    match &job.environment {
        Some(env) => format!("{}:{} {} {}", job.host, job.spec.name, job.build, env),
        None => format!("{}:{} {}", job.host, job.spec.name, job.build),
    }
}
