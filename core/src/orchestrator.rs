//! Drives grading runs: submit, upload, poll until a terminal status, persist, notify.

use std::{
    collections::{HashMap, HashSet},
    path::{Path, PathBuf},
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, Mutex, MutexGuard, PoisonError,
    },
    time::Duration,
};

use autotest_webclient::GradingService;
use fsutil::FileSystem;
use tokio::{sync::Notify, task::JoinHandle};

use crate::{
    error::*,
    event::{Event, EventBus, Subscription},
    persistence::{SentinelFiles, SentinelStore},
    program::{DirKey, Program, RunResult},
    registry::ProgramRegistry,
    snapshot,
    status::ProgramStatus,
};

/// User-facing outcome of `run_tests`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum RunStatus {
    Running,
    NoAutotestsDefined,
    AutotestFileCorrupt,
    ErrorReachingServer,
    ErrorOpeningDirectory,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunInfo {
    pub success: bool,
    pub status: RunStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum CancelStatus {
    Canceled,
    NotUserInvoked,
    NoProgram,
}

/// How a poll loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    Finished(ProgramStatus),
    /// The program was removed, canceled, or taken over by a newer run.
    Abandoned,
}

impl From<&Error> for RunStatus {
    fn from(e: &Error) -> Self {
        use RunStatus::*;
        match e {
            Error::SpecMissing { .. } => NoAutotestsDefined,
            Error::SpecCorrupt { .. } => AutotestFileCorrupt,
            Error::Transport {
                stage: Stage::Upload,
                ..
            } => ErrorOpeningDirectory,
            Error::DirectorySnapshot(_) => ErrorOpeningDirectory,
            Error::ConcurrentRunRejected(_) => Running,
            _ => ErrorReachingServer,
        }
    }
}

impl RunInfo {
    fn running() -> Self {
        Self {
            success: true,
            status: RunStatus::Running,
        }
    }

    fn failed(e: &Error) -> Self {
        Self {
            success: false,
            status: e.into(),
        }
    }
}

struct PollTask {
    seq: u64,
    wake: Arc<Notify>,
    handle: JoinHandle<Result<PollOutcome>>,
}

struct Shared {
    service: Arc<dyn GradingService>,
    fs: Arc<dyn FileSystem>,
    store: SentinelStore,
    registry: ProgramRegistry,
    events: EventBus,
    /// Directories whose `run_tests` is between its guard check and registration.
    starting: Mutex<HashSet<DirKey>>,
    tasks: Mutex<HashMap<DirKey, PollTask>>,
    next_seq: AtomicU64,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Holds a directory in `Shared::starting` until dropped.
struct StartReservation<'a> {
    starting: &'a Mutex<HashSet<DirKey>>,
    dir: DirKey,
}

impl<'a> StartReservation<'a> {
    fn acquire(starting: &'a Mutex<HashSet<DirKey>>, dir: &Path) -> Option<Self> {
        lock(starting).insert(dir.to_owned()).then(|| Self {
            starting,
            dir: dir.to_owned(),
        })
    }
}

impl Drop for StartReservation<'_> {
    fn drop(&mut self) {
        lock(self.starting).remove(&self.dir);
    }
}

enum Step {
    Pending,
    Terminal(ProgramStatus),
    Gone,
}

#[derive(Clone)]
pub struct Orchestrator {
    shared: Arc<Shared>,
    poll_interval: Duration,
    max_poll_failures: Option<u32>,
}

impl Orchestrator {
    pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

    pub fn new(service: Arc<dyn GradingService>, fs: Arc<dyn FileSystem>) -> Self {
        let store = SentinelStore::new(fs.clone(), SentinelFiles::default());
        Self {
            shared: Arc::new(Shared {
                service,
                fs,
                store,
                registry: ProgramRegistry::new(),
                events: EventBus::default(),
                starting: Mutex::new(HashSet::new()),
                tasks: Mutex::new(HashMap::new()),
                next_seq: AtomicU64::new(1),
            }),
            poll_interval: Self::DEFAULT_POLL_INTERVAL,
            max_poll_failures: None,
        }
    }

    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Stop polling a directory after `max` consecutive failed status requests.
    /// `None` keeps polling forever.
    pub fn max_poll_failures(mut self, max: Option<u32>) -> Self {
        self.max_poll_failures = max;
        self
    }

    /// Must be called before the orchestrator is cloned or used.
    pub fn sentinel_files(mut self, files: SentinelFiles) -> Self {
        if let Some(shared) = Arc::get_mut(&mut self.shared) {
            shared.store = SentinelStore::new(shared.fs.clone(), files);
        } else {
            log::warn!("sentinel_files() ignored: orchestrator already shared");
        }
        self
    }

    pub fn subscribe(&self) -> Subscription {
        self.shared.events.subscribe()
    }

    pub fn store(&self) -> &SentinelStore {
        &self.shared.store
    }

    pub fn program(&self, dir: impl AsRef<Path>) -> Option<Program> {
        self.shared.registry.get(dir.as_ref())
    }

    pub fn programs(&self) -> Vec<DirKey> {
        self.shared.registry.keys()
    }

    pub fn is_being_tested(&self, dir: impl AsRef<Path>) -> bool {
        self.shared.registry.is_being_tested(dir.as_ref())
    }

    /// Start a grading run for `dir` and return as soon as polling has begun.
    ///
    /// Failures are reported through the returned status, never as an error.
    pub async fn run_tests(&self, dir: impl AsRef<Path>, is_user_invoked: bool) -> RunInfo {
        let dir = dir.as_ref();
        match self.start_run(dir, is_user_invoked).await {
            Ok(()) => RunInfo::running(),
            Err(e) => {
                log::info!("Run for {:?} not started: {}", dir, e);
                RunInfo::failed(&e)
            }
        }
    }

    async fn start_run(&self, dir: &Path, is_user_invoked: bool) -> Result<()> {
        let sh = &self.shared;
        if sh.registry.is_being_tested(dir) {
            return Err(Error::ConcurrentRunRejected(dir.to_owned()));
        }
        let _reservation = StartReservation::acquire(&sh.starting, dir)
            .ok_or_else(|| Error::ConcurrentRunRejected(dir.to_owned()))?;

        let spec = sh.store.load_spec(dir).await?;
        let task = sh
            .service
            .submit_specification(&spec.raw)
            .await
            .map_err(Error::transport(Stage::Submit))?;

        let mut program = match sh.registry.get(dir) {
            Some(mut p) if p.task_id == Some(task) => {
                log::debug!("Reusing program {:?} for {:?}", p.id, dir);
                p.status = ProgramStatus::AwaitingTests;
                p
            }
            prev => {
                let hint = prev.and_then(|p| p.id);
                let id = sh
                    .service
                    .register_program(hint, task, &Program::display_name(dir))
                    .await
                    .map_err(Error::transport(Stage::Register))?;
                log::debug!("Registered program {} for {:?}", id, dir);
                Program::new(dir, task, id)
            }
        };
        let seq = sh.next_seq.fetch_add(1, Ordering::Relaxed);
        program.total_tests = spec.non_silent_count();
        program.is_user_invoked = is_user_invoked;
        program.result = None;
        program.run_seq = seq;
        let program_id = program.id;
        sh.registry.insert(program);

        let snap = snapshot::build_snapshot(sh.fs.as_ref(), dir).await?;
        if let Some(id) = program_id {
            sh.service
                .upload_snapshot(id, &snap)
                .await
                .map_err(Error::transport(Stage::Upload))?;
        }

        // A cancel or remove may have landed while uploading.
        let started = sh.registry.update(dir, |p| {
            if p.run_seq != seq || p.status == ProgramStatus::Canceled {
                return false;
            }
            p.result = Some(RunResult::waiting());
            true
        });
        if started != Some(true) {
            log::debug!("Run for {:?} superseded before polling started", dir);
            return Ok(());
        }

        let wake = Arc::new(Notify::new());
        let handle = tokio::spawn(self.clone().poll_results(dir.to_owned(), seq, wake.clone()));
        lock(&sh.tasks).insert(dir.to_owned(), PollTask { seq, wake, handle });

        log::info!(
            "Started tests for {:?} ({} test(s), {} file(s))",
            dir,
            spec.non_silent_count(),
            snap.file_count()
        );
        Ok(())
    }

    /// The poll loop of one run. Ends on a terminal status, or silently once the
    /// program is removed, canceled or owned by a newer run.
    async fn poll_results(self, dir: DirKey, seq: u64, wake: Arc<Notify>) -> Result<PollOutcome> {
        let mut failures = 0u32;
        loop {
            let Some(program) = self.shared.registry.get(&dir) else {
                return Ok(PollOutcome::Abandoned);
            };
            if program.run_seq != seq || program.status == ProgramStatus::Canceled {
                return Ok(PollOutcome::Abandoned);
            }

            match self.poll_step(&program).await {
                Ok(Step::Pending) => failures = 0,
                Ok(Step::Terminal(status)) => return Ok(PollOutcome::Finished(status)),
                Ok(Step::Gone) => return Ok(PollOutcome::Abandoned),
                Err(e) => {
                    failures += 1;
                    log::warn!("Polling {:?} failed ({} in a row): {}", dir, failures, e);
                    if self.max_poll_failures.map_or(false, |max| failures >= max) {
                        self.give_up(&dir, seq, &e);
                        return Err(e);
                    }
                }
            }

            tokio::select! {
                _ = tokio::time::sleep(self.poll_interval) => {}
                _ = wake.notified() => {}
            }
        }
    }

    async fn poll_step(&self, program: &Program) -> Result<Step> {
        let sh = &self.shared;
        let (dir, seq) = (&program.dir, program.run_seq);
        let Some(id) = program.id else {
            return Ok(Step::Gone);
        };

        let report = sh
            .service
            .fetch_status(id)
            .await
            .map_err(Error::transport(Stage::Poll))?;
        let (status, result) = RunResult::decode(&report.parsed)?;

        // Re-check ownership: the fetch was a suspension point.
        let updated = sh.registry.update(dir, |p| {
            if p.run_seq != seq || p.status == ProgramStatus::Canceled {
                return None;
            }
            p.status = status;
            p.result = Some(result.clone());
            Some(p.clone())
        });
        let Some(Some(program)) = updated else {
            return Ok(Step::Gone);
        };

        if !status.is_terminal() {
            sh.events.publish(Event::Update(program));
            return Ok(Step::Pending);
        }

        if let Err(e) = sh.store.write_result(dir, &report.raw).await {
            log::warn!("Cannot save result for {:?}: {}", dir, e);
        }
        // A cancel may have landed while writing. The file stays: the server did finish.
        let finished = sh.registry.update(dir, |p| {
            if p.run_seq != seq || p.status == ProgramStatus::Canceled {
                return None;
            }
            p.result = None;
            Some(p.clone())
        });
        let Some(Some(program)) = finished else {
            return Ok(Step::Gone);
        };
        log::info!(
            "Tests for {:?} finished: {} ({}/{} passed)",
            dir,
            status,
            result.passed(),
            program.total_tests
        );
        sh.events.publish(Event::Finished { program, result });
        Ok(Step::Terminal(status))
    }

    fn give_up(&self, dir: &Path, seq: u64, e: &Error) {
        let cleared = self.shared.registry.update(dir, |p| {
            if p.run_seq == seq {
                p.result = None;
            }
        });
        if cleared.is_some() {
            self.shared.events.publish(Event::PollFailed {
                dir: dir.to_owned(),
                message: e.to_string(),
            });
        }
    }

    fn wake_poller(&self, dir: &Path) {
        if let Some(task) = lock(&self.shared.tasks).get(dir) {
            task.wake.notify_one();
        }
    }

    /// Wait for the poll loop of `dir` to end. `None` if no loop was started for it.
    pub async fn wait_for(&self, dir: impl AsRef<Path>) -> Option<Result<PollOutcome>> {
        let dir = dir.as_ref();
        let task = lock(&self.shared.tasks).remove(dir)?;
        log::trace!("Waiting for poll task #{} of {:?}", task.seq, dir);
        Some(match task.handle.await {
            Ok(res) => res,
            Err(e) => Err(Error::PollTask {
                dir: dir.to_owned(),
                message: e.to_string(),
            }),
        })
    }

    pub async fn cancel_tests(
        &self,
        dir: impl AsRef<Path>,
        prevent_non_user_invoked_cancel: bool,
    ) -> CancelStatus {
        match self
            .try_cancel_tests(dir.as_ref(), prevent_non_user_invoked_cancel)
            .await
        {
            Ok(()) => CancelStatus::Canceled,
            Err(Error::CancelRejectedNotUserInvoked(_)) => CancelStatus::NotUserInvoked,
            Err(_) => CancelStatus::NoProgram,
        }
    }

    /// Like `cancel_tests`, with the refusal reasons as errors.
    pub async fn try_cancel_tests(
        &self,
        dir: &Path,
        prevent_non_user_invoked_cancel: bool,
    ) -> Result<()> {
        let sh = &self.shared;
        let program = sh
            .registry
            .get(dir)
            .ok_or_else(|| Error::NoProgramToCancel(dir.to_owned()))?;
        if prevent_non_user_invoked_cancel && !program.is_user_invoked {
            return Err(Error::CancelRejectedNotUserInvoked(dir.to_owned()));
        }

        if let Some(id) = program.id {
            if let Err(e) = sh.service.cancel_program(id).await {
                log::warn!(
                    "{}",
                    Error::Transport {
                        stage: Stage::Cancel,
                        source: e
                    }
                );
            }
        }

        let canceled = sh
            .registry
            .update(dir, |p| {
                p.status = ProgramStatus::Canceled;
                p.result = None;
                p.clone()
            })
            .ok_or_else(|| Error::NoProgramToCancel(dir.to_owned()))?;
        self.wake_poller(dir);
        log::info!("Canceled tests for {:?}", dir);
        sh.events.publish(Event::Canceled(canceled));
        Ok(())
    }

    /// Forget the program of `dir`. The server is not contacted.
    /// A running poll loop is detached and exits at its next step.
    pub fn remove_program(&self, dir: impl AsRef<Path>) -> Option<Program> {
        let dir = dir.as_ref();
        let removed = self.shared.registry.remove(dir);
        if let Some(task) = lock(&self.shared.tasks).remove(dir) {
            task.wake.notify_one();
        }
        self.shared.events.publish(Event::Removed(dir.to_owned()));
        removed
    }

    /// Program reconstructed from the result file of `dir`, if any.
    pub async fn load_saved_result(&self, dir: impl AsRef<Path>) -> Result<Option<Program>> {
        self.shared.store.read_result(dir.as_ref()).await
    }

    pub fn result_path(&self, dir: impl AsRef<Path>) -> PathBuf {
        self.shared.store.result_path(dir.as_ref())
    }
}
