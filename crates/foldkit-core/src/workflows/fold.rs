//! Submission, tracking and result collection for two-stage fold runs.

use super::align::select_and_align;
use crate::core::io::pdb::{PdbFile, apply_pdb_header};
use crate::core::io::read_structure;
use crate::core::io::traits::StructureFile;
use crate::engine::config::PipelineConfig;
use crate::engine::error::EngineError;
use crate::engine::pipeline::{
    FoldInput, PipelineRun, RunRegistry, RunState, ValidationError, VolumeLayout, WorkflowSpec,
    run_parameters, validate_run_name,
};
use crate::engine::services::{BlobVolume, ExternalError, JobId, JobService, RunStatus};
use tracing::{debug, info, instrument, warn};

/// Header title given to a superposed prediction.
pub const PREDICTION_TITLE: &str = "alphafold2 prediction";

/// The three payloads of a prediction-versus-entry comparison, each carrying
/// a naming header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comparison {
    /// The prediction as stored by the fold stage.
    pub prediction: String,
    /// The deposited entry reduced to the chain matching the prediction.
    pub reference: String,
    /// The prediction superposed onto `reference`.
    pub aligned: String,
}

/// Drives fold runs through an external scheduler and a shared volume.
///
/// Submission returns as soon as the scheduler accepts a run; progress is
/// observed with [`FoldCoordinator::refresh`], which may be called as often as
/// needed.
pub struct FoldCoordinator<J, V> {
    jobs: J,
    volume: V,
    config: PipelineConfig,
    layout: VolumeLayout,
    registry: RunRegistry,
}

impl<J: JobService, V: BlobVolume> FoldCoordinator<J, V> {
    pub fn new(jobs: J, volume: V, config: PipelineConfig, registry: RunRegistry) -> Self {
        let layout = VolumeLayout::new(&config.volume_root);
        Self {
            jobs,
            volume,
            config,
            layout,
            registry,
        }
    }

    pub fn registry(&self) -> &RunRegistry {
        &self.registry
    }

    pub fn layout(&self) -> &VolumeLayout {
        &self.layout
    }

    /// Registers the two-stage workflow with the scheduler.
    #[instrument(skip_all, name = "create_workflow")]
    pub async fn create_workflow(&self) -> Result<JobId, EngineError> {
        let spec = WorkflowSpec::from_config(&self.config);
        let job = self.jobs.submit(&spec).await?;
        info!(job = %job, name = %spec.name, "Registered fold workflow.");
        Ok(job)
    }

    /// Finds the one job carrying the configured workflow name.
    pub async fn resolve_job(&self) -> Result<JobId, EngineError> {
        let name = &self.config.job_name;
        let mut found = self.jobs.list_by_name(name).await?;
        match found.len() {
            0 => Err(ExternalError::JobNotFound { name: name.clone() }.into()),
            1 => Ok(found.remove(0)),
            count => Err(ExternalError::AmbiguousJob {
                name: name.clone(),
                count,
            }
            .into()),
        }
    }

    /// Validates the request and starts a run without waiting for it.
    ///
    /// # Errors
    ///
    /// * [`EngineError::PipelineValidation`] for a bad run name or sequence,
    ///   or when a run of the same name is still active after one refresh.
    ///   Nothing is submitted.
    /// * [`EngineError::PipelineExternal`] when the workflow cannot be
    ///   resolved or the scheduler rejects the run.
    #[instrument(skip_all, name = "submit_fold", fields(run = %run_name))]
    pub async fn submit(
        &mut self,
        run_name: &str,
        sequence: &str,
    ) -> Result<&PipelineRun, EngineError> {
        validate_run_name(run_name)?;
        let input = FoldInput::parse(sequence)?;
        if self
            .registry
            .get(run_name)
            .is_some_and(|r| !r.state.is_terminal())
        {
            // A persisted state may lag a run that has since finished.
            self.refresh(run_name).await?;
        }
        self.registry.check_available(run_name)?;

        let job_id = self.resolve_job().await?;
        let run_id = self
            .jobs
            .run(job_id, &run_parameters(run_name, &input))
            .await?;
        info!(
            job = %job_id,
            run_id = %run_id,
            mode = input.mode().as_str(),
            chains = input.chains().len(),
            "Submitted fold run."
        );

        let run = PipelineRun {
            name: run_name.to_string(),
            job_id,
            run_id,
            input,
            state: RunState::Submitted,
            failure: None,
        };
        Ok(self.registry.insert(run)?)
    }

    /// Polls the scheduler and the volume once and advances the run's state.
    ///
    /// A state that would move backwards (the scheduler lagging behind the
    /// volume) is ignored. Terminal runs are not polled.
    #[instrument(skip_all, name = "refresh_fold", fields(run = %run_name))]
    pub async fn refresh(&mut self, run_name: &str) -> Result<RunState, EngineError> {
        let (run_id, current) = {
            let run = self.tracked(run_name)?;
            (run.run_id, run.state)
        };
        if current.is_terminal() {
            return Ok(current);
        }

        let status = self.jobs.status(run_id).await?;
        let features_ready = match status {
            RunStatus::Running => self.fold_ready(run_name).await?,
            _ => false,
        };
        let observed = RunState::observe(&status, features_ready);

        let run = self
            .registry
            .get_mut(run_name)
            .ok_or_else(|| ValidationError::UnknownRun(run_name.to_string()))?;
        if !run.state.can_transition_to(observed) {
            debug!(from = %run.state, observed = %observed, "Ignoring stale scheduler status");
            return Ok(run.state);
        }
        if observed != run.state {
            info!(from = %run.state, to = %observed, "Run state changed.");
        }
        run.transition(observed)?;
        if let RunStatus::Terminated {
            message: Some(message),
            ..
        } = status
        {
            if observed == RunState::Failed {
                warn!(reason = %message, "Run failed.");
                run.failure = Some(message);
            }
        }
        Ok(run.state)
    }

    /// Asks the scheduler to stop a run. The state is left to the next
    /// [`refresh`](Self::refresh), which observes the cancellation.
    pub async fn cancel(&self, run_name: &str) -> Result<(), EngineError> {
        let run_id = self.tracked(run_name)?.run_id;
        self.jobs.cancel(run_id).await?;
        info!(run = %run_name, run_id = %run_id, "Requested cancellation.");
        Ok(())
    }

    /// True once the featurize stage's artifact is visible on the volume, the
    /// point from which the fold stage may start.
    pub async fn fold_ready(&self, run_name: &str) -> Result<bool, EngineError> {
        validate_run_name(run_name)?;
        Ok(self
            .volume
            .exists(&self.layout.features_artifact(run_name))
            .await?)
    }

    /// Reads the top-ranked prediction of a run.
    pub async fn fetch_prediction(&self, run_name: &str) -> Result<String, EngineError> {
        validate_run_name(run_name)?;
        self.read_text(&self.layout.prediction(run_name)).await
    }

    /// Superposes a run's prediction onto the deposited entry `pdb_code`.
    #[instrument(
        skip_all,
        name = "compare_with_entry",
        fields(run = %run_name, entry = %pdb_code)
    )]
    pub async fn compare_with_entry(
        &self,
        run_name: &str,
        pdb_code: &str,
    ) -> Result<Comparison, EngineError> {
        let prediction_text = self.fetch_prediction(run_name).await?;
        let entry_text = self.read_text(&self.layout.mmcif_entry(pdb_code)).await?;

        let mut prediction = PdbFile::read_from_str(&prediction_text)
            .map_err(|e| EngineError::format(run_name, e))?;
        prediction.name = run_name.to_string();
        let mut entry =
            read_structure(&entry_text).map_err(|e| EngineError::format(pdb_code, e))?;
        entry.name = pdb_code.to_ascii_uppercase();

        let (reference, aligned) = select_and_align(&entry, &prediction)?;
        Ok(Comparison {
            prediction: apply_pdb_header(&prediction_text, run_name),
            reference: apply_pdb_header(&reference, run_name),
            aligned: apply_pdb_header(&aligned, PREDICTION_TITLE),
        })
    }

    fn tracked(&self, run_name: &str) -> Result<&PipelineRun, EngineError> {
        Ok(self
            .registry
            .get(run_name)
            .ok_or_else(|| ValidationError::UnknownRun(run_name.to_string()))?)
    }

    async fn read_text(&self, path: &str) -> Result<String, EngineError> {
        let bytes = self.volume.read(path).await?;
        String::from_utf8(bytes).map_err(|_| {
            ExternalError::service("volume", format!("'{}' is not UTF-8 text", path)).into()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::config::{PipelineConfigBuilder, StageResources};
    use crate::engine::services::{RunId, RunResult};
    use crate::testing::{backbone_structure, moved, pdb_text, sequence, some_motion};
    use std::collections::{BTreeMap, HashMap};
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct SchedulerState {
        jobs: Vec<(JobId, String)>,
        specs: Vec<WorkflowSpec>,
        runs: Vec<BTreeMap<String, String>>,
        statuses: HashMap<RunId, RunStatus>,
        cancelled: Vec<RunId>,
    }

    #[derive(Clone, Default)]
    struct FakeScheduler(Arc<Mutex<SchedulerState>>);

    impl FakeScheduler {
        fn with_jobs(names: &[&str]) -> Self {
            let scheduler = Self::default();
            {
                let mut state = scheduler.0.lock().unwrap();
                for (i, name) in names.iter().enumerate() {
                    state.jobs.push((JobId(100 + i as u64), name.to_string()));
                }
            }
            scheduler
        }

        fn set_status(&self, run: RunId, status: RunStatus) {
            self.0.lock().unwrap().statuses.insert(run, status);
        }
    }

    impl JobService for FakeScheduler {
        async fn submit(&self, spec: &WorkflowSpec) -> Result<JobId, ExternalError> {
            let mut state = self.0.lock().unwrap();
            let id = JobId(100 + state.jobs.len() as u64);
            state.jobs.push((id, spec.name.clone()));
            state.specs.push(spec.clone());
            Ok(id)
        }

        async fn run(
            &self,
            _job: JobId,
            parameters: &BTreeMap<String, String>,
        ) -> Result<RunId, ExternalError> {
            let mut state = self.0.lock().unwrap();
            state.runs.push(parameters.clone());
            let id = RunId(state.runs.len() as u64);
            state.statuses.insert(id, RunStatus::Queued);
            Ok(id)
        }

        async fn status(&self, run: RunId) -> Result<RunStatus, ExternalError> {
            self.0
                .lock()
                .unwrap()
                .statuses
                .get(&run)
                .cloned()
                .ok_or_else(|| ExternalError::service("jobs", "unknown run"))
        }

        async fn list_by_name(&self, name: &str) -> Result<Vec<JobId>, ExternalError> {
            Ok(self
                .0
                .lock()
                .unwrap()
                .jobs
                .iter()
                .filter(|(_, n)| n == name)
                .map(|(id, _)| *id)
                .collect())
        }

        async fn cancel(&self, run: RunId) -> Result<(), ExternalError> {
            self.0.lock().unwrap().cancelled.push(run);
            Ok(())
        }
    }

    #[derive(Clone, Default)]
    struct MemoryVolume(Arc<Mutex<HashMap<String, Vec<u8>>>>);

    impl MemoryVolume {
        fn put(&self, path: &str, text: &str) {
            self.0
                .lock()
                .unwrap()
                .insert(path.to_string(), text.as_bytes().to_vec());
        }
    }

    impl BlobVolume for MemoryVolume {
        async fn read(&self, path: &str) -> Result<Vec<u8>, ExternalError> {
            self.0
                .lock()
                .unwrap()
                .get(path)
                .cloned()
                .ok_or_else(|| ExternalError::NotFound {
                    path: path.to_string(),
                })
        }

        async fn exists(&self, path: &str) -> Result<bool, ExternalError> {
            Ok(self.0.lock().unwrap().contains_key(path))
        }
    }

    fn config() -> PipelineConfig {
        PipelineConfigBuilder::new()
            .job_name("alphafold")
            .volume_root("/Volumes/protein_folding/alphafold")
            .notebook_dir("/Workspace/foldkit/notebooks")
            .featurize(StageResources::cpu("Standard_F8"))
            .fold(StageResources::accelerated("Standard_NC4as_T4_v3"))
            .build()
            .unwrap()
    }

    fn coordinator(
        scheduler: &FakeScheduler,
        volume: &MemoryVolume,
    ) -> FoldCoordinator<FakeScheduler, MemoryVolume> {
        FoldCoordinator::new(
            scheduler.clone(),
            volume.clone(),
            config(),
            RunRegistry::new(),
        )
    }

    #[tokio::test]
    async fn create_workflow_registers_two_stages() {
        let scheduler = FakeScheduler::default();
        let fold = coordinator(&scheduler, &MemoryVolume::default());

        let job = fold.create_workflow().await.unwrap();
        assert_eq!(fold.resolve_job().await.unwrap(), job);
        let state = scheduler.0.lock().unwrap();
        assert_eq!(state.specs[0].stages.len(), 2);
        assert_eq!(state.specs[0].name, "alphafold");
    }

    #[tokio::test]
    async fn submit_passes_name_and_sequence_and_returns_immediately() {
        let scheduler = FakeScheduler::with_jobs(&["alphafold"]);
        let mut fold = coordinator(&scheduler, &MemoryVolume::default());

        let run = fold.submit("run_1", "MKV:GGS").await.unwrap();
        assert_eq!(run.state, RunState::Submitted);
        assert_eq!(run.job_id, JobId(100));

        let state = scheduler.0.lock().unwrap();
        assert_eq!(state.runs.len(), 1);
        assert_eq!(state.runs[0]["run_name"], "run_1");
        assert_eq!(state.runs[0]["protein"], "MKV:GGS");
    }

    #[tokio::test]
    async fn duplicate_active_run_name_is_rejected_before_submission() {
        let scheduler = FakeScheduler::with_jobs(&["alphafold"]);
        let mut fold = coordinator(&scheduler, &MemoryVolume::default());

        fold.submit("run_1", "MKVLA").await.unwrap();
        let err = fold.submit("run_1", "MKVLA").await.unwrap_err();

        assert!(matches!(
            err,
            EngineError::PipelineValidation(ValidationError::RunCollision { .. })
        ));
        assert_eq!(scheduler.0.lock().unwrap().runs.len(), 1);
    }

    #[tokio::test]
    async fn name_of_a_run_finished_since_last_poll_is_reusable() {
        let scheduler = FakeScheduler::with_jobs(&["alphafold"]);
        let mut fold = coordinator(&scheduler, &MemoryVolume::default());

        let first = fold.submit("run_1", "MKV").await.unwrap().run_id;
        scheduler.set_status(
            first,
            RunStatus::Terminated {
                result: RunResult::Success,
                message: None,
            },
        );
        let second = fold.submit("run_1", "MKV").await.unwrap().run_id;

        assert_ne!(first, second);
        assert_eq!(scheduler.0.lock().unwrap().runs.len(), 2);
        assert_eq!(fold.registry().runs()[0].state, RunState::Done);
        assert_eq!(fold.registry().get("run_1").unwrap().state, RunState::Submitted);
    }

    #[tokio::test]
    async fn invalid_input_is_rejected_without_contacting_the_scheduler() {
        let scheduler = FakeScheduler::with_jobs(&["alphafold"]);
        let mut fold = coordinator(&scheduler, &MemoryVolume::default());

        assert!(matches!(
            fold.submit("bad name", "MKV").await,
            Err(EngineError::PipelineValidation(ValidationError::InvalidRunName { .. }))
        ));
        assert!(matches!(
            fold.submit("run_2", "MKV::A").await,
            Err(EngineError::PipelineValidation(ValidationError::EmptyChain { index: 1 }))
        ));
        assert!(scheduler.0.lock().unwrap().runs.is_empty());
    }

    #[tokio::test]
    async fn missing_workflow_is_an_external_error() {
        let mut fold = coordinator(&FakeScheduler::default(), &MemoryVolume::default());
        assert!(matches!(
            fold.submit("run_1", "MKV").await,
            Err(EngineError::PipelineExternal(ExternalError::JobNotFound { .. }))
        ));
    }

    #[tokio::test]
    async fn ambiguous_workflow_is_an_external_error() {
        let scheduler = FakeScheduler::with_jobs(&["alphafold", "other", "alphafold"]);
        let mut fold = coordinator(&scheduler, &MemoryVolume::default());
        assert!(matches!(
            fold.submit("run_1", "MKV").await,
            Err(EngineError::PipelineExternal(ExternalError::AmbiguousJob { count: 2, .. }))
        ));
        assert!(fold.registry().runs().is_empty());
    }

    #[tokio::test]
    async fn refresh_follows_the_stage_artifacts() {
        let scheduler = FakeScheduler::with_jobs(&["alphafold"]);
        let volume = MemoryVolume::default();
        let mut fold = coordinator(&scheduler, &volume);
        let run_id = fold.submit("run_1", "MKVLA").await.unwrap().run_id;

        assert_eq!(fold.refresh("run_1").await.unwrap(), RunState::Submitted);

        scheduler.set_status(run_id, RunStatus::Running);
        assert_eq!(fold.refresh("run_1").await.unwrap(), RunState::Featurizing);
        assert!(!fold.fold_ready("run_1").await.unwrap());

        volume.put(
            "/Volumes/protein_folding/alphafold/results/run_1/features.pkl",
            "features",
        );
        assert!(fold.fold_ready("run_1").await.unwrap());
        assert_eq!(fold.refresh("run_1").await.unwrap(), RunState::Folding);

        scheduler.set_status(
            run_id,
            RunStatus::Terminated {
                result: RunResult::Success,
                message: None,
            },
        );
        assert_eq!(fold.refresh("run_1").await.unwrap(), RunState::Done);
        assert_eq!(fold.registry().active_runs().count(), 0);
    }

    #[tokio::test]
    async fn stale_status_does_not_move_a_run_backwards() {
        let scheduler = FakeScheduler::with_jobs(&["alphafold"]);
        let volume = MemoryVolume::default();
        let mut fold = coordinator(&scheduler, &volume);
        let run_id = fold.submit("run_1", "MKVLA").await.unwrap().run_id;

        scheduler.set_status(run_id, RunStatus::Running);
        fold.refresh("run_1").await.unwrap();
        scheduler.set_status(run_id, RunStatus::Queued);
        assert_eq!(fold.refresh("run_1").await.unwrap(), RunState::Featurizing);
    }

    #[tokio::test]
    async fn cancellation_ends_in_failed_and_frees_the_name() {
        let scheduler = FakeScheduler::with_jobs(&["alphafold"]);
        let mut fold = coordinator(&scheduler, &MemoryVolume::default());
        let run_id = fold.submit("run_1", "MKVLA").await.unwrap().run_id;

        fold.cancel("run_1").await.unwrap();
        assert_eq!(scheduler.0.lock().unwrap().cancelled, vec![run_id]);
        assert_eq!(fold.registry().get("run_1").unwrap().state, RunState::Submitted);

        scheduler.set_status(
            run_id,
            RunStatus::Terminated {
                result: RunResult::Cancelled,
                message: Some("cancelled by user".to_string()),
            },
        );
        assert_eq!(fold.refresh("run_1").await.unwrap(), RunState::Failed);
        assert_eq!(
            fold.registry().get("run_1").unwrap().failure.as_deref(),
            Some("cancelled by user")
        );

        // Failed is absorbing; the scheduler is no longer consulted.
        scheduler.set_status(run_id, RunStatus::Running);
        assert_eq!(fold.refresh("run_1").await.unwrap(), RunState::Failed);
        assert!(fold.submit("run_1", "MKVLA").await.is_ok());
    }

    #[tokio::test]
    async fn unknown_run_is_a_validation_error() {
        let mut fold = coordinator(&FakeScheduler::default(), &MemoryVolume::default());
        assert!(matches!(
            fold.refresh("nope").await,
            Err(EngineError::PipelineValidation(ValidationError::UnknownRun(name))) if name == "nope"
        ));
    }

    #[tokio::test]
    async fn missing_prediction_is_reported_with_its_path() {
        let fold = coordinator(&FakeScheduler::default(), &MemoryVolume::default());
        match fold.fetch_prediction("run_1").await {
            Err(EngineError::PipelineExternal(ExternalError::NotFound { path })) => {
                assert!(path.ends_with("results/run_1/ranked_0.pdb"));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[tokio::test]
    async fn comparison_superposes_prediction_onto_entry() {
        let amino = "ACDEFHIKLMNPQRSTVWY";
        let a = sequence(61, 30, amino);
        let b = sequence(62, 40, amino);
        let entry = backbone_structure("4YKK", &[('A', &a), ('B', &b)]);
        let prediction = moved(&backbone_structure("run_1", &[('A', &b)]), &some_motion());

        let volume = MemoryVolume::default();
        volume.put(
            "/Volumes/protein_folding/alphafold/results/run_1/ranked_0.pdb",
            &pdb_text(&prediction),
        );
        volume.put(
            "/Volumes/protein_folding/alphafold/datasets/pdb_mmcif/mmcif_files/4ykk.cif",
            &pdb_text(&entry),
        );
        let fold = coordinator(&FakeScheduler::default(), &volume);

        let comparison = fold.compare_with_entry("run_1", "4YKK").await.unwrap();
        assert!(comparison.prediction.starts_with("HEADER    \"run_1\""));
        assert!(comparison.reference.starts_with("HEADER    \"run_1\""));
        assert!(comparison.aligned.starts_with("HEADER    \"alphafold2 prediction\""));

        let reference = PdbFile::read_from_str(&comparison.reference).unwrap();
        let aligned = PdbFile::read_from_str(&comparison.aligned).unwrap();
        assert_eq!(crate::core::selection::list_chains(&reference), vec!['B']);
        let deviation = crate::core::utils::geometry::calculate_rmsd(
            &crate::core::selection::concat_atoms(&reference, None)
                .iter()
                .map(|a| a.position)
                .collect::<Vec<_>>(),
            &crate::core::selection::concat_atoms(&aligned, None)
                .iter()
                .map(|a| a.position)
                .collect::<Vec<_>>(),
        )
        .unwrap();
        assert!(deviation < 1e-2);
    }
}
