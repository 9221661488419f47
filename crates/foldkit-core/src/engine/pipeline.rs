//! The two-stage featurize/fold contract.
//!
//! A fold run is split into a CPU-only featurize stage (database search) and
//! an accelerator-backed fold stage. The stages share nothing but the blob
//! volume: featurize writes `results/{run}/features.pkl`, and fold reads it.
//! The scheduler enforces stage order through `depends_on`; the coordinator
//! additionally gates on the artifact being visible.

use super::config::{DatabaseConfig, PipelineConfig, StageResources};
use super::services::{JobId, RunId, RunResult, RunStatus};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

pub const CHAIN_DELIMITER: char = ':';
pub const FEATURES_ARTIFACT: &str = "features.pkl";
pub const PREDICTION_ARTIFACT: &str = "ranked_0.pdb";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Run name must not be empty")]
    EmptyRunName,
    #[error("Run name '{name}' contains '{character}'; use letters, digits, '_', '-' or '.'")]
    InvalidRunName { name: String, character: char },
    #[error("Sequence must not be empty")]
    EmptySequence,
    #[error("Chain {index} of the multimer is empty")]
    EmptyChain { index: usize },
    #[error("Residue '{residue}' at position {position} is not a letter")]
    InvalidResidue { position: usize, residue: char },
    #[error("Run '{name}' is still {state}; wait for it to finish or cancel it")]
    RunCollision { name: String, state: RunState },
    #[error("No run named '{0}' is tracked")]
    UnknownRun(String),
    #[error("Run '{name}' cannot move from {from} to {to}")]
    InvalidTransition {
        name: String,
        from: RunState,
        to: RunState,
    },
}

/// Checks that a run name is usable as a directory name on the volume.
pub fn validate_run_name(name: &str) -> Result<(), ValidationError> {
    if name.is_empty() {
        return Err(ValidationError::EmptyRunName);
    }
    if let Some(character) = name
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.')))
    {
        return Err(ValidationError::InvalidRunName {
            name: name.to_string(),
            character,
        });
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FoldMode {
    Monomer,
    Multimer,
}

impl FoldMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            FoldMode::Monomer => "monomer",
            FoldMode::Multimer => "multimer",
        }
    }
}

/// The sequence of a fold run: one chain, or several joined by `:`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum FoldInput {
    Monomer(String),
    Multimer(Vec<String>),
}

impl FoldInput {
    pub fn parse(sequence: &str) -> Result<Self, ValidationError> {
        let sequence: String = sequence.chars().filter(|c| !c.is_whitespace()).collect();
        if sequence.is_empty() {
            return Err(ValidationError::EmptySequence);
        }

        let mut position = 0;
        let mut chains = Vec::new();
        for (index, chain) in sequence.split(CHAIN_DELIMITER).enumerate() {
            if chain.is_empty() {
                return Err(ValidationError::EmptyChain { index });
            }
            for residue in chain.chars() {
                position += 1;
                if !residue.is_ascii_alphabetic() {
                    return Err(ValidationError::InvalidResidue { position, residue });
                }
            }
            position += 1;
            chains.push(chain.to_ascii_uppercase());
        }

        Ok(match chains.len() {
            1 => FoldInput::Monomer(chains.remove(0)),
            _ => FoldInput::Multimer(chains),
        })
    }

    pub fn mode(&self) -> FoldMode {
        match self {
            FoldInput::Monomer(_) => FoldMode::Monomer,
            FoldInput::Multimer(_) => FoldMode::Multimer,
        }
    }

    pub fn chains(&self) -> Vec<&str> {
        match self {
            FoldInput::Monomer(seq) => vec![seq.as_str()],
            FoldInput::Multimer(chains) => chains.iter().map(String::as_str).collect(),
        }
    }

    /// The canonical delimiter-joined sequence passed to the job.
    pub fn sequence(&self) -> String {
        self.chains().join(&CHAIN_DELIMITER.to_string())
    }

    /// FASTA text written by the featurize stage.
    pub fn to_fasta(&self) -> String {
        match self {
            FoldInput::Monomer(seq) => format!(">protein\n{}", seq),
            FoldInput::Multimer(chains) => chains
                .iter()
                .enumerate()
                .map(|(i, chain)| format!(">chain_{}\n{}\n", i, chain))
                .collect(),
        }
    }
}

impl TryFrom<String> for FoldInput {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        FoldInput::parse(&value)
    }
}

impl From<FoldInput> for String {
    fn from(value: FoldInput) -> Self {
        value.sequence()
    }
}

/// Paths of the pipeline's artifacts on the shared volume.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VolumeLayout {
    root: String,
}

impl VolumeLayout {
    pub fn new(root: &str) -> Self {
        Self {
            root: root.trim_end_matches('/').to_string(),
        }
    }

    pub fn root(&self) -> &str {
        &self.root
    }

    pub fn datasets_dir(&self) -> String {
        format!("{}/datasets", self.root)
    }

    pub fn results_dir(&self, run_name: &str) -> String {
        format!("{}/results/{}", self.root, run_name)
    }

    pub fn features_artifact(&self, run_name: &str) -> String {
        format!("{}/{}", self.results_dir(run_name), FEATURES_ARTIFACT)
    }

    pub fn prediction(&self, run_name: &str) -> String {
        format!("{}/{}", self.results_dir(run_name), PREDICTION_ARTIFACT)
    }

    pub fn mmcif_entry(&self, pdb_code: &str) -> String {
        format!(
            "{}/pdb_mmcif/mmcif_files/{}.cif",
            self.datasets_dir(),
            pdb_code.to_ascii_lowercase()
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StageKind {
    Featurize,
    Fold,
}

impl StageKind {
    pub fn key(&self) -> &'static str {
        match self {
            StageKind::Featurize => "featurize",
            StageKind::Fold => "fold",
        }
    }

    fn notebook(&self) -> &'static str {
        match self {
            StageKind::Featurize => "nb_run_af_featurize",
            StageKind::Fold => "nb_run_af_fold",
        }
    }
}

/// Command-line flags for one stage of a run, excluding `--fasta_paths`,
/// which the stage derives from the run name at execution time.
pub fn stage_flags(
    stage: StageKind,
    mode: FoldMode,
    layout: &VolumeLayout,
    databases: &DatabaseConfig,
) -> Vec<String> {
    let base = layout.datasets_dir();
    let mut flags = vec![
        format!("--data_dir={}", base),
        format!("--output_dir={}/results/", layout.root()),
        format!("--db_preset={}", databases.db_preset),
        format!("--model_preset={}", mode.as_str()),
        format!("--uniref90_database_path={}/uniref90/uniref90.fasta", base),
        format!("--mgnify_database_path={}/mgnify/mgy_clusters_2022_05.fa", base),
        format!(
            "--small_bfd_database_path={}/small_bfd/bfd-first_non_consensus_sequences.fasta",
            base
        ),
        format!("--template_mmcif_dir={}/pdb_mmcif/mmcif_files/", base),
        format!("--max_template_date={}", databases.max_template_date),
        format!("--obsolete_pdbs_path={}/pdb_mmcif/obsolete.dat", base),
    ];

    match stage {
        StageKind::Featurize => flags.push("--only_featurize".to_string()),
        StageKind::Fold => flags.extend([
            "--use_gpu_relax".to_string(),
            "--noonly_featurize".to_string(),
            "--fold_from_precalculated_features".to_string(),
        ]),
    }

    match mode {
        FoldMode::Multimer => flags.extend([
            format!("--uniprot_database_path={}/uniprot/uniprot.fasta", base),
            format!("--pdb_seqres_database_path={}/pdb_seqres/pdb_seqres.txt", base),
        ]),
        FoldMode::Monomer => flags.push(format!("--pdb70_database_path={}/pdb70/pdb70", base)),
    }

    flags
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageSpec {
    pub key: String,
    pub notebook_path: String,
    pub depends_on: Vec<String>,
    pub resources: StageResources,
    /// Flags keyed by `flags_monomer` / `flags_multimer`; the stage picks one by mode.
    pub base_parameters: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobParameter {
    pub name: String,
    pub default: String,
}

/// The workflow template registered once with the scheduler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowSpec {
    pub name: String,
    pub stages: Vec<StageSpec>,
    pub parameters: Vec<JobParameter>,
    pub notification_email: Option<String>,
}

impl WorkflowSpec {
    pub fn from_config(config: &PipelineConfig) -> Self {
        let layout = VolumeLayout::new(&config.volume_root);
        let stage = |kind: StageKind, resources: &StageResources, depends_on: Vec<String>| {
            let base_parameters = [FoldMode::Monomer, FoldMode::Multimer]
                .into_iter()
                .map(|mode| {
                    (
                        format!("flags_{}", mode.as_str()),
                        stage_flags(kind, mode, &layout, &config.databases).join(" "),
                    )
                })
                .collect();
            StageSpec {
                key: kind.key().to_string(),
                notebook_path: format!("{}/{}", config.notebook_dir, kind.notebook()),
                depends_on,
                resources: resources.clone(),
                base_parameters,
            }
        };

        Self {
            name: config.job_name.clone(),
            stages: vec![
                stage(StageKind::Featurize, &config.featurize, Vec::new()),
                stage(
                    StageKind::Fold,
                    &config.fold,
                    vec![StageKind::Featurize.key().to_string()],
                ),
            ],
            parameters: vec![
                JobParameter {
                    name: "run_name".to_string(),
                    default: String::new(),
                },
                JobParameter {
                    name: "protein".to_string(),
                    default: String::new(),
                },
            ],
            notification_email: config.notification_email.clone(),
        }
    }

    pub fn stage(&self, kind: StageKind) -> Option<&StageSpec> {
        self.stages.iter().find(|s| s.key == kind.key())
    }
}

/// Parameters of one run of the workflow.
pub fn run_parameters(run_name: &str, input: &FoldInput) -> BTreeMap<String, String> {
    BTreeMap::from([
        ("run_name".to_string(), run_name.to_string()),
        ("protein".to_string(), input.sequence()),
    ])
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RunState {
    Submitted,
    Featurizing,
    Folding,
    Done,
    Failed,
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RunState::Submitted => "submitted",
            RunState::Featurizing => "featurizing",
            RunState::Folding => "folding",
            RunState::Done => "done",
            RunState::Failed => "failed",
        };
        write!(f, "{}", name)
    }
}

impl RunState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, RunState::Done | RunState::Failed)
    }

    fn rank(&self) -> u8 {
        match self {
            RunState::Submitted => 0,
            RunState::Featurizing => 1,
            RunState::Folding => 2,
            RunState::Done | RunState::Failed => 3,
        }
    }

    /// Active states only move forward; terminal states never move.
    ///
    /// Forward moves may skip states. A poll that missed the featurize stage
    /// records `Submitted -> Folding` or `Submitted -> Done` directly.
    pub fn can_transition_to(&self, next: RunState) -> bool {
        if *self == next {
            return true;
        }
        if self.is_terminal() {
            return false;
        }
        next == RunState::Failed || next.rank() > self.rank()
    }

    /// Maps a scheduler status to a coordinator state. A running run is
    /// folding once its featurize artifact is visible.
    pub fn observe(status: &RunStatus, features_ready: bool) -> RunState {
        match status {
            RunStatus::Queued => RunState::Submitted,
            RunStatus::Running if features_ready => RunState::Folding,
            RunStatus::Running => RunState::Featurizing,
            RunStatus::Terminated {
                result: RunResult::Success,
                ..
            } => RunState::Done,
            RunStatus::Terminated { .. } => RunState::Failed,
        }
    }
}

/// A submitted run as tracked by the coordinator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineRun {
    pub name: String,
    pub job_id: JobId,
    pub run_id: RunId,
    pub input: FoldInput,
    pub state: RunState,
    pub failure: Option<String>,
}

impl PipelineRun {
    pub fn transition(&mut self, next: RunState) -> Result<(), ValidationError> {
        if !self.state.can_transition_to(next) {
            return Err(ValidationError::InvalidTransition {
                name: self.name.clone(),
                from: self.state,
                to: next,
            });
        }
        self.state = next;
        Ok(())
    }
}

/// Every run the coordinator has submitted, persisted between invocations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunRegistry {
    runs: Vec<PipelineRun>,
}

impl RunRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn runs(&self) -> &[PipelineRun] {
        &self.runs
    }

    /// The most recent run with this name.
    pub fn get(&self, name: &str) -> Option<&PipelineRun> {
        self.runs.iter().rev().find(|r| r.name == name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut PipelineRun> {
        self.runs.iter_mut().rev().find(|r| r.name == name)
    }

    /// Fails if a non-terminal run already owns this name's output directory.
    pub fn check_available(&self, name: &str) -> Result<(), ValidationError> {
        match self.get(name) {
            Some(run) if !run.state.is_terminal() => Err(ValidationError::RunCollision {
                name: name.to_string(),
                state: run.state,
            }),
            _ => Ok(()),
        }
    }

    pub fn insert(&mut self, run: PipelineRun) -> Result<&PipelineRun, ValidationError> {
        self.check_available(&run.name)?;
        self.runs.push(run);
        let index = self.runs.len() - 1;
        Ok(&self.runs[index])
    }

    pub fn active_runs(&self) -> impl Iterator<Item = &PipelineRun> {
        self.runs.iter().filter(|r| !r.state.is_terminal())
    }

    pub fn state_counts(&self) -> BTreeMap<RunState, usize> {
        let mut counts = BTreeMap::new();
        for run in &self.runs {
            *counts.entry(run.state).or_insert(0) += 1;
        }
        counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(name: &str, state: RunState) -> PipelineRun {
        PipelineRun {
            name: name.to_string(),
            job_id: JobId(1),
            run_id: RunId(10),
            input: FoldInput::parse("MKV").unwrap(),
            state,
            failure: None,
        }
    }

    fn config() -> PipelineConfig {
        crate::engine::config::PipelineConfigBuilder::new()
            .job_name("alphafold")
            .volume_root("/Volumes/protein_folding/alphafold")
            .notebook_dir("/Workspace/foldkit/notebooks")
            .featurize(StageResources::cpu("Standard_F8"))
            .fold(StageResources::accelerated("Standard_NC4as_T4_v3"))
            .notification_email(Some("me@org.com".to_string()))
            .build()
            .unwrap()
    }

    #[test]
    fn run_names_are_restricted_to_path_safe_characters() {
        assert!(validate_run_name("run_1").is_ok());
        assert!(validate_run_name("Design-2.v3").is_ok());
        assert_eq!(validate_run_name(""), Err(ValidationError::EmptyRunName));
        assert_eq!(
            validate_run_name("../etc"),
            Err(ValidationError::InvalidRunName {
                name: "../etc".to_string(),
                character: '/'
            })
        );
        assert!(validate_run_name("my run").is_err());
    }

    #[test]
    fn plain_sequence_is_a_monomer() {
        let input = FoldInput::parse(" mkv lat\n").unwrap();
        assert_eq!(input, FoldInput::Monomer("MKVLAT".to_string()));
        assert_eq!(input.mode(), FoldMode::Monomer);
        assert_eq!(input.to_fasta(), ">protein\nMKVLAT");
    }

    #[test]
    fn colon_joined_sequence_is_a_multimer() {
        let input = FoldInput::parse("MKV:GGS:AAA").unwrap();
        assert_eq!(input.mode(), FoldMode::Multimer);
        assert_eq!(input.chains(), vec!["MKV", "GGS", "AAA"]);
        assert_eq!(
            input.to_fasta(),
            ">chain_0\nMKV\n>chain_1\nGGS\n>chain_2\nAAA\n"
        );
        assert_eq!(input.sequence(), "MKV:GGS:AAA");
    }

    #[test]
    fn malformed_sequences_are_rejected() {
        assert_eq!(FoldInput::parse("  "), Err(ValidationError::EmptySequence));
        assert_eq!(
            FoldInput::parse("MKV::AAA"),
            Err(ValidationError::EmptyChain { index: 1 })
        );
        assert_eq!(
            FoldInput::parse("MKV:"),
            Err(ValidationError::EmptyChain { index: 1 })
        );
        assert_eq!(
            FoldInput::parse("MK1V"),
            Err(ValidationError::InvalidResidue {
                position: 3,
                residue: '1'
            })
        );
    }

    #[test]
    fn volume_layout_keys_artifacts_by_run_name() {
        let layout = VolumeLayout::new("/Volumes/protein_folding/alphafold/");
        assert_eq!(
            layout.features_artifact("run_1"),
            "/Volumes/protein_folding/alphafold/results/run_1/features.pkl"
        );
        assert_eq!(
            layout.prediction("run_1"),
            "/Volumes/protein_folding/alphafold/results/run_1/ranked_0.pdb"
        );
        assert_eq!(
            layout.mmcif_entry("4YKK"),
            "/Volumes/protein_folding/alphafold/datasets/pdb_mmcif/mmcif_files/4ykk.cif"
        );
    }

    #[test]
    fn stage_flags_split_featurize_and_fold() {
        let layout = VolumeLayout::new("/v");
        let db = DatabaseConfig::default();
        let featurize = stage_flags(StageKind::Featurize, FoldMode::Monomer, &layout, &db);
        let fold = stage_flags(StageKind::Fold, FoldMode::Monomer, &layout, &db);

        assert!(featurize.contains(&"--only_featurize".to_string()));
        assert!(!featurize.iter().any(|f| f == "--use_gpu_relax"));
        assert!(fold.contains(&"--noonly_featurize".to_string()));
        assert!(fold.contains(&"--fold_from_precalculated_features".to_string()));
        assert!(fold.contains(&"--db_preset=reduced_dbs".to_string()));
        assert!(fold.contains(&"--max_template_date=2020-05-14".to_string()));
    }

    #[test]
    fn database_flags_depend_on_mode() {
        let layout = VolumeLayout::new("/v");
        let db = DatabaseConfig::default();
        let monomer = stage_flags(StageKind::Fold, FoldMode::Monomer, &layout, &db);
        let multimer = stage_flags(StageKind::Fold, FoldMode::Multimer, &layout, &db);

        assert!(monomer.contains(&"--pdb70_database_path=/v/datasets/pdb70/pdb70".to_string()));
        assert!(!monomer.iter().any(|f| f.starts_with("--uniprot_database_path")));
        assert!(multimer.contains(&"--model_preset=multimer".to_string()));
        assert!(multimer.iter().any(|f| f.starts_with("--uniprot_database_path")));
        assert!(multimer.iter().any(|f| f.starts_with("--pdb_seqres_database_path")));
        assert!(!multimer.iter().any(|f| f.starts_with("--pdb70_database_path")));
    }

    #[test]
    fn workflow_spec_orders_fold_after_featurize() {
        let spec = WorkflowSpec::from_config(&config());
        let featurize = spec.stage(StageKind::Featurize).unwrap();
        let fold = spec.stage(StageKind::Fold).unwrap();

        assert!(featurize.depends_on.is_empty());
        assert!(!featurize.resources.accelerator);
        assert_eq!(fold.depends_on, vec!["featurize"]);
        assert!(fold.resources.accelerator);
        assert_eq!(
            fold.notebook_path,
            "/Workspace/foldkit/notebooks/nb_run_af_fold"
        );
        assert!(fold.base_parameters["flags_multimer"].contains("--uniprot_database_path"));
        assert_eq!(spec.notification_email.as_deref(), Some("me@org.com"));
        assert_eq!(spec.parameters.len(), 2);
    }

    #[test]
    fn run_parameters_carry_name_and_sequence() {
        let params = run_parameters("run_1", &FoldInput::parse("MKV:AAA").unwrap());
        assert_eq!(params["run_name"], "run_1");
        assert_eq!(params["protein"], "MKV:AAA");
    }

    #[test]
    fn transitions_only_move_forward() {
        use RunState::*;
        assert!(Submitted.can_transition_to(Featurizing));
        assert!(Submitted.can_transition_to(Folding));
        assert!(Featurizing.can_transition_to(Folding));
        assert!(Folding.can_transition_to(Done));
        assert!(Submitted.can_transition_to(Done));
        assert!(Featurizing.can_transition_to(Done));
        assert!(!Folding.can_transition_to(Featurizing));
        assert!(!Featurizing.can_transition_to(Submitted));
    }

    #[test]
    fn failed_is_reachable_from_active_states_and_absorbing() {
        use RunState::*;
        for state in [Submitted, Featurizing, Folding] {
            assert!(state.can_transition_to(Failed));
        }
        for next in [Submitted, Featurizing, Folding, Done] {
            assert!(!Failed.can_transition_to(next));
            if next != Done {
                assert!(!Done.can_transition_to(next));
            }
        }
        assert!(!Done.can_transition_to(Failed));
    }

    #[test]
    fn observe_maps_scheduler_status() {
        assert_eq!(RunState::observe(&RunStatus::Queued, false), RunState::Submitted);
        assert_eq!(RunState::observe(&RunStatus::Running, false), RunState::Featurizing);
        assert_eq!(RunState::observe(&RunStatus::Running, true), RunState::Folding);
        let done = RunStatus::Terminated {
            result: RunResult::Success,
            message: None,
        };
        assert_eq!(RunState::observe(&done, true), RunState::Done);
        let cancelled = RunStatus::Terminated {
            result: RunResult::Cancelled,
            message: None,
        };
        assert_eq!(RunState::observe(&cancelled, false), RunState::Failed);
    }

    #[test]
    fn invalid_transition_is_reported() {
        let mut record = run("run_1", RunState::Done);
        assert_eq!(
            record.transition(RunState::Folding),
            Err(ValidationError::InvalidTransition {
                name: "run_1".to_string(),
                from: RunState::Done,
                to: RunState::Folding
            })
        );
    }

    #[test]
    fn registry_rejects_name_collision_with_active_run() {
        let mut registry = RunRegistry::new();
        registry.insert(run("run_1", RunState::Submitted)).unwrap();
        assert_eq!(
            registry.insert(run("run_1", RunState::Submitted)).unwrap_err(),
            ValidationError::RunCollision {
                name: "run_1".to_string(),
                state: RunState::Submitted
            }
        );
    }

    #[test]
    fn registry_allows_reuse_after_terminal_state() {
        let mut registry = RunRegistry::new();
        registry.insert(run("run_1", RunState::Failed)).unwrap();
        registry.insert(run("run_1", RunState::Submitted)).unwrap();
        assert_eq!(registry.runs().len(), 2);
        assert_eq!(registry.get("run_1").unwrap().state, RunState::Submitted);
    }

    #[test]
    fn registry_counts_states_and_lists_active_runs() {
        let mut registry = RunRegistry::new();
        registry.insert(run("a", RunState::Done)).unwrap();
        registry.insert(run("b", RunState::Folding)).unwrap();
        registry.insert(run("c", RunState::Folding)).unwrap();
        registry.insert(run("d", RunState::Failed)).unwrap();

        let counts = registry.state_counts();
        assert_eq!(counts[&RunState::Folding], 2);
        assert_eq!(counts[&RunState::Done], 1);
        assert_eq!(counts.get(&RunState::Submitted), None);
        let active: Vec<&str> = registry.active_runs().map(|r| r.name.as_str()).collect();
        assert_eq!(active, vec!["b", "c"]);
    }

    #[test]
    fn registry_serializes_input_as_sequence() {
        let mut registry = RunRegistry::new();
        registry.insert(run("a", RunState::Submitted)).unwrap();
        let copy = registry.clone();
        assert_eq!(copy, registry);
        assert_eq!(String::from(copy.runs()[0].input.clone()), "MKV");
    }
}
