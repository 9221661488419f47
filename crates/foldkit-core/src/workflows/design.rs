use super::align::superpose_onto_best_chain;
use crate::core::io::{read_structure, write_pdb};
use crate::core::models::structure::Structure;
use crate::core::selection::{SelectionError, filter_chain, list_chains};
use crate::engine::config::DesignConfig;
use crate::engine::error::EngineError;
use crate::engine::mask::MaskedSequence;
use crate::engine::progress::{Progress, ProgressReporter};
use crate::engine::services::{InpaintRequest, Predictor, PredictorError};
use futures_util::future::try_join_all;
use rayon::prelude::*;
use tracing::{info, instrument};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DesignResult {
    /// The initial prediction as returned by the structure predictor, followed
    /// by every design superposed onto it, in generation order.
    pub structures: Vec<String>,
}

impl DesignResult {
    pub fn initial(&self) -> Option<&str> {
        self.structures.first().map(String::as_str)
    }

    pub fn designs(&self) -> &[String] {
        self.structures.get(1..).unwrap_or_default()
    }
}

/// Predict → in-paint → design → predict → align.
///
/// `S` folds a sequence into PDB text, `B` in-paints a masked backbone and
/// `D` proposes sequences for a backbone.
pub struct DesignLoop<'a, S, B, D> {
    structure: S,
    backbones: B,
    designer: D,
    config: DesignConfig,
    reporter: ProgressReporter<'a>,
}

async fn predict_one<P: Predictor>(
    predictor: &P,
    input: P::Input,
) -> Result<P::Output, PredictorError> {
    predictor
        .predict(vec![input])
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| PredictorError::empty_response(predictor.endpoint()))
}

impl<'a, S, B, D> DesignLoop<'a, S, B, D>
where
    S: Predictor<Input = String, Output = String>,
    B: Predictor<Input = InpaintRequest, Output = String>,
    D: Predictor<Input = String, Output = String>,
{
    pub fn new(structure: S, backbones: B, designer: D, config: DesignConfig) -> Self {
        Self {
            structure,
            backbones,
            designer,
            config,
            reporter: ProgressReporter::new(),
        }
    }

    pub fn with_reporter(mut self, reporter: ProgressReporter<'a>) -> Self {
        self.reporter = reporter;
        self
    }

    /// Runs the whole loop for a bracket-masked sequence.
    ///
    /// # Errors
    ///
    /// Any predictor failure aborts the loop with that predictor's error;
    /// no partial result is returned.
    #[instrument(skip_all, name = "design_workflow")]
    pub async fn run(&self, masked: &str) -> Result<DesignResult, EngineError> {
        let masked = MaskedSequence::parse(masked)?;
        info!(
            length = masked.sequence.len(),
            start = masked.start_idx,
            end = masked.end_idx,
            backbones = self.config.num_backbones,
            "Starting design loop."
        );

        // === Phase 1: Initial prediction ===
        self.reporter.report(Progress::PhaseStart {
            name: "Initial prediction",
        });
        let initial_text = predict_one(&self.structure, masked.sequence.clone()).await?;
        let initial = read_structure(&initial_text)
            .map_err(|e| EngineError::format(self.structure.endpoint(), e))?;
        let template = self.template(&initial)?;
        self.reporter.report(Progress::PhaseFinish);

        // === Phase 2: Backbone generation ===
        self.reporter.report(Progress::PhaseStart {
            name: "Backbone generation",
        });
        let backbones = try_join_all((0..self.config.num_backbones).map(|_| {
            predict_one(
                &self.backbones,
                InpaintRequest {
                    pdb: template.clone(),
                    start_idx: masked.start_idx,
                    end_idx: masked.end_idx,
                },
            )
        }))
        .await?;
        self.reporter.report(Progress::PhaseFinish);

        // === Phase 3: Sequence design ===
        self.reporter.report(Progress::PhaseStart {
            name: "Sequence design",
        });
        let designed = try_join_all(backbones.into_iter().map(|backbone| async move {
            let sequences = self.designer.predict(vec![backbone]).await?;
            if sequences.is_empty() {
                return Err(PredictorError::empty_response(self.designer.endpoint()));
            }
            Ok::<_, PredictorError>(sequences)
        }))
        .await?;
        let sequences: Vec<String> = designed.into_iter().flatten().collect();
        info!(count = sequences.len(), "Designed sequences.");
        self.reporter.report(Progress::PhaseFinish);

        // === Phase 4: Design prediction ===
        self.reporter.report(Progress::PhaseStart {
            name: "Design prediction",
        });
        let predictions = try_join_all(
            sequences
                .into_iter()
                .map(|sequence| predict_one(&self.structure, sequence)),
        )
        .await?;
        self.reporter.report(Progress::PhaseFinish);

        // === Phase 5: Alignment onto the initial prediction ===
        self.reporter.report(Progress::PhaseStart { name: "Alignment" });
        self.reporter.report(Progress::TaskStart {
            total_steps: predictions.len() as u64,
        });
        let aligned = predictions
            .par_iter()
            .enumerate()
            .map(|(index, text)| {
                let mut design = read_structure(text)
                    .map_err(|e| EngineError::format(self.structure.endpoint(), e))?;
                design.name = format!("design_{}", index + 1);
                let report = superpose_onto_best_chain(&initial, &design, &self.config.alignment)?;
                self.reporter.report(Progress::TaskIncrement);
                write_pdb(&report.aligned).map_err(|e| EngineError::format(&design.name, e))
            })
            .collect::<Result<Vec<_>, _>>()?;
        self.reporter.report(Progress::TaskFinish);
        self.reporter.report(Progress::PhaseFinish);

        info!(designs = aligned.len(), "Design loop complete.");
        let mut structures = Vec::with_capacity(aligned.len() + 1);
        structures.push(initial_text);
        structures.extend(aligned);
        Ok(DesignResult { structures })
    }

    /// The chain handed to the backbone generator: hetero groups removed and
    /// residues renumbered from 1, so the mask indices address it directly.
    fn template(&self, initial: &Structure) -> Result<String, EngineError> {
        let chain = match self.config.design_chain {
            Some(chain) => chain,
            None => list_chains(initial)
                .first()
                .copied()
                .ok_or_else(|| EngineError::NoChains {
                    structure: initial.name.clone(),
                })?,
        };
        let reduced = filter_chain(initial, chain, true).map_err(
            |SelectionError::ChainNotFound { structure, chain }| EngineError::ChainNotFound {
                structure,
                chain,
            },
        )?;
        write_pdb(&reduced).map_err(|e| EngineError::format(&initial.name, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::io::pdb::PdbFile;
    use crate::core::io::traits::StructureFile;
    use crate::core::selection::{concat_atoms, residue_sequence};
    use crate::core::superposition::RigidTransform;
    use crate::core::utils::geometry::{calculate_rmsd, rotation_from_axis_angle};
    use crate::core::utils::identifiers::ResidueCoding;
    use crate::engine::config::{AlignmentConfig, DesignConfigBuilder};
    use crate::testing::{backbone_structure, moved, pdb_text};
    use nalgebra::Vector3;
    use std::sync::Mutex;

    /// Folds every sequence into a helix, posed differently per sequence.
    struct HelixFolder {
        fail: bool,
    }

    impl Predictor for HelixFolder {
        type Input = String;
        type Output = String;

        fn endpoint(&self) -> &str {
            "esmfold"
        }

        async fn predict(&self, inputs: Vec<String>) -> Result<Vec<String>, PredictorError> {
            if self.fail {
                return Err(PredictorError::new("esmfold", "endpoint unavailable"));
            }
            Ok(inputs
                .iter()
                .map(|seq| {
                    let angle = seq.bytes().map(u32::from).sum::<u32>() % 90 + 10;
                    let axis = Vector3::new(1.0, 2.0, 0.5);
                    let pose = RigidTransform {
                        rotation: rotation_from_axis_angle(&axis, angle as f64).into_inner(),
                        translation: Vector3::new(angle as f64, -3.0, 7.0),
                    };
                    pdb_text(&moved(&backbone_structure("esmfold", &[('A', seq)]), &pose))
                })
                .collect())
        }
    }

    /// Returns the template backbone unchanged and records each request.
    #[derive(Default)]
    struct EchoInpainter {
        requests: Mutex<Vec<InpaintRequest>>,
    }

    impl Predictor for EchoInpainter {
        type Input = InpaintRequest;
        type Output = String;

        fn endpoint(&self) -> &str {
            "rfdiffusion_inpaint"
        }

        async fn predict(
            &self,
            inputs: Vec<InpaintRequest>,
        ) -> Result<Vec<String>, PredictorError> {
            let outputs = inputs.iter().map(|r| r.pdb.clone()).collect();
            self.requests.lock().unwrap().extend(inputs);
            Ok(outputs)
        }
    }

    /// Proposes `per_backbone` sequences: the backbone's own sequence with
    /// its middle residue replaced.
    struct MidpointDesigner {
        per_backbone: usize,
    }

    impl Predictor for MidpointDesigner {
        type Input = String;
        type Output = String;

        fn endpoint(&self) -> &str {
            "proteinmpnn"
        }

        async fn predict(&self, inputs: Vec<String>) -> Result<Vec<String>, PredictorError> {
            let mut out = Vec::new();
            for pdb in inputs {
                let structure = PdbFile::read_from_str(&pdb)
                    .map_err(|e| PredictorError::new("proteinmpnn", e.to_string()))?;
                let seq = residue_sequence(
                    &structure,
                    &structure.polymer_residues(),
                    ResidueCoding::OneLetter,
                );
                for k in 0..self.per_backbone {
                    let mut chars: Vec<char> = seq.chars().collect();
                    let mid = chars.len() / 2;
                    chars[mid] = ['W', 'Y', 'H'][k % 3];
                    out.push(chars.into_iter().collect());
                }
            }
            Ok(out)
        }
    }

    fn design_loop<'a>(
        folder: HelixFolder,
        inpainter: EchoInpainter,
        per_backbone: usize,
        num_backbones: usize,
    ) -> DesignLoop<'a, HelixFolder, EchoInpainter, MidpointDesigner> {
        DesignLoop::new(
            folder,
            inpainter,
            MidpointDesigner { per_backbone },
            // Under first-letter coding the low-complexity test sequence has
            // equal-scoring shifted alignments; one-letter keeps it diagonal.
            DesignConfigBuilder::new()
                .num_backbones(num_backbones)
                .alignment(AlignmentConfig {
                    coding: ResidueCoding::OneLetter,
                    ..AlignmentConfig::default()
                })
                .build()
                .unwrap(),
        )
    }

    fn positions(text: &str) -> Vec<nalgebra::Point3<f64>> {
        let structure = PdbFile::read_from_str(text).unwrap();
        concat_atoms(&structure, None)
            .into_iter()
            .map(|a| a.position)
            .collect()
    }

    #[tokio::test]
    async fn two_backbones_yield_initial_plus_two_aligned_designs() {
        let designer = design_loop(HelixFolder { fail: false }, EchoInpainter::default(), 1, 2);

        let result = designer.run("CASRRSG[FTYPGF]FFEQYF").await.unwrap();

        assert_eq!(result.structures.len(), 3);
        let initial = HelixFolder { fail: false }
            .predict(vec!["CASRRSGFTYPGFFFEQYF".to_string()])
            .await
            .unwrap()
            .remove(0);
        assert_eq!(result.initial(), Some(initial.as_str()));

        let reference = positions(&initial);
        for design in result.designs() {
            let rmsd = calculate_rmsd(&positions(design), &reference).unwrap();
            assert!(rmsd < 1e-2, "rmsd = {}", rmsd);
        }
    }

    #[tokio::test]
    async fn inpainting_requests_carry_the_mask_and_a_renumbered_template() {
        let designer = design_loop(HelixFolder { fail: false }, EchoInpainter::default(), 1, 2);
        designer.run("CASRRSG[FTYPGF]FFEQYF").await.unwrap();

        let requests = designer.backbones.requests.lock().unwrap();
        assert_eq!(requests.len(), 2);
        for request in requests.iter() {
            assert_eq!((request.start_idx, request.end_idx), (7, 14));
            let template = PdbFile::read_from_str(&request.pdb).unwrap();
            let first = template.polymer_residues()[0];
            assert_eq!(template.residue(first).unwrap().number, 1);
            assert_eq!(template.residue_count(), 19);
        }
    }

    #[tokio::test]
    async fn every_designed_sequence_is_folded_and_aligned() {
        let designer = design_loop(HelixFolder { fail: false }, EchoInpainter::default(), 3, 2);
        let result = designer.run("CASRRSG[FTYPGF]FFEQYF").await.unwrap();
        assert_eq!(result.designs().len(), 6);
    }

    #[tokio::test]
    async fn progress_reports_each_phase() {
        let events = Mutex::new(Vec::new());
        let reporter = ProgressReporter::with_callback(|e| events.lock().unwrap().push(e));
        let designer = design_loop(HelixFolder { fail: false }, EchoInpainter::default(), 1, 2)
            .with_reporter(reporter);
        designer.run("CASRRSG[FTYPGF]FFEQYF").await.unwrap();
        drop(designer);

        let events = events.into_inner().unwrap();
        let phases: Vec<&str> = events
            .iter()
            .filter_map(|e| match e {
                Progress::PhaseStart { name } => Some(*name),
                _ => None,
            })
            .collect();
        assert_eq!(
            phases,
            vec![
                "Initial prediction",
                "Backbone generation",
                "Sequence design",
                "Design prediction",
                "Alignment"
            ]
        );
        let increments = events
            .iter()
            .filter(|e| **e == Progress::TaskIncrement)
            .count();
        assert_eq!(increments, 2);
    }

    #[tokio::test]
    async fn predictor_failure_aborts_the_loop() {
        let designer = design_loop(HelixFolder { fail: true }, EchoInpainter::default(), 1, 2);
        match designer.run("CASRRSG[FTYPGF]FFEQYF").await {
            Err(EngineError::Predictor(err)) => assert_eq!(err.endpoint, "esmfold"),
            other => panic!("unexpected {:?}", other),
        }
        assert!(designer.backbones.requests.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn malformed_mask_is_rejected_before_any_prediction() {
        let designer = design_loop(HelixFolder { fail: true }, EchoInpainter::default(), 1, 1);
        assert!(matches!(
            designer.run("CASRRSGFTYPGF").await,
            Err(EngineError::Mask(_))
        ));
    }
}
