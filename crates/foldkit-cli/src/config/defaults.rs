pub struct DefaultsConfig {
    pub job_name: String,
    pub volume_root: String,
    pub notebook_dir: String,
    pub featurize_node_type: String,
    pub fold_node_type: String,
    pub db_preset: String,
    pub max_template_date: String,
    pub structure_endpoint: String,
    pub backbone_endpoint: String,
    pub designer_endpoint: String,
    pub complex_endpoint: String,
    pub num_backbones: usize,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            job_name: "alphafold".to_string(),
            volume_root: "/Volumes/protein_folding/alphafold".to_string(),
            notebook_dir: "/Workspace/foldkit/alphafold/workflow".to_string(),
            featurize_node_type: "Standard_F8".to_string(),
            fold_node_type: "Standard_NC4as_T4_v3".to_string(),
            db_preset: "reduced_dbs".to_string(),
            max_template_date: "2020-05-14".to_string(),
            structure_endpoint: "esmfold".to_string(),
            backbone_endpoint: "rfdiffusion_inpaint".to_string(),
            designer_endpoint: "proteinmpnn".to_string(),
            complex_endpoint: "boltz".to_string(),
            num_backbones: 1,
        }
    }
}
