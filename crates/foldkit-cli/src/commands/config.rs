use crate::cli::{ConfigArgs, ConfigCommands};
use crate::config::{build_config, default_config_path};
use crate::error::Result;
use crate::store::RunStore;

pub fn run(args: ConfigArgs) -> Result<()> {
    match args.command {
        ConfigCommands::Show { overrides } => {
            let config = build_config(&overrides)?;
            print!("{}", config.to_file_config().to_toml()?);
        }
        ConfigCommands::Path => {
            let path = default_config_path()?;
            let note = if path.exists() { "" } else { " (not created yet)" };
            println!("Configuration: {}{}", path.display(), note);
            println!("Run registry:  {}", RunStore::new()?.path().display());
        }
    }
    Ok(())
}
