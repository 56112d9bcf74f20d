//! `validate-config` command

use crate::config::HygeiaConfig;
use clap::Args;

/// Arguments for the validate-config command
#[derive(Args, Debug)]
pub struct ValidateArgs {}

impl ValidateArgs {
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        match HygeiaConfig::from_file(config_path) {
            Ok(config) => {
                println!("Configuration is valid");
                println!("  environment:     {:?}", config.environment);
                println!("  clinical:        {}", config.clinical.base_url);
                println!("  address service: {}", config.address.api_base_url);
                println!("  registry:        {}", config.registry.base_url);
                println!("  handbooks dir:   {}", config.storage.handbooks_dir);
                Ok(0)
            }
            Err(e) => {
                eprintln!("Configuration is invalid: {e}");
                Ok(5)
            }
        }
    }
}
