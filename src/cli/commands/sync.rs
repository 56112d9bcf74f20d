//! `sync-handbooks` command: force-download registry handbooks

use crate::adapters::registry::{descriptor_for, CATALOG};
use crate::cli::commands::Services;
use crate::core::handbooks::files::save_handbook;
use clap::Args;
use futures::future::join_all;

/// Arguments for the sync-handbooks command
#[derive(Args, Debug)]
pub struct SyncHandbooksArgs {
    /// Registry codes to download (defaults to every known code)
    #[arg(long, value_delimiter = ',')]
    pub codes: Vec<String>,
}

impl SyncHandbooksArgs {
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        let services = Services::from_config_path(config_path)?;

        let codes: Vec<String> = if self.codes.is_empty() {
            CATALOG.iter().map(|d| d.code.to_string()).collect()
        } else {
            self.codes.clone()
        };

        let downloads = codes.iter().map(|code| {
            let services = &services;
            async move {
                let Some(descriptor) = descriptor_for(code) else {
                    eprintln!("{code}: unknown registry code");
                    return None;
                };
                let table = match services.registry.fetch_table(&services.http, code).await {
                    Ok(table) => table,
                    Err(e) => {
                        eprintln!("{code}: download failed: {e}");
                        return None;
                    }
                };
                if let Err(e) =
                    save_handbook(&services.handbooks_dir, descriptor.storage_key, &table).await
                {
                    eprintln!("{code}: persist failed: {e}");
                    return None;
                }
                println!("{code}: saved as {}.json", descriptor.storage_key);
                Some(())
            }
        });

        let succeeded = join_all(downloads).await.into_iter().flatten().count();
        println!("Synchronized {succeeded} of {} handbooks", codes.len());

        Ok(if succeeded == codes.len() { 0 } else { 3 })
    }
}
