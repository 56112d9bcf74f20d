//! `list` command: list a patient's hospitalizations with operations

use crate::adapters::clinical::search::list_hospitalizations_with_operations;
use crate::cli::commands::{exit_code_for, Services};
use crate::domain::PatientCriteria;
use clap::Args;

/// Arguments for the list command
#[derive(Args, Debug)]
pub struct ListArgs {
    /// Patient surname
    pub surname: String,

    /// Patient given name
    #[arg(long)]
    pub given_name: Option<String>,

    /// Patient patronymic
    #[arg(long)]
    pub patronymic: Option<String>,

    /// Patient birth date, DD.MM.YYYY
    #[arg(long)]
    pub birth_date: Option<String>,
}

impl ListArgs {
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        let services = Services::from_config_path(config_path)?;

        let session = match services.session_manager.ensure_valid_session(&services.http).await {
            Ok(session) => session,
            Err(e) => {
                eprintln!("Error: {e}");
                return Ok(exit_code_for(&e));
            }
        };

        let criteria = PatientCriteria {
            surname: self.surname.clone(),
            given_name: self.given_name.clone(),
            patronymic: self.patronymic.clone(),
            birth_date: self.birth_date.clone(),
        };

        match list_hospitalizations_with_operations(
            &criteria,
            &session,
            &services.http,
            &services.config.clinical,
        )
        .await
        {
            Ok(rows) => {
                println!("{}", serde_json::to_string_pretty(&rows)?);
                Ok(0)
            }
            Err(e) => {
                eprintln!("Error: {e}");
                Ok(exit_code_for(&e))
            }
        }
    }
}
