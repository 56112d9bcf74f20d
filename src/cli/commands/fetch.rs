//! `fetch` command: collect and enrich one hospitalization record

use crate::cli::commands::{exit_code_for, Services};
use crate::core::handbooks::{ensure_handbooks, DEFAULT_TABLES};
use crate::core::pipeline::{collect_record, EnrichmentContext};
use crate::domain::EventCriteria;
use clap::Args;

/// Arguments for the fetch command
#[derive(Args, Debug)]
pub struct FetchArgs {
    /// Inpatient card number
    pub card_number: String,

    /// Patient surname
    #[arg(long)]
    pub surname: Option<String>,

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

impl FetchArgs {
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        let services = Services::from_config_path(config_path)?;

        ensure_handbooks(
            &services.handbooks,
            &services.http,
            &services.registry,
            &services.handbooks_dir,
            DEFAULT_TABLES,
        )
        .await;

        let session = match services.session_manager.ensure_valid_session(&services.http).await {
            Ok(session) => session,
            Err(e) => {
                eprintln!("Error: {e}");
                return Ok(exit_code_for(&e));
            }
        };

        let criteria = EventCriteria {
            card_number: self.card_number.clone(),
            surname: self.surname.clone(),
            given_name: self.given_name.clone(),
            patronymic: self.patronymic.clone(),
            birth_date: self.birth_date.clone(),
        };

        let ctx = EnrichmentContext {
            http: &services.http,
            session: &session,
            clinical: &services.config.clinical,
            institution: &services.config.institution,
            handbooks: &services.handbooks,
            normalizer: &services.normalizer,
            registry: &services.registry,
            handbooks_dir: &services.handbooks_dir,
        };

        match collect_record(&criteria, &ctx).await {
            Ok(record) => {
                println!("{}", serde_json::to_string_pretty(&record)?);
                Ok(0)
            }
            Err(e) => {
                eprintln!("Error: {e}");
                Ok(exit_code_for(&e))
            }
        }
    }
}
