//! `init` command: write a starter configuration file

use clap::Args;
use std::path::Path;

/// Arguments for the init command
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Overwrite an existing configuration file
    #[arg(long)]
    pub force: bool,

    /// Output path
    #[arg(long, default_value = "hygeia.toml")]
    pub output: String,
}

const TEMPLATE: &str = r#"# Hygeia configuration
# Secrets support ${VAR} substitution from the environment.

environment = "development"

[application]
log_level = "info"

[clinical]
base_url = "https://backend.example.org/"
origin_url = "https://backend.example.org"
referer_url = "https://backend.example.org/"
login = "${HYGEIA_CLINICAL_LOGIN}"
password = "${HYGEIA_CLINICAL_PASSWORD}"
session_payload = "${HYGEIA_CLINICAL_SESSION_PAYLOAD}"
session_permutation = "${HYGEIA_CLINICAL_SESSION_PERMUTATION}"
timeout_seconds = 30
tls_verify = true

[clinical.retry]
max_retries = 3
initial_delay_ms = 500
max_delay_ms = 10000
backoff_multiplier = 2.0

[clinical.search]
pay_type_id = "3010101000000048"
okei_id = "100"
lpu_building_id = "3010101000000467"
ksg_year = "2025"
period_start_date = "01.01.2025"
day_hospital_prefixes = ["ДС"]

[address]
token_url = "https://address.example.org/aas/token"
api_base_url = "https://address.example.org/api/spas/v2.0"

[registry]
base_url = "https://registry.example.org"
timeout_seconds = 120

[storage]
credential_path = "state/credential.json"
handbooks_dir = "handbooks"

[institution]
name = "Полное наименование учреждения"
short_name = "Краткое наименование"
code = "000000"
token = "1.2.643.5.1.13"

[logging]
local_enabled = false
local_path = "logs"
local_rotation = "daily"
"#;

impl InitArgs {
    pub async fn execute(&self) -> anyhow::Result<i32> {
        let path = Path::new(&self.output);

        if path.exists() && !self.force {
            eprintln!(
                "{} already exists; use --force to overwrite",
                path.display()
            );
            return Ok(5);
        }

        tokio::fs::write(path, TEMPLATE).await?;
        println!("Wrote {}", path.display());
        println!("Fill in the credential environment variables before running fetch.");
        Ok(0)
    }
}
