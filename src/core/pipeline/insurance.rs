//! Insurance-resolution step
//!
//! Resolves the insurer name from the demographics step into territory and
//! company codes via the insurers handbook. A missing handbook triggers an
//! on-demand fetch-and-cache before resolving; a missing insurer entry is a
//! soft miss that leaves the codes unset.

use crate::core::handbooks::resolver::resolve_entry;
use crate::core::handbooks::sync::ensure_table;
use crate::core::pipeline::{field_str, EnrichmentContext};
use crate::domain::HospitalizationRecord;
use serde_json::Value;

const INSURERS_TABLE: &str = "insurance_companies";

pub async fn apply(record: &mut HospitalizationRecord, ctx: &EnrichmentContext<'_>) {
    let Some(insurance) = record.insurance.as_mut() else {
        tracing::warn!("No insurance block to resolve");
        return;
    };
    let Some(company_name) = insurance.company_name.clone() else {
        tracing::warn!("Insurance block has no company name, codes stay unset");
        return;
    };

    // Self-healing: resolve against a table that is guaranteed loaded, or
    // degrade softly when even the on-demand fetch fails.
    if let Err(e) = ensure_table(
        ctx.handbooks,
        ctx.http,
        ctx.registry,
        ctx.handbooks_dir,
        INSURERS_TABLE,
    )
    .await
    {
        tracing::warn!(error = %e, "Insurers handbook unavailable, codes stay unset");
        return;
    }

    let Some(first) = resolve_entry(ctx.handbooks, INSURERS_TABLE, &company_name)
        .as_ref()
        .and_then(Value::as_array)
        .and_then(|entries| entries.first().cloned())
    else {
        tracing::warn!(company = %company_name, "Insurer not present in the handbook");
        return;
    };

    insurance.territory_code = field_str(&first, "TF_OKATO");
    insurance.company_code = field_str(&first, "smocod");

    tracing::info!(
        company = %company_name,
        territory_code = ?insurance.territory_code,
        company_code = ?insurance.company_code,
        "Insurer codes resolved"
    );
}
