//! Trigger provisioning for the Notification Bridge (§4.4).
//!
//! Each managed table gets a `notify_<table>_changes()` trigger function
//! and a `<table>_notify_trigger` AFTER trigger that calls `pg_notify` on
//! channel `<table>_changes` with a JSON payload. Ported from the
//! `ensure_table_trigger_exists` routine this system was distilled from,
//! which builds the DELETE payload (old_data only) separately from the
//! INSERT/UPDATE payload (data, plus old_data on UPDATE).

use diesel_async::{AsyncConnection, RunQueryDsl};

use crate::error::DbResult;
use crate::pool::DbPool;

/// Tables whose row changes are bridged to WebSocket subscribers by
/// default. Additional tables can be provisioned by calling
/// [`ensure_table_trigger`] directly (e.g. after a table-creation request
/// outside this crate's scope).
pub const MANAGED_TABLES: &[&str] = &["users", "buckets", "files", "origin_policy_entries"];

/// Idempotently (DROP IF EXISTS, then CREATE) installs the notify trigger
/// for a single table. A failure here does not abort provisioning of any
/// other table (§4.4 failure semantics) — callers run this per-table and
/// log individual failures rather than propagating them.
pub async fn ensure_table_trigger(pool: &DbPool, table_name: &str) -> DbResult<()> {
    let mut conn = pool.get().await?;

    let exists_query = diesel::sql_query(
        "SELECT EXISTS (SELECT FROM information_schema.tables \
         WHERE table_schema = 'public' AND table_name = $1) AS exists",
    )
    .bind::<diesel::sql_types::Text, _>(table_name);

    #[derive(diesel::QueryableByName)]
    struct Exists {
        #[diesel(sql_type = diesel::sql_types::Bool)]
        exists: bool,
    }

    let row: Exists = exists_query.get_result(&mut conn).await?;
    if !row.exists {
        warn!("table {} does not exist, skipping trigger provisioning", table_name);
        return Ok(());
    }

    let function_name = format!("notify_{table_name}_changes");
    let channel = format!("{table_name}_changes");
    let create_function = format!(
        r#"
        CREATE OR REPLACE FUNCTION {function_name}()
        RETURNS TRIGGER AS $$
        DECLARE
            payload JSON;
        BEGIN
            IF (TG_OP = 'DELETE') THEN
                payload = json_build_object(
                    'operation', TG_OP,
                    'table', TG_TABLE_NAME,
                    'old_data', row_to_json(OLD)
                );
            ELSE
                payload = json_build_object(
                    'operation', TG_OP,
                    'table', TG_TABLE_NAME,
                    'data', row_to_json(NEW),
                    'old_data', CASE WHEN TG_OP = 'UPDATE' THEN row_to_json(OLD) ELSE NULL END
                );
            END IF;
            PERFORM pg_notify('{channel}', payload::text);
            RETURN NEW;
        END;
        $$ LANGUAGE plpgsql;
        "#
    );
    conn.batch_execute(&create_function).await?;

    let trigger_name = format!("{table_name}_notify_trigger");
    let drop_trigger = format!(r#"DROP TRIGGER IF EXISTS {trigger_name} ON "{table_name}";"#);
    conn.batch_execute(&drop_trigger).await?;

    let create_trigger = format!(
        r#"
        CREATE TRIGGER {trigger_name}
        AFTER INSERT OR UPDATE OR DELETE ON "{table_name}"
        FOR EACH ROW
        EXECUTE FUNCTION {function_name}();
        "#
    );
    conn.batch_execute(&create_trigger).await?;

    debug!("provisioned change trigger for table {}", table_name);
    Ok(())
}

/// Provisions triggers for every table in [`MANAGED_TABLES`]. Each table is
/// handled independently so one failure doesn't prevent the rest from being
/// provisioned (§4.4).
pub async fn provision_all(pool: &DbPool) {
    for table in MANAGED_TABLES {
        if let Err(e) = ensure_table_trigger(pool, table).await {
            error!("failed to provision trigger for table {}: {:?}", table, e);
        }
    }
}
