use deadpool_postgres::{Pool, PoolError, Runtime};
use time::{OffsetDateTime, PrimitiveDateTime};
use tokio_postgres::{types::Type, NoTls, Row};
use uuid::Uuid;

use crate::{
    config::DatabaseConfig,
    entities::{ActiveUserRecord, RefreshEventRecord, UserId},
    error::{ChurnError, Result},
    timestamp,
};

use super::{ActivitySource, SourceSnapshot};

pub const ACTIVE_USERS: &str = "ActiveUsers";
pub const REFRESH_TOKENS: &str = "RefreshTokens";

const USER_ID: &str = "UserId";
const LAST_USED_DATE: &str = "LastUsedDate";

const TEXT_TYPES: [Type; 4] = [Type::TEXT, Type::VARCHAR, Type::BPCHAR, Type::NAME];

pub struct PostgresSource {
    config: DatabaseConfig,
}

impl PostgresSource {
    pub fn new(config: DatabaseConfig) -> PostgresSource {
        Self { config }
    }

    fn create_connection_pool(&self) -> Result<Pool> {
        self.config
            .pool_config()
            .create_pool(Some(Runtime::Tokio1), NoTls)
            .map_err(|err| ChurnError::Config(err.to_string()))
    }

    async fn fetch(&self, pool: &Pool) -> Result<SourceSnapshot> {
        let client = pool.get().await.map_err(describe_pool_error)?;

        tracing::debug!(schema = %self.config.schema, "connected");

        let refresh_rows = client
            .query(select_all(&self.config.schema, REFRESH_TOKENS).as_str(), &[])
            .await
            .map_err(|err| ChurnError::query(REFRESH_TOKENS, describe(&err)))?;

        let active_rows = client
            .query(select_all(&self.config.schema, ACTIVE_USERS).as_str(), &[])
            .await
            .map_err(|err| ChurnError::query(ACTIVE_USERS, describe(&err)))?;

        let refresh_events = refresh_rows
            .iter()
            .map(refresh_event_from_row)
            .collect::<Result<Vec<_>>>()?;

        let active_users = active_rows
            .iter()
            .map(|row| {
                let user_id = user_id_from_row(row, ACTIVE_USERS)?;
                Ok(ActiveUserRecord { user_id })
            })
            .collect::<Result<Vec<_>>>()?;

        tracing::info!(
            refresh_events = refresh_events.len(),
            active_users = active_users.len(),
            "loaded source tables"
        );

        Ok(SourceSnapshot {
            refresh_events,
            active_users,
        })
    }
}

impl ActivitySource for PostgresSource {
    async fn load(&self) -> Result<SourceSnapshot> {
        tracing::info!(
            host = %self.config.host,
            port = self.config.port,
            dbname = %self.config.dbname,
            "connecting to source database"
        );

        let pool = self.create_connection_pool()?;
        let snapshot = self.fetch(&pool).await;

        // the pooled client is already back in the pool here; closing drops it
        pool.close();

        snapshot
    }
}

pub fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

pub fn select_all(schema: &str, relation: &str) -> String {
    format!("SELECT * FROM {}.{}", quote_ident(schema), quote_ident(relation))
}

fn describe(err: &tokio_postgres::Error) -> String {
    match err.as_db_error() {
        Some(db) => format!("{} ({})", db.message(), db.code().code()),
        None => err.to_string(),
    }
}

fn describe_pool_error(err: PoolError) -> ChurnError {
    match err {
        PoolError::Backend(err) => ChurnError::Connection(describe(&err)),
        other => ChurnError::Connection(other.to_string()),
    }
}

fn column_index(row: &Row, name: &str, relation: &str) -> Result<usize> {
    row.columns()
        .iter()
        .position(|column| column.name() == name)
        .ok_or_else(|| ChurnError::query(relation, format!("column \"{name}\" not found")))
}

fn user_id_from_row(row: &Row, relation: &str) -> Result<UserId> {
    let idx = column_index(row, USER_ID, relation)?;
    let ty = row.columns()[idx].type_();
    let decode_err = |err: tokio_postgres::Error| ChurnError::query(relation, describe(&err));

    let id = if *ty == Type::INT2 {
        row.try_get::<_, Option<i16>>(idx)
            .map_err(decode_err)?
            .map(|id| UserId::Int(id.into()))
    } else if *ty == Type::INT4 {
        row.try_get::<_, Option<i32>>(idx)
            .map_err(decode_err)?
            .map(UserId::from)
    } else if *ty == Type::INT8 {
        row.try_get::<_, Option<i64>>(idx)
            .map_err(decode_err)?
            .map(UserId::Int)
    } else if TEXT_TYPES.contains(ty) {
        row.try_get::<_, Option<String>>(idx)
            .map_err(decode_err)?
            .map(|id| UserId::parse(&id))
    } else if *ty == Type::UUID {
        row.try_get::<_, Option<Uuid>>(idx)
            .map_err(decode_err)?
            .map(|id| UserId::Text(id.to_string()))
    } else {
        return Err(ChurnError::query(
            relation,
            format!("column \"{USER_ID}\" has unsupported type {ty}"),
        ));
    };

    id.ok_or_else(|| ChurnError::query(relation, format!("NULL in column \"{USER_ID}\"")))
}

/// Reads only `UserId` and `LastUsedDate`; token and audit columns stay in the row.
fn refresh_event_from_row(row: &Row) -> Result<RefreshEventRecord> {
    let user_id = user_id_from_row(row, REFRESH_TOKENS)?;
    let idx = column_index(row, LAST_USED_DATE, REFRESH_TOKENS)?;
    let ty = row.columns()[idx].type_();

    // out-of-range values (e.g. 'infinity') count as unparseable, like bad text
    let last_used_date = if TEXT_TYPES.contains(ty) {
        row.try_get::<_, Option<String>>(idx)
            .map_err(|err| ChurnError::query(REFRESH_TOKENS, describe(&err)))?
    } else if *ty == Type::TIMESTAMPTZ {
        row.try_get::<_, Option<OffsetDateTime>>(idx)
            .ok()
            .flatten()
            .and_then(|value| timestamp::format_canonical(value).ok())
    } else if *ty == Type::TIMESTAMP {
        row.try_get::<_, Option<PrimitiveDateTime>>(idx)
            .ok()
            .flatten()
            .and_then(|value| timestamp::format_canonical(value.assume_utc()).ok())
    } else {
        return Err(ChurnError::query(
            REFRESH_TOKENS,
            format!("column \"{LAST_USED_DATE}\" has unsupported type {ty}"),
        ));
    };

    Ok(RefreshEventRecord {
        user_id,
        last_used_date,
    })
}
