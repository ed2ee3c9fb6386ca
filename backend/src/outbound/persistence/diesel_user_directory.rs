//! PostgreSQL user directory over the `auth_users` table.

use std::collections::HashMap;

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use super::diesel_basic_error_mapping::{map_diesel_error, map_pool_error};
use super::models::AuthUserRow;
use super::pool::DbPool;
use super::schema::auth_users;
use crate::domain::ports::{AuthUserDetails, UserDirectory, UserDirectoryError};

/// Diesel-backed implementation of [`UserDirectory`].
#[derive(Clone)]
pub struct DieselUserDirectory {
    pool: DbPool,
}

impl DieselUserDirectory {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserDirectory for DieselUserDirectory {
    async fn lookup_users(
        &self,
        ids: &[Uuid],
    ) -> Result<HashMap<Uuid, AuthUserDetails>, UserDirectoryError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| map_pool_error(err, UserDirectoryError::connection))?;
        let rows: Vec<AuthUserRow> = auth_users::table
            .filter(auth_users::id.eq_any(ids))
            .select(AuthUserRow::as_select())
            .load(&mut conn)
            .await
            .map_err(|err| {
                map_diesel_error(err, UserDirectoryError::query, UserDirectoryError::connection)
            })?;
        Ok(rows.into_iter().map(Into::into).collect())
    }
}
