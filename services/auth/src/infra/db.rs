use anyhow::Context as _;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, ConnectionTrait, DatabaseConnection,
    DatabaseTransaction, DbErr, EntityTrait, QueryFilter, QuerySelect, SqlErr,
    TransactionTrait, sea_query::Expr,
};
use uuid::Uuid;

use otpgate_auth_schema::{login_codes, users};

use crate::domain::repository::{LoginCodeRepository, Transactioner, UserRepository};
use crate::domain::types::{LoginCode, LoginCodeStatus, NewLoginCode, User};
use crate::error::AuthServiceError;

fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}

// ── Transactions ─────────────────────────────────────────────────────────────

/// Transactions over the shared pool. A `DatabaseTransaction` that is dropped
/// uncommitted rolls back.
#[derive(Clone)]
pub struct DbTransactioner {
    pub db: DatabaseConnection,
}

impl Transactioner for DbTransactioner {
    type Tx = DatabaseTransaction;

    async fn begin(&self) -> Result<DatabaseTransaction, AuthServiceError> {
        self.db
            .begin()
            .await
            .context("begin transaction")
            .map_err(AuthServiceError::Transaction)
    }

    async fn commit(&self, tx: DatabaseTransaction) -> Result<(), AuthServiceError> {
        tx.commit()
            .await
            .context("commit transaction")
            .map_err(AuthServiceError::Transaction)
    }

    async fn rollback(&self, tx: DatabaseTransaction) -> Result<(), AuthServiceError> {
        tx.rollback()
            .await
            .context("rollback transaction")
            .map_err(AuthServiceError::Transaction)
    }
}

// ── User repository ──────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbUserRepository {
    pub db: DatabaseConnection,
}

impl UserRepository for DbUserRepository {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, AuthServiceError> {
        let model = users::Entity::find()
            .filter(users::Column::Username.eq(username))
            .one(&self.db)
            .await
            .context("find user by username")?;
        Ok(model.map(user_from_model))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AuthServiceError> {
        let model = users::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .context("find user by id")?;
        Ok(model.map(user_from_model))
    }

    async fn create(&self, user: &User) -> Result<(), AuthServiceError> {
        let result = users::ActiveModel {
            id: Set(user.id),
            username: Set(user.username.clone()),
            role: Set(user.role.clone()),
            full_name: Set(user.full_name.clone()),
            created_at: Set(user.created_at),
            updated_at: Set(user.updated_at),
        }
        .insert(&self.db)
        .await;
        match result {
            Ok(_) => Ok(()),
            Err(e) if is_unique_violation(&e) => Err(AuthServiceError::UserAlreadyExists),
            Err(e) => Err(anyhow::Error::new(e).context("create user").into()),
        }
    }
}

fn user_from_model(model: users::Model) -> User {
    User {
        id: model.id,
        username: model.username,
        role: model.role,
        full_name: model.full_name,
        created_at: model.created_at,
        updated_at: model.updated_at,
    }
}

// ── LoginCode repository ─────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbLoginCodeRepository {
    pub db: DatabaseConnection,
}

impl LoginCodeRepository for DbLoginCodeRepository {
    type Tx = DatabaseTransaction;

    async fn find_by_username(
        &self,
        tx: Option<&DatabaseTransaction>,
        username: &str,
    ) -> Result<Option<LoginCode>, AuthServiceError> {
        match tx {
            Some(txn) => find_active_by_username(txn, username, true).await,
            None => find_active_by_username(&self.db, username, false).await,
        }
    }

    async fn find_by_id(
        &self,
        tx: Option<&DatabaseTransaction>,
        id: Uuid,
    ) -> Result<Option<LoginCode>, AuthServiceError> {
        match tx {
            Some(txn) => find_active_by_id(txn, id).await,
            None => find_active_by_id(&self.db, id).await,
        }
    }

    async fn create(
        &self,
        tx: Option<&DatabaseTransaction>,
        code: &NewLoginCode,
    ) -> Result<LoginCode, AuthServiceError> {
        match tx {
            Some(txn) => insert_or_refresh(txn, code).await,
            None => insert_or_refresh(&self.db, code).await,
        }
    }

    async fn update(
        &self,
        tx: Option<&DatabaseTransaction>,
        id: Uuid,
        code: &NewLoginCode,
    ) -> Result<Option<LoginCode>, AuthServiceError> {
        match tx {
            Some(txn) => update_active(txn, id, code).await,
            None => update_active(&self.db, id, code).await,
        }
    }

    async fn delete_by_username(
        &self,
        tx: Option<&DatabaseTransaction>,
        username: &str,
    ) -> Result<u64, AuthServiceError> {
        match tx {
            Some(txn) => consume_by_username(txn, username).await,
            None => consume_by_username(&self.db, username).await,
        }
    }

    async fn delete(
        &self,
        tx: Option<&DatabaseTransaction>,
        id: Uuid,
    ) -> Result<bool, AuthServiceError> {
        match tx {
            Some(txn) => soft_delete_by_id(txn, id).await,
            None => soft_delete_by_id(&self.db, id).await,
        }
    }
}

/// `lock` adds `FOR UPDATE`: a concurrent transaction locking the same row
/// waits for us, then re-checks `deleted_at` and finds nothing.
async fn find_active_by_username<C: ConnectionTrait>(
    conn: &C,
    username: &str,
    lock: bool,
) -> Result<Option<LoginCode>, AuthServiceError> {
    let mut query = login_codes::Entity::find()
        .filter(login_codes::Column::Username.eq(username))
        .filter(login_codes::Column::DeletedAt.is_null());
    if lock {
        query = query.lock_exclusive();
    }
    let model = query
        .one(conn)
        .await
        .context("find login code by username")?;
    model.map(login_code_from_model).transpose()
}

async fn find_active_by_id<C: ConnectionTrait>(
    conn: &C,
    id: Uuid,
) -> Result<Option<LoginCode>, AuthServiceError> {
    let model = login_codes::Entity::find_by_id(id)
        .filter(login_codes::Column::DeletedAt.is_null())
        .one(conn)
        .await
        .context("find login code by id")?;
    model.map(login_code_from_model).transpose()
}

/// Insert inside a nested transaction (a savepoint when `conn` is already a
/// transaction) so a unique violation on the active-username index can be
/// recovered from. The loser of a concurrent insert refreshes the winner's row.
async fn insert_or_refresh<C>(conn: &C, code: &NewLoginCode) -> Result<LoginCode, AuthServiceError>
where
    C: ConnectionTrait + TransactionTrait,
{
    let now = Utc::now();
    let row = login_codes::ActiveModel {
        id: Set(Uuid::now_v7()),
        username: Set(code.username.clone()),
        code: Set(code.code.clone()),
        expiry_time: Set(code.expiry_time),
        status: Set(code.status.as_str().to_owned()),
        response_meta: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
        deleted_at: Set(None),
    };

    let attempt = conn.begin().await.context("begin login code insert")?;
    match row.insert(&attempt).await {
        Ok(model) => {
            attempt.commit().await.context("commit login code insert")?;
            login_code_from_model(model)
        }
        Err(e) if is_unique_violation(&e) => {
            attempt
                .rollback()
                .await
                .context("rollback login code insert")?;
            refresh_active_by_username(conn, code)
                .await?
                .ok_or_else(|| anyhow::anyhow!("active login code vanished during refresh").into())
        }
        Err(e) => Err(anyhow::Error::new(e).context("create login code").into()),
    }
}

async fn refresh_active_by_username<C: ConnectionTrait>(
    conn: &C,
    code: &NewLoginCode,
) -> Result<Option<LoginCode>, AuthServiceError> {
    let result = login_codes::Entity::update_many()
        .col_expr(login_codes::Column::Code, Expr::value(code.code.clone()))
        .col_expr(login_codes::Column::ExpiryTime, Expr::value(code.expiry_time))
        .col_expr(
            login_codes::Column::Status,
            Expr::value(code.status.as_str()),
        )
        .col_expr(login_codes::Column::UpdatedAt, Expr::value(Utc::now()))
        .filter(login_codes::Column::Username.eq(code.username.as_str()))
        .filter(login_codes::Column::DeletedAt.is_null())
        .exec(conn)
        .await
        .context("refresh login code by username")?;
    if result.rows_affected == 0 {
        return Ok(None);
    }
    find_active_by_username(conn, &code.username, false).await
}

async fn update_active<C: ConnectionTrait>(
    conn: &C,
    id: Uuid,
    code: &NewLoginCode,
) -> Result<Option<LoginCode>, AuthServiceError> {
    let result = login_codes::Entity::update_many()
        .col_expr(
            login_codes::Column::Username,
            Expr::value(code.username.clone()),
        )
        .col_expr(login_codes::Column::Code, Expr::value(code.code.clone()))
        .col_expr(login_codes::Column::ExpiryTime, Expr::value(code.expiry_time))
        .col_expr(
            login_codes::Column::Status,
            Expr::value(code.status.as_str()),
        )
        .col_expr(login_codes::Column::UpdatedAt, Expr::value(Utc::now()))
        .filter(login_codes::Column::Id.eq(id))
        .filter(login_codes::Column::DeletedAt.is_null())
        .exec(conn)
        .await
        .context("update login code")?;
    if result.rows_affected == 0 {
        return Ok(None);
    }
    find_active_by_id(conn, id).await
}

/// The conditional `deleted_at IS NULL` makes this the serialization point:
/// of two logins racing on one code, only one sees a row affected.
async fn consume_by_username<C: ConnectionTrait>(
    conn: &C,
    username: &str,
) -> Result<u64, AuthServiceError> {
    let now = Utc::now();
    let result = login_codes::Entity::update_many()
        .col_expr(login_codes::Column::DeletedAt, Expr::value(now))
        .col_expr(
            login_codes::Column::Status,
            Expr::value(LoginCodeStatus::Success.as_str()),
        )
        .col_expr(login_codes::Column::UpdatedAt, Expr::value(now))
        .filter(login_codes::Column::Username.eq(username))
        .filter(login_codes::Column::DeletedAt.is_null())
        .exec(conn)
        .await
        .context("delete login code by username")?;
    Ok(result.rows_affected)
}

async fn soft_delete_by_id<C: ConnectionTrait>(
    conn: &C,
    id: Uuid,
) -> Result<bool, AuthServiceError> {
    let now = Utc::now();
    let result = login_codes::Entity::update_many()
        .col_expr(login_codes::Column::DeletedAt, Expr::value(now))
        .col_expr(login_codes::Column::UpdatedAt, Expr::value(now))
        .filter(login_codes::Column::Id.eq(id))
        .filter(login_codes::Column::DeletedAt.is_null())
        .exec(conn)
        .await
        .context("delete login code")?;
    Ok(result.rows_affected > 0)
}

fn login_code_from_model(model: login_codes::Model) -> Result<LoginCode, AuthServiceError> {
    let status = model
        .status
        .parse::<LoginCodeStatus>()
        .context("decode login code status")?;
    Ok(LoginCode {
        id: model.id,
        username: model.username,
        code: model.code,
        expiry_time: model.expiry_time,
        status,
        response_meta: model.response_meta,
        created_at: model.created_at,
        updated_at: model.updated_at,
        deleted_at: model.deleted_at,
    })
}
