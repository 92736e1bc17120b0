//! PostgreSQL 기반 아이덴티티 저장소.
//!
//! 사용자, 역할, 역할 멤버십을 저장합니다. 비밀번호 해시는 이 모듈 밖으로 나가지 않습니다.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::time::Duration;
use tracing::{debug, info};

use identity_core::{
    hash_password, normalize_key, prepare_decoy_hash, verify_password_or_decoy,
    CredentialVerifier, DatabaseConfig, Identity, IdentityError, IdentityResult, IdentityStore,
    NewIdentity, PasswordPolicy, Role, RoleName,
};

/// `identities.normalized_email` UNIQUE 제약 이름 (PostgreSQL 기본 명명).
const EMAIL_UNIQUE_CONSTRAINT: &str = "identities_normalized_email_key";

/// DB에서 조회한 사용자 row
#[derive(Debug, sqlx::FromRow)]
struct IdentityRow {
    id: i64,
    user_name: String,
    email: String,
    display_name: String,
    created_at: DateTime<Utc>,
}

impl From<IdentityRow> for Identity {
    fn from(row: IdentityRow) -> Self {
        Self {
            id: row.id,
            user_name: row.user_name,
            email: row.email,
            display_name: row.display_name,
            created_at: row.created_at,
        }
    }
}

/// 자격증명 검증용 row
#[derive(sqlx::FromRow)]
struct CredentialRow {
    #[sqlx(flatten)]
    identity: IdentityRow,
    password_hash: String,
}

/// DB에서 조회한 역할 row
#[derive(Debug, sqlx::FromRow)]
struct RoleRow {
    id: i64,
    name: String,
}

impl TryFrom<RoleRow> for Role {
    type Error = IdentityError;

    fn try_from(row: RoleRow) -> Result<Self, Self::Error> {
        let name = RoleName::parse(&row.name)
            .map_err(|e| IdentityError::Storage(format!("저장된 역할 이름 오류: {}", e)))?;
        Ok(Role { id: row.id, name })
    }
}

fn storage_error(err: sqlx::Error) -> IdentityError {
    IdentityError::Storage(err.to_string())
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}

fn violated_constraint(err: &sqlx::Error) -> Option<&str> {
    match err {
        sqlx::Error::Database(db) => db.constraint(),
        _ => None,
    }
}

fn is_foreign_key_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_foreign_key_violation())
}

/// PostgreSQL 아이덴티티 저장소.
#[derive(Debug, Clone)]
pub struct PgIdentityStore {
    pool: PgPool,
    policy: PasswordPolicy,
}

impl PgIdentityStore {
    /// 기존 풀로 저장소 생성.
    pub fn new(pool: PgPool, policy: PasswordPolicy) -> Self {
        prepare_decoy_hash();
        Self { pool, policy }
    }

    /// 설정에 따라 연결 풀을 생성합니다.
    pub async fn connect(
        url: &str,
        config: &DatabaseConfig,
        policy: PasswordPolicy,
    ) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.connection_timeout_secs))
            .connect(url)
            .await?;

        info!(
            max_connections = config.max_connections,
            "Connected to identity database"
        );

        Ok(Self::new(pool, policy))
    }

    /// 데이터베이스 마이그레이션 실행.
    pub async fn migrate(&self) -> IdentityResult<()> {
        info!("Running database migrations...");

        sqlx::migrate!("../../migrations")
            .run(&self.pool)
            .await
            .map_err(|e| IdentityError::Storage(format!("마이그레이션 실패: {}", e)))?;

        info!("Database migrations completed");
        Ok(())
    }

    async fn require_role_id(&self, role: &RoleName) -> IdentityResult<i64> {
        let row: Option<(i64,)> = sqlx::query_as("SELECT id FROM roles WHERE normalized_name = $1")
            .bind(role.normalized())
            .fetch_optional(&self.pool)
            .await
            .map_err(storage_error)?;

        row.map(|(id,)| id)
            .ok_or_else(|| IdentityError::NotFound(format!("역할 {}", role)))
    }
}

#[async_trait]
impl CredentialVerifier for PgIdentityStore {
    async fn verify_credential(
        &self,
        user_name: &str,
        password: &str,
    ) -> IdentityResult<Option<Identity>> {
        let row = sqlx::query_as::<_, CredentialRow>(
            r#"
            SELECT id, user_name, email, display_name, created_at, password_hash
            FROM identities
            WHERE normalized_user_name = $1
            "#,
        )
        .bind(normalize_key(user_name))
        .fetch_optional(&self.pool)
        .await
        .map_err(storage_error)?;

        let (identity, hash) = row.map(|r| (r.identity, r.password_hash)).unzip();
        if identity.is_none() {
            debug!("Credential check for unknown user");
        }

        // 사용자 유무와 관계없이 Argon2 검증 1회 (CPU 작업이므로 블로킹 풀)
        let password = password.to_string();
        let matched = tokio::task::spawn_blocking(move || {
            verify_password_or_decoy(&password, hash.as_deref())
        })
        .await
        .map_err(|e| IdentityError::Internal(e.to_string()))?;

        Ok(identity.filter(|_| matched).map(Identity::from))
    }
}

#[async_trait]
impl IdentityStore for PgIdentityStore {
    async fn create_identity(&self, new: NewIdentity, password: &str) -> IdentityResult<Identity> {
        new.validate()?;
        self.policy
            .validate(password)
            .map_err(|msg| IdentityError::Validation(msg.to_string()))?;

        let password = password.to_string();
        let password_hash = tokio::task::spawn_blocking(move || hash_password(&password))
            .await
            .map_err(|e| IdentityError::Internal(e.to_string()))??;

        let row = sqlx::query_as::<_, IdentityRow>(
            r#"
            INSERT INTO identities
                (user_name, normalized_user_name, email, normalized_email, display_name, password_hash)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, user_name, email, display_name, created_at
            "#,
        )
        .bind(&new.user_name)
        .bind(normalize_key(&new.user_name))
        .bind(&new.email)
        .bind(normalize_key(&new.email))
        .bind(&new.display_name)
        .bind(&password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if !is_unique_violation(&e) {
                storage_error(e)
            } else if violated_constraint(&e) == Some(EMAIL_UNIQUE_CONSTRAINT) {
                IdentityError::Conflict(new.email.clone())
            } else {
                IdentityError::Conflict(new.user_name.clone())
            }
        })?;

        Ok(row.into())
    }

    async fn find_by_name(&self, user_name: &str) -> IdentityResult<Option<Identity>> {
        let row = sqlx::query_as::<_, IdentityRow>(
            r#"
            SELECT id, user_name, email, display_name, created_at
            FROM identities
            WHERE normalized_user_name = $1
            "#,
        )
        .bind(normalize_key(user_name))
        .fetch_optional(&self.pool)
        .await
        .map_err(storage_error)?;

        Ok(row.map(Identity::from))
    }

    async fn find_by_email(&self, email: &str) -> IdentityResult<Option<Identity>> {
        let row = sqlx::query_as::<_, IdentityRow>(
            r#"
            SELECT id, user_name, email, display_name, created_at
            FROM identities
            WHERE normalized_email = $1
            "#,
        )
        .bind(normalize_key(email))
        .fetch_optional(&self.pool)
        .await
        .map_err(storage_error)?;

        Ok(row.map(Identity::from))
    }

    async fn roles_of(&self, identity: &Identity) -> IdentityResult<Vec<RoleName>> {
        let rows = sqlx::query_as::<_, RoleRow>(
            r#"
            SELECT r.id, r.name
            FROM roles r
            JOIN identity_roles ir ON ir.role_id = r.id
            WHERE ir.identity_id = $1
            ORDER BY r.name
            "#,
        )
        .bind(identity.id)
        .fetch_all(&self.pool)
        .await
        .map_err(storage_error)?;

        rows.into_iter()
            .map(|row| Role::try_from(row).map(|role| role.name))
            .collect()
    }

    async fn create_role(&self, name: &RoleName) -> IdentityResult<Role> {
        let row = sqlx::query_as::<_, RoleRow>(
            "INSERT INTO roles (name, normalized_name) VALUES ($1, $2) RETURNING id, name",
        )
        .bind(name.as_str())
        .bind(name.normalized())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                IdentityError::Conflict(name.to_string())
            } else {
                storage_error(e)
            }
        })?;

        Role::try_from(row)
    }

    async fn find_role(&self, name: &RoleName) -> IdentityResult<Option<Role>> {
        let row = sqlx::query_as::<_, RoleRow>(
            "SELECT id, name FROM roles WHERE normalized_name = $1",
        )
        .bind(name.normalized())
        .fetch_optional(&self.pool)
        .await
        .map_err(storage_error)?;

        row.map(Role::try_from).transpose()
    }

    async fn list_roles(&self) -> IdentityResult<Vec<Role>> {
        let rows = sqlx::query_as::<_, RoleRow>("SELECT id, name FROM roles ORDER BY name")
            .fetch_all(&self.pool)
            .await
            .map_err(storage_error)?;

        rows.into_iter().map(Role::try_from).collect()
    }

    async fn add_role_membership(
        &self,
        identity: &Identity,
        role: &RoleName,
    ) -> IdentityResult<()> {
        let role_id = self.require_role_id(role).await?;

        sqlx::query(
            r#"
            INSERT INTO identity_roles (identity_id, role_id)
            VALUES ($1, $2)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(identity.id)
        .bind(role_id)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_foreign_key_violation(&e) {
                IdentityError::NotFound(format!("사용자 {}", identity.id))
            } else {
                storage_error(e)
            }
        })?;

        Ok(())
    }

    async fn remove_role_membership(
        &self,
        identity: &Identity,
        role: &RoleName,
    ) -> IdentityResult<()> {
        let role_id = self.require_role_id(role).await?;

        sqlx::query("DELETE FROM identity_roles WHERE identity_id = $1 AND role_id = $2")
            .bind(identity.id)
            .bind(role_id)
            .execute(&self.pool)
            .await
            .map_err(storage_error)?;

        Ok(())
    }

    async fn ping(&self) -> bool {
        sqlx::query("SELECT 1").execute(&self.pool).await.is_ok()
    }
}
