use models::errors::ModelError;
use models::user::{self as user_model, UserRow};
use sea_orm::DatabaseConnection;

use crate::auth::domain::User;
use crate::auth::errors::AuthError;
use crate::auth::repository::UserRepository;

pub struct SeaOrmUserRepository {
    pub db: DatabaseConnection,
}

impl SeaOrmUserRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

fn map_err(err: ModelError) -> AuthError {
    match err {
        ModelError::UniqueViolation(_) => AuthError::EmailAlreadyRegistered,
        ModelError::NotFound => AuthError::NotFound,
        other => AuthError::Repository(other.to_string()),
    }
}

fn to_user(m: user_model::Model) -> User {
    let roles = m.role_list();
    User {
        id: i64::from(m.id),
        first_name: m.first_name,
        last_name: m.last_name,
        email: m.email,
        password: m.password,
        salt: m.salt,
        roles,
    }
}

fn to_row(u: &User) -> UserRow {
    UserRow {
        first_name: u.first_name.clone(),
        last_name: u.last_name.clone(),
        email: u.email.clone(),
        password: u.password.clone(),
        salt: u.salt.clone(),
        roles: u.roles.clone(),
    }
}

/// Ids outside the column range cannot exist in the table.
fn column_id(id: i64) -> Option<i32> {
    i32::try_from(id).ok()
}

#[async_trait::async_trait]
impl UserRepository for SeaOrmUserRepository {
    async fn add_user(&self, user: &mut User) -> Result<(), AuthError> {
        let created = user_model::create(&self.db, to_row(user)).await.map_err(map_err)?;
        user.id = i64::from(created.id);
        Ok(())
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, AuthError> {
        let res = user_model::find_by_email(&self.db, email).await.map_err(map_err)?;
        Ok(res.map(to_user))
    }

    async fn get_user_by_id(&self, id: i64) -> Result<Option<User>, AuthError> {
        let Some(id) = column_id(id) else { return Ok(None) };
        let res = user_model::find_by_id(&self.db, id).await.map_err(map_err)?;
        Ok(res.map(to_user))
    }

    async fn get_all_users(&self) -> Result<Vec<User>, AuthError> {
        let rows = user_model::list_all(&self.db).await.map_err(map_err)?;
        Ok(rows.into_iter().map(to_user).collect())
    }

    async fn update_user(&self, user: &User) -> Result<(), AuthError> {
        let id = column_id(user.id).ok_or(AuthError::NotFound)?;
        user_model::update(&self.db, id, to_row(user)).await.map_err(map_err)?;
        Ok(())
    }

    async fn delete_user(&self, id: i64) -> Result<bool, AuthError> {
        let Some(id) = column_id(id) else { return Ok(false) };
        user_model::hard_delete(&self.db, id).await.map_err(map_err)
    }
}
