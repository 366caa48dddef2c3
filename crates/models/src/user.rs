use sea_orm::{entity::prelude::*, DatabaseConnection, QueryOrder, Set};
use serde::{Deserialize, Serialize};

use crate::errors::ModelError;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub first_name: String,
    pub last_name: String,
    #[sea_orm(unique)]
    pub email: String,
    pub password: String,
    pub salt: String,
    /// Comma-joined role names.
    #[sea_orm(column_type = "Text")]
    pub roles: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

/// Column values for an insert or a full update.
#[derive(Clone, Debug)]
pub struct UserRow {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    pub salt: String,
    pub roles: Vec<String>,
}

pub fn join_roles(roles: &[String]) -> String {
    roles.join(",")
}

pub fn split_roles(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .map(str::to_string)
        .collect()
}

impl Model {
    pub fn role_list(&self) -> Vec<String> {
        split_roles(&self.roles)
    }
}

pub async fn create(db: &DatabaseConnection, row: UserRow) -> Result<Model, ModelError> {
    if row.email.trim().is_empty() {
        return Err(ModelError::Validation("email required".into()));
    }
    let am = ActiveModel {
        first_name: Set(row.first_name),
        last_name: Set(row.last_name),
        email: Set(row.email),
        password: Set(row.password),
        salt: Set(row.salt),
        roles: Set(join_roles(&row.roles)),
        ..Default::default()
    };
    Ok(am.insert(db).await?)
}

pub async fn find_by_email(db: &DatabaseConnection, email: &str) -> Result<Option<Model>, ModelError> {
    Ok(Entity::find().filter(Column::Email.eq(email)).one(db).await?)
}

pub async fn find_by_id(db: &DatabaseConnection, id: i32) -> Result<Option<Model>, ModelError> {
    Ok(Entity::find_by_id(id).one(db).await?)
}

pub async fn list_all(db: &DatabaseConnection) -> Result<Vec<Model>, ModelError> {
    Ok(Entity::find().order_by_asc(Column::Id).all(db).await?)
}

/// Overwrite every column of an existing row.
pub async fn update(db: &DatabaseConnection, id: i32, row: UserRow) -> Result<Model, ModelError> {
    let mut am: ActiveModel = Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or(ModelError::NotFound)?
        .into();
    am.first_name = Set(row.first_name);
    am.last_name = Set(row.last_name);
    am.email = Set(row.email);
    am.password = Set(row.password);
    am.salt = Set(row.salt);
    am.roles = Set(join_roles(&row.roles));
    Ok(am.update(db).await?)
}

/// Returns whether a row was removed.
pub async fn hard_delete(db: &DatabaseConnection, id: i32) -> Result<bool, ModelError> {
    let res = Entity::delete_by_id(id).exec(db).await?;
    Ok(res.rows_affected > 0)
}
