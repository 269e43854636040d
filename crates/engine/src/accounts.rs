//! Accounts: the tenants owning inventory and sales.
//!
//! The credential hash is an opaque blob produced and checked by the
//! authentication collaborator; the ledger only stores it.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::Serialize;

use crate::{AccountId, EngineError, util::parse_account_id};

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Account {
    pub id: AccountId,
    pub username: String,
    #[serde(skip)]
    pub credential_hash: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

impl Account {
    pub fn new(username: String, credential_hash: String, email: String) -> Self {
        Self {
            id: AccountId::new(),
            username,
            credential_hash,
            email,
            created_at: Utc::now(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "accounts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    #[sea_orm(unique)]
    pub username: String,
    pub password_hash: String,
    pub email: String,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::items::Entity")]
    Items,
    #[sea_orm(has_many = "super::sales::Entity")]
    Sales,
}

impl Related<super::items::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Items.def()
    }
}

impl Related<super::sales::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Sales.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Account> for ActiveModel {
    fn from(value: &Account) -> Self {
        Self {
            id: ActiveValue::Set(value.id.to_string()),
            username: ActiveValue::Set(value.username.clone()),
            password_hash: ActiveValue::Set(value.credential_hash.clone()),
            email: ActiveValue::Set(value.email.clone()),
            created_at: ActiveValue::Set(value.created_at),
        }
    }
}

impl TryFrom<Model> for Account {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_account_id(&model.id)?,
            username: model.username,
            credential_hash: model.password_hash,
            email: model.email,
            created_at: model.created_at,
        })
    }
}
