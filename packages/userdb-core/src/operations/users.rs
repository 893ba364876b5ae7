use std::collections::HashMap;

use uuid::Uuid;

use super::collect_found;
use crate::database::Database;
use crate::error::DbError;
use crate::models::{Asset, ProductUser, User, UserData};

impl Database {
    /// Registers a new user with empty settings and assets.
    pub fn create_user(
        &self,
        name: &str,
        email: &str,
        password: &[u8],
    ) -> Result<UserData, DbError> {
        self.write(|tables| {
            if tables.users.find(|u| u.email == email).is_some() {
                return Err(DbError::DuplicateEmail);
            }
            if tables.users.find(|u| u.name == name).is_some() {
                return Err(DbError::DuplicateName);
            }

            let settings = self.new_asset()?;
            let assets = self.new_asset()?;
            let user = User {
                id: Uuid::new_v4(),
                name: name.to_string(),
                email: email.to_string(),
                password: password.to_vec(),
                settings_id: settings.id,
                assets_id: assets.id,
            };

            tables.assets.insert(settings);
            tables.assets.insert(assets);
            tables.users.insert(user.clone());
            tracing::debug!("Created user {}", user.id);
            tables.user_data(&user)
        })
    }

    pub fn user(&self, id: &Uuid) -> Result<UserData, DbError> {
        let tables = self.snapshot();
        let user = tables.users.get(id).ok_or(DbError::UserNotFound)?;
        tables.user_data(user)
    }

    pub fn user_by_email(&self, email: &str) -> Result<UserData, DbError> {
        let tables = self.snapshot();
        let user = tables
            .users
            .find(|u| u.email == email)
            .ok_or(DbError::UserNotFound)?;
        tables.user_data(user)
    }

    /// Returns the users found among `ids`, in request order.
    pub fn users(&self, ids: &[Uuid]) -> Result<Vec<UserData>, DbError> {
        let tables = self.snapshot();
        collect_found(ids, DbError::UserNotFound, |id| {
            tables.users.get(id).map(|u| tables.user_data(u)).transpose()
        })
    }

    /// Replaces the settings datamap of a user.
    pub fn update_user_settings(&self, user_id: &Uuid, settings: &Asset) -> Result<(), DbError> {
        self.write(|tables| {
            let expected = tables
                .users
                .get(user_id)
                .ok_or(DbError::UserNotFound)?
                .settings_id;
            tables.replace_asset(expected, settings, "user settings")
        })
    }

    /// Replaces the assets datamap of a user.
    pub fn update_user_assets(&self, user_id: &Uuid, assets: &Asset) -> Result<(), DbError> {
        self.write(|tables| {
            let expected = tables
                .users
                .get(user_id)
                .ok_or(DbError::UserNotFound)?
                .assets_id;
            tables.replace_asset(expected, assets, "user assets")
        })
    }

    /// Deletes a user.
    ///
    /// Products owned by the user pass to the nominee given for them in
    /// `nominees` (product id to user id); products without a nominee are
    /// deleted together with their projects.
    pub fn delete_user(&self, id: &Uuid, nominees: &HashMap<Uuid, Uuid>) -> Result<(), DbError> {
        self.write(|tables| {
            let user = tables.users.get(id).cloned().ok_or(DbError::UserNotFound)?;
            let owner = tables.owner_privilege()?;

            let owned: Vec<Uuid> = tables
                .product_users
                .iter()
                .filter(|pu| pu.user_id == *id && pu.privilege == owner)
                .map(|pu| pu.product_id)
                .collect();

            for product_id in owned {
                match nominees.get(&product_id).filter(|nominee| *nominee != id) {
                    Some(nominee) => {
                        if !tables.users.contains(nominee) {
                            return Err(DbError::UserNotFound);
                        }
                        upsert_product_user(&mut tables.product_users, product_id, *nominee, owner);
                        tracing::debug!("Transferred product {} to {}", product_id, nominee);
                    }
                    None => {
                        tables.remove_product(&product_id);
                        tracing::debug!("Deleted product {} with its owner", product_id);
                    }
                }
            }

            tables.product_users.retain(|pu| pu.user_id != *id);
            tables.project_users.retain(|pu| pu.user_id != *id);
            tables.project_viewers.retain(|pv| pv.user_id != *id);
            tables.assets.remove(&user.settings_id);
            tables.assets.remove(&user.assets_id);
            tables.users.remove(id);
            tracing::debug!("Deleted user {}", id);
            Ok(())
        })
    }

    /// Checks a user's credentials.
    pub fn authenticate(&self, id: &Uuid, email: &str, password: &[u8]) -> Result<(), DbError> {
        let tables = self.snapshot();
        let user = tables.users.get(id).ok_or(DbError::UserNotFound)?;
        if user.email != email {
            return Err(DbError::InvalidEmailOrPassword);
        }
        if user.password != password {
            return Err(DbError::InvalidPassword);
        }
        Ok(())
    }
}

/// Sets the privilege of a product member, adding the membership if needed.
pub(super) fn upsert_product_user(
    product_users: &mut Vec<ProductUser>,
    product_id: Uuid,
    user_id: Uuid,
    privilege: i64,
) {
    match product_users
        .iter_mut()
        .find(|pu| pu.product_id == product_id && pu.user_id == user_id)
    {
        Some(existing) => existing.privilege = privilege,
        None => product_users.push(ProductUser {
            product_id,
            user_id,
            privilege,
        }),
    }
}
