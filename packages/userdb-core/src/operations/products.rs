use uuid::Uuid;

use super::collect_found;
use super::users::upsert_product_user;
use crate::database::Database;
use crate::error::DbError;
use crate::models::{Product, ProductData};

impl Database {
    /// Creates a product owned by `owner_id`.
    pub fn create_product(
        &self,
        name: &str,
        public: bool,
        owner_id: &Uuid,
    ) -> Result<ProductData, DbError> {
        self.write(|tables| {
            if tables.products.find(|p| p.name == name).is_some() {
                return Err(DbError::ProductExists(name.to_string()));
            }
            if !tables.users.contains(owner_id) {
                return Err(DbError::UserNotFound);
            }
            let owner = tables.owner_privilege()?;

            let details = self.new_asset()?;
            let assets = self.new_asset()?;
            let product = Product {
                id: Uuid::new_v4(),
                name: name.to_string(),
                public,
                details_id: details.id,
                assets_id: assets.id,
            };

            tables.assets.insert(details);
            tables.assets.insert(assets);
            tables.products.insert(product.clone());
            upsert_product_user(&mut tables.product_users, product.id, *owner_id, owner);
            tracing::debug!("Created product {} owned by {}", product.id, owner_id);
            tables.product_data(&product)
        })
    }

    pub fn product(&self, id: &Uuid) -> Result<ProductData, DbError> {
        let tables = self.snapshot();
        let product = tables.products.get(id).ok_or(DbError::ProductNotFound)?;
        tables.product_data(product)
    }

    /// Returns the products found among `ids`, in request order.
    pub fn products(&self, ids: &[Uuid]) -> Result<Vec<ProductData>, DbError> {
        let tables = self.snapshot();
        collect_found(ids, DbError::ProductNotFound, |id| {
            tables
                .products
                .get(id)
                .map(|p| tables.product_data(p))
                .transpose()
        })
    }

    /// Replaces the details datamap of a product.
    pub fn update_product_details(&self, product: &ProductData) -> Result<(), DbError> {
        self.write(|tables| {
            let expected = tables
                .products
                .get(&product.id)
                .ok_or(DbError::ProductNotFound)?
                .details_id;
            tables.replace_asset(expected, &product.details, "product details")
        })
    }

    /// Replaces the assets datamap of a product.
    pub fn update_product_assets(&self, product: &ProductData) -> Result<(), DbError> {
        self.write(|tables| {
            let expected = tables
                .products
                .get(&product.id)
                .ok_or(DbError::ProductNotFound)?
                .assets_id;
            tables.replace_asset(expected, &product.assets, "product assets")
        })
    }

    /// Deletes a product with its projects, viewers, memberships and assets.
    pub fn delete_product(&self, id: &Uuid) -> Result<(), DbError> {
        self.write(|tables| {
            tables.remove_product(id).ok_or(DbError::ProductNotFound)?;
            tracing::debug!("Deleted product {}", id);
            Ok(())
        })
    }

    /// Adds or updates product memberships.
    ///
    /// The product may end up with at most one owner.
    pub fn add_product_users(
        &self,
        product_id: &Uuid,
        users: &[(Uuid, i64)],
    ) -> Result<(), DbError> {
        if users.is_empty() {
            return Err(DbError::EmptyUsersList);
        }

        self.write(|tables| {
            if !tables.products.contains(product_id) {
                return Err(DbError::ProductNotFound);
            }

            let owner = tables.owner_privilege()?;
            let mut owners = tables
                .product_users
                .iter()
                .filter(|pu| pu.product_id == *product_id && pu.privilege == owner)
                .filter(|pu| !users.iter().any(|(id, _)| *id == pu.user_id))
                .count();

            for (user_id, privilege) in users {
                if !tables.privileges.is_valid(*privilege) {
                    return Err(DbError::UnknownPrivilege {
                        privilege: *privilege,
                        user: *user_id,
                    });
                }
                if *privilege == owner {
                    owners += 1;
                }
            }
            if owners > 1 {
                return Err(DbError::InvalidOwnerCount);
            }

            for (user_id, privilege) in users {
                if !tables.users.contains(user_id) {
                    return Err(DbError::UserNotFound);
                }
                upsert_product_user(&mut tables.product_users, *product_id, *user_id, *privilege);
            }
            tracing::debug!("Set {} member(s) of product {}", users.len(), product_id);
            Ok(())
        })
    }

    /// Removes a user from a product.
    pub fn delete_product_user(&self, product_id: &Uuid, user_id: &Uuid) -> Result<(), DbError> {
        self.write(|tables| {
            let position = tables
                .product_users
                .iter()
                .position(|pu| pu.product_id == *product_id && pu.user_id == *user_id)
                .ok_or(DbError::ProductUserNotAssociated)?;
            tables.product_users.remove(position);
            Ok(())
        })
    }
}
