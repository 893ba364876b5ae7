//! Business operations on users, products, projects and viewers.
//!
//! Every operation is a method on [`Database`]. Reads run against a
//! snapshot; writes run inside a single transaction so a failing step
//! leaves no partial state behind.

mod products;
mod projects;
mod users;
mod viewers;

use uuid::Uuid;

use crate::database::{Database, Tables};
use crate::error::DbError;
use crate::models::privilege::OWNER;
use crate::models::{
    Asset, DataMap, Product, ProductData, Project, ProjectData, User, UserData,
};

impl Database {
    /// Creates an empty asset, with its own directory when an asset root
    /// is configured.
    pub(crate) fn new_asset(&self) -> Result<Asset, DbError> {
        match &self.config().asset_root {
            Some(root) => Asset::with_base_path(DataMap::new(), root),
            None => Ok(Asset::new(DataMap::new())),
        }
    }
}

impl Tables {
    fn asset(&self, id: &Uuid, what: &'static str) -> Result<&Asset, DbError> {
        self.assets.get(id).ok_or(DbError::AssetMissing(what))
    }

    /// Replaces the datamap of the asset `expected` with the one supplied.
    fn replace_asset(
        &mut self,
        expected: Uuid,
        asset: &Asset,
        what: &'static str,
    ) -> Result<(), DbError> {
        if asset.id != expected {
            return Err(DbError::AssetMissing(what));
        }

        let stored = self
            .assets
            .get_mut(&expected)
            .ok_or(DbError::AssetMissing(what))?;
        stored.datamap = asset.datamap.clone();
        Ok(())
    }

    fn owner_privilege(&self) -> Result<i64, DbError> {
        self.privileges
            .by_name(OWNER)
            .map(|p| p.id)
            .ok_or_else(|| DbError::DataCorruption("Privilege table has no Owner".to_string()))
    }

    fn user_data(&self, user: &User) -> Result<UserData, DbError> {
        Ok(UserData {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            password: user.password.clone(),
            settings: self.asset(&user.settings_id, "user settings")?.clone(),
            assets: self.asset(&user.assets_id, "user assets")?.clone(),
        })
    }

    fn product_data(&self, product: &Product) -> Result<ProductData, DbError> {
        Ok(ProductData {
            id: product.id,
            name: product.name.clone(),
            public: product.public,
            details: self.asset(&product.details_id, "product details")?.clone(),
            assets: self.asset(&product.assets_id, "product assets")?.clone(),
        })
    }

    fn project_data(&self, project: &Project) -> Result<ProjectData, DbError> {
        Ok(ProjectData {
            id: project.id,
            product_id: project.product_id,
            details: self.asset(&project.details_id, "project details")?.clone(),
            assets: self.asset(&project.assets_id, "project assets")?.clone(),
        })
    }

    /// Removes a project with its assets, memberships and viewers.
    fn remove_project(&mut self, id: &Uuid) -> Option<Project> {
        let project = self.projects.remove(id)?;
        self.assets.remove(&project.details_id);
        self.assets.remove(&project.assets_id);
        self.project_users.retain(|pu| pu.project_id != *id);
        self.project_viewers.retain(|pv| pv.project_id != *id);
        Some(project)
    }

    /// Removes a product with its projects, assets and memberships.
    fn remove_product(&mut self, id: &Uuid) -> Option<Product> {
        let product = self.products.remove(id)?;
        let projects: Vec<Uuid> = self
            .projects
            .iter()
            .filter(|p| p.product_id == *id)
            .map(|p| p.id)
            .collect();
        for project_id in &projects {
            self.remove_project(project_id);
        }

        self.assets.remove(&product.details_id);
        self.assets.remove(&product.assets_id);
        self.product_users.retain(|pu| pu.product_id != *id);
        Some(product)
    }
}

/// Looks up every id in order, skipping the ones `lookup` does not find.
///
/// Fails with `not_found` only if nothing was found at all.
fn collect_found<T, F>(ids: &[Uuid], not_found: DbError, mut lookup: F) -> Result<Vec<T>, DbError>
where
    F: FnMut(&Uuid) -> Result<Option<T>, DbError>,
{
    let mut found = Vec::with_capacity(ids.len());
    for id in ids {
        if let Some(item) = lookup(id)? {
            found.push(item);
        }
    }

    if found.is_empty() {
        return Err(not_found);
    }
    Ok(found)
}
