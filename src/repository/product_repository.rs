use futures::stream::TryStreamExt;
use mongodb::bson::{doc, oid::ObjectId, DateTime};
use mongodb::error::Result;
use mongodb::options::FindOptions;
use mongodb::results::{DeleteResult, UpdateResult};
use mongodb::{Client, Collection};

use crate::models::product::{Product, ProductPatch};

/// Hard cap on the `/latest-products` listing.
pub const LATEST_PRODUCTS_LIMIT: i64 = 6;

pub struct ProductRepository {
    collection: Collection<Product>,
}

impl ProductRepository {
    pub fn new(client: &Client) -> Self {
        let db = client.database("smart_db");
        let collection = db.collection::<Product>("products");
        ProductRepository { collection }
    }

    pub async fn get_products(&self, owner_email: Option<&str>) -> Result<Vec<Product>> {
        let filter = owner_email.map(|email| doc! { "email": email });
        let mut cursor = self.collection.find(filter, None).await?;
        let mut products = Vec::new();
        while let Some(product) = cursor.try_next().await? {
            products.push(product);
        }
        Ok(products)
    }

    pub async fn get_latest_products(&self) -> Result<Vec<Product>> {
        let mut cursor = self.collection.find(None, latest_find_options()).await?;
        let mut products = Vec::new();
        while let Some(product) = cursor.try_next().await? {
            products.push(product);
        }
        Ok(products)
    }

    pub async fn find_product_by_id(&self, id: ObjectId) -> Result<Option<Product>> {
        let filter = doc! { "_id": id };
        self.collection.find_one(filter, None).await
    }

    pub async fn create_product(&self, mut product: Product) -> Result<Product> {
        if product.created_at.is_none() {
            product.created_at = Some(DateTime::now());
        }
        let result = self.collection.insert_one(&product, None).await?;
        product.id = result.inserted_id.as_object_id();
        Ok(product)
    }

    /// Applies a name/price patch. Returns `None` without touching the store
    /// when the patch carries nothing to set.
    pub async fn update_product(
        &self,
        id: ObjectId,
        patch: &ProductPatch,
    ) -> Result<Option<UpdateResult>> {
        let update_fields = patch.to_update_fields();
        if update_fields.is_empty() {
            return Ok(None);
        }

        let filter = doc! { "_id": id };
        let update = doc! { "$set": update_fields };
        self.collection.update_one(filter, update, None).await.map(Some)
    }

    pub async fn delete_product(&self, id: ObjectId) -> Result<DeleteResult> {
        let filter = doc! { "_id": id };
        self.collection.delete_one(filter, None).await
    }
}

fn latest_find_options() -> FindOptions {
    FindOptions::builder()
        .sort(doc! { "created_at": -1 })
        .limit(LATEST_PRODUCTS_LIMIT)
        .build()
}
