use mongodb::bson::{doc, oid::ObjectId, DateTime, Document};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Product {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub name: String,
    pub price: f64, // no sign/range validation, matches the stored documents
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>, // owner
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime>, // recency ordering key, stamped on insert
    #[serde(flatten)]
    pub extra: Document,
}

/// PATCH body for a product. Only `name` and `price` are ever written back;
/// anything else the caller sends is dropped.
#[derive(Deserialize, Serialize, Debug)]
pub struct ProductPatch {
    pub name: Option<String>,
    pub price: Option<f64>,
}

impl ProductPatch {
    /// Builds the `$set` fields for this patch. Empty when the body carried
    /// neither updatable field, in which case no store call should be made.
    pub fn to_update_fields(&self) -> Document {
        let mut update_fields = doc! {};
        if let Some(ref name) = self.name {
            update_fields.insert("name", name.clone());
        }
        if let Some(price) = self.price {
            update_fields.insert("price", price);
        }
        update_fields
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::bson::{from_document, to_document};

    #[test]
    fn patch_sets_only_name_and_price() {
        let patch = ProductPatch {
            name: Some("Lamp".to_string()),
            price: Some(20.0),
        };

        let fields = patch.to_update_fields();
        assert_eq!(fields.len(), 2);
        assert_eq!(fields.get_str("name").unwrap(), "Lamp");
        assert_eq!(fields.get_f64("price").unwrap(), 20.0);
    }

    #[test]
    fn partial_patch_omits_missing_fields() {
        let patch = ProductPatch {
            name: None,
            price: Some(35.5),
        };

        let fields = patch.to_update_fields();
        assert!(!fields.contains_key("name"));
        assert_eq!(fields.get_f64("price").unwrap(), 35.5);
    }

    #[test]
    fn empty_patch_builds_no_update_fields() {
        let patch = ProductPatch {
            name: None,
            price: None,
        };
        assert!(patch.to_update_fields().is_empty());
    }

    #[test]
    fn product_round_trips_through_bson() {
        let stored = doc! {
            "_id": ObjectId::new(),
            "name": "Lamp",
            "price": 20.0,
            "email": "seller@example.com",
            "created_at": DateTime::now(),
            "condition": "used",
        };

        let product: Product = from_document(stored.clone()).unwrap();
        assert_eq!(product.name, "Lamp");
        assert_eq!(product.extra.get_str("condition").unwrap(), "used");

        let back = to_document(&product).unwrap();
        assert_eq!(back.get_object_id("_id").unwrap(), stored.get_object_id("_id").unwrap());
    }
}
