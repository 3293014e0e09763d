use mongodb::bson::{oid::ObjectId, Document};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct User {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub email: String, // logical unique key; at most one stored record per email
    #[serde(flatten)]
    pub profile: Document, // arbitrary profile fields, stored as-is
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::bson::{doc, from_document, to_document};

    #[test]
    fn extra_profile_fields_survive_a_bson_round_trip() {
        let stored = doc! {
            "email": "seller@example.com",
            "display_name": "Seller",
            "photo_url": "https://example.com/p.png",
        };

        let user: User = from_document(stored).unwrap();
        assert_eq!(user.email, "seller@example.com");
        assert_eq!(user.profile.get_str("display_name").unwrap(), "Seller");

        let back = to_document(&user).unwrap();
        assert_eq!(back.get_str("photo_url").unwrap(), "https://example.com/p.png");
        assert!(!back.contains_key("_id"));
    }

    #[test]
    fn object_id_maps_to_underscore_id() {
        let id = ObjectId::new();
        let user = User {
            id: Some(id),
            email: "seller@example.com".to_string(),
            profile: Document::new(),
        };

        let doc = to_document(&user).unwrap();
        assert_eq!(doc.get_object_id("_id").unwrap(), id);
    }
}
