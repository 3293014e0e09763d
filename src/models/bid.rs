use mongodb::bson::{oid::ObjectId, Document};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Bid {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub product: String, // hex id of the product being bid on; not enforced as a reference
    #[serde(skip_serializing_if = "Option::is_none")]
    pub buyer_email: Option<String>,
    pub bid_price: f64,
    #[serde(flatten)]
    pub extra: Document,
}
