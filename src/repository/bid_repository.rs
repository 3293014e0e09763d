use futures::stream::TryStreamExt;
use mongodb::bson::{doc, oid::ObjectId};
use mongodb::error::Result;
use mongodb::options::FindOptions;
use mongodb::results::DeleteResult;
use mongodb::{Client, Collection};

use crate::models::bid::Bid;

pub struct BidRepository {
    collection: Collection<Bid>,
}

impl BidRepository {
    pub fn new(client: &Client) -> Self {
        let db = client.database("smart_db");
        let collection = db.collection::<Bid>("bids");
        BidRepository { collection }
    }

    pub async fn get_bids(&self, buyer_email: Option<&str>) -> Result<Vec<Bid>> {
        let filter = buyer_email.map(|email| doc! { "buyer_email": email });
        let mut cursor = self.collection.find(filter, None).await?;
        let mut bids = Vec::new();
        while let Some(bid) = cursor.try_next().await? {
            bids.push(bid);
        }
        Ok(bids)
    }

    /// All bids on one product, highest bid first.
    pub async fn get_bids_for_product(&self, product_id: &str) -> Result<Vec<Bid>> {
        let filter = doc! { "product": product_id };
        let options = FindOptions::builder().sort(doc! { "bid_price": -1 }).build();
        let mut cursor = self.collection.find(filter, options).await?;
        let mut bids = Vec::new();
        while let Some(bid) = cursor.try_next().await? {
            bids.push(bid);
        }
        Ok(bids)
    }

    pub async fn create_bid(&self, mut bid: Bid) -> Result<Bid> {
        let result = self.collection.insert_one(&bid, None).await?;
        bid.id = result.inserted_id.as_object_id();
        Ok(bid)
    }

    pub async fn delete_bid(&self, id: ObjectId) -> Result<DeleteResult> {
        let filter = doc! { "_id": id };
        self.collection.delete_one(filter, None).await
    }
}
