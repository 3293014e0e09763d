use mongodb::bson::doc;
use mongodb::error::Result;
use mongodb::{Client, Collection};

use crate::models::user::User;

pub struct UserRepository {
    collection: Collection<User>,
}

impl UserRepository {
    pub fn new(client: &Client) -> Self {
        let db = client.database("smart_db");
        let collection = db.collection::<User>("users");
        UserRepository { collection }
    }

    pub async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let filter = doc! { "email": email };
        self.collection.find_one(filter, None).await
    }

    /// Inserts the user and returns it with the generated id. Uniqueness per
    /// email is the caller's find-then-insert check; two concurrent inserts
    /// with the same email can both land (known non-atomic policy).
    pub async fn create_user(&self, mut user: User) -> Result<User> {
        let result = self.collection.insert_one(&user, None).await?;
        user.id = result.inserted_id.as_object_id();
        Ok(user)
    }
}
