use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // verified email of the caller
    pub exp: usize,  // expiry as unix timestamp
}
