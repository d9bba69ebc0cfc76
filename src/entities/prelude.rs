pub use super::activity::{ActivityStatus, Entity as Activity};
pub use super::auth_token::Entity as AuthToken;
pub use super::comment::Entity as Comment;
pub use super::crop::{CropStatus, Entity as Crop};
pub use super::farmer::{Entity as Farmer, VerificationStatus};
pub use super::field::Entity as Field;
pub use super::post::Entity as Post;
pub use super::post_like::Entity as PostLike;
pub use super::review::Entity as Review;
pub use super::secure_route::{Entity as SecureRoute, SecurityStatus};
pub use super::weather_record::{Entity as WeatherRecord, WeatherSource};
