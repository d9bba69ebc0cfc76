pub mod activity;
pub mod auth_token;
pub mod comment;
pub mod crop;
pub mod farmer;
pub mod field;
pub mod post;
pub mod post_like;
pub mod review;
pub mod secure_route;
pub mod weather_record;

pub use activity::Entity as Activity;
pub use auth_token::Entity as AuthToken;
pub use comment::Entity as Comment;
pub use crop::Entity as Crop;
pub use farmer::Entity as Farmer;
pub use field::Entity as Field;
pub use post::Entity as Post;
pub use post_like::Entity as PostLike;
pub use review::Entity as Review;
pub use secure_route::Entity as SecureRoute;
pub use weather_record::Entity as WeatherRecord;

pub mod prelude;
