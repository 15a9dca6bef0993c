pub mod article;
pub mod event;
pub mod user;

pub use article::{Article, NewArticle};
pub use event::{LikeEvent, LikeState, ViewEvent, ViewerIdentity};
pub use user::{Category, User};

/// Row id of an `article`.
pub type ArticleId = i64;

/// Row id of a `users` entry. Values `<= 0` mean "anonymous" or "invalid".
pub type UserId = i64;
