pub mod db;
pub mod recipe_query;

pub use db::DbAdapter;
