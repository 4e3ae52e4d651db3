mod handler;
pub(crate) mod model;

pub use handler::{create_asset, delete_asset, get_asset, list_assets, update_asset};
