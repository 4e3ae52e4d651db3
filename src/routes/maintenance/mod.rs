mod handler;
mod model;

pub use handler::{
    create_maintenance, delete_maintenance, due_summary, get_maintenance, list_for_asset,
    update_maintenance,
};
