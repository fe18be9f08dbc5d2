pub mod toml_loader;

pub use toml_loader::{load_all_plan_files, load_toml_to_edit_plan, mark_plan_done};
