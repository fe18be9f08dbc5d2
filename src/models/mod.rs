pub mod document;
pub mod loaders;
pub mod page;
pub mod plan;
pub mod viewer;

pub use document::{DocumentDetails, OrganizePayload, RecipeEntry, UploadedDocument};
pub use loaders::{load_all_plan_files, load_toml_to_edit_plan, mark_plan_done};
pub use page::{Page, PageUid, Rotation};
pub use plan::{EditPlan, PlanOperation};
pub use viewer::ViewerType;
