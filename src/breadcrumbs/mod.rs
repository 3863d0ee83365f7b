pub mod engine;
pub mod record;

pub use engine::BreadcrumbEngine;
pub use record::{Breadcrumb, Category, CrumbKind, Hint, UNKNOWN_TARGET};
