//! CV field extraction and the biodata HTML sheet.

pub mod assemble;
pub mod classifier;
pub mod html;
pub mod people;
pub mod record;
pub mod template;

pub use classifier::{rules_for, Classifier, Section};
pub use html::render_html;
pub use people::{assign, Assignment};
pub use record::{CvRecord, EmploymentRecord};
