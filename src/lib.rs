pub mod appendix;
pub mod batch;
pub mod cli;
pub mod config;
pub mod cv;
pub mod docx;
pub mod extract;
pub mod normalize;
pub mod proposal;
pub mod screenshots;
pub mod util;
