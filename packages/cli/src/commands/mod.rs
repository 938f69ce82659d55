pub mod list;
pub mod render;
pub mod run;

pub use list::{list, ListArgs};
pub use render::{render, RenderArgs};
pub use run::{run, RunArgs};
