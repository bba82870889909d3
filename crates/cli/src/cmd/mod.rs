mod check;
mod plan;
mod roots;

pub use check::cmd_check;
pub use plan::{PlanOptions, cmd_plan};
pub use roots::cmd_roots;
