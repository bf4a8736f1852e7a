pub mod inventory;
pub mod natural_key;
pub mod pass;
pub mod reconciler;
pub mod selector;

pub use inventory::{collect_inventory, Inventory};
pub use natural_key::natural_key;
pub use pass::{plan_pass, run_pass, PassReport, Plan};
pub use reconciler::{reconcile, ReconcileStats};
pub use selector::{select_files, Budgets, Decision};
