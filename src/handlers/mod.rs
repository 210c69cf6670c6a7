// handlers/mod.rs - HTTP handlers
//
// Public:   / and /health, no auth context
// Resolved: /api/v1/* - every handler receives the caller's AuthContext from
//           the auth middleware (guest when no token matches)

pub mod categories;
pub mod public;
pub mod tasks;
pub mod users;

pub use categories::get as categories_get;
pub use categories::put as categories_put;

pub use tasks::collection_get as tasks_list;
pub use tasks::collection_post as tasks_create;
pub use tasks::record_get as task_get;
pub use tasks::record_put as task_put;

pub use users::get as users_get;
