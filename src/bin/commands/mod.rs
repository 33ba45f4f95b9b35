pub mod export_cmd;
pub mod inspect_cmd;
pub mod query_cmd;

pub use export_cmd::cmd_export;
pub use inspect_cmd::cmd_inspect;
pub use query_cmd::cmd_query;
