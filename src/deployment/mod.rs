pub mod assembly;
pub mod dep_group;
pub mod manage;
pub mod process;
pub mod receipt;
pub mod type_id;
