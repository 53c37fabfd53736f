pub mod ddl;
pub mod transcriptions;
pub mod users;
