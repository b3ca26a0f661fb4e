pub mod records;
pub mod rows;
