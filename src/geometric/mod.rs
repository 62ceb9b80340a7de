pub mod flood;
pub mod infrastructure;
pub mod road;
