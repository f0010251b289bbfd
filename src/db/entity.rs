pub mod donation;
pub mod star;

pub use donation::Entity as Donations;
pub use star::Entity as Stars;
pub use star::Model as StarRow;
