pub mod categories;
pub mod company;
pub mod goods;
pub mod hours;
pub mod phones;
pub mod reviews;
