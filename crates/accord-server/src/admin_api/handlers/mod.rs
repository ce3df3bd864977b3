pub mod apps;
pub mod contracts;
pub mod system;
pub mod versions;
pub mod wirestubs;
pub mod wiretests;
