pub use self::{helpers::*, structs_and_traits::*};

mod afs;
mod helpers;
mod params;
mod progress;
mod structs_and_traits;
