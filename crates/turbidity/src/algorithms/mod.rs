pub mod binarize;
pub mod labeling;
pub mod filtering;
pub mod boundary;
pub mod classification;

pub use binarize::*;
pub use labeling::*;
pub use filtering::*;
pub use boundary::*;
pub use classification::*;
