pub use self::il3820::*;

pub mod il3820;
