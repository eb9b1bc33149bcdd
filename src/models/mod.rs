pub mod jobmodel;
pub mod paymentmodel;
pub mod skillmodel;
pub mod usermodel;
