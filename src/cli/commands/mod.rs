pub mod decrypt;
pub mod encrypt;
pub mod inspect;
pub mod keygen;
pub mod rotate;
