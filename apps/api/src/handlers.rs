pub mod health;
pub mod shifts;
pub mod subscription;
