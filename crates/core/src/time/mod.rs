pub mod as_of;
