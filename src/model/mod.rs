pub mod record;
pub mod ticket;
