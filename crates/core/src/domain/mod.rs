pub mod agent;
pub mod flow;
pub mod health;
pub mod session;
