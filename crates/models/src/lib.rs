//! sea-orm entities, field validation and single-entity query helpers.

pub mod errors;
pub mod db;
pub mod validate;
pub mod user;
pub mod user_credentials;
pub mod category;
pub mod post;
pub mod template;
pub mod review;
pub mod contact_message;
pub mod newsletter_subscriber;
pub mod order;
pub mod order_item;
pub mod license;
pub mod webhook_event;

#[cfg(test)]
mod tests;
