pub(crate) mod common;
mod connect_hooks;
mod examples;
