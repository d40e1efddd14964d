//! Published request contracts, one per entity operation

macro_rules! contract {
    ($ty:ident, $name:literal, $build:expr) => {
        pub struct $ty;

        impl $crate::extractors::Contract for $ty {
            const NAME: &'static str = $name;

            fn schema() -> &'static ::validation::RequestSchema {
                static SCHEMA: ::once_cell::sync::Lazy<::validation::RequestSchema> =
                    ::once_cell::sync::Lazy::new(|| $build.expect(concat!("invalid contract ", $name)));
                &SCHEMA
            }
        }
    };
}

pub mod areas;
pub mod common;
pub mod customers;
pub mod items;
pub mod orders;
pub mod quotes;
pub mod workers;
