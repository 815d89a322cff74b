//! Probe Web – browser client for the device probe page.
//!
//! Views, reactive state and the platform-neutral halves of the DOM glue
//! compile natively; everything that touches the DOM is compiled only with
//! the `hydrate` feature.

pub mod components;
pub mod platform;
pub mod recorder;
pub mod render;
pub mod state;

cfg_if::cfg_if! {
    if #[cfg(feature = "hydrate")] {
        mod console;
        mod devices;
        mod dom;
        mod probe;

        pub use probe::Probe;
    }
}
