//! Provider reflection.
//!
//! The system this fabric is modelled on gets compile-time reflection over a
//! provider's methods from a `std::tuple` of member-function pointers. Rust
//! has no direct equivalent that stays simple, so this settles for a lighter
//! mechanism: a provider is a unit struct carrying a `PROVIDER_ID` and an
//! ordered table of method names, where a method's position in the table
//! *is* its method ID. Call sites refer to methods by the `pub const`
//! ordinals each concrete provider module declares rather than by deriving
//! an index at compile time, trading a little generated boilerplate for
//! something straightforward to read and to get right without a build.

/// A provider identifies a fixed, ordered set of RPC methods. `PROVIDER_ID`
/// must be unique among providers sharing a fabric; `METHOD_NAMES`'
/// position `i` names the method with method ID `i`, for debugging and
/// logging only — dispatch itself is done by numeric ordinal.
pub trait Provider {
    const PROVIDER_ID: u16;
    const METHOD_NAMES: &'static [&'static str];
}

/// Declares a provider's identity and method table.
///
/// ```ignore
/// provider!(Pico2Main, id = 100, methods = ["ping", "debugPrint", "onBoot"]);
/// ```
#[macro_export]
macro_rules! provider {
    ($name:ident, id = $id:expr, methods = [$($method:literal),* $(,)?]) => {
        pub struct $name;

        impl $crate::provider::Provider for $name {
            const PROVIDER_ID: u16 = $id;
            const METHOD_NAMES: &'static [&'static str] = &[$($method),*];
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    provider!(Example, id = 42, methods = ["foo", "bar"]);

    #[test]
    fn macro_generates_provider_id_and_method_table() {
        assert_eq!(Example::PROVIDER_ID, 42);
        assert_eq!(Example::METHOD_NAMES, &["foo", "bar"]);
    }
}
