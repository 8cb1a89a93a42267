/// Emits a user-facing success line through the tracing pipeline.
///
/// Subscribers pick the `pharos::success` target up and render it with a
/// success symbol instead of the plain info one.
#[macro_export]
macro_rules! success {
    ($($arg:tt)*) => {
        ::tracing::info!(target: "pharos::success", $($arg)*)
    };
}
