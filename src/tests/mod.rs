mod test_properties;
mod test_report;

/// Default K used by most tests.
pub const NUM_NEIGHBOURS: usize = 5;

/// Installs a test logger once; repeated calls are no-ops.
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}
