use std::sync::Once;

static INIT_SYNC: Once = Once::new();

pub(crate) fn init_test_logger() {
    INIT_SYNC.call_once(|| {
        let _ = env_logger::builder().is_test(true).try_init();
    });
}
