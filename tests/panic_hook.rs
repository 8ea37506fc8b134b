// Runs in its own process: the panic hook is global state.

use std::panic;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;

use trial::{
    collect, FixtureRegistry, RunOptions, Runner, Selection, Suite, TestDef, TestModule,
    TrialConfig,
};

static HOOK_CALLS: AtomicUsize = AtomicUsize::new(0);

fn panicking_suite(delay: Duration) -> Suite {
    Suite::new(FixtureRegistry::new()).module(TestModule::new("test_mod").test(TestDef::new(
        "test_boom",
        move |_| {
            thread::sleep(delay);
            panic!("boom");
        },
    )))
}

fn run_in_thread(delay: Duration) -> thread::JoinHandle<usize> {
    thread::spawn(move || {
        let suite = panicking_suite(delay);
        let config = TrialConfig::default();
        let options = RunOptions::default();
        let collection = collect(&suite, &config, &Selection::default());
        Runner::new(&suite, &config, &options).run(&collection).counts.failed
    })
}

#[test]
fn overlapping_runs_keep_the_callers_hook() {
    panic::set_hook(Box::new(|_| {
        HOOK_CALLS.fetch_add(1, Ordering::SeqCst);
    }));

    let first = run_in_thread(Duration::from_millis(300));
    thread::sleep(Duration::from_millis(100));
    let second = run_in_thread(Duration::from_millis(600));
    assert_eq!(first.join().unwrap(), 1);
    assert_eq!(second.join().unwrap(), 1);
    assert_eq!(HOOK_CALLS.load(Ordering::SeqCst), 0);

    let outside = panic::catch_unwind(|| panic!("outside any run"));
    assert!(outside.is_err());
    assert_eq!(HOOK_CALLS.load(Ordering::SeqCst), 1);
}
