mod common;

use common::*;
use csvbind::{read, write, Error, RayonPool, ReadOptions, WorkerPool};
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

const ROWS: usize = 10_000;

fn population() -> Vec<Person> {
    (0..ROWS)
        .map(|i| {
            person(
                &format!("person-{i}"),
                (i % 100) as i32,
                &format!("{i} Main St"),
                &format!("City {}", i % 37),
            )
        })
        .collect()
}

#[test]
fn every_row_is_delivered_exactly_once_at_any_concurrency() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("population.csv");
    let mut expected = population();
    write(&path, &expected)?;
    expected.sort_by(|a, b| a.name.cmp(&b.name));

    for concurrency in [1, 5, 10, 20, 80] {
        let seen = Arc::new(Mutex::new(Vec::with_capacity(ROWS)));
        let sink = Arc::clone(&seen);
        let options = ReadOptions::new()
            .with_concurrency(concurrency)
            .with_handler(move |p: Person| {
                sink.lock().unwrap().push(p);
                Ok(())
            });

        assert_eq!(read(&path, options)?, ROWS, "concurrency {concurrency}");

        let mut got = std::mem::take(&mut *seen.lock().unwrap());
        got.sort_by(|a, b| a.name.cmp(&b.name));
        assert_eq!(got, expected, "concurrency {concurrency}");
    }
    Ok(())
}

#[mark_flaky_tests::flaky]
#[test]
fn handlers_run_on_several_threads() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("population.csv");
    write(&path, &population()[..200]).expect("write");

    let threads = Arc::new(Mutex::new(HashSet::new()));
    let sink = Arc::clone(&threads);
    let options = ReadOptions::new()
        .with_concurrency(4)
        .with_handler(move |_: Person| {
            sink.lock().unwrap().insert(thread::current().id());
            thread::sleep(Duration::from_millis(1));
            Ok(())
        });
    read(&path, options).expect("read");
    assert!(threads.lock().unwrap().len() > 1);
}

#[test]
fn in_flight_rows_stay_bounded() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("population.csv");
    write(&path, &population()[..500])?;

    let workers = 3;
    let active = Arc::new(AtomicUsize::new(0));
    let peak = Arc::new(AtomicUsize::new(0));
    let (a, p) = (Arc::clone(&active), Arc::clone(&peak));
    let options = ReadOptions::new()
        .with_concurrency(workers)
        .with_handler(move |_: Person| {
            let now = a.fetch_add(1, Ordering::SeqCst) + 1;
            p.fetch_max(now, Ordering::SeqCst);
            thread::sleep(Duration::from_micros(200));
            a.fetch_sub(1, Ordering::SeqCst);
            Ok(())
        });
    read(&path, options)?;
    assert!(peak.load(Ordering::SeqCst) <= workers);
    Ok(())
}

#[test]
fn first_error_wins_and_pool_drains() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("population.csv");
    write(&path, &population())?;

    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let options = ReadOptions::new()
        .with_concurrency(8)
        .with_handler(move |p: Person| {
            counter.fetch_add(1, Ordering::SeqCst);
            if p.age == 50 {
                anyhow::bail!("rejected {}", p.name);
            }
            Ok(())
        });

    let err = read(&path, options).unwrap_err();
    assert!(matches!(err, Error::Handler { .. }), "{err}");
    // Dispatch stops shortly after the first failure.
    assert!(calls.load(Ordering::SeqCst) < ROWS);
    Ok(())
}

#[test]
fn submission_blocks_at_twice_the_worker_count() -> anyhow::Result<()> {
    let workers = 2;
    let pool = RayonPool::new(workers)?;
    let pending = Arc::new(AtomicUsize::new(0));
    let mut peak = 0;

    for _ in 0..200 {
        pending.fetch_add(1, Ordering::SeqCst);
        let done = Arc::clone(&pending);
        pool.submit(Box::new(move || {
            thread::sleep(Duration::from_micros(300));
            done.fetch_sub(1, Ordering::SeqCst);
            Ok(())
        }));
        peak = peak.max(pending.load(Ordering::SeqCst));
    }
    pool.wait()?;

    assert!(peak <= 2 * workers, "peak {peak}");
    assert_eq!(pending.load(Ordering::SeqCst), 0);
    Ok(())
}

#[test]
fn zero_worker_pool_is_rejected() {
    assert!(matches!(
        RayonPool::new(0),
        Err(Error::InvalidConfiguration(_))
    ));
}
