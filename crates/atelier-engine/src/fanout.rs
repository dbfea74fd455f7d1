use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::thread;

/// Runs `task` once per item on at most `max_concurrency` scoped workers and
/// waits for every call to settle. Outcomes come back in item order. A slot
/// is `None` when its worker died before settling.
pub fn gather<I, T, E, F>(items: &[I], max_concurrency: usize, task: F) -> Vec<Option<Result<T, E>>>
where
    I: Sync,
    T: Send,
    E: Send,
    F: Fn(&I) -> Result<T, E> + Sync,
{
    if items.is_empty() {
        return Vec::new();
    }
    let slots: Vec<Mutex<Option<Result<T, E>>>> = items.iter().map(|_| Mutex::new(None)).collect();
    let next = AtomicUsize::new(0);
    let workers = max_concurrency.clamp(1, items.len());
    let (cursor, cells, task) = (&next, &slots, &task);

    thread::scope(|scope| {
        let mut handles = Vec::with_capacity(workers);
        for _ in 0..workers {
            handles.push(scope.spawn(move || loop {
                let idx = cursor.fetch_add(1, Ordering::SeqCst);
                let Some(item) = items.get(idx) else {
                    break;
                };
                let outcome = task(item);
                if let Ok(mut slot) = cells[idx].lock() {
                    *slot = Some(outcome);
                }
            }));
        }
        for handle in handles {
            // A panicked worker leaves its slot empty.
            let _ = handle.join();
        }
    });

    slots
        .into_iter()
        .map(|slot| slot.into_inner().ok().flatten())
        .collect()
}

/// Commit-or-abort verdict over a gathered batch.
#[derive(Debug, PartialEq, Eq)]
pub enum BatchDecision<T, E> {
    /// Every call succeeded; values are in item order.
    Commit(Vec<T>),
    /// At least one call failed. Successful siblings are thrown away and
    /// only counted.
    Abort {
        failures: Vec<(usize, E)>,
        discarded: usize,
    },
}

/// All-or-nothing fan-in. `lost` turns an unsettled slot into an error.
pub fn decide<T, E>(
    outcomes: Vec<Option<Result<T, E>>>,
    lost: impl Fn(usize) -> E,
) -> BatchDecision<T, E> {
    let mut values = Vec::with_capacity(outcomes.len());
    let mut failures = Vec::new();
    for (idx, outcome) in outcomes.into_iter().enumerate() {
        match outcome {
            Some(Ok(value)) => values.push(value),
            Some(Err(err)) => failures.push((idx, err)),
            None => failures.push((idx, lost(idx))),
        }
    }
    if failures.is_empty() {
        return BatchDecision::Commit(values);
    }
    BatchDecision::Abort {
        failures,
        discarded: values.len(),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;
    use std::time::Duration;

    use super::{decide, gather, BatchDecision};

    #[test]
    fn outcomes_follow_item_order_not_completion_order() {
        let items = vec![40u64, 30, 20, 10];
        let outcomes = gather(&items, 8, |delay| {
            thread::sleep(Duration::from_millis(*delay));
            Ok::<u64, String>(*delay)
        });
        assert_eq!(
            outcomes,
            vec![Some(Ok(40)), Some(Ok(30)), Some(Ok(20)), Some(Ok(10))]
        );
    }

    #[test]
    fn concurrency_never_exceeds_the_bound() {
        let items = (0..12).collect::<Vec<u32>>();
        let running = AtomicUsize::new(0);
        let peak = AtomicUsize::new(0);
        let outcomes = gather(&items, 3, |item| {
            let now = running.fetch_add(1, Ordering::SeqCst) + 1;
            peak.fetch_max(now, Ordering::SeqCst);
            thread::sleep(Duration::from_millis(5));
            running.fetch_sub(1, Ordering::SeqCst);
            Ok::<u32, String>(*item)
        });
        assert_eq!(outcomes.len(), 12);
        assert!(peak.load(Ordering::SeqCst) <= 3);
    }

    #[test]
    fn empty_input_spawns_nothing() {
        let items: Vec<u8> = Vec::new();
        let outcomes = gather(&items, 4, |_| Ok::<u8, String>(0));
        assert!(outcomes.is_empty());
    }

    #[test]
    fn one_failure_aborts_and_discards_siblings() {
        let decision = decide(
            vec![Some(Ok("a")), Some(Err("boom")), Some(Ok("c")), None],
            |_| "lost",
        );
        assert_eq!(
            decision,
            BatchDecision::Abort {
                failures: vec![(1, "boom"), (3, "lost")],
                discarded: 2,
            }
        );
        assert_eq!(
            decide(vec![Some(Ok::<&str, &str>("a")), Some(Ok("b"))], |_| "lost"),
            BatchDecision::Commit(vec!["a", "b"])
        );
    }
}
