//! Event collection helpers for integration tests

use std::time::Duration;

use image_harvest::{Event, ImageHarvester};

/// Subscribe-based wait for `Complete`, returning every event seen
///
/// Panics if `timeout` elapses or the channel closes first.
pub async fn collect_run(
    events: &mut tokio::sync::broadcast::Receiver<Event>,
    timeout: Duration,
) -> Vec<Event> {
    let collected = tokio::time::timeout(timeout, async {
        let mut collected = Vec::new();
        loop {
            match events.recv().await {
                Ok(Event::Complete) => {
                    collected.push(Event::Complete);
                    return collected;
                }
                Ok(event) => collected.push(event),
                Err(e) => panic!("event channel failed: {}", e),
            }
        }
    })
    .await;

    match collected {
        Ok(events) => events,
        Err(_) => panic!("timed out waiting for run to complete"),
    }
}

/// Poll-based wait for `Complete`
pub async fn poll_run(harvester: &ImageHarvester, timeout: Duration) -> Vec<Event> {
    let deadline = tokio::time::Instant::now() + timeout;
    let mut collected = Vec::new();
    while tokio::time::Instant::now() < deadline {
        collected.extend(harvester.poll_events());
        if collected.iter().any(|e| matches!(e, Event::Complete)) {
            return collected;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("timed out waiting for run to complete: {:?}", collected);
}

/// Image events of a run, in arrival order
pub fn images(events: &[Event]) -> Vec<&Event> {
    events
        .iter()
        .filter(|e| matches!(e, Event::Image { .. }))
        .collect()
}

/// `done` values of the run's progress events
pub fn progress_values(events: &[Event]) -> Vec<usize> {
    events
        .iter()
        .filter_map(|e| match e {
            Event::Progress { done, .. } => Some(*done),
            _ => None,
        })
        .collect()
}

/// Assert the run ended with exactly one terminal Complete
pub fn assert_single_complete(events: &[Event]) {
    let completes = events
        .iter()
        .filter(|e| matches!(e, Event::Complete))
        .count();
    assert_eq!(completes, 1, "expected exactly one Complete: {:?}", events);
    assert!(matches!(events.last(), Some(Event::Complete)));
}
