use std::time::Duration;

use futures::StreamExt;
use pollen::{Exponential, ExponentialCapped, Linear, Policy, PollingDriver, RunState};
use tokio::time::Instant;

#[tokio::test(start_paused = true)]
async fn linear_consumed_fully() {
    let driver = PollingDriver::new(Linear::from_millis(10, 100));
    let mut completed = 0;

    let mut stream = driver.start().unwrap();
    while let Some(tick) = stream.next().await {
        tick.unwrap();
        completed += 1;
    }

    assert_eq!(completed, 10);
    assert_eq!(driver.state(), RunState::Completed);
}

#[tokio::test(start_paused = true)]
async fn linear_spacing_is_at_least_the_duration() {
    let driver = PollingDriver::new(Linear::from_millis(4, 100));
    let mut stream = driver.start().unwrap();
    let mut last = Instant::now();
    let mut first = true;

    while let Some(tick) = stream.next().await {
        tick.unwrap();
        let gap = last.elapsed();
        if first {
            assert!(gap < Duration::from_millis(1));
            first = false;
        } else {
            assert!(gap >= Duration::from_millis(100));
        }
        last = Instant::now();
    }
}

#[tokio::test(start_paused = true)]
async fn cancel_after_third_emission() {
    let driver = PollingDriver::new(Linear::from_millis(10, 100));
    let mut completed = 0;

    let mut stream = driver.start().unwrap();
    while let Some(tick) = stream.next().await {
        tick.unwrap();
        completed += 1;
        if completed == 3 {
            driver.cancel();
        }
    }

    assert_eq!(completed, 3);
    assert_eq!(driver.state(), RunState::Cancelled);
    driver.cancel();
    assert!(stream.next().await.is_none());
}

#[tokio::test(start_paused = true)]
async fn consumer_error_stops_reading_and_drop_cancels() {
    let driver = PollingDriver::new(Linear::from_millis(10, 100));

    let outcome: Result<(), &str> = async {
        let mut stream = driver.start().unwrap();
        let mut completed = 0;
        while let Some(tick) = stream.next().await {
            tick.unwrap();
            if completed == 2 {
                return Err("polling error");
            }
            completed += 1;
        }
        Ok::<(), &str>(())
    }
    .await;

    assert_eq!(outcome, Err("polling error"));
    driver.join().await;
    assert_eq!(driver.state(), RunState::Cancelled);
}

#[tokio::test(start_paused = true)]
async fn exponential_total_elapsed() {
    let driver = PollingDriver::new(Exponential::from_millis(4, 100));
    let started = Instant::now();

    let ticks: Vec<_> = driver.start().unwrap().collect().await;

    assert_eq!(ticks.len(), 4);
    // 200ms + 400ms + 800ms before iterations 2, 3 and 4.
    assert!(started.elapsed() >= Duration::from_millis(1_400));
}

#[tokio::test(start_paused = true)]
async fn capped_delay_hits_ceiling() {
    let driver = PollingDriver::new(ExponentialCapped::new(
        2,
        Duration::from_secs(1),
        Duration::from_secs(2),
    ));
    let mut stream = driver.start().unwrap();
    let mut start = Instant::now();
    let mut delta = Duration::ZERO;

    while let Some(tick) = stream.next().await {
        tick.unwrap();
        delta = start.elapsed();
        start = Instant::now();
    }

    let tolerance = Duration::from_millis(150);
    assert!(delta >= Duration::from_secs(2) && delta <= Duration::from_secs(2) + tolerance);
}

#[tokio::test(start_paused = true)]
async fn empty_run_completes_immediately() {
    let driver = PollingDriver::new(Policy::from(Exponential::from_millis(0, 100)));
    let started = Instant::now();

    assert!(driver.start().unwrap().next().await.is_none());
    assert!(started.elapsed() < Duration::from_millis(1));
    assert_eq!(driver.state(), RunState::Completed);
}

#[tokio::test]
async fn real_clock_linear_run() {
    let driver = PollingDriver::new(Linear::from_millis(3, 20));
    let started = std::time::Instant::now();

    let ticks: Vec<u32> = driver
        .start()
        .unwrap()
        .map(|tick| tick.unwrap())
        .collect()
        .await;

    assert_eq!(ticks, vec![1, 2, 3]);
    assert!(started.elapsed() >= Duration::from_millis(40));
}
