use tickseq::clock::{IntervalTimer, ManualMicros, ManualTimer, TimerError};
use tickseq::ring_buffer::ring_buffer;
use tickseq::TickScheduler;

#[test]
fn test_ring_buffer_is_fifo() {
    let (mut producer, mut consumer) = ring_buffer::<u32, 8>();
    for value in 1..=3 {
        assert!(producer.push(value).is_ok());
    }
    assert_eq!(consumer.pop(), Some(1));
    assert_eq!(consumer.pop(), Some(2));
    assert_eq!(consumer.pop(), Some(3));
    assert_eq!(consumer.pop(), None);
}

#[test]
fn test_ring_buffer_keeps_one_slot_free() {
    let (mut producer, consumer) = ring_buffer::<u32, 4>();
    assert!(producer.push(1).is_ok());
    assert!(producer.push(2).is_ok());
    assert!(producer.push(3).is_ok());
    assert!(producer.is_full());
    assert_eq!(producer.push(4), Err(4));
    assert_eq!(consumer.len(), 3);
}

#[test]
fn test_begin_fails_when_timer_unavailable() {
    let mut scheduler = TickScheduler::new(ManualTimer::failing());
    let result = scheduler.begin(1000, ManualMicros::new(0));
    assert!(matches!(result, Err(TimerError::Unavailable(_))));
    assert!(!scheduler.is_armed());
    assert_eq!(scheduler.fetch(), None);
}

#[test]
fn test_begin_twice_is_rejected() {
    let mut scheduler = TickScheduler::new(ManualTimer::new());
    scheduler.begin(1000, ManualMicros::new(0)).unwrap();
    assert_eq!(
        scheduler.begin(1000, ManualMicros::new(0)),
        Err(TimerError::AlreadyArmed)
    );
}

#[test]
fn test_ticks_carry_sequence_and_timestamp() {
    let clock = ManualMicros::new(500);
    let mut scheduler = TickScheduler::new(ManualTimer::new());
    scheduler.begin(1000, clock.clone()).unwrap();
    assert_eq!(scheduler.timer_mut().period_micros(), 1000);

    for _ in 0..3 {
        assert!(scheduler.timer_mut().fire());
        clock.advance(1000);
    }

    let ticks: Vec<_> = std::iter::from_fn(|| scheduler.fetch()).collect();
    assert_eq!(ticks.len(), 3);
    assert_eq!(
        ticks.iter().map(|t| t.sequence).collect::<Vec<_>>(),
        vec![0, 1, 2]
    );
    assert_eq!(
        ticks.iter().map(|t| t.timestamp).collect::<Vec<_>>(),
        vec![500, 1500, 2500]
    );
}

#[test]
fn test_full_buffer_counts_dropped_ticks() {
    let mut scheduler = TickScheduler::new(ManualTimer::new());
    scheduler.begin(1000, ManualMicros::new(0)).unwrap();

    // The consumer stalls while 1100 interrupts fire.
    for _ in 0..1100 {
        scheduler.timer_mut().fire();
    }

    assert_eq!(scheduler.depth(), 1023);
    assert_eq!(scheduler.dropped(), 77);

    // The oldest ticks survive; the newest were dropped.
    assert_eq!(scheduler.fetch().map(|t| t.sequence), Some(0));
}

#[test]
fn test_end_keeps_queued_ticks() {
    let mut scheduler = TickScheduler::new(ManualTimer::new());
    scheduler.begin(1000, ManualMicros::new(0)).unwrap();
    scheduler.timer_mut().fire();
    scheduler.end();

    assert!(!scheduler.is_armed());
    assert!(!scheduler.timer_mut().fire());
    assert!(scheduler.fetch().is_some());
    assert!(scheduler.fetch().is_none());
}

#[test]
fn test_rearm_resets_drop_counter() {
    let mut scheduler = TickScheduler::new(ManualTimer::new());
    scheduler.begin(1000, ManualMicros::new(0)).unwrap();
    for _ in 0..1024 {
        scheduler.timer_mut().fire();
    }
    assert_eq!(scheduler.dropped(), 1);

    scheduler.end();
    scheduler.begin(1000, ManualMicros::new(0)).unwrap();
    assert_eq!(scheduler.dropped(), 0);
    assert_eq!(scheduler.depth(), 0);
    assert!(scheduler.timer_mut().is_armed());
}
