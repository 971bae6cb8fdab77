use prodcons_monitor::buffer::BoundedBuffer;
use prodcons_monitor::domain::{ConsumerId, Item};
use prodcons_monitor::pipeline::{
    ConsumerPool, Pacing, PipelineRunner, PipelineSettings, Producer, RunSummary,
};
use std::collections::BTreeSet;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

fn settings(capacity: usize, items: u32, consumers: u32) -> PipelineSettings {
    PipelineSettings {
        buffer_capacity: capacity,
        items,
        consumers,
        producer_max_delay: Duration::ZERO,
        consumer_max_delay: Duration::ZERO,
    }
}

async fn run_recorded(settings: PipelineSettings) -> RunSummary {
    let run = PipelineRunner::new(settings).unwrap().record_items(true).run();
    tokio::time::timeout(Duration::from_secs(30), run)
        .await
        .expect("pipeline did not reach the terminal state")
        .unwrap()
}

fn assert_every_item_once(summary: &RunSummary, items: u32) {
    let mut seen = BTreeSet::new();
    for report in &summary.consumers {
        for item in &report.items {
            assert!(seen.insert(item.id()), "{item} dequeued twice");
        }
    }
    assert_eq!(seen, (0..items).collect::<BTreeSet<_>>());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_single_consumer_takes_everything() {
    let summary = run_recorded(settings(4, 10, 1)).await;

    assert_eq!(summary.final_snapshot.consumed, vec![10]);
    assert_eq!(summary.final_snapshot.queue_length, 0);
    assert_eq!(summary.final_snapshot.items_produced, 10);
    // One consumer observes the exact production order.
    let ids: Vec<u32> = summary.consumers[0].items.iter().map(|i| i.id()).collect();
    assert_eq!(ids, (0..10).collect::<Vec<_>>());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_three_consumers_share_the_work() {
    let summary = run_recorded(settings(4, 10, 3)).await;

    assert_eq!(summary.final_snapshot.consumed_total(), 10);
    assert!(summary.final_snapshot.consumed.iter().all(|&c| c <= 10));
    assert_eq!(summary.consumed_total(), 10);
    assert_every_item_once(&summary, 10);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_smallest_ring_single_item_terminates() {
    let summary = run_recorded(settings(2, 1, 1)).await;

    assert!(summary.final_snapshot.is_terminal());
    assert_eq!(summary.final_snapshot.consumed, vec![1]);
    assert_eq!(summary.buffer_stats.peak_queue_length, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_many_consumers_on_a_tiny_ring() {
    let summary = run_recorded(settings(2, 500, 8)).await;

    assert_eq!(summary.final_snapshot.consumed.len(), 8);
    assert_eq!(summary.final_snapshot.consumed_total(), 500);
    assert!(summary.buffer_stats.peak_queue_length <= 1);
    assert_every_item_once(&summary, 500);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_paced_run_conserves_items() {
    let paced = PipelineSettings {
        producer_max_delay: Duration::from_micros(200),
        consumer_max_delay: Duration::from_micros(500),
        ..settings(5, 200, 3)
    };
    let summary = run_recorded(paced).await;

    assert_eq!(summary.items_produced, 200);
    assert_eq!(summary.final_snapshot.consumed_total(), 200);
    assert_every_item_once(&summary, 200);
}

#[test]
fn test_each_consumer_sees_fifo_order() {
    let buffer = Arc::new(BoundedBuffer::new(3, 4).unwrap());
    let consumers: Vec<_> = ConsumerPool::new(&buffer, Pacing::disabled())
        .recording_items(true)
        .into_consumers()
        .into_iter()
        .map(|consumer| thread::spawn(move || consumer.run()))
        .collect();

    let produced = Producer::new(Arc::clone(&buffer), 1000, Pacing::disabled()).run();
    assert_eq!(produced, 1000);

    let mut total = 0;
    for handle in consumers {
        let report = handle.join().unwrap();
        // Removal order is FIFO, so any one consumer's items are increasing.
        assert!(report.items.windows(2).all(|w| w[0] < w[1]));
        total += report.consumed;
    }
    assert_eq!(total, 1000);
    assert!(buffer.is_terminal());
}

#[test]
fn test_snapshots_stay_consistent_under_load() {
    let buffer = Arc::new(BoundedBuffer::new(4, 3).unwrap());
    let consumers = ConsumerPool::new(&buffer, Pacing::disabled())
        .into_consumers()
        .into_iter()
        .map(|consumer| thread::spawn(move || consumer.run()))
        .collect::<Vec<_>>();
    let producer = {
        let buffer = Arc::clone(&buffer);
        thread::spawn(move || Producer::new(buffer, 5000, Pacing::disabled()).run())
    };

    let mut last_produced = 0;
    while !buffer.is_terminal() {
        let snapshot = buffer.snapshot();
        assert!(snapshot.is_consistent(), "{snapshot:?}");
        assert!(snapshot.queue_length <= 3);
        assert!(snapshot.items_produced >= last_produced);
        last_produced = snapshot.items_produced;
    }

    producer.join().unwrap();
    for handle in consumers {
        handle.join().unwrap();
    }
    assert_eq!(buffer.snapshot().consumed_total(), 5000);
}

#[test]
fn test_completion_is_visible_to_late_consumers() {
    let buffer = BoundedBuffer::new(4, 2).unwrap();
    buffer.enqueue(Item::new(7));
    buffer.mark_complete();

    let late = ConsumerId::new(2).unwrap();
    assert_eq!(buffer.dequeue(late), Some(Item::new(7)));
    assert_eq!(buffer.dequeue(late), None);
    assert_eq!(buffer.snapshot().consumed, vec![0, 1]);
}
